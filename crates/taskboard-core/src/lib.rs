pub mod config;
pub mod error;
pub mod io;
pub mod store;
pub mod types;
pub mod validate;

pub use error::{BoardError, Result};
pub use store::Store;
