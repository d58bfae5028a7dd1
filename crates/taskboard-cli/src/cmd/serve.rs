use anyhow::Context;
use clap::Args;
use taskboard_core::config::{ActionsRoute, ServerConfig};
use std::path::Path;

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Port to listen on (0 = OS-assigned)
    #[arg(long, env = "TASKBOARD_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub bind: Option<String>,

    /// Database URL, e.g. sqlite://taskboard.db
    #[arg(long = "database", env = "TASKBOARD_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Route shape for a project's actions: nested or legacy
    #[arg(long)]
    pub actions_route: Option<String>,
}

impl ServeArgs {
    /// Apply command-line overrides on top of the file config.
    pub fn apply(self, mut config: ServerConfig) -> anyhow::Result<ServerConfig> {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(url) = self.database_url {
            config.database_url = url;
        }
        if let Some(route) = self.actions_route {
            config.actions_route = route.parse::<ActionsRoute>()?;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn run(config_path: &Path, args: ServeArgs) -> anyhow::Result<()> {
    let config = ServerConfig::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let config = args.apply(config)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(taskboard_server::serve(config))
}
