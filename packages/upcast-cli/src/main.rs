use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use upcast_config::{AppConfig, ConfigError};
use upcast_core::ChannelResolver;
use upcast_provider::SourceManager;
use upcast_server::{UpdateRequestHandler, UpdateServer};
use upcast_utils::BoxError;

#[derive(Parser)]
#[command(name = "upcast")]
#[command(about = "Serve desktop app downloads and updates from GitHub releases")]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Options {
    /// JSON config file
    #[arg(long, short, env = "UPCAST_CONFIG")]
    config: Option<PathBuf>,

    /// Repository, `owner/name` or a full URL
    #[arg(long)]
    repo: Option<String>,

    /// Access token for private repositories
    #[arg(long)]
    token: Option<String>,

    /// Base URL of a GitHub-compatible private store
    #[arg(long)]
    server_url: Option<String>,

    /// Address to listen on
    #[arg(long)]
    listen: Option<String>,

    /// Seconds a release list is cached
    #[arg(long)]
    cache_ttl: Option<u64>,

    /// Public GitHub API root
    #[arg(long)]
    github_api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the update server (default)
    Serve,
    /// Print the latest release of every channel and exit
    Channels,
}

impl Options {
    fn into_config(self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(repo) = self.repo {
            config.repo.repo = repo;
        }
        if let Some(token) = self.token {
            config.repo.token = Some(token);
        }
        if let Some(server_url) = self.server_url {
            config.repo.server_url = Some(server_url);
        }
        if let Some(listen) = self.listen {
            config.server.listen = listen;
        }
        if let Some(ttl) = self.cache_ttl {
            config.server.cache_ttl_secs = ttl;
        }
        if let Some(api_url) = self.github_api_url {
            config.server.github_api_url = Some(api_url);
        }
        config.validate()?;
        Ok(config)
    }
}

fn build_resolver(config: &AppConfig) -> ChannelResolver {
    let sources = match config.server.github_api_url.as_deref() {
        Some(api_base) => SourceManager::with_github_api(api_base),
        None => SourceManager::default(),
    };
    ChannelResolver::with_sources(sources, config.server.cache_ttl())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.options.into_config()?;
    let resolver = Arc::new(build_resolver(&config));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let addr = config.server.listen_addr()?;
            let handler = UpdateRequestHandler::new(resolver, config.repo);
            UpdateServer::new(handler).start(addr).await?;
        }
        Commands::Channels => {
            let channels = resolver.latest_by_channel(&config.repo).await?;
            let mut names: Vec<&String> = channels.keys().collect();
            names.sort();
            for name in names {
                let release = &channels[name];
                println!("{}\t{}\t{} assets", name, release.tag, release.assets.len());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "upcast",
            "--repo",
            "acme/app",
            "--listen",
            "0.0.0.0:9000",
            "--cache-ttl",
            "5",
            "channels",
        ]);
        let config = cli.options.into_config().unwrap();
        assert_eq!(config.repo.repo, "acme/app");
        assert_eq!(config.server.listen, "0.0.0.0:9000");
        assert_eq!(config.server.cache_ttl_secs, 5);
        assert!(matches!(cli.command, Some(Commands::Channels)));
    }

    #[test]
    fn test_build_resolver_uses_ttl() {
        let mut config = AppConfig::default();
        config.server.cache_ttl_secs = 42;
        let resolver = build_resolver(&config);
        assert_eq!(resolver.cache_ttl().as_secs(), 42);
    }
}
