use clap::Parser;

use throttler::config::Config;
use throttler::server::Server;

/// Distributed, Redis-backed token bucket rate limiter.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to a config file (TOML/YAML/JSON, extension-sniffed). Optional —
    /// falls back to `THROTTLER_*` environment variables, then defaults.
    #[arg(short, long, default_value = "config")]
    config: String,

    /// Overrides the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Overrides the configured Redis URL.
    #[arg(short, long)]
    redis_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;

    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }
    if let Some(redis_url) = cli.redis_url {
        config.redis_url = redis_url;
    }

    tracing::info!(
        bind_address = %config.bind_address,
        redis_url = %config.redis_url,
        "starting throttler"
    );

    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}
