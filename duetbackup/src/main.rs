use anyhow::Context;
use clap::Parser;
use duet_core::DuetClient;
use duetbackup::{BackupConfig, Cli, SyncEngine};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "duetbackup=debug,duet_core=debug"
    } else {
        "duetbackup=info,duet_core=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = BackupConfig::from_cli(Cli::parse())?;
    init_tracing(config.verbose);

    let client = DuetClient::new(&config.base_url)
        .with_context(|| format!("invalid device address {}", config.base_url))?;

    debug!("trying to connect to {}", client.base_url());
    if let Err(err) = client.connect(&config.password).await {
        warn!("Duet currently not available: {err}");
        return Ok(());
    }

    let engine = SyncEngine::new(client, config.excludes).with_remove_local(config.remove_local);
    engine
        .run(&config.remote_root, &config.out_dir)
        .await
        .with_context(|| {
            format!(
                "backup of {} to {} failed",
                config.remote_root,
                config.out_dir.display()
            )
        })?;
    Ok(())
}
