use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use life_manager::{create_router, initialize_backend, AppConfig};

#[derive(Parser, Debug)]
#[command(name = "life-manager", version, about = "Life Manager REST server")]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Directory holding the database, settings.yaml and the JSON goal store.
    #[arg(long, env = "LM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Signed-in user; goal routes without `user_id` act for this user.
    #[arg(long)]
    user_id: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    std::fs::create_dir_all(&config.data_dir)?;

    let app_state = initialize_backend(config, args.user_id).await?;
    let app = create_router(app_state);

    info!("Starting server on {}", args.listen);
    let listener = TcpListener::bind(args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
