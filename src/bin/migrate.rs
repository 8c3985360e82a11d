use anyhow::Result;
use geocache::{app, config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let database_url = config::load_database_url()?;
    let _ = app::connect_to_db(database_url.as_str()).await?;
    tracing::info!("DB successfully initialized");

    Ok(())
}
