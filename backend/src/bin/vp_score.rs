//! One-shot vendor score recalculation for operators and schedulers

use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vendorpulse_backend::{services::VendorScoreService, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vp_score=info,vendorpulse_backend=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::load()?;

    let db_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    let result = VendorScoreService::new(db_pool).recalculate_all().await?;

    for vendor in &result.vendors {
        println!("{}: {}", vendor.supplier_name, vendor.score);
    }
    println!("Updated {} vendor scores.", result.updated);

    Ok(())
}
