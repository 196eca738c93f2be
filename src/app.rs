//! Process bootstrap shared by the binaries.

use anyhow::Context;
use bookstore_db::Database;
use bookstore_kernel::{InitCtx, ModuleRegistry, Settings};

use crate::modules;

/// Registry with every feature module registered
pub fn build_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Connect to the store and apply every module's schema
pub async fn prepare_database(settings: &Settings, registry: &ModuleRegistry) -> anyhow::Result<Database> {
    let db = Database::connect(&settings.database)
        .await
        .context("failed to open the book store")?;
    db.apply_schema(&registry.collect_schema()).await?;
    Ok(db)
}

/// Run the HTTP service until shutdown, then stop modules and close the pool
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "bookstore bootstrap starting"
    );

    let registry = build_registry();
    let db = Database::connect(&settings.database)
        .await
        .context("failed to open the book store")?;
    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };

    registry.init_all(&ctx).await?;
    db.apply_schema(&registry.collect_schema()).await?;
    registry.start_all(&ctx).await?;

    let served = bookstore_http::start_server(&registry, &ctx).await;

    registry.stop_all().await?;
    db.close().await;
    served
}
