use std::sync::Arc;
use storefront_sync::{
    config::{database, settings},
    core::{
        bus::ChangeBus, reconcile, session::SessionFlags, store::LocalProductStore,
        subscribe::ChangeTrigger,
    },
    errors::Result,
    models::{self, ProductFilter},
    storage::{FileStorage, SharedStorage},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenvy::dotenv().ok();

    // 3. Load the application configuration
    let app_config = settings::load_default_config()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;
    info!(
        "Configuration loaded: {} catalog products, polling every {:?}",
        app_config.catalog.len(),
        app_config.sync.poll_interval()
    );

    // 4. Open the local slots
    let storage: SharedStorage = Arc::new(FileStorage::open(&app_config.sync.storage_dir)?);
    let session = SessionFlags::new(Arc::clone(&storage));
    if !session.has_visited() {
        info!("First run on this profile");
        session.mark_visited();
    }

    let store = LocalProductStore::new(
        Arc::clone(&storage),
        Arc::new(app_config.catalog.clone()),
        ChangeBus::new(),
    );

    // 5. Load and top up the local list from the baseline catalog
    let loaded = store.load();
    if let Some(reason) = loaded.reason() {
        warn!("Local product list degraded: {}", reason);
    }
    let report = reconcile::merge_and_ensure(&store).into_inner();
    info!(
        "Local list holds {} products ({} appended from catalog)",
        report.total,
        report.appended.len()
    );
    info!("Categories in use: {}", models::categories(&store.list()).join(", "));

    // 6. Pull remote products; an unreachable database leaves the local list as is
    match database::create_connection().await {
        Ok(db) => {
            database::create_tables(&db)
                .await
                .inspect_err(|e| error!("Failed to prepare products table: {}", e))?;
            let remote = reconcile::merge_remote(&store, &db).await;
            match remote.reason() {
                Some(reason) => warn!("Remote sync skipped: {}", reason),
                None => info!("Remote sync appended {} products", remote.value().appended.len()),
            }
        }
        Err(e) => warn!("Remote product service unavailable: {}", e),
    }

    // 7. Watch for changes until interrupted
    let watcher = store.clone();
    let badge_window = chrono::Duration::days(app_config.sync.new_badge_days);
    let subscription = store.subscribe(app_config.sync.poll_interval(), move |trigger| {
        let listed = ProductFilter::default().apply(&watcher.list());
        let now = chrono::Utc::now();
        let fresh = listed.iter().filter(|p| p.is_new(now, badge_window)).count();
        match trigger {
            ChangeTrigger::Poll { current, .. } => info!(
                "Products changed elsewhere (stamp {:?}): {} listed, {} new",
                current,
                listed.len(),
                fresh
            ),
            other => info!("Products changed ({:?}): {} listed, {} new", other, listed.len(), fresh),
        }
    })?;

    info!("Watching {:?} for product changes, Ctrl-C to stop", app_config.sync.storage_dir);
    tokio::signal::ctrl_c().await?;
    subscription.unsubscribe();
    info!("Stopped");
    Ok(())
}
