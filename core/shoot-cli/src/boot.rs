//! Startup for CLI commands that need the durable store.

use shoot_core::boot::{BootOutcome, LaunchMarker, StartupArbiter};
use shoot_core::config::ShootConfig;
use shoot_core::storage::StorageConfig;
use shoot_core::store::{Store, StoreBootstrapper};
use tokio::runtime::Runtime;

pub type StoreArbiter = StartupArbiter<StoreBootstrapper>;

pub fn runtime() -> Result<Runtime, String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {}", e))
}

pub fn arbiter(storage: &StorageConfig, config: &ShootConfig) -> StoreArbiter {
    StartupArbiter::new(StoreBootstrapper::new(storage.store_file()))
        .with_timeout(config.boot_timeout())
        .with_launch_marker(marker(storage))
}

pub fn marker(storage: &StorageConfig) -> LaunchMarker {
    LaunchMarker::new(storage.launch_marker_file())
}

/// Boots and hands back the store, or the safe-mode message as an error.
pub async fn ready_store(arbiter: &StoreArbiter) -> Result<std::sync::Arc<Store>, String> {
    arbiter.start();
    match arbiter.wait_resolved().await {
        BootOutcome::Ready { store, warning, .. } => {
            if let Some(warning) = warning {
                eprintln!("warning: {}", warning);
            }
            Ok(store)
        }
        BootOutcome::SafeMode { message, .. } => Err(format!("safe mode: {}", message)),
        BootOutcome::Loading => Err("startup did not resolve".to_string()),
    }
}

pub fn run(storage: &StorageConfig, config: &ShootConfig) -> Result<(), String> {
    let arbiter = arbiter(storage, config);
    let summary = runtime()?.block_on(async {
        arbiter.start();
        arbiter.wait_resolved().await.summary()
    });
    marker(storage).mark_clean_exit();

    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| format!("Failed to serialize boot outcome: {}", e))?;
    println!("{}", json);
    Ok(())
}
