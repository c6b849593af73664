//! TTL Cleanup Task
//!
//! Background task that periodically drops expired entries from an
//! in-process engine, so memory is reclaimed even for keys nobody reads again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::Config;
use crate::storage::ExpiryPurge;

/// Spawns a task that purges expired entries every `cleanup_interval_secs`.
///
/// # Arguments
/// * `target` - Engine or adapter to purge
/// * `cleanup_interval_secs` - Interval in seconds between purges
///
/// # Returns
/// A JoinHandle that can be aborted to stop the task.
///
/// # Example
/// ```ignore
/// let adapter = MemoryAdapter::new(1000, Some(300));
/// let cleanup_handle = spawn_cleanup_task(Arc::new(adapter.clone()), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<P>(target: Arc<P>, cleanup_interval_secs: u64) -> JoinHandle<()>
where
    P: ExpiryPurge + ?Sized + 'static,
{
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = target.purge_expired();
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

/// Spawns the cleanup task at the interval set by `KEYED_CACHE_CLEANUP_INTERVAL`.
pub fn spawn_cleanup_task_from_config<P>(target: Arc<P>, config: &Config) -> JoinHandle<()>
where
    P: ExpiryPurge + ?Sized + 'static,
{
    spawn_cleanup_task(target, config.cleanup_interval)
}
