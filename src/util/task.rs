use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Run a future, turning a panic into `Err(message)`.
///
/// Spawned tasks wrap their work in this so a panic becomes an event the UI
/// can show instead of a task that silently vanishes.
pub async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future).catch_unwind().await.map_err(|panic| {
        if let Some(s) = panic.downcast_ref::<&'static str>() {
            s.to_string()
        } else if let Some(s) = panic.downcast_ref::<String>() {
            s.clone()
        } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
            e.to_string()
        } else {
            format!("Unknown panic: {:?}", (*panic).type_id())
        }
    })
}
