use std::future::Future;

use crate::error::{report_unhandled, ClientError};

/// Queues `task` on the page's single event thread.
#[cfg(target_arch = "wasm32")]
pub fn spawn_task<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(task);
}

/// Queues `task` on the current `tokio::task::LocalSet`.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_task<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    tokio::task::spawn_local(task);
}

/// Like `spawn_task`, but a failure ends up in `report_unhandled`.
pub fn spawn_unhandled<F>(task: F)
where
    F: Future<Output = Result<(), ClientError>> + 'static,
{
    spawn_task(async move {
        if let Err(err) = task.await {
            report_unhandled(&err);
        }
    });
}
