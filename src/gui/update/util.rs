//! gui/update/util.rs
use iced::futures::channel::oneshot;

/// Run a blocking function on a background thread and await the result.
///
/// Every network call (validity checks, account lookup) and file read goes
/// through here so the update loop never blocks.
pub(crate) async fn spawn_blocking<T>(f: impl FnOnce() -> T + Send + 'static) -> Option<T>
where
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel::<T>();

    std::thread::spawn(move || {
        let _ = tx.send(f());
    });

    match rx.await {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::error!("background worker dropped without returning");
            None
        }
    }
}
