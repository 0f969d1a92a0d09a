use anyhow::Result;

/// The daemon is single-threaded by design: one event loop plus a handful of
/// lightweight producer tasks.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
