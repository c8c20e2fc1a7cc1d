//! The synchronous/asynchronous boundary.
//!
//! This is the only place in the crate where the two concurrency domains
//! cross. A synchronous caller hands over a future; it runs to completion
//! on a dedicated scoped worker thread with its own short-lived
//! current-thread runtime, and the caller blocks on the join. Because the
//! future never touches the caller's executor, this is safe to call from a
//! thread that is itself inside a running runtime — at the cost of parking
//! that thread for the duration.

/// Drive `fut` to completion on a fresh worker thread and return its output.
pub fn run_blocking<F, T>(fut: F) -> T
where
    F: Future<Output = T> + Send,
    T: Send,
{
    std::thread::scope(|scope| {
        let handle = scope.spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("bridge runtime construction failed");
            runtime.block_on(fut)
        });

        match handle.join() {
            Ok(value) => value,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    })
}
