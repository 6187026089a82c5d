//! Runtime utilities that abstract over the underlying async executor.
//!
//! The attribute macros in `core-async-macros` expand to these functions, so
//! tests and binaries never construct a Tokio runtime by hand.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a fresh current-thread runtime.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on: failed to build Tokio runtime")
        .block_on(future)
}

/// Runs the future on a current-thread runtime whose clock starts paused.
///
/// Time only moves when every task is idle, at which point the clock jumps to
/// the next pending timer. Backoff and watchdog tests use this to observe
/// exact delays without sleeping in real time.
pub fn block_on_paused<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .expect("core_async::runtime::block_on_paused: failed to build Tokio runtime")
        .block_on(future)
}
