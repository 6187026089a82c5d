//! Task spawning and execution abstractions.
//!
//! Tasks are plain Tokio tasks. The [`AbortOnDrop`] wrapper ties a background
//! task's lifetime to its owner, which is how timers and forwarders are
//! guaranteed not to outlive the component that spawned them.
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//!
//! async fn example() {
//!     let handle = task::spawn(async { 42 });
//!     let result = handle.await.unwrap();
//!     assert_eq!(result, 42);
//! }
//! ```

pub use tokio::task::{spawn_blocking, yield_now, AbortHandle, JoinError, JoinHandle};

/// Spawns a new asynchronous task on the current Tokio runtime.
///
/// # Panics
///
/// Panics when called outside of a runtime context.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Owns a spawned task and aborts it when dropped.
///
/// ```rust
/// use core_async::task::{spawn, AbortOnDrop};
/// use core_async::time::{sleep, Duration};
///
/// # async fn example() {
/// let guard = AbortOnDrop::new(spawn(async {
///     sleep(Duration::from_secs(60)).await;
/// }));
/// drop(guard); // the sleeping task is cancelled
/// # }
/// ```
#[derive(Debug)]
pub struct AbortOnDrop<T> {
    handle: JoinHandle<T>,
}

impl<T> AbortOnDrop<T> {
    pub fn new(handle: JoinHandle<T>) -> Self {
        Self { handle }
    }

    /// Cancels the task now. Dropping the guard afterwards is harmless.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;
