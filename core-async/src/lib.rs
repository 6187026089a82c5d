//! Runtime abstraction layer for the player core.
//!
//! Every `core-*` crate goes through this crate instead of depending on Tokio
//! directly, so the executor, the clock and the test harness are swapped in
//! one place.
//!
//! # Modules
//!
//! - `task`: Task spawning and join handles
//! - `time`: Sleep, intervals and the runtime-driven `Instant`
//! - `sync`: Channels and cancellation primitives
//! - `runtime`: Blocking entry points used by the attribute macros
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(10)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

// Re-export the async entry-point/test macros so downstream crates never need
// direct Tokio dependencies.
pub use core_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

/// Waits on several branches at once, running the first that completes.
pub use tokio::select;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
