//! Deferred, memoized computations.
//!
//! [`Lazy`] runs a synchronous producer the first time its value is read.
//! [`AsyncLazy`] does the same for a producer that returns a future; every
//! reader, including concurrent ones, awaits the same in-flight computation.
//!
//! In both flavours the producer runs at most once. Whatever it yields is what
//! every later read observes, so a producer returning `Err` keeps returning
//! that `Err` and is never re-attempted. A synchronous producer that panics
//! poisons the value and later reads panic as well.
//!
//! # Example
//!
//! ```ignore
//! use pacote_networking::lazy::{AsyncLazy, Lazy};
//!
//! let answer = Lazy::new(|| 6 * 7);
//! assert_eq!(*answer.get(), 42);
//!
//! let remote = AsyncLazy::new(|| async { fetch_answer().await });
//! let first = remote.get().await;
//! let second = remote.get().await; // not recomputed
//! ```

use std::fmt;
use std::future::Future;
use std::sync::LazyLock;

use futures_util::future::{BoxFuture, FutureExt, Shared};

type Producer<T> = Box<dyn FnOnce() -> T + Send>;

/// A value computed synchronously on first access.
pub struct Lazy<T> {
    inner: LazyLock<T, Producer<T>>,
}

impl<T> Lazy<T> {
    /// Create a lazy value from a producer. The producer does not run yet.
    pub fn new<F>(producer: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self {
            inner: LazyLock::new(Box::new(producer)),
        }
    }

    /// Get the value, computing it on the first call.
    pub fn get(&self) -> &T {
        LazyLock::force(&self.inner)
    }
}

impl<T> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy").finish_non_exhaustive()
    }
}

/// A value computed by a future on first access.
///
/// The future is created and polled only when [`get`](Self::get) is first
/// awaited. Dropping a `get` call mid-flight does not restart the computation;
/// the next reader resumes the same future.
pub struct AsyncLazy<T> {
    pending: Shared<BoxFuture<'static, T>>,
}

impl<T> AsyncLazy<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an async lazy value from a producer.
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self {
            pending: async move { producer().await }.boxed().shared(),
        }
    }

    /// Create an async lazy value whose result is already known.
    pub fn ready(value: T) -> Self {
        Self {
            pending: futures_util::future::ready(value).boxed().shared(),
        }
    }

    /// Get the value, awaiting the computation if it has not settled yet.
    pub async fn get(&self) -> T {
        self.pending.clone().await
    }

    /// Get the value only if the computation already settled.
    pub fn peek(&self) -> Option<&T> {
        self.pending.peek()
    }

    /// Whether the computation already settled.
    pub fn is_evaluated(&self) -> bool {
        self.peek().is_some()
    }
}

impl<T> fmt::Debug for AsyncLazy<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncLazy")
            .field("value", &self.peek())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_first_get_computes_value() {
        let lazy = Lazy::new(|| 3 + 3);
        assert_eq!(*lazy.get(), 6);
    }

    #[test]
    fn test_subsequent_gets_do_not_recompute() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let lazy = Lazy::new(move || counter.fetch_add(1, Ordering::SeqCst) + 6);

        for _ in 0..10 {
            lazy.get();
        }

        assert_eq!(*lazy.get(), 6);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sync_failure_is_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let lazy: Lazy<Result<u8, String>> = Lazy::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err("boom".to_string())
        });

        assert_eq!(lazy.get(), &Err("boom".to_string()));
        assert_eq!(lazy.get(), &Err("boom".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sync_panic_poisons_value() {
        let lazy: Lazy<u8> = Lazy::new(|| panic!("producer failed"));

        let first = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| *lazy.get()));
        let second = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| *lazy.get()));

        assert!(first.is_err());
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_async_gets_return_memoized_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let lazy = AsyncLazy::new(move || async move { counter.fetch_add(1, Ordering::SeqCst) + 6 });

        assert!(!lazy.is_evaluated());
        for _ in 0..10 {
            lazy.get().await;
        }

        assert_eq!(lazy.get().await, 6);
        assert_eq!(lazy.peek(), Some(&6));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_gets_share_computation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let lazy = AsyncLazy::new(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            "done".to_string()
        });

        let (a, b, c) = tokio::join!(lazy.get(), lazy.get(), lazy.get());

        assert_eq!(a, "done");
        assert_eq!(b, "done");
        assert_eq!(c, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_failure_is_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let lazy: AsyncLazy<Result<u8, String>> = AsyncLazy::new(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err("unreachable host".to_string())
        });

        assert!(lazy.get().await.is_err());
        assert!(lazy.get().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_producer_does_not_run_until_awaited() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let _lazy = AsyncLazy::new(move || async move { counter.fetch_add(1, Ordering::SeqCst) });

        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
