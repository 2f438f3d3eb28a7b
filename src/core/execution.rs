//! Cancellable, progress-reporting execution harness shared by every algorithm.
//!
//! [`ExecutionContext::run_parallel`] splits a slice of work items into
//! contiguous blocks, folds each block on the rayon pool starting from a fresh
//! zero value, and reduces the partial results with a caller-supplied
//! associative combiner. Workers only read shared state; algorithms apply the
//! reduced result on the driving thread once the parallel phase has returned.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::debug;

use crate::core::errors::{MovewiseError, Result};

/// Receives progress updates for a running algorithm.
pub trait ProgressListener: Send + Sync {
    /// Called with the latest fraction in `[0, 1]`
    fn on_progress(&self, algorithm: &str, fraction: f64);
}

impl<F> ProgressListener for F
where
    F: Fn(&str, f64) + Send + Sync,
{
    fn on_progress(&self, algorithm: &str, fraction: f64) {
        self(algorithm, fraction)
    }
}

/// Shared cancellation flag.
///
/// Clones observe the same flag, so a caller keeps one handle and gives
/// another to the engine.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Per-invocation harness: pool handle, cancellation flag, progress.
pub struct ExecutionContext {
    algorithm: String,
    pool: Arc<ThreadPool>,
    token: CancellationToken,
    progress: AtomicU64,
    listener: Option<Arc<dyn ProgressListener>>,
}

impl ExecutionContext {
    /// Create a context for one run of `algorithm`.
    ///
    /// The pool is borrowed by reference count; its lifecycle stays with the owner.
    pub fn new(
        algorithm: impl Into<String>,
        pool: Arc<ThreadPool>,
        token: CancellationToken,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            pool,
            token,
            progress: AtomicU64::new(0f64.to_bits()),
            listener: None,
        }
    }

    /// Attach a progress listener
    pub fn with_progress_listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Name of the algorithm this context serves
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Worker threads available to parallel phases
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Cancellation token observed by this context
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Check the cancellation flag without raising
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Raise the cancellation signal if cancellation was requested.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.token.is_cancelled() {
            Err(MovewiseError::cancelled(&self.algorithm))
        } else {
            Ok(())
        }
    }

    /// Publish a progress fraction.
    ///
    /// Values are clamped to `[0, 1]` but ordering is not enforced.
    pub fn report_progress(&self, fraction: f64) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self.progress.store(fraction.to_bits(), Ordering::Relaxed);
        debug!(algorithm = %self.algorithm, progress = fraction, "progress");
        if let Some(listener) = &self.listener {
            listener.on_progress(&self.algorithm, fraction);
        }
    }

    /// Last reported progress fraction
    pub fn progress(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::Relaxed))
    }

    /// Fold `items` in parallel blocks and reduce the partial results.
    ///
    /// The slice is cut into `min(threads, items.len())` contiguous blocks of
    /// `ceil(len / blocks)` items. Each block folds `accumulate` from a fresh
    /// `zero()`; partial results are reduced in block order with `combine`,
    /// which must be associative and free of side effects. An empty slice
    /// yields `zero()`.
    ///
    /// The cancellation flag is polled before every item. Once it is raised
    /// the remaining work of every block is skipped and the call returns the
    /// cancellation signal; partial results are discarded.
    pub fn run_parallel<T, A, Z, F, C>(
        &self,
        items: &[T],
        zero: Z,
        accumulate: F,
        combine: C,
    ) -> Result<A>
    where
        T: Sync,
        A: Send,
        Z: Fn() -> A + Sync,
        F: Fn(A, &T) -> Result<A> + Sync,
        C: Fn(A, A) -> A,
    {
        self.check_cancelled()?;
        if items.is_empty() {
            return Ok(zero());
        }

        let blocks = self.threads().clamp(1, items.len());
        let block_size = items.len().div_ceil(blocks);

        let partials: Vec<A> = self.pool.install(|| {
            items
                .par_chunks(block_size)
                .map(|block| {
                    block.iter().try_fold(zero(), |acc, item| {
                        self.check_cancelled()?;
                        accumulate(acc, item)
                    })
                })
                .collect::<Result<Vec<A>>>()
        })?;

        // A cancel raised while the last blocks finished still discards them.
        self.check_cancelled()?;

        Ok(partials.into_iter().reduce(combine).unwrap_or_else(zero))
    }

    /// Map every item in parallel, keeping input order.
    pub fn map_parallel<T, R, F>(&self, items: &[T], map: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Sync,
    {
        self.run_parallel(
            items,
            Vec::new,
            |mut acc, item| {
                acc.push(map(item)?);
                Ok(acc)
            },
            |mut left, right| {
                left.extend(right);
                left
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn pool(threads: usize) -> Arc<ThreadPool> {
        Arc::new(
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap(),
        )
    }

    fn context(threads: usize) -> ExecutionContext {
        ExecutionContext::new("test", pool(threads), CancellationToken::new())
    }

    #[test]
    fn test_run_parallel_sums() {
        let ctx = context(4);
        let items: Vec<u64> = (1..=100).collect();
        let total = ctx
            .run_parallel(&items, || 0u64, |acc, x| Ok(acc + x), |a, b| a + b)
            .unwrap();
        assert_eq!(total, 5050);
    }

    #[test]
    fn test_run_parallel_empty_returns_zero() {
        let ctx = context(2);
        let items: Vec<u32> = Vec::new();
        let result = ctx
            .run_parallel(&items, || 42u32, |acc, _| Ok(acc + 1), |a, b| a + b)
            .unwrap();
        assert_eq!(result, 42);
    }

    #[test]
    fn test_blocks_are_contiguous_and_ordered() {
        let ctx = context(3);
        let items: Vec<usize> = (0..10).collect();
        let blocks = ctx
            .run_parallel(
                &items,
                || vec![Vec::new()],
                |mut acc, &x| {
                    acc[0].push(x);
                    Ok(acc)
                },
                |mut a, b| {
                    a.extend(b);
                    a
                },
            )
            .unwrap();
        // ceil(10 / 3) = 4
        assert_eq!(blocks, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]);
    }

    #[test]
    fn test_fewer_items_than_threads() {
        let ctx = context(8);
        let items = vec![1, 2];
        let blocks = ctx
            .run_parallel(&items, || 1usize, |acc, _| Ok(acc), |a, b| a + b)
            .unwrap();
        // one block per item, each starting from its own zero
        assert_eq!(blocks, 2);
    }

    #[test]
    fn test_map_parallel_preserves_order() {
        let ctx = context(4);
        let items: Vec<i32> = (0..37).collect();
        let doubled = ctx.map_parallel(&items, |x| Ok(x * 2)).unwrap();
        assert_eq!(doubled, items.iter().map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_errors_propagate() {
        let ctx = context(2);
        let items = vec![1, 2, 3];
        let err = ctx
            .map_parallel(&items, |&x| {
                if x == 2 {
                    Err(MovewiseError::algorithm("test", "boom"))
                } else {
                    Ok(x)
                }
            })
            .unwrap_err();
        assert!(matches!(err, MovewiseError::Algorithm { .. }));
    }

    #[test]
    fn test_cancelled_before_start() {
        let ctx = context(2);
        ctx.token().cancel();
        let calls = AtomicUsize::new(0);
        let err = ctx
            .map_parallel(&[1, 2, 3], |x| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(*x)
            })
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_during_phase_aborts() {
        let ctx = context(1);
        let items: Vec<usize> = (0..100).collect();
        let seen = AtomicUsize::new(0);
        let err = ctx
            .map_parallel(&items, |&x| {
                seen.fetch_add(1, Ordering::SeqCst);
                if x == 10 {
                    ctx.token().cancel();
                }
                Ok(x)
            })
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(seen.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_progress_is_clamped_and_forwarded() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let ctx = context(1).with_progress_listener(Arc::new(move |alg: &str, f: f64| {
            sink.lock().push((alg.to_string(), f));
        }));

        ctx.report_progress(0.25);
        ctx.report_progress(1.5);
        ctx.report_progress(f64::NAN);

        assert_eq!(ctx.progress(), 0.0);
        let seen = seen.lock();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], ("test".to_string(), 0.25));
        assert_eq!(seen[1].1, 1.0);
    }
}
