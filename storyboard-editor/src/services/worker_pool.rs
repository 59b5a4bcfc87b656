//! Bounded strided worker pool
//!
//! `min(max_parallel, len)` workers run cooperatively; worker `w` claims
//! items `w, w + max_parallel, w + 2 * max_parallel, ...` in order.
//! Completion order across workers is unspecified.

use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;

/// Item indices claimed by each worker
pub fn strided_assignments(len: usize, max_parallel: usize) -> Vec<Vec<usize>> {
    let stride = max_parallel.max(1);
    let workers = stride.min(len);
    (0..workers)
        .map(|w| (w..len).step_by(stride).collect())
        .collect()
}

/// Run `work` over every item with strided workers
///
/// Resolves once every worker has drained its slots. Results come back in
/// item order. `max_parallel == 0` is treated as 1.
pub async fn run_strided<T, R, F, Fut>(items: Vec<T>, max_parallel: usize, work: F) -> Vec<R>
where
    T: Clone,
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = R>,
{
    let assignments = strided_assignments(items.len(), max_parallel);
    let items = &items;
    let work = &work;

    let mut workers: FuturesUnordered<_> = assignments
        .into_iter()
        .map(|slots| async move {
            let mut done = Vec::with_capacity(slots.len());
            for idx in slots {
                done.push((idx, work(idx, items[idx].clone()).await));
            }
            done
        })
        .collect();

    let mut results = Vec::with_capacity(items.len());
    while let Some(done) = workers.next().await {
        results.extend(done);
    }
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_strided_assignments() {
        assert_eq!(
            strided_assignments(7, 3),
            vec![vec![0, 3, 6], vec![1, 4], vec![2, 5]]
        );
        assert_eq!(strided_assignments(2, 4), vec![vec![0], vec![1]]);
        assert_eq!(strided_assignments(3, 0), vec![vec![0, 1, 2]]);
        assert!(strided_assignments(0, 3).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_strided_caps_concurrency() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = run_strided((0..7).collect::<Vec<u32>>(), 3, |_, item| {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(100)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                item * 10
            }
        })
        .await;

        assert_eq!(results, vec![0, 10, 20, 30, 40, 50, 60]);
        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }
}
