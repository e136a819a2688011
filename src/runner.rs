//! Bounded-pool batch execution for async jobs.
//!
//! Not used by the crawl orchestration itself (that path is two
//! long-lived sessions, not a job fan-out); kept as a general-purpose
//! helper for call sites that scrape many independent targets.

use crate::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;

pub struct TaskRunner {
    max_workers: usize,
}

impl TaskRunner {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    /// Runs all jobs with at most `max_workers` in flight, returning
    /// results in completion order. A job's error surfaces when that
    /// job finishes.
    pub async fn execute<F, Fut, T>(&self, jobs: Vec<F>) -> Result<Vec<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        stream::iter(jobs.into_iter().map(|job| job()))
            .buffer_unordered(self.max_workers)
            .try_collect()
            .await
    }

    /// Same pool bound, but results come back in submission order. A
    /// job's error surfaces when its slot is reached in order.
    pub async fn execute_ordered<F, Fut, T>(&self, jobs: Vec<F>) -> Result<Vec<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        stream::iter(jobs.into_iter().map(|job| job()))
            .buffered(self.max_workers)
            .try_collect()
            .await
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CrawlError;
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use std::time::Duration;

    type Job = Box<dyn FnOnce() -> BoxFuture<'static, Result<u32>>>;

    fn delayed(value: u32, delay_ms: u64) -> Job {
        Box::new(move || {
            async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(value)
            }
            .boxed()
        })
    }

    fn failing(message: &'static str) -> Job {
        Box::new(move || async move { Err(CrawlError::General(message.into())) }.boxed())
    }

    #[tokio::test]
    async fn test_execute_returns_in_completion_order() {
        let runner = TaskRunner::new(4);
        let jobs = vec![delayed(1, 80), delayed(2, 10), delayed(3, 40)];

        let results = runner.execute(jobs).await.unwrap();
        assert_eq!(results, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_execute_ordered_preserves_submission_order() {
        let runner = TaskRunner::new(4);
        let jobs = vec![delayed(1, 80), delayed(2, 10), delayed(3, 40)];

        let results = runner.execute_ordered(jobs).await.unwrap();
        assert_eq!(results, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failing_job_propagates() {
        let runner = TaskRunner::new(2);
        let jobs = vec![delayed(1, 1), failing("job failed"), delayed(3, 1)];

        let result = runner.execute_ordered(jobs).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_zero_workers_clamped_to_one() {
        let runner = TaskRunner::new(0);
        let jobs = vec![delayed(7, 1)];
        assert_eq!(runner.execute(jobs).await.unwrap(), vec![7]);
    }
}
