use futures::future::join_all;
use std::future::Future;

/// Drive every future to completion concurrently and return each outcome in
/// input order. One failure never short-circuits the others.
pub async fn settle_all<I>(tasks: I) -> Vec<<I::Item as Future>::Output>
where
    I: IntoIterator,
    I::Item: Future,
{
    join_all(tasks).await
}

/// Aggregate of a settled batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl SettleReport {
    pub fn from_results<'a, T: 'a, E: 'a>(
        results: impl IntoIterator<Item = &'a Result<T, E>>,
    ) -> Self {
        results
            .into_iter()
            .fold(Self::default(), |mut report, result| {
                match result {
                    Ok(_) => report.succeeded += 1,
                    Err(_) => report.failed += 1,
                }
                report
            })
    }

    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_settle_all_keeps_order_and_failures() {
        let tasks = (0..4u64).map(|i| async move {
            tokio::time::sleep(Duration::from_millis(20 - i * 5)).await;
            if i % 2 == 0 {
                Ok(i)
            } else {
                Err(format!("task {} failed", i))
            }
        });

        let results = settle_all(tasks).await;
        assert_eq!(
            results,
            vec![
                Ok(0),
                Err("task 1 failed".to_string()),
                Ok(2),
                Err("task 3 failed".to_string()),
            ]
        );

        let report = SettleReport::from_results(&results);
        assert_eq!(
            report,
            SettleReport {
                succeeded: 2,
                failed: 2
            }
        );
        assert_eq!(report.attempted(), 4);
    }

    #[tokio::test]
    async fn test_settle_all_empty() {
        let results: Vec<Result<(), ()>> =
            settle_all(Vec::<std::future::Ready<Result<(), ()>>>::new()).await;
        assert!(results.is_empty());
        assert_eq!(SettleReport::from_results(&results).attempted(), 0);
    }
}
