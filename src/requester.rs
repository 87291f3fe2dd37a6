use crate::capture::record::Record;
use crate::capture::sealed::RequestLog;
use crate::generator::RequestGenerator;
use crate::sender::HttpSender;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Exactly one stop condition is configured per run.
#[derive(Debug, Clone, Copy)]
pub enum StopCondition {
    Requests(u64),
    Deadline(Duration),
}

/// One sender task: generates requests and posts them at its share of
/// the overall rate, logging each exchange until the stop condition or
/// a sealed log ends the loop.
pub struct Requester<R: Rng> {
    pub generator: RequestGenerator<R>,
    pub sender: HttpSender,
    pub log: Arc<RequestLog>,
    pub interval: Duration,
    pub stop: StopCondition,
}

impl<R: Rng> Requester<R> {
    pub async fn run(mut self) {
        let deadline = match self.stop {
            StopCondition::Deadline(after) => Some(Instant::now() + after),
            StopCondition::Requests(_) => None,
        };
        let mut sent: u64 = 0;

        loop {
            match self.stop {
                StopCondition::Requests(budget) if sent >= budget => break,
                StopCondition::Deadline(_) => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        break;
                    }
                }
                _ => {}
            }

            let request = self.generator.next_request();
            let payload = match serde_json::to_vec(&request) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::warn!(%err, "failed to encode bid request");
                    continue;
                }
            };

            let started = Instant::now();
            let record = match self.sender.send(payload).await {
                Ok((status, body)) => Record::new(request, status, body),
                Err(err) => {
                    // A transport failure is still an exchange; status 0
                    // lands it in the error bucket.
                    tracing::warn!(%err, "request failed");
                    Record::new(request, 0, Vec::new())
                }
            };
            if self.log.append(record).is_err() {
                break;
            }
            sent += 1;

            let elapsed = started.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
    }
}

/// Caps the task count so each task carries at least 10 QPS, and splits
/// the overall rate into a per-task send interval.
pub fn plan_tasks(num_tasks: u32, max_qps: u32) -> (u32, Duration) {
    let tasks = num_tasks.min(max_qps / 10).max(1);
    let interval = Duration::from_secs_f64(tasks as f64 / max_qps as f64);
    (tasks, interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_count_is_capped_by_qps() {
        let (tasks, interval) = plan_tasks(20, 50);
        assert_eq!(tasks, 5);
        assert_eq!(interval, Duration::from_millis(100));
    }

    #[test]
    fn at_least_one_task_even_for_tiny_rates() {
        let (tasks, _) = plan_tasks(20, 3);
        assert_eq!(tasks, 1);
    }

    #[test]
    fn interval_splits_the_rate_across_tasks() {
        let (tasks, interval) = plan_tasks(2, 100);
        assert_eq!(tasks, 2);
        assert_eq!(interval, Duration::from_millis(20));
    }
}
