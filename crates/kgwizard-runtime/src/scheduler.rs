//! Batch scheduler for independent per-file jobs.
//!
//! Jobs are tokio tasks. A panicking job is reported as a failed outcome and
//! never stops the batch. Outcomes come back in input order.

use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use kgwizard_core::{Error, Result};
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::types::{ExecutionMode, JobOutcome};

/// Pool sizes for dynamic execution over `total` files.
///
/// `steps` sizes grow as `round(linspace(start^0.6, max_workers^0.6)^(1/0.6))`
/// (ties to even), each clamped to `[1, max_workers]`. The sequence stops as
/// soon as it covers `total`, trimming its last batch; any remainder is
/// covered by `max_workers`-sized batches, the last one trimmed. The result
/// always sums to `total`.
pub fn generate_pool_sizes(
    total: usize,
    max_workers: usize,
    steps: usize,
    start: usize,
) -> Result<Vec<usize>> {
    ExecutionMode::Dynamic {
        start,
        steps,
        max_workers,
    }
    .validate()?;

    const EXPONENT: f64 = 0.6;
    let lo = (start as f64).powf(EXPONENT);
    let hi = (max_workers as f64).powf(EXPONENT);

    let ramp = (0..steps).map(|i| {
        let x = if steps == 1 {
            lo
        } else {
            lo + (hi - lo) * i as f64 / (steps - 1) as f64
        };
        let size = x.powf(1.0 / EXPONENT).round_ties_even() as usize;
        size.clamp(1, max_workers)
    });

    let mut sizes = Vec::new();
    let mut covered = 0;
    for size in ramp {
        if covered >= total {
            break;
        }
        let size = size.min(total - covered);
        sizes.push(size);
        covered += size;
    }
    while covered < total {
        let size = max_workers.min(total - covered);
        sizes.push(size);
        covered += size;
    }
    Ok(sizes)
}

/// Runs a job over every file according to an [`ExecutionMode`].
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    mode: ExecutionMode,
}

impl Scheduler {
    pub fn new(mode: ExecutionMode) -> Result<Self> {
        mode.validate()?;
        Ok(Self { mode })
    }

    pub async fn run<T, F, Fut>(&self, files: Vec<PathBuf>, job: F) -> Vec<JobOutcome<T>>
    where
        F: Fn(PathBuf) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let job = Arc::new(job);
        info!("Scheduling {} jobs ({:?})", files.len(), self.mode);

        match self.mode {
            ExecutionMode::Sequential => {
                let mut outcomes = Vec::with_capacity(files.len());
                for file in files {
                    outcomes.push(run_one(&job, file).await);
                }
                outcomes
            }
            ExecutionMode::Static { workers } => run_pool(files, workers, &job).await,
            ExecutionMode::Dynamic {
                start,
                steps,
                max_workers,
            } => {
                let sizes = match generate_pool_sizes(files.len(), max_workers, steps, start) {
                    Ok(sizes) => sizes,
                    // Unreachable after `new` validated the mode.
                    Err(e) => return fail_all(files, &e),
                };
                let mut remaining = VecDeque::from(files);
                let mut outcomes = Vec::with_capacity(remaining.len());
                for size in sizes {
                    let batch: Vec<PathBuf> = remaining.drain(..size).collect();
                    info!(
                        "Starting batch with {} workers, {} files left after it",
                        size,
                        remaining.len()
                    );
                    outcomes.extend(run_pool(batch, size, &job).await);
                }
                outcomes
            }
        }
    }
}

/// Run `job` on one file in its own task so a panic stays contained.
async fn run_one<T, F, Fut>(job: &Arc<F>, file: PathBuf) -> JobOutcome<T>
where
    F: Fn(PathBuf) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let result = match tokio::spawn((**job)(file.clone())).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => {
            error!("Job for {} panicked", file.display());
            Err(Error::Internal(format!("job for {} panicked", file.display())))
        }
        Err(e) => Err(Error::Internal(e.to_string())),
    };
    if let Err(e) = &result {
        error!("{}: {}", file.display(), e);
    }
    JobOutcome { file, result }
}

/// `workers` tasks draining a shared queue.
async fn run_pool<T, F, Fut>(files: Vec<PathBuf>, workers: usize, job: &Arc<F>) -> Vec<JobOutcome<T>>
where
    F: Fn(PathBuf) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let total = files.len();
    let queue = Arc::new(Mutex::new(
        files.into_iter().enumerate().collect::<VecDeque<_>>(),
    ));

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers.min(total) {
        let queue = Arc::clone(&queue);
        let job = Arc::clone(job);
        handles.push(tokio::spawn(async move {
            let mut done = Vec::new();
            loop {
                let next = queue.lock().pop_front();
                let Some((index, file)) = next else { break };
                debug!("worker {} takes {}", worker, file.display());
                done.push((index, run_one(&job, file).await));
            }
            done
        }));
    }

    let mut indexed = Vec::with_capacity(total);
    for handle in handles {
        match handle.await {
            Ok(done) => indexed.extend(done),
            Err(e) => error!("Worker task failed: {}", e),
        }
    }
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, outcome)| outcome).collect()
}

fn fail_all<T>(files: Vec<PathBuf>, e: &Error) -> Vec<JobOutcome<T>> {
    files
        .into_iter()
        .map(|file| JobOutcome {
            file,
            result: Err(Error::Config(e.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_pool_sizes_worked_example() {
        let sizes = generate_pool_sizes(47, 10, 5, 1).unwrap();
        assert_eq!(sizes, vec![1, 3, 5, 7, 10, 10, 10, 1]);
        assert_eq!(sizes.iter().sum::<usize>(), 47);
    }

    #[test]
    fn test_pool_sizes_truncate_small_batches() {
        assert_eq!(generate_pool_sizes(10, 30, 5, 1).unwrap(), vec![1, 5, 4]);
        assert_eq!(generate_pool_sizes(1, 30, 5, 1).unwrap(), vec![1]);
        assert!(generate_pool_sizes(0, 30, 5, 1).unwrap().is_empty());
    }

    #[test]
    fn test_pool_sizes_conserve_files() {
        for total in [0, 1, 2, 7, 26, 47, 100, 513] {
            for max_workers in [1, 2, 10, 30] {
                for steps in [1, 2, 5, 20] {
                    for start in [1, 3, 50] {
                        let sizes = generate_pool_sizes(total, max_workers, steps, start).unwrap();
                        assert_eq!(sizes.iter().sum::<usize>(), total);
                        assert!(sizes.iter().all(|&s| s >= 1 && s <= max_workers));
                        if sizes.len() > 1 {
                            let body = &sizes[..sizes.len() - 1];
                            if start <= max_workers {
                                assert!(body.windows(2).all(|w| w[0] <= w[1]), "{:?}", sizes);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_pool_sizes_reject_zero_parameters() {
        assert!(generate_pool_sizes(10, 0, 5, 1).is_err());
        assert!(generate_pool_sizes(10, 30, 0, 1).is_err());
        assert!(generate_pool_sizes(10, 30, 5, 0).is_err());
    }

    fn files(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("f{:02}.json", i))).collect()
    }

    #[tokio::test]
    async fn test_every_mode_runs_every_file_in_order() {
        for mode in [
            ExecutionMode::Sequential,
            ExecutionMode::Static { workers: 3 },
            ExecutionMode::Dynamic { start: 1, steps: 3, max_workers: 4 },
        ] {
            let scheduler = Scheduler::new(mode).unwrap();
            let outcomes = scheduler
                .run(files(11), |file| async move { Ok(file.display().to_string()) })
                .await;
            let names: Vec<String> = outcomes.into_iter().map(|o| o.result.unwrap()).collect();
            let expected: Vec<String> = files(11).iter().map(|f| f.display().to_string()).collect();
            assert_eq!(names, expected, "{:?}", mode);
        }
    }

    #[tokio::test]
    async fn test_static_pool_bounds_concurrency() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::new(ExecutionMode::Static { workers: 2 }).unwrap();

        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));
        let outcomes = scheduler
            .run(files(6), move |_| {
                let (a, p) = (Arc::clone(&a), Arc::clone(&p));
                async move {
                    let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                    p.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    a.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;

        assert_eq!(outcomes.len(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[derive(Default)]
    struct Timeline {
        in_flight: usize,
        /// `(file index, started, in flight after the event)` in event order.
        events: Vec<(usize, bool, usize)>,
    }

    #[tokio::test]
    async fn test_dynamic_batches_fill_their_pool_and_run_one_after_another() {
        let (start, steps, max_workers) = (1, 3, 4);
        let sizes = generate_pool_sizes(11, max_workers, steps, start).unwrap();
        assert!(sizes.len() > 2);

        let timeline = Arc::new(Mutex::new(Timeline::default()));
        let scheduler = Scheduler::new(ExecutionMode::Dynamic {
            start,
            steps,
            max_workers,
        })
        .unwrap();

        let t = Arc::clone(&timeline);
        let outcomes = scheduler
            .run(files(11), move |file| {
                let t = Arc::clone(&t);
                async move {
                    let index: usize = file
                        .to_str()
                        .and_then(|f| f.strip_prefix('f'))
                        .and_then(|f| f.strip_suffix(".json"))
                        .and_then(|n| n.parse().ok())
                        .unwrap();
                    {
                        let mut t = t.lock();
                        t.in_flight += 1;
                        let now = t.in_flight;
                        t.events.push((index, true, now));
                    }
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    let mut t = t.lock();
                    t.in_flight -= 1;
                    let now = t.in_flight;
                    t.events.push((index, false, now));
                    Ok(())
                }
            })
            .await;
        assert!(outcomes.iter().all(JobOutcome::is_ok));

        let mut batch_of = Vec::new();
        for (batch, &size) in sizes.iter().enumerate() {
            batch_of.extend(std::iter::repeat(batch).take(size));
        }

        let timeline = timeline.lock();
        let events = &timeline.events;
        assert_eq!(events.len(), 22);
        for (batch, &size) in sizes.iter().enumerate() {
            let peak = events
                .iter()
                .filter(|(i, started, _)| *started && batch_of[*i] == batch)
                .map(|(_, _, now)| *now)
                .max();
            assert_eq!(peak, Some(size), "batch {} of {:?}", batch, sizes);
        }
        for batch in 1..sizes.len() {
            let previous_end = events
                .iter()
                .rposition(|(i, started, _)| !*started && batch_of[*i] == batch - 1)
                .unwrap();
            let next_start = events
                .iter()
                .position(|(i, started, _)| *started && batch_of[*i] == batch)
                .unwrap();
            assert!(
                previous_end < next_start,
                "batch {} started before batch {} finished",
                batch,
                batch - 1
            );
        }
    }

    #[tokio::test]
    async fn test_failures_and_panics_do_not_stop_the_batch() {
        let scheduler = Scheduler::new(ExecutionMode::Static { workers: 2 }).unwrap();
        let outcomes = scheduler
            .run(files(5), |file| async move {
                match file.to_str() {
                    Some("f01.json") => panic!("boom"),
                    Some("f03.json") => Err(Error::Generation("rate limited".into())),
                    _ => Ok(()),
                }
            })
            .await;

        let ok: Vec<bool> = outcomes.iter().map(JobOutcome::is_ok).collect();
        assert_eq!(ok, vec![true, false, true, false, true]);
        assert!(matches!(outcomes[1].result, Err(Error::Internal(_))));
    }

    #[test]
    fn test_invalid_mode_rejected() {
        assert!(Scheduler::new(ExecutionMode::Static { workers: 0 }).is_err());
    }
}
