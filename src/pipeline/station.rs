//! Core stage abstraction and runner for the transcoding pipeline.

use crate::error::Result;
use crate::pipeline::cancel::{CancelToken, send_or_cancel};
use crate::pipeline::error::ErrorReporter;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Input was exhausted and everything was passed on.
    Finished,
    /// Stopped because another stage failed or the consumer went away.
    Cancelled,
    /// Stopped on its own error.
    Failed(String),
}

/// Result of one stage thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: &'static str,
    pub outcome: StageOutcome,
    /// Units successfully handed on (or written, for the writer).
    pub frames: u64,
}

/// A transformer stage in the pipeline.
///
/// Receives one unit, produces one unit. Runs in its own thread between two
/// bounded queues.
pub trait Station: Send + 'static {
    /// The input type this station receives.
    type Input: Send + 'static;
    /// The output type this station produces.
    type Output: Send + 'static;

    /// Processes a single input item. Any error stops the station.
    fn process(&mut self, input: Self::Input) -> Result<Self::Output>;

    /// Returns the name of this station for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Called when the station is shutting down.
    fn shutdown(&mut self) {}
}

/// Handle to one spawned stage thread.
pub struct StageRunner {
    handle: Option<JoinHandle<StageReport>>,
    stage_name: &'static str,
}

impl StageRunner {
    pub(crate) fn from_handle(stage_name: &'static str, handle: JoinHandle<StageReport>) -> Self {
        Self {
            handle: Some(handle),
            stage_name,
        }
    }

    /// Spawns a station between `input_rx` and `output_tx`.
    pub fn spawn_station<S: Station>(
        mut station: S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        cancel: CancelToken,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let stage_name = station.name();
        let handle = thread::spawn(move || {
            run_station(&mut station, input_rx, output_tx, &cancel, error_reporter.as_ref())
        });
        Self::from_handle(stage_name, handle)
    }

    /// Waits for the stage thread to complete.
    ///
    /// A panicked stage is reported as failed.
    pub fn join(mut self) -> StageReport {
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(report)) => report,
            Some(Err(_)) => StageReport {
                stage: self.stage_name,
                outcome: StageOutcome::Failed(format!(
                    "stage '{}' thread panicked",
                    self.stage_name
                )),
                frames: 0,
            },
            None => StageReport {
                stage: self.stage_name,
                outcome: StageOutcome::Finished,
                frames: 0,
            },
        }
    }

    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        self.stage_name
    }
}

/// Main processing loop for a station.
fn run_station<S: Station>(
    station: &mut S,
    input_rx: Receiver<S::Input>,
    output_tx: Sender<S::Output>,
    cancel: &CancelToken,
    error_reporter: &dyn ErrorReporter,
) -> StageReport {
    let stage = station.name();
    let mut frames = 0;
    let mut outcome = StageOutcome::Finished;

    while let Ok(input) = input_rx.recv() {
        match station.process(input) {
            Ok(output) => {
                if !send_or_cancel(&output_tx, output, cancel) {
                    outcome = StageOutcome::Cancelled;
                    break;
                }
                frames += 1;
            }
            Err(e) => {
                error_reporter.report(stage, &e);
                cancel.cancel();
                outcome = StageOutcome::Failed(e.to_string());
                break;
            }
        }
    }

    station.shutdown();
    tracing::debug!(stage, frames, ?outcome, "station stopped");
    StageReport {
        stage,
        outcome,
        frames,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DcaError;
    use crossbeam_channel::bounded;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Mock station that doubles integers
    struct DoublerStation {
        shutdown_called: Arc<AtomicBool>,
    }

    impl Station for DoublerStation {
        type Input = i32;
        type Output = i32;

        fn process(&mut self, input: Self::Input) -> Result<Self::Output> {
            Ok(input * 2)
        }

        fn name(&self) -> &'static str {
            "doubler"
        }

        fn shutdown(&mut self) {
            self.shutdown_called.store(true, Ordering::SeqCst);
        }
    }

    // Mock station that fails on a given input
    struct FailingStation {
        fail_on: i32,
    }

    impl Station for FailingStation {
        type Input = i32;
        type Output = i32;

        fn process(&mut self, input: Self::Input) -> Result<Self::Output> {
            if input == self.fail_on {
                Err(DcaError::Codec {
                    message: format!("failed on {}", input),
                })
            } else {
                Ok(input)
            }
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    // Mock error reporter that collects errors
    #[derive(Default)]
    struct MockReporter {
        errors: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl ErrorReporter for MockReporter {
        fn report(&self, stage: &str, error: &DcaError) {
            let mut errors = self.errors.lock().unwrap();
            errors.push((stage.to_string(), error.to_string()));
        }
    }

    #[test]
    fn test_station_runner_basic_processing() {
        let (input_tx, input_rx) = bounded(10);
        let (output_tx, output_rx) = bounded(10);
        let shutdown_flag = Arc::new(AtomicBool::new(false));

        let station = DoublerStation {
            shutdown_called: shutdown_flag.clone(),
        };
        let runner = StageRunner::spawn_station(
            station,
            input_rx,
            output_tx,
            CancelToken::new(),
            Arc::new(MockReporter::default()),
        );

        assert_eq!(runner.name(), "doubler");

        input_tx.send(1).unwrap();
        input_tx.send(2).unwrap();
        input_tx.send(3).unwrap();
        drop(input_tx); // Close channel to trigger shutdown

        let outputs: Vec<i32> = output_rx.iter().collect();
        assert_eq!(outputs, vec![2, 4, 6]);

        let report = runner.join();
        assert_eq!(report.outcome, StageOutcome::Finished);
        assert_eq!(report.frames, 3);
        assert!(shutdown_flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_station_error_stops_and_cancels() {
        let (input_tx, input_rx) = bounded(10);
        let (output_tx, output_rx) = bounded(10);
        let reporter = Arc::new(MockReporter::default());
        let errors = reporter.errors.clone();
        let cancel = CancelToken::new();

        let runner = StageRunner::spawn_station(
            FailingStation { fail_on: 2 },
            input_rx,
            output_tx,
            cancel.clone(),
            reporter,
        );

        input_tx.send(1).unwrap();
        input_tx.send(2).unwrap(); // This will fail
        // Never processed; the station may already be gone.
        input_tx.send(3).ok();
        drop(input_tx);

        let outputs: Vec<i32> = output_rx.iter().collect();
        assert_eq!(outputs, vec![1]);

        let report = runner.join();
        assert!(matches!(report.outcome, StageOutcome::Failed(ref msg) if msg.contains("failed on 2")));
        assert!(cancel.is_cancelled());

        let reported = errors.lock().unwrap();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].0, "failing");
    }

    #[test]
    fn test_station_runner_graceful_shutdown() {
        let (input_tx, input_rx) = bounded::<i32>(10);
        let (output_tx, _output_rx) = bounded(10);
        let shutdown_flag = Arc::new(AtomicBool::new(false));

        let station = DoublerStation {
            shutdown_called: shutdown_flag.clone(),
        };
        let runner = StageRunner::spawn_station(
            station,
            input_rx,
            output_tx,
            CancelToken::new(),
            Arc::new(MockReporter::default()),
        );

        // Close input channel immediately
        drop(input_tx);

        assert_eq!(runner.join().outcome, StageOutcome::Finished);
        assert!(shutdown_flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_station_cancelled_while_blocked_on_send() {
        let (input_tx, input_rx) = bounded(10);
        // Nobody drains the output queue, so the second send blocks.
        let (output_tx, _output_rx) = bounded(1);
        let cancel = CancelToken::new();

        let station = DoublerStation {
            shutdown_called: Arc::new(AtomicBool::new(false)),
        };
        let runner = StageRunner::spawn_station(
            station,
            input_rx,
            output_tx,
            cancel.clone(),
            Arc::new(MockReporter::default()),
        );

        input_tx.send(1).unwrap();
        input_tx.send(2).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        cancel.cancel();

        let report = runner.join();
        assert_eq!(report.outcome, StageOutcome::Cancelled);
        assert_eq!(report.frames, 1);
    }

    #[test]
    fn test_station_output_channel_closed() {
        let (input_tx, input_rx) = bounded(10);
        let (output_tx, output_rx) = bounded(10);

        let station = DoublerStation {
            shutdown_called: Arc::new(AtomicBool::new(false)),
        };
        let runner = StageRunner::spawn_station(
            station,
            input_rx,
            output_tx,
            CancelToken::new(),
            Arc::new(MockReporter::default()),
        );

        drop(output_rx);
        input_tx.send(1).unwrap();

        assert_eq!(runner.join().outcome, StageOutcome::Cancelled);
    }
}
