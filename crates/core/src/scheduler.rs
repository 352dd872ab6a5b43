use crate::classifier::Classifier;
use crate::device_api::DeviceApi;
use crate::session_state::{GuessSession, SessionError, TickReport};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// 10 Hz.
pub const DEFAULT_FRAME_PERIOD: Duration = Duration::from_millis(100);

/// Keeps the loop close to a fixed period by sleeping out whatever time the
/// tick's work left over. A tick that overruns is followed immediately by the
/// next one; there is no catch-up and no backlog.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    period: Duration,
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_PERIOD)
    }
}

impl Pacer {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// `max(0, period - elapsed)`.
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.period.saturating_sub(elapsed)
    }

    /// Sleeps until one period has passed since `started`.
    pub async fn pace(&self, started: Instant) {
        let remaining = self.remaining(started.elapsed());
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
    }
}

/// Why the loop returned.
#[derive(Debug)]
pub enum LoopExit {
    /// The stop flag was raised, or its sender went away.
    Stopped,
    /// A tick failed in a way the session cannot recover from.
    Faulted(SessionError),
}

/// Runs the capture, infer and react loop until stopped or faulted.
///
/// The stop flag is checked at the top of every tick and raced against the
/// pacing sleep, so a stop request is honoured within one tick. Each report
/// overwrites the previous one in `sink`; a slow renderer only ever sees the
/// latest tick.
pub async fn run_loop<D, C>(
    session: &mut GuessSession,
    device: &D,
    classifier: &C,
    pacer: &Pacer,
    mut stop: watch::Receiver<bool>,
    sink: watch::Sender<Option<TickReport>>,
) -> LoopExit
where
    D: DeviceApi + ?Sized,
    C: Classifier + ?Sized,
{
    tracing::info!("Starting loop with a {:?} period", pacer.period());

    loop {
        if *stop.borrow_and_update() {
            tracing::info!("Stop requested, leaving loop.");
            return LoopExit::Stopped;
        }

        let started = Instant::now();
        match session.process_tick(device, classifier).await {
            Ok(report) => {
                tracing::debug!("{}", report.outcome);
                sink.send_replace(Some(report));
            }
            Err(e) => {
                tracing::error!("Tick failed, ending session: {}", e);
                return LoopExit::Faulted(e);
            }
        }

        // A change that leaves the flag down goes back to sleeping out the period.
        loop {
            tokio::select! {
                _ = pacer.pace(started) => break,
                changed = stop.changed() => {
                    if changed.is_err() {
                        tracing::info!("Stop handle dropped, leaving loop.");
                        return LoopExit::Stopped;
                    }
                    if *stop.borrow_and_update() {
                        tracing::info!("Stop requested, leaving loop.");
                        return LoopExit::Stopped;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MockClassifier;
    use crate::device_api::{CaptureFailure, MockDeviceApi};
    use crate::prompts::Prompts;
    use crate::session_state::TickOutcome;
    use crate::types::{CONFIDENCE_THRESHOLD, Frame, Prediction};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // The paused clock can round timer deadlines up to the next millisecond.
    fn assert_close(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual <= expected + Duration::from_millis(2),
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_remaining_sleeps_out_the_period() {
        let pacer = Pacer::default();
        assert_eq!(pacer.remaining(Duration::from_millis(30)), Duration::from_millis(70));
        assert_eq!(pacer.remaining(Duration::ZERO), Duration::from_millis(100));
    }

    #[test]
    fn test_remaining_is_zero_when_work_overruns() {
        let pacer = Pacer::default();
        assert_eq!(pacer.remaining(Duration::from_millis(100)), Duration::ZERO);
        assert_eq!(pacer.remaining(Duration::from_millis(250)), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pace_holds_the_period() {
        let pacer = Pacer::default();
        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(40)).await;
        pacer.pace(started).await;
        assert_close(started.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pace_does_not_sleep_after_overrun() {
        let pacer = Pacer::default();
        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(130)).await;
        pacer.pace(started).await;
        assert_close(started.elapsed(), Duration::from_millis(130));
    }

    async fn connected_session(device: &MockDeviceApi) -> GuessSession {
        let mut session = GuessSession::new(Prompts::default(), CONFIDENCE_THRESHOLD);
        session.connect("10.0.0.2", device).await.unwrap();
        session.start_episode(device).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_raised_stop_flag_skips_ticks() {
        let mut device = MockDeviceApi::new();
        device.expect_check_status().returning(|| true);
        device.expect_speak().returning(|_| true);
        device.expect_capture_frame().never();
        let classifier = MockClassifier::new();
        let mut session = connected_session(&device).await;

        let (_stop_tx, stop_rx) = watch::channel(true);
        let (sink_tx, sink_rx) = watch::channel(None);

        let exit = run_loop(
            &mut session,
            &device,
            &classifier,
            &Pacer::default(),
            stop_rx,
            sink_tx,
        )
        .await;
        assert!(matches!(exit, LoopExit::Stopped));
        assert!(sink_rx.borrow().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_failures_keep_the_loop_running_until_stopped() {
        let captures = Arc::new(AtomicUsize::new(0));
        let counter = captures.clone();

        let mut device = MockDeviceApi::new();
        device.expect_check_status().returning(|| true);
        device.expect_speak().returning(|_| true);
        device.expect_capture_frame().returning(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(CaptureFailure::Status(404))
        });
        let classifier = MockClassifier::new();
        let mut session = connected_session(&device).await;

        let (stop_tx, stop_rx) = watch::channel(false);
        let (sink_tx, sink_rx) = watch::channel(None);

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(350)).await;
            stop_tx.send(true).unwrap();
        });

        let started = Instant::now();
        let exit = run_loop(
            &mut session,
            &device,
            &classifier,
            &Pacer::default(),
            stop_rx,
            sink_tx,
        )
        .await;
        stopper.await.unwrap();

        assert!(matches!(exit, LoopExit::Stopped));
        // ticks at 0, 100, 200 and 300 ms; the stop lands during the fourth sleep
        assert_eq!(captures.load(Ordering::SeqCst), 4);
        assert_close(started.elapsed(), Duration::from_millis(350));
        assert_eq!(
            sink_rx.borrow().as_ref().map(|r| r.outcome.clone()),
            Some(TickOutcome::CaptureFailed("HTTP Error 404".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_lowered_flag_update_does_not_cut_the_period_short() {
        let captured_at = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = captured_at.clone();

        let mut device = MockDeviceApi::new();
        device.expect_check_status().returning(|| true);
        device.expect_speak().returning(|_| true);
        device.expect_capture_frame().returning(move || {
            log.lock().unwrap().push(Instant::now());
            Err(CaptureFailure::Status(500))
        });
        let classifier = MockClassifier::new();
        let mut session = connected_session(&device).await;

        let (stop_tx, stop_rx) = watch::channel(false);
        let (sink_tx, _sink_rx) = watch::channel(None);

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            stop_tx.send(false).unwrap();
            tokio::time::sleep(Duration::from_millis(120)).await;
            stop_tx.send(true).unwrap();
        });

        let started = Instant::now();
        let exit = run_loop(
            &mut session,
            &device,
            &classifier,
            &Pacer::default(),
            stop_rx,
            sink_tx,
        )
        .await;
        stopper.await.unwrap();

        assert!(matches!(exit, LoopExit::Stopped));
        let captured_at = captured_at.lock().unwrap();
        // ticks at 0 and 100 ms only; the update at 30 ms must not start one
        assert_eq!(captured_at.len(), 2);
        assert_close(captured_at[1] - started, Duration::from_millis(100));
        assert_close(started.elapsed(), Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_classifier_error_faults_the_loop() {
        let mut device = MockDeviceApi::new();
        device.expect_check_status().returning(|| true);
        device.expect_speak().returning(|_| true);
        device
            .expect_capture_frame()
            .once()
            .returning(|| Ok(Frame::new(b"garbage".to_vec())));
        let mut classifier = MockClassifier::new();
        classifier
            .expect_classify()
            .once()
            .returning(|_| Err(anyhow::anyhow!("unsupported image format")));
        let mut session = connected_session(&device).await;

        let (_stop_tx, stop_rx) = watch::channel(false);
        let (sink_tx, _sink_rx) = watch::channel(None);

        let exit = run_loop(
            &mut session,
            &device,
            &classifier,
            &Pacer::default(),
            stop_rx,
            sink_tx,
        )
        .await;
        assert!(matches!(exit, LoopExit::Faulted(SessionError::Inference(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_stop_handle_ends_loop() {
        let mut device = MockDeviceApi::new();
        device.expect_check_status().returning(|| true);
        device.expect_speak().returning(|_| true);
        device
            .expect_capture_frame()
            .returning(|| Ok(Frame::new(vec![1, 2, 3])));
        let mut classifier = MockClassifier::new();
        classifier
            .expect_classify()
            .returning(|_| Ok(Prediction::new(0, 0.1)));
        let mut session = connected_session(&device).await;

        let (stop_tx, stop_rx) = watch::channel(false);
        let (sink_tx, sink_rx) = watch::channel(None);
        drop(stop_tx);

        let exit = run_loop(
            &mut session,
            &device,
            &classifier,
            &Pacer::default(),
            stop_rx,
            sink_tx,
        )
        .await;
        assert!(matches!(exit, LoopExit::Stopped));
        assert!(matches!(
            sink_rx.borrow().as_ref().map(|r| &r.outcome),
            Some(TickOutcome::LowConfidence(_))
        ));
    }
}
