use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::detect::{DetectedField, DetectionError, DetectionResult, FormDetector};
use crate::session::{AnalysisRequest, AnalysisTicket};

pub const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(24);

/// Runs `work` on a background thread and hands the result back over a channel.
pub fn spawn_worker_action<T, W>(work: W) -> mpsc::Receiver<T>
where
    T: Send + 'static,
    W: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<T>();
    std::thread::spawn(move || {
        let result = work();
        let _ = tx.send(result);
    });
    rx
}

/// A detection call running off the event loop.
///
/// The ticket travels with the result so the session can drop it if the user
/// has moved on by the time it arrives.
#[derive(Debug)]
pub struct PendingAnalysis {
    ticket: AnalysisTicket,
    rx: mpsc::Receiver<DetectionResult<Vec<DetectedField>>>,
    started_at: Instant,
    timeout: Duration,
}

pub fn spawn_detection(
    detector: Arc<dyn FormDetector>,
    request: AnalysisRequest,
    timeout: Duration,
) -> PendingAnalysis {
    let AnalysisRequest {
        ticket,
        image,
        profile,
    } = request;
    tracing::debug!(epoch = ticket.epoch(), capture_id = image.capture_id(), "spawning detection worker");
    let rx = spawn_worker_action(move || detector.detect(&image, &profile));
    PendingAnalysis {
        ticket,
        rx,
        started_at: Instant::now(),
        timeout,
    }
}

impl PendingAnalysis {
    pub fn ticket(&self) -> AnalysisTicket {
        self.ticket
    }

    /// Non-blocking check, meant to be called every [`RESULT_POLL_INTERVAL`]
    /// from the event loop. Past the timeout the call is reported as failed;
    /// a result arriving afterwards is discarded with the receiver.
    pub fn poll(&self) -> Option<DetectionResult<Vec<DetectedField>>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) if self.started_at.elapsed() >= self.timeout => {
                tracing::warn!(epoch = self.ticket.epoch(), timeout = ?self.timeout, "detection timed out");
                Some(Err(DetectionError::TimedOut {
                    after: self.timeout,
                }))
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(worker_exited())),
        }
    }

    /// Blocks until the detector answers or the timeout elapses.
    pub fn wait(self) -> (AnalysisTicket, DetectionResult<Vec<DetectedField>>) {
        let remaining = self.timeout.saturating_sub(self.started_at.elapsed());
        let result = match self.rx.recv_timeout(remaining) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(epoch = self.ticket.epoch(), timeout = ?self.timeout, "detection timed out");
                Err(DetectionError::TimedOut {
                    after: self.timeout,
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(worker_exited()),
        };
        (self.ticket, result)
    }
}

fn worker_exited() -> DetectionError {
    DetectionError::Failed {
        message: "detection worker exited without a result".to_string(),
    }
}
