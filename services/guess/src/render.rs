use guess_core::TickReport;
use std::path::PathBuf;
use tokio::sync::watch;

pub fn status_line(report: &TickReport) -> String {
    match &report.frame {
        Some(frame) => format!("[frame {} bytes] {}", frame.len(), report.outcome),
        None => format!("[no frame] {}", report.outcome),
    }
}

/// Render sink for the loop's latest-tick mailbox.
///
/// Only the newest report is ever looked at; reports that arrive while a frame
/// is being written are skipped. Returns once the loop drops its sender.
pub async fn run(mut reports: watch::Receiver<Option<TickReport>>, frame_output: Option<PathBuf>) {
    while reports.changed().await.is_ok() {
        let Some(report) = reports.borrow_and_update().clone() else {
            continue;
        };

        tracing::info!("{}", status_line(&report));

        if let (Some(path), Some(frame)) = (&frame_output, &report.frame) {
            if let Err(e) = tokio::fs::write(path, &frame.data).await {
                tracing::warn!("Failed to write frame to {}: {}", path.display(), e);
            }
        }
    }
    tracing::debug!("Render sink closed.");
}
