use chrono::Utc;
use isscore::scheduler::TaskHandle;
use isscore::tracking::{SharedSession, StatusReport};
use std::time::Duration;

/// Prints the status cards every `interval` when no globe can be drawn.
pub fn spawn_console_report(session: SharedSession, interval: Duration) -> TaskHandle {
    TaskHandle::spawn("console-report", move |mut liveness| async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = liveness.cancelled() => break,
                _ = ticker.tick() => {
                    if let Some(report) = render(&session) {
                        println!("{report}\n");
                    }
                }
            }
        }
    })
}

fn render(session: &SharedSession) -> Option<StatusReport> {
    let guard = session.read().ok()?;
    Some(StatusReport::from_session(&guard, Utc::now()))
}
