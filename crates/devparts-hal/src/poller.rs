//! Periodic re-read of a setting for live displays
//!
//! The charger limit changes whenever a charger is plugged in or removed, so
//! its screen polls the driver while visible. The poller reads, reports, and
//! only then sleeps for the interval, so polls never overlap however slow the
//! read is. Dropping the poller aborts it; [`SettingPoller::stop`] also waits
//! for an in-flight read to finish.

use crate::codec::SettingValue;
use crate::labels::{Label, LabelProvider};
use crate::setting::{DeviceSetting, SyncOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// What the display should show after one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub label: Label,
    /// Decoded value, `None` when the poll failed
    pub value: Option<SettingValue>,
    /// Preference form to select in the list widget; `None` while no charger is plugged in
    pub selection: Option<String>,
}

impl PollReport {
    fn from_outcome(outcome: &SyncOutcome, labels: &dyn LabelProvider) -> Self {
        match outcome {
            SyncOutcome::Updated(value) => Self {
                label: labels.label(value),
                value: Some(value.clone()),
                selection: value.selection(),
            },
            SyncOutcome::Unchanged(err) => {
                tracing::error!("Unable to poll: {}", err);
                Self {
                    label: labels.poll_error(),
                    value: None,
                    selection: None,
                }
            }
        }
    }
}

pub struct SettingPoller {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SettingPoller {
    /// Start polling `setting` immediately, then `interval` after each completed poll.
    ///
    /// Must be called from within a Tokio runtime. The poller ends on its own
    /// once `reports` has no receiver left.
    pub fn start(
        setting: DeviceSetting,
        interval: Duration,
        labels: Arc<dyn LabelProvider>,
        reports: mpsc::Sender<PollReport>,
    ) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let key = setting.key();

        let handle = tokio::spawn(async move {
            tracing::debug!("Polling {} every {:?}", key, interval);
            let mut setting = setting;

            loop {
                let polled = tokio::task::spawn_blocking(move || {
                    let outcome = setting.refresh();
                    (setting, outcome)
                })
                .await;

                let outcome = match polled {
                    Ok((returned, outcome)) => {
                        setting = returned;
                        outcome
                    }
                    Err(e) => {
                        tracing::error!("Poll of {} panicked: {}", key, e);
                        break;
                    }
                };

                let report = PollReport::from_outcome(&outcome, labels.as_ref());

                tokio::select! {
                    sent = reports.send(report) => {
                        if sent.is_err() {
                            tracing::debug!("Nobody is listening for {}, stopping", key);
                            break;
                        }
                    }
                    _ = &mut stop_rx => break,
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = &mut stop_rx => break,
                }
            }

            tracing::debug!("Stopped polling {}", key);
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop polling and wait until the task has exited
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::error!("Poller task failed: {}", e);
                }
            }
        }
    }
}

impl Drop for SettingPoller {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
