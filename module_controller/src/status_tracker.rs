use std::collections::BTreeMap;
use std::sync::Arc;

use k8s_openapi::api::core::v1::{ContainerStateTerminated, Pod};
use kube::api::{Meta, WatchEvent};
use tokio::sync::Mutex;

use module_definitions::naming::LABEL_MODULE;
use module_definitions::status::{ModuleStatus, RuntimeRecord};

/// Tracks the last known runtime status of every module, built entirely
/// from Pod watch events. Cheap to clone: the map itself lives
/// behind an `Arc<Mutex<..>>` so every watch task shares one tracker.
#[derive(Clone)]
pub struct StatusTracker {
    records: Arc<Mutex<BTreeMap<String, RuntimeRecord>>>,
}

impl Default for StatusTracker {
    fn default() -> Self {
        StatusTracker { records: Arc::new(Mutex::new(BTreeMap::new())) }
    }
}

fn record_from_pod(pod: &Pod) -> Option<RuntimeRecord> {
    let module_name = pod.metadata.labels.as_ref()?.get(LABEL_MODULE)?.clone();
    let status = pod.status.as_ref()?;
    let container_status = status
        .container_statuses
        .as_ref()?
        .iter()
        .find(|cs| cs.name.eq_ignore_ascii_case(&module_name))?;

    let state = container_status.state.as_ref();
    let (status, description) = match state {
        Some(s) if s.running.is_some() => {
            let started = s.running.as_ref().and_then(|r| r.started_at.clone()).map(|t| t.0);
            let description = match started {
                Some(t) => format!("running since {}", t),
                None => "running".to_string(),
            };
            (ModuleStatus::Running, description)
        }
        Some(s) if s.terminated.is_some() => {
            let t = s.terminated.as_ref().unwrap();
            let description = t
                .message
                .clone()
                .or_else(|| t.reason.clone())
                .unwrap_or_else(|| "terminated".to_string());
            (ModuleStatus::Failed, description)
        }
        Some(s) if s.waiting.is_some() => {
            let w = s.waiting.as_ref().unwrap();
            let description = w
                .message
                .clone()
                .or_else(|| w.reason.clone())
                .unwrap_or_else(|| "waiting".to_string());
            (ModuleStatus::Failed, description)
        }
        _ => (ModuleStatus::Unknown, "unknown".to_string()),
    };

    // exitCode/startTime/exitTime come from lastState, not the current state -
    // the current state is only consulted for (status, description) above.
    let last_state = container_status.last_state.as_ref();
    let (exit_code, start_time, exit_time) = match last_state {
        Some(s) if s.terminated.is_some() => {
            let t: &ContainerStateTerminated = s.terminated.as_ref().unwrap();
            (
                Some(t.exit_code),
                t.started_at.clone().map(|d| d.0),
                t.finished_at.clone().map(|d| d.0),
            )
        }
        Some(s) if s.running.is_some() => {
            let started = s.running.as_ref().and_then(|r| r.started_at.clone()).map(|d| d.0);
            (None, started, None)
        }
        _ => (None, None, None),
    };

    Some(RuntimeRecord {
        name: module_name,
        status,
        description,
        exitCode: exit_code,
        startTime: start_time,
        exitTime: exit_time,
        image: Some(container_status.image.clone()),
    })
}

impl StatusTracker {
    pub fn new() -> Self { Self::default() }

    /// Fold one Pod watch event into the tracker. Pods without a `module`
    /// label are not ours and are ignored.
    pub async fn handle_pod_event(&self, event: &WatchEvent<Pod>) {
        match event {
            WatchEvent::Added(pod) | WatchEvent::Modified(pod) => {
                if let Some(record) = record_from_pod(pod) {
                    let mut records = self.records.lock().await;
                    records.insert(record.name.clone(), record);
                } else {
                    debug!("ignoring pod '{}': no module label or no container status yet", Meta::name(pod));
                }
            }
            WatchEvent::Deleted(pod) => {
                if let Some(name) = pod.metadata.labels.as_ref().and_then(|l| l.get(LABEL_MODULE)) {
                    let mut records = self.records.lock().await;
                    records.remove(name);
                }
            }
            WatchEvent::Error(e) => {
                warn!("pod watch error (non-fatal, tracker state retained): {}", e);
            }
        }
    }

    /// A point-in-time snapshot of every tracked module's status.
    pub async fn get_modules(&self) -> Vec<RuntimeRecord> {
        self.records.lock().await.values().cloned().collect()
    }
}
