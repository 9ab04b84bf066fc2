use chrono::{DateTime, Utc};

/// Coarse runtime status of a module, derived from its container state.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ModuleStatus {
    Running,
    Failed,
    Unknown,
}

/// A snapshot of one module's runtime state, synthesized from Pod watch
/// events. Lifecycle: overwritten on Added/Modified/Error, removed
/// on Deleted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RuntimeRecord {
    pub name: String,
    pub status: ModuleStatus,
    pub description: String,
    #[serde(default)]
    pub exitCode: Option<i32>,
    #[serde(default)]
    pub startTime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exitTime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image: Option<String>,
}
