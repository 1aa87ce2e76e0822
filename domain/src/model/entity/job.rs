use std::sync::Arc;

use serde::Serialize;

/// A job as the scheduler reports it back.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Arc<str>,
    pub name: String,
    pub owner: String,
    pub state: JobState,
    pub exit_status_code: i32,
    pub error_output: String,
    pub resource_used: JobResources,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum JobState {
    Queuing,
    Running,
    Suspended,
    Completing,
    Completed,
    Cancelled,
    Failed,
    #[default]
    Unknown,
}

impl JobState {
    /// The scheduler will never move the job out of these states.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Resources the job actually consumed, as accounted by the scheduler.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobResources {
    pub cpu: u64,
    pub avg_memory: u64,
    pub max_memory: u64,
    pub wall_time: u64,
    pub cpu_time: u64,
    pub node: u64,
    pub start_time: i64,
    pub end_time: i64,
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.owner == other.owner
            && self.state == other.state
    }
}

impl Default for Job {
    fn default() -> Self {
        Self {
            id: Arc::from(String::default()),
            name: String::default(),
            owner: String::default(),
            state: JobState::default(),
            exit_status_code: 0,
            error_output: String::default(),
            resource_used: JobResources::default(),
        }
    }
}
