use crate::model::entity::Job;
use crate::model::vo::ScriptInfo;

#[async_trait::async_trait]
pub trait JobScheduler {
    /// Render the batch script in this scheduler's directive syntax. Every
    /// declared resource field must appear in the output unchanged.
    fn render_script(&self, info: &ScriptInfo) -> String;

    /// Write the script into a fresh work directory and submit it,
    /// returning the scheduler-assigned job id.
    async fn submit_job_script(&self, info: ScriptInfo) -> anyhow::Result<String>;

    /// Submit an already-written script, path relative to the work base.
    async fn submit_job(&self, script_path: &str) -> anyhow::Result<String>;

    async fn get_job(&self, id: &str) -> anyhow::Result<Job>;

    async fn cancel_job(&self, job_id: &str) -> anyhow::Result<()>;
}
