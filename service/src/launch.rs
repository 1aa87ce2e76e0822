use std::sync::Arc;
use std::time::Duration;

use domain::model::entity::job::{Job, JobState};
use domain::model::entity::JobSpec;
use domain::model::vo::ScriptInfo;
use domain::service::{EnvironmentProvider, JobScheduler};
use uuid::Uuid;

/// Orchestrates one submission: validate the spec, render the environment
/// setup, hand the script to the scheduler, and optionally poll until the
/// job reaches a terminal state. No retries; every failure surfaces as-is.
pub struct LaunchService {
    scheduler: Arc<dyn JobScheduler + Send + Sync>,
    environment: Arc<dyn EnvironmentProvider + Send + Sync>,
    poll_interval: Duration,
}

impl LaunchService {
    pub fn new(
        scheduler: Arc<dyn JobScheduler + Send + Sync>,
        environment: Arc<dyn EnvironmentProvider + Send + Sync>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            scheduler,
            environment,
            poll_interval,
        }
    }

    /// Build the [`ScriptInfo`] for one submission. A fresh id is minted
    /// every time, so resubmitting the same spec never shares state with an
    /// earlier submission.
    pub fn script_info(&self, spec: &JobSpec) -> anyhow::Result<ScriptInfo> {
        spec.validate()?;

        let arguments = spec
            .invocation
            .args
            .iter()
            .flat_map(|a| [format!("--{}", a.name), a.value.clone()])
            .collect();

        Ok(ScriptInfo::builder()
            .id(Uuid::new_v4().to_string())
            .job_name(spec.resources.job_name.clone())
            .ntasks(spec.resources.ntasks)
            .cpus_per_task(spec.resources.cpus_per_task)
            .ntasks_per_node(spec.resources.ntasks_per_node)
            .time(spec.resources.time)
            .mem_mb(spec.resources.mem_mb)
            .partition(spec.resources.partition.clone())
            .accelerator(spec.resources.accelerator.clone())
            .setup_lines(self.environment.setup_lines(&spec.environment))
            .program(spec.invocation.program.clone())
            .arguments(arguments)
            .build())
    }

    /// Render the batch script without submitting it.
    pub fn render(&self, spec: &JobSpec) -> anyhow::Result<String> {
        Ok(self.scheduler.render_script(&self.script_info(spec)?))
    }

    pub async fn submit(&self, spec: &JobSpec) -> anyhow::Result<String> {
        let info = self.script_info(spec)?;
        tracing::info!(job_name = %info.job_name, submission = %info.id, "Submitting job");
        let job_id = self.scheduler.submit_job_script(info).await?;
        tracing::info!(job_id = %job_id, "Job accepted by scheduler");
        Ok(job_id)
    }

    pub async fn status(&self, job_id: &str) -> anyhow::Result<Job> {
        self.scheduler.get_job(job_id).await
    }

    pub async fn cancel(&self, job_id: &str) -> anyhow::Result<()> {
        self.scheduler.cancel_job(job_id).await?;
        tracing::info!(job_id = %job_id, "Job cancelled");
        Ok(())
    }

    /// Poll until the job leaves the scheduler, then hand back the invoked
    /// program's exit code untranslated.
    pub async fn wait(&self, job_id: &str) -> anyhow::Result<i32> {
        loop {
            let job = self.scheduler.get_job(job_id).await?;
            match job.state {
                JobState::Completed => {
                    tracing::info!(job_id = %job_id, "Job completed");
                    return Ok(job.exit_status_code);
                }
                JobState::Cancelled => {
                    tracing::warn!(job_id = %job_id, "Job was cancelled");
                    return Ok(if job.exit_status_code != 0 {
                        job.exit_status_code
                    } else {
                        1
                    });
                }
                JobState::Failed => {
                    tracing::error!(
                        job_id = %job_id,
                        exit = job.exit_status_code,
                        "Job failed\n{}",
                        job.error_output,
                    );
                    // A kill by the scheduler can report exit 0; the launcher
                    // must still exit non-zero.
                    return Ok(if job.exit_status_code != 0 {
                        job.exit_status_code
                    } else {
                        1
                    });
                }
                state => {
                    tracing::debug!(job_id = %job_id, %state, "Job not finished yet");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}
