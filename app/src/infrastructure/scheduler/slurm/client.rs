use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use domain::model::entity::job::{Job, JobResources, JobState};
use domain::model::vo::ScriptInfo;
use domain::service::JobScheduler;
use indoc::formatdoc;
use tokio::process::Command;

use super::models::SacctRow;

pub struct SlurmClient {
    base_path: String,
}

impl SlurmClient {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

#[async_trait::async_trait]
impl JobScheduler for SlurmClient {
    fn render_script(&self, info: &ScriptInfo) -> String {
        let work_dir = format!("{}/{}", self.base_path, info.id);
        let gres = match &info.accelerator {
            Some(acc) => format!("#SBATCH --gres={}:{}\n", acc.kind, acc.count),
            None => String::new(),
        };
        let setup = match info.setup_lines.is_empty() {
            true => String::new(),
            false => format!("{}\n", info.setup_lines.join("\n")),
        };
        formatdoc! {r#"
            #!/bin/bash
            #SBATCH --job-name={job_name}
            #SBATCH --ntasks={ntasks}
            #SBATCH --cpus-per-task={cpus_per_task}
            #SBATCH --ntasks-per-node={ntasks_per_node}
            #SBATCH --time={time}
            #SBATCH --mem={mem_mb}M
            #SBATCH --partition={partition}
            {gres}#SBATCH --output={work_dir}/STDOUT
            #SBATCH --error={work_dir}/STDERR
            set -e
            cd $SLURM_SUBMIT_DIR
            {setup}srun {command}
        "#,
            job_name = info.job_name,
            ntasks = info.ntasks,
            cpus_per_task = info.cpus_per_task,
            ntasks_per_node = info.ntasks_per_node,
            time = info.time,
            mem_mb = info.mem_mb,
            partition = info.partition,
            command = info.command_line(),
        }
    }

    async fn submit_job_script(&self, info: ScriptInfo) -> anyhow::Result<String> {
        let work_dir = PathBuf::from_iter([self.base_path.as_str(), info.id.as_str()]);
        tokio::fs::create_dir_all(&work_dir).await?;
        let script_path = format!("{}/job.sh", info.id);
        tokio::fs::write(work_dir.join("job.sh"), self.render_script(&info)).await?;
        self.submit_job(&script_path).await
    }

    async fn submit_job(&self, script_path: &str) -> anyhow::Result<String> {
        let mut path = PathBuf::new();
        path.push(self.base_path.as_str());
        path.push(script_path);

        let out = Command::new("sbatch")
            .arg(&path)
            .current_dir(path.parent().context("Script path has no parent")?)
            .output()
            .await?;
        if !out.status.success() {
            anyhow::bail!(
                "Exit status not 0 for sbatch. real: {}, err: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr)
            )
        }
        Ok(String::from_utf8_lossy(&out.stdout)
            .replace("Submitted batch job ", "")
            .trim()
            .to_string())
    }

    async fn get_job(&self, id: &str) -> anyhow::Result<Job> {
        tracing::debug!("Getting job id: {id}");
        let out = Command::new("sacct")
            .args([
                "-PXo",
                "JobID,JobName,User,State,ExitCode,WorkDir,CPUTimeRaw,ElapsedRaw,NCPUS,AveRSS,MaxRSS,NNodes,Start,End",
                "-j",
                id,
            ])
            .output()
            .await?;
        if !out.status.success() {
            anyhow::bail!("Exit status not 0 for sacct. real: {}", out.status)
        }
        // Some site configs quote sacct fields.
        let stdout = out.stdout.iter().cloned().filter(|c| *c != b'\'').collect::<Vec<_>>();
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .quoting(false)
            .from_reader(stdout.as_slice());
        let mut jobs = Vec::<Job>::new();
        for record in csv_reader.deserialize() {
            let row: SacctRow = record?;
            let error_output =
                tokio::fs::read_to_string(format!("{}/STDERR", row.work_dir))
                    .await
                    .unwrap_or_default();
            jobs.push(Job {
                id: Arc::from(row.job_id),
                name: row.job_name,
                owner: row.user,
                state: map_state(&row.state),
                exit_status_code: row.exit_code.split(':').next().unwrap_or("0").parse()?,
                error_output,
                resource_used: JobResources {
                    cpu: row.ncpus,
                    avg_memory: row.avg_mem.unwrap_or(0),
                    max_memory: row.max_mem.unwrap_or(0),
                    wall_time: row.elapsed,
                    cpu_time: row.cpu_time,
                    node: row.nnodes,
                    start_time: parse_time(&row.start),
                    end_time: parse_time(&row.end),
                },
            })
        }
        jobs.into_iter().next().context("No such job id")
    }

    async fn cancel_job(&self, job_id: &str) -> anyhow::Result<()> {
        let out = Command::new("scancel").arg(job_id).output().await?;
        if !out.status.success() {
            anyhow::bail!("Exit status not 0 for scancel. real: {}", out.status)
        }
        Ok(())
    }
}

fn map_state(state: &str) -> JobState {
    match state {
        "BOOT_FAIL" | "FAILED" | "NODE_FAIL" | "OUT_OF_MEMORY" | "TIMEOUT" | "DEADLINE" => {
            JobState::Failed
        }
        // sacct reports "CANCELLED by <uid>" when someone else ran scancel.
        s if s.starts_with("CANCELLED") => JobState::Cancelled,
        "COMPLETED" => JobState::Completed,
        "PENDING" => JobState::Queuing,
        "COMPLETING" => JobState::Completing,
        "RUNNING" => JobState::Running,
        _ => JobState::Unknown,
    }
}

fn parse_time(time: &str) -> i64 {
    if time.eq("UNKNOWN") {
        return 0;
    }
    match chrono::NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S") {
        Ok(x) => x.and_utc().timestamp(),
        Err(_) => 0,
    }
}
