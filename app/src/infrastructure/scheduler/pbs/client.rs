use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use domain::model::entity::job::{Job, JobResources, JobState};
use domain::model::vo::ScriptInfo;
use domain::service::JobScheduler;
use indoc::formatdoc;
use tokio::{fs, process::Command};

use super::models::{PbsJob, PbsJobs};

pub struct PbsClient {
    base_path: String,
}

impl PbsClient {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

#[async_trait::async_trait]
impl JobScheduler for PbsClient {
    fn render_script(&self, info: &ScriptInfo) -> String {
        let work_dir = format!("{}/{}", self.base_path, info.id);
        // Torque-style node spec: tasks spread over ceil(ntasks / per-node)
        // nodes, each reserving the per-node CPU share.
        let nodes = info.ntasks.div_ceil(info.ntasks_per_node);
        let ppn = info.ntasks_per_node * info.cpus_per_task;
        let gpus = match &info.accelerator {
            Some(acc) => format!(":gpus={}", acc.count),
            None => String::new(),
        };
        let setup = match info.setup_lines.is_empty() {
            true => String::new(),
            false => format!("{}\n", info.setup_lines.join("\n")),
        };
        formatdoc! {r#"
            #!/bin/bash
            #PBS -N {job_name}
            #PBS -q {partition}
            #PBS -l nodes={nodes}:ppn={ppn}{gpus}
            #PBS -l walltime={walltime}
            #PBS -l mem={mem_mb}mb
            #PBS -o {work_dir}/STDOUT
            #PBS -e {work_dir}/STDERR
            set -e
            cd $PBS_O_WORKDIR
            {setup}{command}
        "#,
            job_name = info.job_name,
            partition = info.partition,
            walltime = info.time.hms(),
            mem_mb = info.mem_mb,
            command = info.command_line(),
        }
    }

    async fn submit_job_script(&self, info: ScriptInfo) -> anyhow::Result<String> {
        let work_dir = PathBuf::from_iter([self.base_path.as_str(), info.id.as_str()]);
        fs::create_dir_all(&work_dir).await?;
        let script_path = format!("{}/job.sh", info.id);
        fs::write(work_dir.join("job.sh"), self.render_script(&info)).await?;
        self.submit_job(&script_path).await
    }

    async fn submit_job(&self, script_path: &str) -> anyhow::Result<String> {
        let path = PathBuf::from_iter([self.base_path.as_str(), script_path]);
        let out = Command::new("qsub")
            .arg(&path)
            .current_dir(path.parent().context("Script path has no parent")?)
            .output()
            .await?;
        if !out.status.success() {
            anyhow::bail!(
                "Exit status not 0 for qsub. real: {}, err: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr)
            )
        }
        // qsub prints "<seq>.<server>"; the sequence number identifies the job.
        Ok(String::from_utf8_lossy(&out.stdout)
            .split('.')
            .next()
            .context("Id parse error")?
            .trim()
            .to_owned())
    }

    async fn get_job(&self, id: &str) -> anyhow::Result<Job> {
        let out = Command::new("qstat").args(["-xfF", "json", id]).output().await?;
        if !out.status.success() {
            anyhow::bail!("Exit status not 0 for qstat. real: {}", out.status)
        }
        let result: PbsJobs = serde_json::from_slice(&out.stdout)?;
        let (id, item) = result.jobs.into_iter().next().context("No such job id")?;

        let error_output = fs::read_to_string(item.error_path.split_once(':').unwrap_or_default().1)
            .await
            .unwrap_or_default();
        Ok(Job {
            id: Arc::from(id),
            name: item.job_name.clone(),
            owner: item.job_owner.clone(),
            state: map_state(&item),
            exit_status_code: item.exit_status,
            error_output,
            resource_used: JobResources {
                cpu: item.resources_used.ncpus,
                avg_memory: parse_memory(&item.resources_used.mem),
                max_memory: parse_memory(&item.resources_used.mem),
                wall_time: parse_duration(&item.resources_used.walltime),
                cpu_time: parse_duration(&item.resources_used.cput),
                node: item.resource_list.nodect,
                start_time: parse_time(&item.stime),
                end_time: match item.job_state.as_str() {
                    "F" | "E" => parse_time(&item.mtime),
                    _ => 0,
                },
            },
        })
    }

    async fn cancel_job(&self, job_id: &str) -> anyhow::Result<()> {
        let out = Command::new("qdel").args(["-x", job_id]).output().await?;
        if !out.status.success() {
            anyhow::bail!("Exit status not 0 for qdel. real: {}", out.status)
        }
        Ok(())
    }
}

fn map_state(job: &PbsJob) -> JobState {
    // 254 is PBS for "killed while finishing", still a clean run.
    let clean = job.exit_status == 0 || job.exit_status == 254;
    match job.job_state.as_str() {
        "R" => JobState::Running,
        "E" if clean => JobState::Completing,
        "E" => JobState::Failed,
        "F" if clean => JobState::Completed,
        "F" => JobState::Failed,
        "S" | "U" | "H" => JobState::Suspended,
        "Q" => JobState::Queuing,
        _ => JobState::Unknown,
    }
}

fn parse_time(time: &str) -> i64 {
    NaiveDateTime::parse_from_str(time, "%a %b %d %T %Y")
        .ok()
        .and_then(|nt| nt.and_local_timezone(Local).single())
        .map(|t| t.timestamp())
        .unwrap_or_default()
}

fn parse_duration(duration: &str) -> u64 {
    let times = duration.rsplit(':');
    let mut seconds = 0u64;
    for (i, time) in times.enumerate() {
        let time: u64 = time.parse().unwrap_or(0);
        match i as u32 {
            0..=2 => seconds += 60u64.pow(i as u32) * time,
            3 => seconds += 86_400 * time,
            _ => {}
        }
    }
    seconds
}

fn parse_memory(memory: &str) -> u64 {
    let unit = memory.trim_start_matches(char::is_numeric);
    let size = memory.trim_end_matches(char::is_alphabetic).parse().unwrap_or(0u64);
    match unit {
        "b" => size,
        "kb" => size * 1024,
        "mb" => size * 1024 * 1024,
        "gb" => size * 1024 * 1024 * 1024,
        "tb" => size * 1024 * 1024 * 1024 * 1024,
        _ => size * 1024,
    }
}

#[cfg(test)]
mod tests {
    use domain::model::entity::spec::AcceleratorRequest;
    use indoc::indoc;

    use super::*;

    fn info() -> ScriptInfo {
        ScriptInfo::builder()
            .id("run-0001".into())
            .job_name("dl_lstm_pytorch_DB".into())
            .ntasks(1)
            .cpus_per_task(3)
            .ntasks_per_node(1)
            .time("12:00:00".parse().unwrap())
            .mem_mb(60_000)
            .partition("gpu_shared_course".into())
            .accelerator(Some(AcceleratorRequest {
                kind: "gpu".into(),
                count: 1,
            }))
            .setup_lines(vec!["module purge".into(), "source activate dl".into()])
            .program("python train.py".into())
            .arguments(vec!["--txt_file".into(), "book.txt".into()])
            .build()
    }

    #[test]
    fn script_carries_every_directive() {
        let script = PbsClient::new("/scratch/jobs").render_script(&info());
        let expected = indoc! {r#"
            #!/bin/bash
            #PBS -N dl_lstm_pytorch_DB
            #PBS -q gpu_shared_course
            #PBS -l nodes=1:ppn=3:gpus=1
            #PBS -l walltime=12:00:00
            #PBS -l mem=60000mb
            #PBS -o /scratch/jobs/run-0001/STDOUT
            #PBS -e /scratch/jobs/run-0001/STDERR
            set -e
            cd $PBS_O_WORKDIR
            module purge
            source activate dl
            python train.py --txt_file book.txt
        "#};
        assert_eq!(script, expected);
    }

    #[test]
    fn spreads_tasks_over_nodes() {
        let mut info = info();
        info.ntasks = 8;
        info.ntasks_per_node = 4;
        info.cpus_per_task = 2;
        let script = PbsClient::new(".").render_script(&info);
        assert!(script.contains("#PBS -l nodes=2:ppn=8:gpus=1"));
    }

    #[test]
    fn maps_qstat_states() {
        let job = |state: &str, exit: i32| PbsJob {
            job_state: state.into(),
            exit_status: exit,
            ..PbsJob::default()
        };
        assert_eq!(map_state(&job("Q", 0)), JobState::Queuing);
        assert_eq!(map_state(&job("R", 0)), JobState::Running);
        assert_eq!(map_state(&job("F", 0)), JobState::Completed);
        assert_eq!(map_state(&job("F", 254)), JobState::Completed);
        assert_eq!(map_state(&job("F", 1)), JobState::Failed);
        assert_eq!(map_state(&job("H", 0)), JobState::Suspended);
    }

    #[test]
    fn parses_resource_figures() {
        assert_eq!(parse_duration("11:32:10"), 41_530);
        assert_eq!(parse_duration("1:00:00:00"), 86_400);
        assert_eq!(parse_memory("51200kb"), 51_200 * 1024);
        assert_eq!(parse_memory("2gb"), 2 * 1024 * 1024 * 1024);
    }
}
