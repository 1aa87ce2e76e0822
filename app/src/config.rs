use std::path::Path;

use domain::model::entity::JobSpec;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LauncherConfig {
    #[serde(default = "Default::default")]
    pub scheduler: SchedulerConfig,

    /// Directory where per-submission work directories are created.
    #[serde(default = "LauncherConfig::default_base_path")]
    pub base_path: String,

    /// Seconds between job state polls while waiting.
    #[serde(default = "LauncherConfig::default_poll_interval")]
    pub poll_interval: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "SchedulerConfig::default_type")]
    pub r#type: String,
}

impl LauncherConfig {
    /// Launcher settings from `launcher.yaml` (or an explicit path), with
    /// `SBX__`-prefixed environment variables taking precedence.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let file = match path {
            Some(p) => config::File::with_name(p),
            None => config::File::with_name("launcher").required(false),
        };
        let config = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("SBX").separator("__"))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn default_base_path() -> String {
        ".".to_owned()
    }

    pub fn default_poll_interval() -> u64 {
        10
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            base_path: Self::default_base_path(),
            poll_interval: Self::default_poll_interval(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            r#type: Self::default_type(),
        }
    }
}

impl SchedulerConfig {
    pub fn default_type() -> String {
        "slurm".to_owned()
    }
}

/// One job file, one submission.
pub fn load_job_spec(path: &Path) -> anyhow::Result<JobSpec> {
    let config = config::Config::builder().add_source(config::File::from(path)).build()?;
    Ok(config.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use config::FileFormat;
    use indoc::indoc;

    use super::*;

    #[test]
    fn job_file_round_trip() {
        let yaml = indoc! {r#"
            resources:
              job_name: dl_lstm_pytorch_DB
              ntasks: 1
              cpus_per_task: 3
              ntasks_per_node: 1
              time: "12:00:00"
              mem_mb: 60000
              partition: gpu_shared_course
              accelerator:
                kind: gpu
                count: 1
            environment:
              modules:
                - "2019"
                - Python/3.6.6-foss-2019b
                - cuDNN/7.6.3-CUDA-10.0.130
                - NCCL/2.4.7-CUDA-10.0.130
              activate: dl
            invocation:
              program: python train.py
              args:
                - name: txt_file
                  value: book.txt
                - name: print_every
                  value: "100"
                - name: dropout_keep_prob
                  value: "0.85"
        "#};
        let spec: JobSpec = config::Config::builder()
            .add_source(config::File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        spec.validate().unwrap();

        assert_eq!(spec.resources.job_name, "dl_lstm_pytorch_DB");
        assert_eq!(spec.resources.mem_mb, 60_000);
        assert_eq!(spec.environment.modules.len(), 4);
        assert_eq!(spec.environment.activate.as_deref(), Some("dl"));
    }

    #[test]
    fn defaults_fill_in() {
        let config: LauncherConfig = config::Config::builder()
            .add_source(config::File::from_str("scheduler:\n  type: pbs", FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.scheduler.r#type, "pbs");
        assert_eq!(config.base_path, ".");
        assert_eq!(config.poll_interval, 10);
    }
}
