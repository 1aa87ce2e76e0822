use serde::Deserialize;

use crate::model::vo::WallTime;

/// The static description of one submission: a resource request, the
/// environment setup steps, and the single program invocation. Defined once,
/// consumed once per submission, never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSpec {
    pub resources: ResourceRequest,
    #[serde(default)]
    pub environment: EnvironmentSetup,
    pub invocation: Invocation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRequest {
    pub job_name: String,
    #[serde(default = "ResourceRequest::default_count")]
    pub ntasks: u32,
    #[serde(default = "ResourceRequest::default_count")]
    pub cpus_per_task: u32,
    #[serde(default = "ResourceRequest::default_count")]
    pub ntasks_per_node: u32,
    pub time: WallTime,
    pub mem_mb: u64,
    pub partition: String,
    #[serde(default)]
    pub accelerator: Option<AcceleratorRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcceleratorRequest {
    #[serde(default = "AcceleratorRequest::default_kind")]
    pub kind: String,
    pub count: u32,
}

/// Ordered environment preparation: an optional purge of pre-existing module
/// state, module loads in declared order, then at most one activation.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentSetup {
    #[serde(default = "EnvironmentSetup::default_purge")]
    pub purge: bool,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub activate: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Invocation {
    pub program: String,
    #[serde(default)]
    pub args: Vec<Argument>,
}

/// A named argument passed verbatim to the invoked program as `--name value`.
#[derive(Debug, Clone, Deserialize)]
pub struct Argument {
    pub name: String,
    pub value: String,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSpec {
    #[error("job name is empty")]
    EmptyJobName,
    #[error("partition is empty")]
    EmptyPartition,
    #[error("program path is empty")]
    EmptyProgram,
    #[error("{0} must be at least 1")]
    ZeroCount(&'static str),
    #[error("memory limit must be at least 1 MB")]
    ZeroMemory,
    #[error("accelerator count must be at least 1")]
    ZeroAccelerators,
}

impl JobSpec {
    pub fn validate(&self) -> Result<(), InvalidSpec> {
        let r = &self.resources;
        if r.job_name.is_empty() {
            return Err(InvalidSpec::EmptyJobName);
        }
        if r.partition.is_empty() {
            return Err(InvalidSpec::EmptyPartition);
        }
        if r.ntasks == 0 {
            return Err(InvalidSpec::ZeroCount("ntasks"));
        }
        if r.cpus_per_task == 0 {
            return Err(InvalidSpec::ZeroCount("cpus_per_task"));
        }
        if r.ntasks_per_node == 0 {
            return Err(InvalidSpec::ZeroCount("ntasks_per_node"));
        }
        if r.mem_mb == 0 {
            return Err(InvalidSpec::ZeroMemory);
        }
        if let Some(acc) = &r.accelerator {
            if acc.count == 0 {
                return Err(InvalidSpec::ZeroAccelerators);
            }
        }
        if self.invocation.program.is_empty() {
            return Err(InvalidSpec::EmptyProgram);
        }
        Ok(())
    }
}

impl ResourceRequest {
    fn default_count() -> u32 {
        1
    }
}

impl AcceleratorRequest {
    fn default_kind() -> String {
        "gpu".to_owned()
    }
}

impl EnvironmentSetup {
    fn default_purge() -> bool {
        true
    }
}

impl Default for EnvironmentSetup {
    fn default() -> Self {
        Self {
            purge: Self::default_purge(),
            modules: Vec::new(),
            activate: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn deserialize_full_spec() {
        let s = indoc! {r#"{
            "resources": {
              "job_name": "dl_lstm_pytorch_DB",
              "ntasks": 1,
              "cpus_per_task": 3,
              "time": "12:00:00",
              "mem_mb": 60000,
              "partition": "gpu_shared_course",
              "accelerator": { "count": 1 }
            },
            "environment": {
              "modules": ["2019", "Python/3.6.6-foss-2019b", "cuDNN/7.6.3-CUDA-10.0.130"],
              "activate": "dl"
            },
            "invocation": {
              "program": "python train.py",
              "args": [
                { "name": "txt_file", "value": "book.txt" },
                { "name": "print_every", "value": "100" },
                { "name": "dropout_keep_prob", "value": "0.85" }
              ]
            }
        }"#};
        let spec: JobSpec = serde_json::from_str(s).unwrap();
        spec.validate().unwrap();

        assert_eq!(spec.resources.ntasks_per_node, 1);
        assert_eq!(spec.resources.time.as_secs(), 12 * 3600);
        assert!(spec.environment.purge);
        assert_eq!(spec.resources.accelerator.unwrap().kind, "gpu");
        let args: Vec<_> =
            spec.invocation.args.iter().map(|a| (a.name.as_str(), a.value.as_str())).collect();
        assert_eq!(
            args,
            [
                ("txt_file", "book.txt"),
                ("print_every", "100"),
                ("dropout_keep_prob", "0.85"),
            ]
        );
    }

    #[test]
    fn rejects_zero_counts() {
        let s = indoc! {r#"{
            "resources": {
              "job_name": "j",
              "ntasks": 0,
              "time": "00:10:00",
              "mem_mb": 100,
              "partition": "short"
            },
            "invocation": { "program": "true" }
        }"#};
        let spec: JobSpec = serde_json::from_str(s).unwrap();
        assert_eq!(spec.validate(), Err(InvalidSpec::ZeroCount("ntasks")));
    }

    #[test]
    fn rejects_empty_job_name() {
        let s = indoc! {r#"{
            "resources": {
              "job_name": "",
              "time": "00:10:00",
              "mem_mb": 100,
              "partition": "short"
            },
            "invocation": { "program": "true" }
        }"#};
        let spec: JobSpec = serde_json::from_str(s).unwrap();
        assert_eq!(spec.validate(), Err(InvalidSpec::EmptyJobName));
    }
}
