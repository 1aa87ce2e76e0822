use std::collections::HashMap;

use serde::Deserialize;

/// `qstat -xfF json` output.
#[derive(Debug, Default, Deserialize)]
pub struct PbsJobs {
    #[serde(rename = "Jobs", default)]
    pub jobs: HashMap<String, PbsJob>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PbsJob {
    #[serde(rename = "Job_Name", default)]
    pub job_name: String,
    #[serde(rename = "Job_Owner", default)]
    pub job_owner: String,
    pub job_state: String,
    #[serde(rename = "Exit_status", default)]
    pub exit_status: i32,
    #[serde(rename = "Error_Path", default)]
    pub error_path: String,
    #[serde(default)]
    pub resources_used: PbsResourcesUsed,
    #[serde(rename = "Resource_List", default)]
    pub resource_list: PbsResourceList,
    #[serde(default)]
    pub stime: String,
    #[serde(default)]
    pub mtime: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PbsResourcesUsed {
    #[serde(default)]
    pub ncpus: u64,
    #[serde(default)]
    pub mem: String,
    #[serde(default)]
    pub walltime: String,
    #[serde(default)]
    pub cput: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PbsResourceList {
    #[serde(default)]
    pub nodect: u64,
}
