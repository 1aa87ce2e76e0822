use typed_builder::TypedBuilder;

use crate::model::entity::spec::AcceleratorRequest;
use crate::model::vo::WallTime;

/// Everything a scheduler client needs to render and submit one batch
/// script. Built by the launch service from a validated [`JobSpec`];
/// `id` names the per-submission work directory, so a fresh one is minted
/// for every submission.
///
/// [`JobSpec`]: crate::model::entity::JobSpec
#[derive(Debug, Clone, TypedBuilder)]
pub struct ScriptInfo {
    pub id: String,
    pub job_name: String,
    pub ntasks: u32,
    pub cpus_per_task: u32,
    pub ntasks_per_node: u32,
    pub time: WallTime,
    pub mem_mb: u64,
    pub partition: String,
    #[builder(default)]
    pub accelerator: Option<AcceleratorRequest>,
    /// Shell lines run before the program, already in execution order.
    #[builder(default)]
    pub setup_lines: Vec<String>,
    pub program: String,
    #[builder(default)]
    pub arguments: Vec<String>,
}

impl ScriptInfo {
    /// The command line as the invoked program receives it.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.arguments {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}
