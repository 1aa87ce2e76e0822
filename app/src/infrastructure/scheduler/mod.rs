pub mod pbs;
pub mod slurm;

use std::sync::Arc;

use domain::service::JobScheduler;

use crate::config::LauncherConfig;

pub fn select(config: &LauncherConfig) -> anyhow::Result<Arc<dyn JobScheduler + Send + Sync>> {
    Ok(match config.scheduler.r#type.as_str() {
        "slurm" => Arc::new(slurm::SlurmClient::new(&config.base_path)),
        "pbs" => Arc::new(pbs::PbsClient::new(&config.base_path)),
        other => anyhow::bail!("Unknown scheduler type: {other}"),
    })
}
