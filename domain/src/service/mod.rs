mod environment;
mod job_scheduler;

#[rustfmt::skip]
pub use self::{
    environment::EnvironmentProvider,
    job_scheduler::JobScheduler,
};
