pub mod job;
pub mod spec;

#[rustfmt::skip]
pub use self::{
    job::Job,
    spec::JobSpec,
};
