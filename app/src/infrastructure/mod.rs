pub mod environment;
pub mod scheduler;
