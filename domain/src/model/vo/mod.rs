pub mod script;
pub mod walltime;

#[rustfmt::skip]
pub use self::{
    script::ScriptInfo,
    walltime::WallTime,
};
