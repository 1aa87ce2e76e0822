use crate::model::entity::spec::EnvironmentSetup;

/// Turns the declared environment setup into shell lines for the batch
/// script: purge first, module loads in declared order, activation last.
pub trait EnvironmentProvider {
    fn setup_lines(&self, env: &EnvironmentSetup) -> Vec<String>;
}
