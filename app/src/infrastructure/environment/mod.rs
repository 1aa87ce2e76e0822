use domain::model::entity::spec::EnvironmentSetup;
use domain::service::EnvironmentProvider;

/// Environment-modules plus conda activation. The rendered lines run under
/// `set -e`, so a missing module or a failing activation aborts the script
/// before the program is invoked.
pub struct ModuleEnvironment;

impl EnvironmentProvider for ModuleEnvironment {
    fn setup_lines(&self, env: &EnvironmentSetup) -> Vec<String> {
        let mut lines = Vec::with_capacity(env.modules.len() + 2);
        if env.purge {
            lines.push("module purge".to_owned());
        }
        for module in &env.modules {
            lines.push(format!("module load {module}"));
        }
        if let Some(name) = &env.activate {
            // `source activate` works in non-interactive batch shells where
            // `conda activate` needs a shell hook.
            lines.push(format!("source activate {name}"));
        }
        lines
    }
}
