use std::path::PathBuf;

use crate::{Cli, MemoryAmount, OutputFormat};

#[derive(Clone, Debug)]
pub struct Config {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub additional: MemoryAmount,
    pub output: OutputFormat,
}

impl Config {
    pub fn new(
        kubeconfig: Option<PathBuf>,
        context: Option<String>,
        additional: MemoryAmount,
        output: OutputFormat,
    ) -> Self {
        Self {
            kubeconfig,
            context,
            additional,
            output,
        }
    }
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self::new(
            cli.kubeconfig.clone(),
            cli.context.clone(),
            cli.additional.clone(),
            cli.output,
        )
    }
}
