//! `harbormaster deprovision <project>`

use anyhow::Result;
use clap::Args;

use harbormaster_core::ProjectName;

use super::{build_provisioner, finish, load_settings, runtime};

/// Arguments for `harbormaster deprovision`.
#[derive(Args, Debug)]
pub struct DeprovisionArgs {
    /// Project name whose registry project should be removed.
    pub project: String,

    /// Emit the step report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Exit non-zero when any step failed.
    #[arg(long)]
    pub strict: bool,
}

impl DeprovisionArgs {
    pub fn run(self) -> Result<()> {
        let settings = load_settings()?;
        let provisioner = build_provisioner(&settings)?;

        let name = ProjectName::from(self.project);
        let report = runtime()?.block_on(provisioner.deprovision_project(&name));
        finish(&report, self.json, self.strict)
    }
}
