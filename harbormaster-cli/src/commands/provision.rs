//! `harbormaster provision <project> --project-id <id>`

use anyhow::Result;
use clap::Args;

use harbormaster_core::{InternalProjectId, ProjectName};

use super::{build_provisioner, finish, load_settings, runtime};

/// Arguments for `harbormaster provision`.
#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Project name; also the registry namespace name.
    pub project: String,

    /// Internal id of the owning project; credential records are attributed to it.
    #[arg(long = "project-id", short = 'i')]
    pub project_id: u64,

    /// Emit the step report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Exit non-zero when any step failed.
    #[arg(long)]
    pub strict: bool,
}

impl ProvisionArgs {
    pub fn run(self) -> Result<()> {
        let settings = load_settings()?;
        let provisioner = build_provisioner(&settings)?;

        let name = ProjectName::from(self.project);
        let owner = InternalProjectId(self.project_id);
        let report = runtime()?.block_on(provisioner.provision_project(&name, owner));
        finish(&report, self.json, self.strict)
    }
}
