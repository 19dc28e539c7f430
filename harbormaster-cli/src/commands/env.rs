//! `harbormaster env list <project-id>` and `harbormaster env projects`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use harbormaster_core::{store, EnvVarName, InternalProjectId};

/// Inspect stored credential records.
#[derive(Subcommand, Debug)]
pub enum EnvCommand {
    /// List the records stored for an internal project.
    List(ListArgs),

    /// List internal project ids that have stored records.
    Projects {
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Internal project id.
    pub project_id: u64,

    /// Print secret values instead of masking them.
    #[arg(long)]
    pub show_secrets: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(cmd: EnvCommand) -> Result<()> {
    match cmd {
        EnvCommand::List(args) => list(args),
        EnvCommand::Projects { json } => projects(json),
    }
}

#[derive(Serialize, Tabled)]
struct EnvRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "scope")]
    scope: String,
    #[tabled(rename = "value")]
    value: String,
    #[tabled(rename = "created")]
    created_at: String,
}

fn list(args: ListArgs) -> Result<()> {
    let project = InternalProjectId(args.project_id);
    let records = store::load_env(project)
        .with_context(|| format!("failed to read credential records for project {project}"))?;

    let rows: Vec<EnvRow> = records
        .into_iter()
        .map(|record| {
            let secret = record.variable.name == EnvVarName::InternalRegistryPassword;
            EnvRow {
                name: record.variable.name.to_string(),
                scope: record.variable.scope.to_string(),
                value: if secret && !args.show_secrets {
                    mask(&record.variable.value)
                } else {
                    record.variable.value
                },
                created_at: record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            }
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No credential records for project {project}.");
        println!("Run: harbormaster provision <project> --project-id {project}");
        return Ok(());
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn projects(json: bool) -> Result<()> {
    let ids = store::list_projects().context("failed to list credential store projects")?;
    if json {
        let ids: Vec<u64> = ids.iter().map(|id| id.0).collect();
        println!("{}", serde_json::to_string_pretty(&ids)?);
        return Ok(());
    }
    if ids.is_empty() {
        println!("No projects have stored credential records.");
        return Ok(());
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

fn mask(value: &str) -> String {
    if value.is_empty() {
        "(empty)".to_string()
    } else {
        "********".to_string()
    }
}
