//! Subcommands and the wiring they share.

pub mod deprovision;
pub mod env;
pub mod provision;
pub mod routes;

use anyhow::{Context, Result};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use harbormaster_core::{settings, Settings};
use harbormaster_provision::{
    FileCredentialStore, HarborClient, OperationReport, ProjectLocks, Provisioner,
    ProvisionerConfig, StepStatus,
};

pub(crate) fn load_settings() -> Result<Settings> {
    settings::load().context("failed to load harbormaster settings")
}

pub(crate) fn build_provisioner(
    settings: &Settings,
) -> Result<Provisioner<HarborClient, FileCredentialStore>> {
    let client = HarborClient::new(&settings.harbor).with_context(|| {
        format!("invalid registry API URL '{}'", settings.harbor.base_api_url)
    })?;
    let provisioner = Provisioner::new(
        client,
        FileCredentialStore::from_home_dir().context("failed to open credential store")?,
        ProvisionerConfig::from(settings),
    );
    Ok(if settings.serialize_per_project {
        provisioner.with_project_locks(ProjectLocks::new())
    } else {
        provisioner
    })
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "step")]
    step: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

/// Print `report` and, with `strict`, turn step failures into an error exit.
pub(crate) fn finish(report: &OperationReport, json: bool, strict: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_table(report);
    }
    if strict && !report.succeeded() {
        anyhow::bail!(
            "{} of '{}' had {} failed step(s)",
            report.operation,
            report.project,
            report.failures().count()
        );
    }
    Ok(())
}

fn print_table(report: &OperationReport) {
    let rows: Vec<StepRow> = report
        .steps
        .iter()
        .map(|record| StepRow {
            step: match &record.target {
                Some(target) => format!("{} {}", record.step, target),
                None => record.step.to_string(),
            },
            status: colored_status(record.status),
            detail: record.message.clone().unwrap_or_default(),
        })
        .collect();

    let mark = if report.succeeded() {
        "✓".green()
    } else {
        "!".yellow()
    };
    println!("{mark} {} '{}'", report.operation, report.project);
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn colored_status(status: StepStatus) -> String {
    let label = status.to_string();
    match status {
        StepStatus::Succeeded => label.green().to_string(),
        StepStatus::Tolerated => label.cyan().to_string(),
        StepStatus::Failed => label.red().to_string(),
        StepStatus::Skipped => label.yellow().to_string(),
    }
}
