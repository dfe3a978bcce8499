//! Output formatting: table, JSON, YAML.
//!
//! Structured formats serialize the report as-is. Table output is a
//! per-destination summary followed by the planned names, diffs (dry
//! run) and write failures (execute).

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use dlpsync_core::{DestinationReport, KindReport, SyncReport, TenantReport};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Applies colors only when enabled.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn paint(self, text: &str, styled: impl FnOnce(&str) -> String) -> String {
        if self.enabled {
            styled(text)
        } else {
            text.to_owned()
        }
    }

    pub fn good(self, text: &str) -> String {
        self.paint(text, |t| t.green().to_string())
    }

    pub fn change(self, text: &str) -> String {
        self.paint(text, |t| t.yellow().to_string())
    }

    pub fn bad(self, text: &str) -> String {
        self.paint(text, |t| t.red().bold().to_string())
    }

    pub fn heading(self, text: &str) -> String {
        self.paint(text, |t| t.bold().to_string())
    }

    pub fn dim(self, text: &str) -> String {
        self.paint(text, |t| t.dimmed().to_string())
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render `data` in the chosen format; `table` builds the table view.
pub fn render<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
    table: impl FnOnce(&T) -> String,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(table(data)),
        OutputFormat::Json => serde_json::to_string_pretty(data).map_err(|e| render_error("json", &e)),
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(|e| render_error("json", &e)),
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| render_error("yaml", &e)),
    }
}

fn render_error(format: &'static str, err: &dyn std::fmt::Display) -> CliError {
    CliError::Render {
        format,
        message: err.to_string(),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Print a status line to stderr, respecting quiet mode.
pub fn print_note(message: &str, quiet: bool) {
    if quiet {
        return;
    }
    let _ = writeln!(io::stderr().lock(), "{message}");
}

// ── Sync report ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Data patterns")]
    patterns: String,
    #[tabled(rename = "Data profiles")]
    profiles: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct RejectedRow {
    #[tabled(rename = "Tenant")]
    name: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

/// Table view of a sync report.
pub fn report_table(report: &SyncReport, painter: Painter) -> String {
    let mut out = String::new();
    let mode = if report.dry_run { "dry run" } else { "execute" };
    let _ = writeln!(
        out,
        "{} {} ({} custom data patterns, {} custom data profiles) [{}]",
        painter.heading("Source:"),
        report.source_name,
        report.source_patterns,
        report.source_profiles,
        mode,
    );

    let rows: Vec<SummaryRow> = report
        .destinations
        .iter()
        .map(|(name, dest)| summary_row(name, dest, report.dry_run))
        .chain(report.rejected.iter().map(|r| SummaryRow {
            destination: r.name.clone(),
            patterns: "-".into(),
            profiles: "-".into(),
            status: "rejected".into(),
        }))
        .collect();
    if !rows.is_empty() {
        let _ = writeln!(out, "{}", Table::new(rows).with(Style::rounded()));
    }

    for (name, dest) in &report.destinations {
        match dest {
            DestinationReport::Synced(tenant) => {
                write_tenant_details(&mut out, name, tenant, report.dry_run, painter);
            }
            DestinationReport::Failed { error } => {
                let _ = writeln!(out, "\n{}", painter.heading(name));
                let _ = writeln!(out, "  {} {error}", painter.bad("failed:"));
            }
        }
    }

    if !report.rejected.is_empty() {
        let rows: Vec<RejectedRow> = report
            .rejected
            .iter()
            .map(|r| RejectedRow {
                name: r.name.clone(),
                reason: r.reason.clone(),
            })
            .collect();
        let _ = writeln!(out, "\n{}", painter.bad("Authentication failed:"));
        let _ = writeln!(out, "{}", Table::new(rows).with(Style::rounded()));
    }

    out.trim_end().to_owned()
}

fn summary_row(name: &str, dest: &DestinationReport, dry_run: bool) -> SummaryRow {
    match dest {
        DestinationReport::Synced(tenant) => SummaryRow {
            destination: name.to_owned(),
            patterns: kind_cell(&tenant.patterns, dry_run),
            profiles: kind_cell(&tenant.profiles, dry_run),
            status: tenant_status(tenant, dry_run).into(),
        },
        DestinationReport::Failed { .. } => SummaryRow {
            destination: name.to_owned(),
            patterns: "-".into(),
            profiles: "-".into(),
            status: "failed".into(),
        },
    }
}

fn kind_cell(kind: &KindReport, dry_run: bool) -> String {
    let c = kind.counts();
    if dry_run {
        format!(
            "{} new, {} changed, {} same",
            c.to_create, c.to_update, c.identical
        )
    } else {
        let mut cell = format!("{} created, {} updated, {} same", c.created, c.updated, c.identical);
        if c.errors > 0 {
            let _ = write!(cell, ", {} failed", c.errors);
        }
        cell
    }
}

fn tenant_status(tenant: &TenantReport, dry_run: bool) -> &'static str {
    if tenant.has_errors() {
        "partial"
    } else if tenant.pending_writes() == 0 {
        "in sync"
    } else if dry_run {
        "changes pending"
    } else {
        "applied"
    }
}

fn write_tenant_details(
    out: &mut String,
    name: &str,
    tenant: &TenantReport,
    dry_run: bool,
    painter: Painter,
) {
    let sections = [
        ("data patterns", &tenant.patterns),
        ("data profiles", &tenant.profiles),
    ];
    if sections
        .iter()
        .all(|(_, k)| k.to_create.is_empty() && k.to_update.is_empty())
    {
        return;
    }

    let _ = writeln!(out, "\n{}", painter.heading(name));
    for (label, kind) in sections {
        if kind.to_create.is_empty() && kind.to_update.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {label}");
        for entity in &kind.to_create {
            let _ = writeln!(out, "    {} {entity}", painter.good("+"));
        }
        for update in &kind.to_update {
            let _ = writeln!(out, "    {} {}", painter.change("~"), update.name);
            if dry_run {
                for line in update.diff.to_string().lines() {
                    let _ = writeln!(out, "        {}", painter.dim(line));
                }
            }
        }
        if let Some(applied) = &kind.applied {
            for failure in &applied.errors {
                let _ = writeln!(
                    out,
                    "    {} {} {}: {}",
                    painter.bad("!"),
                    failure.operation,
                    failure.name,
                    failure.message
                );
            }
        }
    }
}

// ── Tenants listing ──────────────────────────────────────────────────

/// One configured tenant, as shown by `dlpsync tenants`.
#[derive(Debug, Serialize, Tabled)]
pub struct TenantListing {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Role")]
    pub role: String,
    #[tabled(rename = "Service account")]
    pub service_account: String,
    #[tabled(rename = "TSG ID")]
    pub tsg_id: String,
    #[tabled(rename = "API key")]
    pub key_source: String,
}

pub fn tenants_table(rows: &[TenantListing]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}
