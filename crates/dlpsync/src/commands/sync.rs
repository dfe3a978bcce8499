//! The default command: analyse or apply source changes to destinations.

use dlpsync_core::{
    ApiAuthenticator, DestinationReport, RunOptions, SyncOutcome, SyncReport, Synchronizer,
    TenantStore, establish,
};

use crate::cli::{GlobalOpts, SyncArgs, SyncMode};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output::{self, Painter};

pub async fn handle(args: &SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let sync_config = config::load_sync_config(global)?;
    let authenticator = ApiAuthenticator::new(sync_config.api.clone());

    let progress = util::spinner("Authenticating tenants...", global.quiet);
    let session = establish(
        &authenticator,
        &sync_config.source,
        &sync_config.destinations,
    )
    .await;
    progress.finish_and_clear();
    let synchronizer = Synchronizer::new(session?);

    match args.mode() {
        SyncMode::DryRun => {
            let report = run_once(&synchronizer, &RunOptions::dry_run(), global).await?;
            if report.as_ref().is_some_and(SyncReport::has_pending_writes) {
                output::print_note(
                    "Dry run only. Re-run with --execute to apply changes \
                     (--execute --all skips confirmation, --tenant NAME limits the run).",
                    global.quiet,
                );
            }
            Ok(())
        }
        SyncMode::ExecuteAll => {
            run_once(&synchronizer, &RunOptions::execute(), global).await?;
            Ok(())
        }
        SyncMode::Targeted { names, execute } => {
            let options = if execute {
                RunOptions::execute()
            } else {
                RunOptions::dry_run()
            };
            run_once(&synchronizer, &options.with_targets(names), global).await?;
            Ok(())
        }
        SyncMode::Interactive => interactive(&synchronizer, args.yes, global).await,
    }
}

/// Analyse every destination, then execute each one the user confirms.
async fn interactive(
    synchronizer: &Synchronizer<TenantStore>,
    yes: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let Some(preview) = run_once(synchronizer, &RunOptions::dry_run(), global).await? else {
        return Ok(());
    };

    let candidates = execute_candidates(&preview);
    if candidates.is_empty() {
        output::print_note("Every destination is in sync. Nothing to apply.", global.quiet);
        return Ok(());
    }

    for (name, preview_failed) in candidates {
        let prompt = if preview_failed {
            format!("Analysis of '{name}' failed. Attempt to apply changes anyway?")
        } else {
            format!("Apply changes to '{name}'?")
        };
        if !util::confirm(&prompt, yes, &name)? {
            output::print_note(&format!("Skipped {name}."), global.quiet);
            continue;
        }
        let options = RunOptions::execute().with_targets([name]);
        run_once(synchronizer, &options, global).await?;
    }
    Ok(())
}

/// Run once and print the report. `None` when the target filter
/// matched nothing.
async fn run_once(
    synchronizer: &Synchronizer<TenantStore>,
    options: &RunOptions,
    global: &GlobalOpts,
) -> Result<Option<SyncReport>, CliError> {
    let verb = if options.dry_run { "Analysing" } else { "Applying to" };
    let progress = util::spinner(
        &format!("{verb} destinations of {}...", synchronizer.source_name()),
        global.quiet,
    );
    let outcome = synchronizer.run(options).await;
    progress.finish_and_clear();

    match outcome? {
        SyncOutcome::Completed(report) => {
            let painter = Painter::new(output::should_color(global.color));
            let rendered = output::render(global.output, &report, |r| {
                output::report_table(r, painter)
            })?;
            output::print_output(&rendered, global.quiet);
            if report.has_failures() {
                output::print_note(
                    "Some destinations or items failed. See the report for details.",
                    global.quiet,
                );
            }
            Ok(Some(report))
        }
        SyncOutcome::NoMatchingDestination { requested } => {
            let available: Vec<&str> = synchronizer
                .destination_names()
                .chain(synchronizer.rejected().iter().map(|r| r.name.as_str()))
                .collect();
            output::print_note(
                &format!(
                    "No matching destination for {}. Configured: {}",
                    requested.join(", "),
                    available.join(", ")
                ),
                global.quiet,
            );
            Ok(None)
        }
    }
}

/// Destinations worth offering for execution, in report order: those
/// with pending writes, and those whose analysis failed (flagged `true`),
/// since a retry may succeed.
fn execute_candidates(preview: &SyncReport) -> Vec<(String, bool)> {
    preview
        .destinations
        .iter()
        .filter_map(|(name, dest)| match dest {
            DestinationReport::Synced(tenant) if tenant.pending_writes() > 0 => {
                Some((name.clone(), false))
            }
            DestinationReport::Synced(_) => None,
            DestinationReport::Failed { .. } => Some((name.clone(), true)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    use dlpsync_core::{KindReport, TenantReport};

    use super::*;

    fn report(destinations: IndexMap<String, DestinationReport>) -> SyncReport {
        SyncReport {
            source_name: "HQ".into(),
            source_patterns: 1,
            source_profiles: 0,
            dry_run: true,
            generated_at: Utc::now(),
            rejected: Vec::new(),
            destinations,
        }
    }

    fn synced(to_create: &[&str]) -> DestinationReport {
        DestinationReport::Synced(TenantReport {
            patterns: KindReport {
                to_create: to_create.iter().map(|s| (*s).to_owned()).collect(),
                ..KindReport::default()
            },
            profiles: KindReport::default(),
        })
    }

    #[test]
    fn candidates_include_pending_and_failed_but_not_in_sync() {
        let mut destinations = IndexMap::new();
        destinations.insert("Prod".to_owned(), synced(&["SSN"]));
        destinations.insert("Lab".to_owned(), synced(&[]));
        destinations.insert(
            "Dev".to_owned(),
            DestinationReport::Failed {
                error: "Failed to list data patterns: HTTP 500".into(),
            },
        );

        let candidates = execute_candidates(&report(destinations));

        assert_eq!(
            candidates,
            vec![("Prod".to_owned(), false), ("Dev".to_owned(), true)]
        );
    }

    #[test]
    fn nothing_to_offer_when_everything_is_in_sync() {
        let mut destinations = IndexMap::new();
        destinations.insert("Prod".to_owned(), synced(&[]));
        assert!(execute_candidates(&report(destinations)).is_empty());
    }
}
