// ── Orchestrator ──
//
// One run: snapshot the source once, then take each selected destination
// through two phases. Patterns complete (including the post-write
// re-fetch) before profiles start, because profile references can only
// be translated once the referenced patterns exist at the destination.
//
// Destinations are processed sequentially. Whatever goes wrong inside
// one destination is recorded in its report entry; the run continues.

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{info, info_span, warn, Instrument};

use crate::apply::apply_plan;
use crate::error::CoreError;
use crate::identity::{PatternIdMap, ProfileIdMap};
use crate::model::{Entity, EntityKind, custom_only};
use crate::plan::{Plan, classify};
use crate::remap::ReferenceMaps;
use crate::report::{DestinationReport, KindReport, SyncReport, TenantReport};
use crate::store::EntityStore;
use crate::tenant::{RejectedTenant, Session};

/// How a run should behave.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Classify only; issue no create or update.
    pub dry_run: bool,
    /// Restrict to these destination names. `None` means all.
    pub targets: Option<Vec<String>>,
}

impl RunOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            targets: None,
        }
    }

    pub fn execute() -> Self {
        Self {
            dry_run: false,
            targets: None,
        }
    }

    pub fn with_targets<I, T>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }
}

/// Result of [`Synchronizer::run`].
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// An explicit target filter matched no authenticated destination.
    /// Nothing was fetched or written. Without a filter a run always
    /// completes, even when every destination was rejected.
    NoMatchingDestination { requested: Vec<String> },
}

/// The source's entities, fetched once per run and shared read-only by
/// every destination.
struct SourceSnapshot {
    all_patterns: Vec<Entity>,
    custom_patterns: Vec<Entity>,
    custom_profiles: Vec<Entity>,
}

/// Drives runs over an authenticated [`Session`].
pub struct Synchronizer<S> {
    source: S,
    destinations: Vec<S>,
    rejected: Vec<RejectedTenant>,
}

impl<S: EntityStore> Synchronizer<S> {
    pub fn new(session: Session<S>) -> Self {
        Self {
            source: session.source,
            destinations: session.destinations,
            rejected: session.rejected,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Authenticated destination names, in configuration order.
    pub fn destination_names(&self) -> impl Iterator<Item = &str> {
        self.destinations.iter().map(EntityStore::name)
    }

    pub fn rejected(&self) -> &[RejectedTenant] {
        &self.rejected
    }

    /// Execute one run.
    ///
    /// Fails only when the source cannot be read. Destination and item
    /// failures end up in the report.
    pub async fn run(&self, options: &RunOptions) -> Result<SyncOutcome, CoreError> {
        let selected = self.select(options.targets.as_deref());
        if selected.is_empty() {
            if let Some(requested) = &options.targets {
                warn!(?requested, "no matching destination");
                return Ok(SyncOutcome::NoMatchingDestination {
                    requested: requested.clone(),
                });
            }
            warn!(
                rejected = self.rejected.len(),
                "no authenticated destination"
            );
        }

        let snapshot = self.snapshot_source().await?;

        let mut destinations = IndexMap::with_capacity(selected.len());
        for dest in selected {
            let span = info_span!("destination", tenant = dest.name());
            let entry = match sync_destination(dest, &snapshot, options.dry_run)
                .instrument(span)
                .await
            {
                Ok(report) => DestinationReport::Synced(report),
                Err(e) => {
                    warn!(tenant = dest.name(), error = %e, "destination failed");
                    DestinationReport::Failed {
                        error: e.to_string(),
                    }
                }
            };
            destinations.insert(dest.name().to_owned(), entry);
        }

        let rejected = self
            .rejected
            .iter()
            .filter(|r| is_targeted(options.targets.as_deref(), &r.name))
            .cloned()
            .collect();

        Ok(SyncOutcome::Completed(SyncReport {
            source_name: self.source.name().to_owned(),
            source_patterns: snapshot.custom_patterns.len(),
            source_profiles: snapshot.custom_profiles.len(),
            dry_run: options.dry_run,
            generated_at: Utc::now(),
            rejected,
            destinations,
        }))
    }

    fn select(&self, targets: Option<&[String]>) -> Vec<&S> {
        self.destinations
            .iter()
            .filter(|d| is_targeted(targets, d.name()))
            .collect()
    }

    async fn snapshot_source(&self) -> Result<SourceSnapshot, CoreError> {
        let all_patterns = self.source.list(EntityKind::Pattern, false).await?;
        let custom_patterns = custom_only(EntityKind::Pattern, &all_patterns);
        let custom_profiles = self.source.list(EntityKind::Profile, true).await?;
        info!(
            tenant = self.source.name(),
            patterns = custom_patterns.len(),
            profiles = custom_profiles.len(),
            "source snapshot"
        );
        Ok(SourceSnapshot {
            all_patterns,
            custom_patterns,
            custom_profiles,
        })
    }
}

fn is_targeted(targets: Option<&[String]>, name: &str) -> bool {
    targets.is_none_or(|t| t.iter().any(|n| n == name))
}

async fn sync_destination<S: EntityStore>(
    dest: &S,
    source: &SourceSnapshot,
    dry_run: bool,
) -> Result<TenantReport, CoreError> {
    // ── Phase 1: data patterns ──
    let mut dest_patterns = dest.list(EntityKind::Pattern, false).await?;
    let dest_custom = custom_only(EntityKind::Pattern, &dest_patterns);
    let pattern_plan = classify(
        EntityKind::Pattern,
        &source.custom_patterns,
        &dest_custom,
        ReferenceMaps::none(),
    )?;
    log_plan(dest.name(), &pattern_plan);

    let mut patterns = KindReport::from_plan(&pattern_plan);
    if !dry_run {
        let outcome = apply_plan(dest, &pattern_plan, ReferenceMaps::none()).await;
        patterns = patterns.with_outcome(outcome);
        // Newly created patterns have IDs only the destination knows.
        dest_patterns = dest.list(EntityKind::Pattern, false).await?;
    }

    // ── Phase 2: data profiles ──
    let pattern_map = PatternIdMap::build(&source.all_patterns, &dest_patterns)?;
    let dest_profiles = dest.list(EntityKind::Profile, true).await?;
    let profile_map = ProfileIdMap::build(&source.custom_profiles, &dest_profiles)?;
    info!(
        tenant = dest.name(),
        patterns = pattern_map.len(),
        profiles = profile_map.len(),
        "identity maps built"
    );

    let refs = ReferenceMaps::new(&pattern_map, &profile_map);
    let profile_plan = classify(
        EntityKind::Profile,
        &source.custom_profiles,
        &dest_profiles,
        refs,
    )?;
    log_plan(dest.name(), &profile_plan);

    let mut profiles = KindReport::from_plan(&profile_plan);
    if !dry_run {
        let outcome = apply_plan(dest, &profile_plan, refs).await;
        profiles = profiles.with_outcome(outcome);
    }

    Ok(TenantReport { patterns, profiles })
}

fn log_plan(tenant: &str, plan: &Plan) {
    info!(
        tenant,
        kind = %plan.kind,
        to_create = plan.to_create.len(),
        to_update = plan.to_update.len(),
        identical = plan.identical.len(),
        "classified"
    );
}
