//! One reconciliation pass over every sync unit.
//!
//! Users and groups are fetched once at the start of the pass and shared by
//! every unit. Each unit runs its enabled modes in order, current member
//! first; a failure is logged, recorded for that mode only, and the pass
//! moves on.

use std::time::Duration;

use serde::Serialize;

use pagersync_core::{GroupHandle, RosterId, SyncMode, SyncUnit};
use pagersync_providers::{Directory, RosterProvider};

use crate::error::{directory_err, SyncError};
use crate::identity::{identities_for_emails, UserSnapshot};
use crate::reconcile::{GroupSnapshot, ReconcileOutcome, Reconciler};
use crate::roster::{emails_for_unit, CURRENT_HORIZON};

/// Knobs for a single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOptions {
    /// Window used by the all-members mode.
    pub lookahead: Duration,
    pub dry_run: bool,
}

/// Outcome of one mode of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeReport {
    pub group: GroupHandle,
    pub mode: SyncMode,
    pub roster_ids: Vec<RosterId>,
    pub outcome: ReconcileOutcome,
}

/// Everything a pass did, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub dry_run: bool,
    pub reports: Vec<ModeReport>,
}

impl PassReport {
    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, ReconcileOutcome::Unchanged))
    }

    /// Updated, or would have been in a dry run.
    pub fn updated(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                ReconcileOutcome::Updated { .. } | ReconcileOutcome::WouldUpdate { .. }
            )
        })
    }

    pub fn failed(&self) -> usize {
        self.count(ReconcileOutcome::is_failed)
    }

    fn count(&self, pred: impl Fn(&ReconcileOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Reconcile every enabled mode of every unit once.
///
/// Only a failure to take the user or group snapshot fails the pass; every
/// other error is confined to the unit and mode it happened in.
pub fn run_pass<D, R>(
    directory: &D,
    roster: &R,
    units: &[SyncUnit],
    options: PassOptions,
) -> Result<PassReport, SyncError>
where
    D: Directory + ?Sized,
    R: RosterProvider + ?Sized,
{
    tracing::info!("running schedule sync for {} units", units.len());

    let users = UserSnapshot::new(directory.list_users().map_err(directory_err("list users"))?);
    let groups =
        GroupSnapshot::new(directory.list_groups().map_err(directory_err("list groups"))?);
    tracing::debug!(
        "snapshot: {} users with email, {} groups",
        users.len(),
        groups.len()
    );

    let mut reconciler = Reconciler::new(directory, groups, options.dry_run);
    let mut report = PassReport {
        dry_run: options.dry_run,
        reports: Vec::new(),
    };

    for unit in units {
        for mode in unit.enabled_modes() {
            let group = unit.group_for(mode);
            let horizon = match mode {
                SyncMode::CurrentMember => CURRENT_HORIZON,
                SyncMode::AllMembers => options.lookahead,
            };
            tracing::info!("checking slack group: {group}");

            let outcome = match sync_mode(roster, &users, &mut reconciler, unit, group, horizon) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!("failed to sync slack group {group}: {err}");
                    ReconcileOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            };

            report.reports.push(ModeReport {
                group: group.clone(),
                mode,
                roster_ids: unit.roster_ids.clone(),
                outcome,
            });
        }
    }

    tracing::info!(
        "schedule sync finished: {} updated, {} unchanged, {} failed",
        report.updated(),
        report.unchanged(),
        report.failed()
    );
    Ok(report)
}

fn sync_mode<D, R>(
    roster: &R,
    users: &UserSnapshot,
    reconciler: &mut Reconciler<'_, D>,
    unit: &SyncUnit,
    group: &GroupHandle,
    horizon: Duration,
) -> Result<ReconcileOutcome, SyncError>
where
    D: Directory + ?Sized,
    R: RosterProvider + ?Sized,
{
    let emails = emails_for_unit(roster, unit, horizon)?;
    let identities = identities_for_emails(users, &emails)?;
    reconciler.try_reconcile(group, &identities)
}

#[cfg(test)]
mod tests {
    use pagersync_core::{build_sync_units, GroupPrefixes, RosterDeclaration, SyncModes};
    use pagersync_providers::memory::{DirectoryOp, MemoryDirectory, MemoryRoster};

    use super::*;

    fn units(raw: &[&str], modes: SyncModes) -> Vec<SyncUnit> {
        let decls: Vec<RosterDeclaration> =
            raw.iter().map(|r| r.parse().expect("declaration")).collect();
        build_sync_units(&decls, &GroupPrefixes::default(), modes).expect("units")
    }

    fn options() -> PassOptions {
        PassOptions {
            lookahead: Duration::from_secs(7 * 86_400),
            dry_run: false,
        }
    }

    #[test]
    fn snapshot_failure_fails_the_pass() {
        let directory = MemoryDirectory::new();
        directory.fail(DirectoryOp::ListGroups);
        let roster = MemoryRoster::new();

        let err = run_pass(
            &directory,
            &roster,
            &units(&["P1,platform"], SyncModes::default()),
            options(),
        )
        .unwrap_err();
        assert!(
            matches!(err, SyncError::DirectoryApi { operation: "list groups", .. }),
            "got: {err}"
        );
        assert!(roster.queries().is_empty());
    }

    #[test]
    fn modes_use_their_own_horizon() {
        let directory = MemoryDirectory::new().with_user("U1", "jane@example.com");
        let roster = MemoryRoster::new().with_on_call("P1", "jane@example.com");
        let modes = SyncModes {
            current_member: true,
            all_members: true,
        };

        run_pass(&directory, &roster, &units(&["P1,platform"], modes), options()).expect("pass");

        let horizons: Vec<Duration> = roster.queries().into_iter().map(|(_, h)| h).collect();
        assert_eq!(horizons, vec![CURRENT_HORIZON, options().lookahead]);
    }

    #[test]
    fn report_counts_each_outcome() {
        let report = PassReport {
            dry_run: false,
            reports: vec![
                ModeReport {
                    group: GroupHandle::from("a"),
                    mode: SyncMode::CurrentMember,
                    roster_ids: vec![RosterId::from("P1")],
                    outcome: ReconcileOutcome::Unchanged,
                },
                ModeReport {
                    group: GroupHandle::from("b"),
                    mode: SyncMode::CurrentMember,
                    roster_ids: vec![RosterId::from("P2")],
                    outcome: ReconcileOutcome::WouldUpdate {
                        added: 1,
                        removed: 0,
                        created: false,
                    },
                },
                ModeReport {
                    group: GroupHandle::from("c"),
                    mode: SyncMode::AllMembers,
                    roster_ids: vec![RosterId::from("P3")],
                    outcome: ReconcileOutcome::Failed {
                        reason: "boom".to_string(),
                    },
                },
            ],
        };
        assert_eq!(
            (report.unchanged(), report.updated(), report.failed()),
            (1, 1, 1)
        );
    }
}
