//! Group reconciliation: make a directory group's membership match a desired
//! identity set, writing only when the two differ.
//!
//! ## Protocol
//!
//! 1. Find the group by handle in the per-pass [`GroupSnapshot`]; create it
//!    when absent (never in dry-run).
//! 2. Read the live member list.
//! 3. Compare as unordered sets → return `Unchanged` when equal.
//! 4. Otherwise replace the whole membership with the desired set.

use std::collections::HashMap;

use serde::Serialize;

use pagersync_core::{GroupHandle, IdentitySet};
use pagersync_providers::{Directory, DirectoryGroup};

use crate::error::{directory_err, SyncError};

// ---------------------------------------------------------------------------
// Group snapshot
// ---------------------------------------------------------------------------

/// Directory groups indexed by lower-cased handle, taken once per pass.
///
/// Never refetched mid-pass; groups created during the pass are recorded so
/// they are not created twice.
#[derive(Debug, Clone, Default)]
pub struct GroupSnapshot {
    by_handle: HashMap<String, DirectoryGroup>,
}

impl GroupSnapshot {
    pub fn new(groups: Vec<DirectoryGroup>) -> Self {
        let mut by_handle = HashMap::with_capacity(groups.len());
        for group in groups {
            by_handle.entry(group.handle.to_lowercase()).or_insert(group);
        }
        Self { by_handle }
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    /// Case-insensitive lookup by handle.
    pub fn find(&self, handle: &str) -> Option<&DirectoryGroup> {
        self.by_handle.get(&handle.to_lowercase())
    }

    fn record(&mut self, group: DirectoryGroup) {
        self.by_handle.insert(group.handle.to_lowercase(), group);
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of reconciling one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Membership already matched; nothing was written.
    Unchanged,
    /// The group was created and/or its membership replaced.
    Updated {
        added: usize,
        removed: usize,
        created: bool,
    },
    /// Dry-run: this is what would have been written.
    WouldUpdate {
        added: usize,
        removed: usize,
        created: bool,
    },
    /// Some stage failed; nothing further was written for this group.
    Failed { reason: String },
}

impl ReconcileOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ReconcileOutcome::Failed { .. })
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Reconciles groups against one directory within a single pass.
pub struct Reconciler<'a, D: Directory + ?Sized> {
    directory: &'a D,
    groups: GroupSnapshot,
    dry_run: bool,
}

impl<'a, D: Directory + ?Sized> Reconciler<'a, D> {
    pub fn new(directory: &'a D, groups: GroupSnapshot, dry_run: bool) -> Self {
        Self {
            directory,
            groups,
            dry_run,
        }
    }

    /// Reconcile `handle` to exactly `desired`, folding errors into
    /// [`ReconcileOutcome::Failed`].
    pub fn reconcile(&mut self, handle: &GroupHandle, desired: &IdentitySet) -> ReconcileOutcome {
        match self.try_reconcile(handle, desired) {
            Ok(outcome) => outcome,
            Err(err) => ReconcileOutcome::Failed {
                reason: err.to_string(),
            },
        }
    }

    /// Same as [`Reconciler::reconcile`] but keeps the typed error.
    pub fn try_reconcile(
        &mut self,
        handle: &GroupHandle,
        desired: &IdentitySet,
    ) -> Result<ReconcileOutcome, SyncError> {
        let (group_id, created) = match self.groups.find(handle.as_str()) {
            Some(group) => (Some(group.id.clone()), false),
            None if self.dry_run => (None, true),
            None => {
                let group = self
                    .directory
                    .create_group(handle.as_str(), handle.as_str())
                    .map_err(directory_err("create group"))?;
                tracing::info!("created slack group {handle} ({})", group.id);
                let id = group.id.clone();
                self.groups.record(group);
                (Some(id), true)
            }
        };

        let current: IdentitySet = match &group_id {
            Some(id) => self
                .directory
                .group_members(id)
                .map_err(directory_err("list group members"))?
                .into_iter()
                .collect(),
            None => IdentitySet::new(),
        };

        let added = desired.difference(&current).count();
        let removed = current.difference(desired).count();

        if current == *desired && !created {
            tracing::info!("slack group {handle} is up to date");
            return Ok(ReconcileOutcome::Unchanged);
        }

        let Some(group_id) = group_id.filter(|_| !self.dry_run) else {
            tracing::info!(
                "[dry-run] slack group {handle} would be updated (+{added} -{removed})"
            );
            return Ok(ReconcileOutcome::WouldUpdate {
                added,
                removed,
                created,
            });
        };

        if current != *desired {
            tracing::info!("slack group {handle} needs updating (+{added} -{removed})");
            self.directory
                .replace_group_members(&group_id, &desired.to_vec())
                .map_err(directory_err("update group members"))?;
        }

        Ok(ReconcileOutcome::Updated {
            added,
            removed,
            created,
        })
    }
}
