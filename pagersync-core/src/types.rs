//! Domain types shared by every pagersync crate.
//!
//! Identifiers coming from PagerDuty and Slack are kept as strongly-typed
//! newtypes so a roster id can never be passed where a group handle is
//! expected.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a schedule in the on-call roster system (PagerDuty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RosterId(pub String);

impl fmt::Display for RosterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RosterId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RosterId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Team name taken from a schedule declaration; group handles derive from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TeamName(pub String);

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TeamName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TeamName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Handle of a user group in the directory (Slack), e.g. `current-oncall-platform`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupHandle(pub String);

impl GroupHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for GroupHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GroupHandle {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which of the two reconciliations is being run for a sync unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Whoever is on call right now.
    CurrentMember,
    /// Everyone on call at some point inside the lookahead window.
    AllMembers,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::CurrentMember => write!(f, "current"),
            SyncMode::AllMembers => write!(f, "all"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sync unit
// ---------------------------------------------------------------------------

/// One or more roster schedules feeding exactly one pair of output groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncUnit {
    pub roster_ids: Vec<RosterId>,
    pub all_members_group: GroupHandle,
    pub current_member_group: GroupHandle,
    pub sync_all_members: bool,
    pub sync_current_member: bool,
}

impl SyncUnit {
    /// Modes enabled for this unit, in the order they are reconciled.
    pub fn enabled_modes(&self) -> Vec<SyncMode> {
        let mut modes = Vec::with_capacity(2);
        if self.sync_current_member {
            modes.push(SyncMode::CurrentMember);
        }
        if self.sync_all_members {
            modes.push(SyncMode::AllMembers);
        }
        modes
    }

    /// Group handle targeted by `mode`.
    pub fn group_for(&self, mode: SyncMode) -> &GroupHandle {
        match mode {
            SyncMode::CurrentMember => &self.current_member_group,
            SyncMode::AllMembers => &self.all_members_group,
        }
    }
}

// ---------------------------------------------------------------------------
// Email / identity sets
// ---------------------------------------------------------------------------

/// Deduplicated contact emails in discovery order.
///
/// Duplicates are detected by exact string equality; case-insensitive
/// matching only happens later, against directory records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailSet {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl EmailSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `email`, returning `false` when it was already present.
    pub fn insert(&mut self, email: impl Into<String>) -> bool {
        let email = email.into();
        if self.seen.contains(&email) {
            return false;
        }
        self.seen.insert(email.clone());
        self.ordered.push(email);
        true
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for EmailSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = EmailSet::new();
        set.extend(iter);
        set
    }
}

impl<S: Into<String>> Extend<S> for EmailSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for email in iter {
            self.insert(email);
        }
    }
}

/// Deduplicated directory identity handles (Slack user ids).
///
/// Backed by an ordered set so equality is order-independent and the
/// membership written to the directory is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentitySet(BTreeSet<String>);

impl IdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.0.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Ids in `self` that are missing from `other`.
    pub fn difference<'a>(&'a self, other: &'a IdentitySet) -> impl Iterator<Item = &'a str> {
        self.0.difference(&other.0).map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for IdentitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
