//! Environment configuration and sync-unit building.
//!
//! Environment access is confined to [`Settings::from_env`] and
//! [`Credentials::from_env`]; everything else works on already-materialised
//! key/value pairs so it can be tested without touching the process
//! environment.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::duration::parse_duration;
use crate::error::ConfigError;
use crate::types::{GroupHandle, RosterId, SyncUnit, TeamName};

pub const SCHEDULE_KEY_PREFIX: &str = "SCHEDULE_";
pub const PAGERDUTY_TOKEN_KEY: &str = "PAGERDUTY_TOKEN";
pub const SLACK_TOKEN_KEY: &str = "SLACK_TOKEN";
pub const RUN_INTERVAL_KEY: &str = "RUN_INTERVAL_SECONDS";
pub const LOOKAHEAD_KEY: &str = "PAGERDUTY_SCHEDULE_LOOKAHEAD";
pub const SYNC_ALL_KEY: &str = "SYNC_ALL_ONCALL_GROUP";
pub const SYNC_CURRENT_KEY: &str = "SYNC_CURRENT_ONCALL_GROUP";
pub const ALL_PREFIX_KEY: &str = "ALL_ONCALL_GROUP_NAME_PREFIX";
pub const CURRENT_PREFIX_KEY: &str = "CURRENT_ONCALL_GROUP_NAME_PREFIX";

pub const DEFAULT_RUN_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_LOOKAHEAD: Duration = Duration::from_secs(100 * 24 * 60 * 60);
pub const DEFAULT_ALL_PREFIX: &str = "all-oncall-";
pub const DEFAULT_CURRENT_PREFIX: &str = "current-oncall-";

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// A raw `scheduleId,teamName` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterDeclaration {
    pub roster_id: RosterId,
    pub team: TeamName,
}

impl FromStr for RosterDeclaration {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || ConfigError::MalformedDeclaration {
            raw: raw.to_string(),
        };

        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        let [id, team] = fields.as_slice() else {
            return Err(malformed());
        };
        if id.is_empty() || team.is_empty() || !is_path_safe(id) {
            return Err(malformed());
        }

        Ok(Self {
            roster_id: RosterId::from(*id),
            team: TeamName::from(*team),
        })
    }
}

/// Schedule ids are interpolated into request paths, so only characters that
/// need no escaping there are accepted.
fn is_path_safe(id: &str) -> bool {
    id.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Prefixes for the two group-handle families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupPrefixes {
    pub current: String,
    pub all: String,
}

impl Default for GroupPrefixes {
    fn default() -> Self {
        Self {
            current: DEFAULT_CURRENT_PREFIX.to_string(),
            all: DEFAULT_ALL_PREFIX.to_string(),
        }
    }
}

impl GroupPrefixes {
    pub fn current_handle(&self, team: &TeamName) -> GroupHandle {
        GroupHandle(format!("{}{}", self.current, team))
    }

    /// The "all" group is the plural of the team name: a fixed `s` suffix.
    pub fn all_handle(&self, team: &TeamName) -> GroupHandle {
        GroupHandle(format!("{}{}s", self.all, team))
    }
}

/// Which reconciliations run; applied uniformly to every unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncModes {
    pub current_member: bool,
    pub all_members: bool,
}

impl Default for SyncModes {
    fn default() -> Self {
        Self {
            current_member: true,
            all_members: false,
        }
    }
}

/// Merge declarations into sync units keyed by their current-member handle.
///
/// Output order is the order in which each handle was first seen; roster ids
/// inside a unit keep first-seen order too.
pub fn build_sync_units(
    declarations: &[RosterDeclaration],
    prefixes: &GroupPrefixes,
    modes: SyncModes,
) -> Result<Vec<SyncUnit>, ConfigError> {
    if declarations.is_empty() {
        return Err(ConfigError::NoDeclarations);
    }

    let mut units: Vec<SyncUnit> = Vec::new();
    let mut index_by_handle: HashMap<GroupHandle, usize> = HashMap::new();

    for decl in declarations {
        let current = prefixes.current_handle(&decl.team);
        match index_by_handle.get(&current) {
            Some(&idx) => {
                let unit = &mut units[idx];
                if !unit.roster_ids.contains(&decl.roster_id) {
                    unit.roster_ids.push(decl.roster_id.clone());
                }
            }
            None => {
                index_by_handle.insert(current.clone(), units.len());
                units.push(SyncUnit {
                    roster_ids: vec![decl.roster_id.clone()],
                    all_members_group: prefixes.all_handle(&decl.team),
                    current_member_group: current,
                    sync_all_members: modes.all_members,
                    sync_current_member: modes.current_member,
                });
            }
        }
    }

    Ok(units)
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Validated, non-secret configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub declarations: Vec<RosterDeclaration>,
    pub prefixes: GroupPrefixes,
    pub modes: SyncModes,
    pub lookahead: Duration,
    pub run_interval: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build settings from key/value pairs.
    ///
    /// `SCHEDULE_*` entries are processed in ascending key order.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let declarations = vars
            .iter()
            .filter(|(key, _)| key.starts_with(SCHEDULE_KEY_PREFIX))
            .map(|(_, value)| value.parse::<RosterDeclaration>())
            .collect::<Result<Vec<_>, _>>()?;
        if declarations.is_empty() {
            return Err(ConfigError::NoDeclarations);
        }

        let prefixes = GroupPrefixes {
            current: vars
                .get(CURRENT_PREFIX_KEY)
                .cloned()
                .unwrap_or_else(|| DEFAULT_CURRENT_PREFIX.to_string()),
            all: vars
                .get(ALL_PREFIX_KEY)
                .cloned()
                .unwrap_or_else(|| DEFAULT_ALL_PREFIX.to_string()),
        };

        let defaults = SyncModes::default();
        let modes = SyncModes {
            current_member: bool_or_default(&vars, SYNC_CURRENT_KEY, defaults.current_member),
            all_members: bool_or_default(&vars, SYNC_ALL_KEY, defaults.all_members),
        };

        let lookahead = match vars.get(LOOKAHEAD_KEY) {
            Some(raw) => parse_duration(raw)?,
            None => DEFAULT_LOOKAHEAD,
        };

        Ok(Self {
            declarations,
            prefixes,
            modes,
            lookahead,
            run_interval: interval_or_default(&vars),
        })
    }

    pub fn sync_units(&self) -> Result<Vec<SyncUnit>, ConfigError> {
        build_sync_units(&self.declarations, &self.prefixes, self.modes)
    }
}

fn bool_or_default(vars: &BTreeMap<String, String>, key: &str, default: bool) -> bool {
    let Some(raw) = vars.get(key).filter(|v| !v.is_empty()) else {
        return default;
    };
    match raw.as_str() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => true,
        "0" | "f" | "F" | "FALSE" | "false" | "False" => false,
        _ => {
            tracing::warn!("ignoring {key}={raw:?}: not a boolean, using default {default}");
            default
        }
    }
}

fn interval_or_default(vars: &BTreeMap<String, String>) -> Duration {
    let Some(raw) = vars.get(RUN_INTERVAL_KEY).filter(|v| !v.is_empty()) else {
        return DEFAULT_RUN_INTERVAL;
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            tracing::warn!(
                "ignoring {RUN_INTERVAL_KEY}={raw:?}: expected a positive number of seconds, using default {}",
                DEFAULT_RUN_INTERVAL.as_secs()
            );
            DEFAULT_RUN_INTERVAL
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// API tokens, kept apart from [`Settings`] so that they never end up in
/// `Debug` output or plan listings.
#[derive(Clone)]
pub struct Credentials {
    pub pagerduty_token: String,
    pub slack_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("pagerduty_token", &"<redacted>")
            .field("slack_token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let required = |key: &'static str| {
            vars.get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or(ConfigError::MissingVariable { key })
        };

        Ok(Self {
            pagerduty_token: required(PAGERDUTY_TOKEN_KEY)?,
            slack_token: required(SLACK_TOKEN_KEY)?,
        })
    }
}
