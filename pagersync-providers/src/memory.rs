//! In-process directory and roster test doubles.
//!
//! Nothing in the production path uses them. They let the engine's tests
//! observe every call and make specific operations fail.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pagersync_core::RosterId;

use crate::directory::{Directory, DirectoryGroup, DirectoryUser};
use crate::error::ProviderError;
use crate::roster::RosterProvider;

/// Directory operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryOp {
    ListUsers,
    ListGroups,
    CreateGroup,
    GroupMembers,
    ReplaceGroupMembers,
}

impl DirectoryOp {
    fn endpoint(self) -> &'static str {
        match self {
            DirectoryOp::ListUsers => "users.list",
            DirectoryOp::ListGroups => "usergroups.list",
            DirectoryOp::CreateGroup => "usergroups.create",
            DirectoryOp::GroupMembers => "usergroups.users.list",
            DirectoryOp::ReplaceGroupMembers => "usergroups.users.update",
        }
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: Vec<DirectoryUser>,
    groups: Vec<DirectoryGroup>,
    members: HashMap<String, Vec<String>>,
    failing: HashSet<DirectoryOp>,
    created: Vec<String>,
    replaces: Vec<(String, Vec<String>)>,
}

/// A directory held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: Mutex<DirectoryState>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, id: &str, email: &str) -> Self {
        self.lock().users.push(DirectoryUser {
            id: id.to_string(),
            email: email.to_string(),
        });
        self
    }

    pub fn with_group(self, id: &str, handle: &str, members: &[&str]) -> Self {
        {
            let mut state = self.lock();
            state.groups.push(DirectoryGroup {
                id: id.to_string(),
                handle: handle.to_string(),
                name: handle.to_string(),
            });
            state
                .members
                .insert(id.to_string(), members.iter().map(|m| m.to_string()).collect());
        }
        self
    }

    /// Make every future call of `op` fail with an API error.
    pub fn fail(&self, op: DirectoryOp) {
        self.lock().failing.insert(op);
    }

    pub fn recover(&self, op: DirectoryOp) {
        self.lock().failing.remove(&op);
    }

    /// Handles of groups created through [`Directory::create_group`].
    pub fn created_groups(&self) -> Vec<String> {
        self.lock().created.clone()
    }

    /// Every membership replace issued, as `(group id, members)`.
    pub fn replaces(&self) -> Vec<(String, Vec<String>)> {
        self.lock().replaces.clone()
    }

    /// Id of the group with `handle` (case-insensitive).
    pub fn group_id(&self, handle: &str) -> Option<String> {
        self.lock()
            .groups
            .iter()
            .find(|g| g.handle.eq_ignore_ascii_case(handle))
            .map(|g| g.id.clone())
    }

    /// Current members of the group with `handle` (case-insensitive).
    pub fn members_of(&self, handle: &str) -> Option<Vec<String>> {
        let state = self.lock();
        let group = state
            .groups
            .iter()
            .find(|g| g.handle.eq_ignore_ascii_case(handle))?;
        state.members.get(&group.id).cloned()
    }

    /// Change membership behind the reconciler's back.
    pub fn set_members(&self, group_id: &str, members: &[&str]) {
        self.lock().members.insert(
            group_id.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(state: &DirectoryState, op: DirectoryOp) -> Result<(), ProviderError> {
        if state.failing.contains(&op) {
            return Err(ProviderError::Api {
                endpoint: op.endpoint().to_string(),
                message: "injected_failure".to_string(),
            });
        }
        Ok(())
    }
}

impl Directory for MemoryDirectory {
    fn list_users(&self) -> Result<Vec<DirectoryUser>, ProviderError> {
        let state = self.lock();
        Self::check(&state, DirectoryOp::ListUsers)?;
        Ok(state.users.clone())
    }

    fn list_groups(&self) -> Result<Vec<DirectoryGroup>, ProviderError> {
        let state = self.lock();
        Self::check(&state, DirectoryOp::ListGroups)?;
        Ok(state.groups.clone())
    }

    fn create_group(&self, name: &str, handle: &str) -> Result<DirectoryGroup, ProviderError> {
        let mut state = self.lock();
        Self::check(&state, DirectoryOp::CreateGroup)?;
        if state
            .groups
            .iter()
            .any(|g| g.handle.eq_ignore_ascii_case(handle))
        {
            return Err(ProviderError::Api {
                endpoint: DirectoryOp::CreateGroup.endpoint().to_string(),
                message: "name_already_exists".to_string(),
            });
        }

        let group = DirectoryGroup {
            id: format!("S{:04}", state.groups.len() + 1),
            handle: handle.to_string(),
            name: name.to_string(),
        };
        state.groups.push(group.clone());
        state.members.insert(group.id.clone(), Vec::new());
        state.created.push(handle.to_string());
        Ok(group)
    }

    fn group_members(&self, group_id: &str) -> Result<Vec<String>, ProviderError> {
        let state = self.lock();
        Self::check(&state, DirectoryOp::GroupMembers)?;
        state
            .members
            .get(group_id)
            .cloned()
            .ok_or_else(|| ProviderError::Api {
                endpoint: DirectoryOp::GroupMembers.endpoint().to_string(),
                message: "no_such_subteam".to_string(),
            })
    }

    fn replace_group_members(
        &self,
        group_id: &str,
        members: &[String],
    ) -> Result<(), ProviderError> {
        let mut state = self.lock();
        Self::check(&state, DirectoryOp::ReplaceGroupMembers)?;
        if !state.members.contains_key(group_id) {
            return Err(ProviderError::Api {
                endpoint: DirectoryOp::ReplaceGroupMembers.endpoint().to_string(),
                message: "no_such_subteam".to_string(),
            });
        }
        state.members.insert(group_id.to_string(), members.to_vec());
        state
            .replaces
            .push((group_id.to_string(), members.to_vec()));
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Shift {
    email: String,
    starts_in: Duration,
}

#[derive(Debug, Default)]
struct RosterState {
    shifts: HashMap<RosterId, Vec<Shift>>,
    failing: HashSet<RosterId>,
    queries: Vec<(RosterId, Duration)>,
}

/// A roster of shifts held in memory.
///
/// A shift is returned when it starts strictly before the queried horizon,
/// so a shift starting now is visible to every query.
#[derive(Debug, Default)]
pub struct MemoryRoster {
    state: Mutex<RosterState>,
}

impl MemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Someone on call right now.
    pub fn with_on_call(self, roster_id: &str, email: &str) -> Self {
        self.with_shift(roster_id, email, Duration::ZERO)
    }

    /// Someone whose shift starts `starts_in` from now.
    pub fn with_shift(self, roster_id: &str, email: &str, starts_in: Duration) -> Self {
        self.lock()
            .shifts
            .entry(RosterId::from(roster_id))
            .or_default()
            .push(Shift {
                email: email.to_string(),
                starts_in,
            });
        self
    }

    pub fn fail(&self, roster_id: &str) {
        self.lock().failing.insert(RosterId::from(roster_id));
    }

    /// Every query issued, as `(roster id, horizon)`.
    pub fn queries(&self) -> Vec<(RosterId, Duration)> {
        self.lock().queries.clone()
    }

    fn lock(&self) -> MutexGuard<'_, RosterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RosterProvider for MemoryRoster {
    fn on_call_emails(
        &self,
        roster_id: &RosterId,
        horizon: Duration,
    ) -> Result<Vec<String>, ProviderError> {
        let mut state = self.lock();
        state.queries.push((roster_id.clone(), horizon));
        if state.failing.contains(roster_id) {
            return Err(ProviderError::Status {
                endpoint: format!("schedules/{roster_id}/users"),
                status: 404,
                body: "schedule not found".to_string(),
            });
        }

        Ok(state
            .shifts
            .get(roster_id)
            .map(|shifts| {
                shifts
                    .iter()
                    .filter(|s| s.starts_in < horizon)
                    .map(|s| s.email.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_filters_shifts_by_horizon() {
        let roster = MemoryRoster::new()
            .with_on_call("P1", "now@example.com")
            .with_shift("P1", "later@example.com", Duration::from_secs(3_600));

        let now = roster
            .on_call_emails(&RosterId::from("P1"), Duration::from_secs(1))
            .expect("now");
        assert_eq!(now, vec!["now@example.com".to_string()]);

        let week = roster
            .on_call_emails(&RosterId::from("P1"), Duration::from_secs(7 * 86_400))
            .expect("week");
        assert_eq!(week.len(), 2);
        assert_eq!(roster.queries().len(), 2);
    }

    #[test]
    fn directory_refuses_duplicate_handles() {
        let directory = MemoryDirectory::new().with_group("S1", "oncall", &[]);
        let err = directory.create_group("OnCall", "ONCALL").unwrap_err();
        assert!(matches!(err, ProviderError::Api { .. }), "got: {err}");
        assert!(directory.created_groups().is_empty());
    }

    #[test]
    fn injected_failures_can_be_cleared() {
        let directory = MemoryDirectory::new();
        directory.fail(DirectoryOp::ListUsers);
        assert!(directory.list_users().is_err());
        directory.recover(DirectoryOp::ListUsers);
        assert!(directory.list_users().expect("users").is_empty());
    }
}
