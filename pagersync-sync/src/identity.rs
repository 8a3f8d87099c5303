//! Identity resolution: contact emails to directory user ids.

use std::collections::HashMap;

use pagersync_core::{EmailSet, IdentitySet};
use pagersync_providers::DirectoryUser;

use crate::error::SyncError;

/// Directory users indexed by lower-cased email, taken once per pass.
#[derive(Debug, Clone, Default)]
pub struct UserSnapshot {
    by_email: HashMap<String, String>,
}

impl UserSnapshot {
    /// Index `users`; when several share an email the first listed wins.
    pub fn new(users: Vec<DirectoryUser>) -> Self {
        let mut by_email = HashMap::with_capacity(users.len());
        for user in users {
            by_email.entry(user.email.to_lowercase()).or_insert(user.id);
        }
        Self { by_email }
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }

    /// Case-insensitive lookup of the user id owning `email`.
    pub fn find(&self, email: &str) -> Option<&str> {
        self.by_email.get(&email.to_lowercase()).map(String::as_str)
    }
}

/// Map every email to its directory id, or fail on the first unknown email.
pub fn identities_for_emails(
    snapshot: &UserSnapshot,
    emails: &EmailSet,
) -> Result<IdentitySet, SyncError> {
    let mut ids = IdentitySet::new();
    for email in emails.iter() {
        let id = snapshot
            .find(email)
            .ok_or_else(|| SyncError::IdentityResolution {
                email: email.to_string(),
            })?;
        ids.insert(id);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, email: &str) -> DirectoryUser {
        DirectoryUser {
            id: id.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn email_matching_ignores_case() {
        let snapshot = UserSnapshot::new(vec![user("U1", "jane@example.com")]);
        let emails: EmailSet = ["Jane@Example.com"].into_iter().collect();

        let ids = identities_for_emails(&snapshot, &emails).expect("ids");
        assert!(ids.contains("U1"));
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn one_unknown_email_fails_the_whole_set() {
        let snapshot = UserSnapshot::new(vec![user("U1", "a@x.com")]);
        let emails: EmailSet = ["a@x.com", "missing@x.com"].into_iter().collect();

        let err = identities_for_emails(&snapshot, &emails).unwrap_err();
        assert!(
            matches!(&err, SyncError::IdentityResolution { email } if email == "missing@x.com"),
            "got: {err}"
        );
    }

    #[test]
    fn first_listed_user_wins_for_shared_email() {
        let snapshot = UserSnapshot::new(vec![
            user("U1", "shared@example.com"),
            user("U2", "SHARED@example.com"),
        ]);
        assert_eq!(snapshot.find("shared@example.com"), Some("U1"));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn empty_email_set_resolves_to_empty_identities() {
        let snapshot = UserSnapshot::new(vec![user("U1", "a@x.com")]);
        let ids = identities_for_emails(&snapshot, &EmailSet::new()).expect("ids");
        assert!(ids.is_empty());
    }
}
