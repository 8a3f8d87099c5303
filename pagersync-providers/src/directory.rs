//! User-directory seam: users and user groups.

use serde::Deserialize;

use crate::error::ProviderError;

/// A directory user with its stable identity and contact email.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub email: String,
}

/// A user group as listed or created by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryGroup {
    pub id: String,
    pub handle: String,
    #[serde(default)]
    pub name: String,
}

/// User and user-group primitives the reconciler needs.
pub trait Directory {
    fn list_users(&self) -> Result<Vec<DirectoryUser>, ProviderError>;

    fn list_groups(&self) -> Result<Vec<DirectoryGroup>, ProviderError>;

    fn create_group(&self, name: &str, handle: &str) -> Result<DirectoryGroup, ProviderError>;

    /// Current member identities of the group, read live.
    fn group_members(&self, group_id: &str) -> Result<Vec<String>, ProviderError>;

    /// Replace the whole membership of the group with `members`.
    fn replace_group_members(&self, group_id: &str, members: &[String])
        -> Result<(), ProviderError>;
}

impl<T: Directory + ?Sized> Directory for &T {
    fn list_users(&self) -> Result<Vec<DirectoryUser>, ProviderError> {
        (**self).list_users()
    }

    fn list_groups(&self) -> Result<Vec<DirectoryGroup>, ProviderError> {
        (**self).list_groups()
    }

    fn create_group(&self, name: &str, handle: &str) -> Result<DirectoryGroup, ProviderError> {
        (**self).create_group(name, handle)
    }

    fn group_members(&self, group_id: &str) -> Result<Vec<String>, ProviderError> {
        (**self).group_members(group_id)
    }

    fn replace_group_members(
        &self,
        group_id: &str,
        members: &[String],
    ) -> Result<(), ProviderError> {
        (**self).replace_group_members(group_id, members)
    }
}
