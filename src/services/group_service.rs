use anyhow::{Result, anyhow};
use std::sync::Arc;

use crate::constants::{CAN_UPDATE_ORGANIZATIONS, ORGANIZATIONS_ADMIN_GROUP};
use crate::repository::{Group, GroupRepository, NewGroup, UserRepository};

#[derive(Debug, Clone)]
pub struct GroupService<G: GroupRepository, U: UserRepository> {
    pub repo: Arc<G>,
    pub user_repo: Arc<U>,
}

impl<G: GroupRepository, U: UserRepository> GroupService<G, U> {
    pub fn new(repo: Arc<G>, user_repo: Arc<U>) -> Self {
        Self { repo, user_repo }
    }

    /// Creates the organizations-admin group with its update permission.
    /// Safe to run on every deployment; existing rows are left alone.
    pub async fn ensure_organizations_admin_group(&self) -> Result<Group> {
        let group = self
            .repo
            .ensure_group(NewGroup {
                name: ORGANIZATIONS_ADMIN_GROUP.to_string(),
                description: Some("Can update all organizations in the directory".to_string()),
            })
            .await?;

        self.repo
            .ensure_group_permission(
                group.group_id,
                CAN_UPDATE_ORGANIZATIONS,
                "Can update organizations",
            )
            .await?;

        Ok(group)
    }

    /// Puts the user identified by email or username into the
    /// organizations-admin group, seeding the group first if needed.
    pub async fn grant_organizations_admin(&self, identity: &str) -> Result<()> {
        let user = if identity.contains('@') {
            self.user_repo.find_by_email(identity).await?
        } else {
            self.user_repo.find_by_username(identity).await?
        };
        let user = user.ok_or_else(|| anyhow!("user not found: {identity}"))?;

        let group = self.ensure_organizations_admin_group().await?;
        self.repo
            .assign_user_to_group(user.user_id, group.group_id)
            .await
    }
}
