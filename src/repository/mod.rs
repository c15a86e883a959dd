pub mod sqlx_impl;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::opening_hours::{DayOpeningHours, OpeningHoursWeek};
use crate::domain::organization::{
    Address, NewAddress, NewOrganization, Organization, OrganizationCategory, OrganizationUpdate,
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub external_id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub external_id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub group_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>>;
    async fn insert_user(&self, new_user: NewUser) -> Result<User>;
    async fn get_user_groups(&self, user_id: i64) -> Result<Vec<Group>>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Group>>;
    /// Insert-or-fetch by name, so seeding can run any number of times.
    async fn ensure_group(&self, new_group: NewGroup) -> Result<Group>;
    /// Attach a permission codename to a group, ignoring duplicates.
    async fn ensure_group_permission(
        &self,
        group_id: i64,
        codename: &str,
        name: &str,
    ) -> Result<()>;
    async fn assign_user_to_group(&self, user_id: i64, group_id: i64) -> Result<()>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, category_id: i64) -> Result<Option<OrganizationCategory>>;
    async fn list_all(&self) -> Result<Vec<OrganizationCategory>>;
    /// Distinct categories having at least one active, approved, unblocked
    /// organization, ordered by name.
    async fn with_active_organizations(&self) -> Result<Vec<OrganizationCategory>>;
}

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn find_by_id(&self, organization_id: i64) -> Result<Option<Organization>>;
    /// Creates the organization together with its address in one
    /// transaction; a failing address insert leaves no orphan organization.
    async fn insert_with_address(
        &self,
        new_org: NewOrganization,
        new_address: NewAddress,
    ) -> Result<Organization>;
    async fn update_organization(
        &self,
        organization_id: i64,
        update: OrganizationUpdate,
    ) -> Result<Organization>;
    async fn first_address(&self, organization_id: i64) -> Result<Option<Address>>;
    async fn update_address(&self, organization_id: i64, address: NewAddress) -> Result<()>;
    async fn delete_organization(&self, organization_id: i64) -> Result<()>;
    /// Atomic flip, returning the new value.
    async fn toggle_rooms_available(&self, organization_id: i64) -> Result<bool>;
    async fn list_active(&self) -> Result<Vec<Organization>>;
    /// Active organizations of one category, ordered by membership first,
    /// then manual order, then name.
    async fn list_active_by_category(&self, category_id: i64) -> Result<Vec<Organization>>;
    async fn list_sorted_by_order(&self) -> Result<Vec<Organization>>;
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Organization>>;
}

#[async_trait]
pub trait OpeningHoursRepository: Send + Sync {
    async fn find_by_id(&self, hours_id: i64) -> Result<Option<DayOpeningHours>>;
    /// Loads the schedule rows referenced by the organization's slots.
    async fn week_for(&self, org: &Organization) -> Result<OpeningHoursWeek>;
    /// Materializes empty schedule rows for every slot the organization's
    /// mode needs but does not have yet, updating the slot references in the
    /// same transaction, and returns the complete week.
    async fn ensure_week(&self, org: &Organization) -> Result<OpeningHoursWeek>;
    /// Persists the given day rows all-or-nothing.
    async fn save_week(&self, days: &[DayOpeningHours]) -> Result<()>;
}
