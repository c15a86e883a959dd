use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::constants::{DEFAULT_COUNTRY, DEFAULT_ORDER};
use crate::domain::organization::{
    Address, NewAddress, NewOrganization, Organization, OrganizationCategory, OrganizationUpdate,
};
use crate::repository::{CategoryRepository, OpeningHoursRepository, OrganizationRepository};

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.and_then(|s| if s.trim().is_empty() { None } else { Some(s) }))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub category_id: i64,
    pub phone_nr: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rooms_available: bool,
    pub address: String,
    pub postal_code: String,
    pub city: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrganizationRequest {
    pub name: String,
    pub category_id: i64,
    pub phone_nr: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rooms_available: bool,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    // Only honored for organizations admins; silently dropped otherwise.
    pub update_hours_daily: Option<bool>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
    pub is_approved: Option<bool>,
    pub is_blocked: Option<bool>,
    pub is_member: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct OrganizationService<
    O: OrganizationRepository,
    C: CategoryRepository,
    H: OpeningHoursRepository,
> {
    pub repo: Arc<O>,
    pub category_repo: Arc<C>,
    pub hours_repo: Arc<H>,
}

impl<O: OrganizationRepository, C: CategoryRepository, H: OpeningHoursRepository>
    OrganizationService<O, C, H>
{
    pub fn new(repo: Arc<O>, category_repo: Arc<C>, hours_repo: Arc<H>) -> Self {
        Self {
            repo,
            category_repo,
            hours_repo,
        }
    }

    pub async fn create_organization(
        &self,
        req: CreateOrganizationRequest,
        owner_id: i64,
    ) -> Result<Organization> {
        let category = self
            .category_repo
            .find_by_id(req.category_id)
            .await?
            .ok_or_else(|| anyhow!("category not found"))?;

        if req.name.trim().is_empty() {
            return Err(anyhow!("organization name cannot be empty"));
        }

        let new_org = NewOrganization {
            name: req.name,
            category_id: req.category_id,
            order: DEFAULT_ORDER,
            phone_nr: req.phone_nr,
            website: req.website,
            description: req.description,
            owner_id,
            // The flag only exists for categories it applies to.
            rooms_available: category.rooms_available_applies && req.rooms_available,
        };
        let new_address = NewAddress {
            address: req.address,
            postal_code: req.postal_code,
            city: req.city,
            country: DEFAULT_COUNTRY.to_string(),
        };

        self.repo.insert_with_address(new_org, new_address).await
    }

    pub async fn get_organization(&self, organization_id: i64) -> Result<Option<Organization>> {
        self.repo.find_by_id(organization_id).await
    }

    pub async fn first_address(&self, organization_id: i64) -> Result<Option<Address>> {
        self.repo.first_address(organization_id).await
    }

    pub async fn get_category(&self, category_id: i64) -> Result<Option<OrganizationCategory>> {
        self.category_repo.find_by_id(category_id).await
    }

    pub async fn list_categories(&self) -> Result<Vec<OrganizationCategory>> {
        self.category_repo.list_all().await
    }

    /// Categories that have something to show on the public pages.
    pub async fn categories_with_active_organizations(
        &self,
    ) -> Result<Vec<OrganizationCategory>> {
        self.category_repo.with_active_organizations().await
    }

    /// Updates the organization and its address. Admin-only fields are
    /// applied only when `is_admin` is set.
    pub async fn update_organization(
        &self,
        organization_id: i64,
        req: UpdateOrganizationRequest,
        is_admin: bool,
    ) -> Result<Organization> {
        let category = self
            .category_repo
            .find_by_id(req.category_id)
            .await?
            .ok_or_else(|| anyhow!("category not found"))?;

        let update = OrganizationUpdate {
            name: req.name,
            category_id: req.category_id,
            phone_nr: req.phone_nr,
            website: req.website,
            description: req.description,
            rooms_available: category.rooms_available_applies && req.rooms_available,
            update_hours_daily: if is_admin { req.update_hours_daily } else { None },
            order: if is_admin { req.order } else { None },
            is_active: if is_admin { req.is_active } else { None },
            is_approved: if is_admin { req.is_approved } else { None },
            is_blocked: if is_admin { req.is_blocked } else { None },
            is_member: if is_admin { req.is_member } else { None },
        };

        let org = self.repo.update_organization(organization_id, update).await?;
        self.repo
            .update_address(
                organization_id,
                NewAddress {
                    address: req.address,
                    postal_code: req.postal_code,
                    city: req.city,
                    country: DEFAULT_COUNTRY.to_string(),
                },
            )
            .await?;
        Ok(org)
    }

    pub async fn delete_organization(&self, organization_id: i64) -> Result<()> {
        self.repo.delete_organization(organization_id).await
    }

    /// Atomically flips the rooms-available flag, returning the new value.
    pub async fn toggle_rooms_available(&self, organization_id: i64) -> Result<bool> {
        self.repo.toggle_rooms_available(organization_id).await
    }

    /// The list view: admins manage the whole directory ordered by manual
    /// rank, owners see their own entries by name.
    pub async fn list_for(&self, user_id: i64, is_admin: bool) -> Result<Vec<Organization>> {
        if is_admin {
            self.repo.list_sorted_by_order().await
        } else {
            self.repo.list_by_owner(user_id).await
        }
    }

    pub async fn list_active_by_category(&self, category_id: i64) -> Result<Vec<Organization>> {
        self.repo.list_active_by_category(category_id).await
    }

    /// Active organizations (of one category, if given) that are open on
    /// the date of `now`, in the listing order of the underlying query.
    pub async fn opened_today(
        &self,
        category_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Organization>> {
        let organizations = match category_id {
            Some(category_id) => self.repo.list_active_by_category(category_id).await?,
            None => self.repo.list_active().await?,
        };

        let mut open = Vec::new();
        for org in organizations {
            let week = self.hours_repo.week_for(&org).await?;
            if week.open_today(now) {
                open.push(org);
            }
        }
        Ok(open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::opening_hours::{DayOpeningHours, OpeningHoursWeek};
    use crate::test_support::{MockCategoryRepository, MockHoursRepository, MockOrgRepository};
    use chrono::{NaiveTime, TimeZone};

    fn wednesday() -> DateTime<Utc> {
        // 2024-01-03 is a Wednesday.
        Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap()
    }

    fn open_day(hours_id: i64) -> DayOpeningHours {
        DayOpeningHours {
            hours_id,
            open_first: NaiveTime::from_hms_opt(9, 0, 0),
            close_first: NaiveTime::from_hms_opt(17, 0, 0),
            ..DayOpeningHours::default()
        }
    }

    fn service(
        orgs: Arc<MockOrgRepository>,
        categories: Arc<MockCategoryRepository>,
        hours: Arc<MockHoursRepository>,
    ) -> OrganizationService<MockOrgRepository, MockCategoryRepository, MockHoursRepository> {
        OrganizationService::new(orgs, categories, hours)
    }

    #[tokio::test]
    async fn test_create_organization_with_address() {
        let orgs = Arc::new(MockOrgRepository::default());
        let categories = Arc::new(MockCategoryRepository::with_category(1, "Shops", true));
        let hours = Arc::new(MockHoursRepository::default());
        let service = service(orgs.clone(), categories, hours);

        let org = service
            .create_organization(
                CreateOrganizationRequest {
                    name: "Corner Bakery".to_string(),
                    category_id: 1,
                    phone_nr: "+49 123 456".to_string(),
                    website: None,
                    description: None,
                    rooms_available: true,
                    address: "Main Street 1".to_string(),
                    postal_code: "12345".to_string(),
                    city: "Kleve".to_string(),
                },
                7,
            )
            .await
            .unwrap();

        assert_eq!(org.owner_id, 7);
        assert_eq!(org.order, DEFAULT_ORDER);
        assert!(org.rooms_available);
        let address = orgs.first_address(org.organization_id).await.unwrap().unwrap();
        assert_eq!(address.country, "DE");
    }

    #[tokio::test]
    async fn test_rooms_available_ignored_when_category_does_not_apply() {
        let orgs = Arc::new(MockOrgRepository::default());
        let categories = Arc::new(MockCategoryRepository::with_category(1, "Clubs", false));
        let hours = Arc::new(MockHoursRepository::default());
        let service = service(orgs, categories, hours);

        let org = service
            .create_organization(
                CreateOrganizationRequest {
                    name: "Chess Club".to_string(),
                    category_id: 1,
                    phone_nr: "".to_string(),
                    website: None,
                    description: None,
                    rooms_available: true,
                    address: "Main Street 2".to_string(),
                    postal_code: "12345".to_string(),
                    city: "Kleve".to_string(),
                },
                1,
            )
            .await
            .unwrap();
        assert!(!org.rooms_available);
    }

    #[tokio::test]
    async fn test_admin_fields_dropped_for_regular_owner() {
        let orgs = Arc::new(MockOrgRepository::default());
        let categories = Arc::new(MockCategoryRepository::with_category(1, "Shops", false));
        let hours = Arc::new(MockHoursRepository::default());
        let service = service(orgs.clone(), categories, hours);

        let org = orgs.seed_org(1, "Corner Bakery", 1, 1).await;
        let req = UpdateOrganizationRequest {
            name: "Corner Bakery".to_string(),
            category_id: 1,
            phone_nr: "+49 1".to_string(),
            address: "Main Street 1".to_string(),
            postal_code: "12345".to_string(),
            city: "Kleve".to_string(),
            is_blocked: Some(true),
            order: Some(1),
            ..UpdateOrganizationRequest::default()
        };

        let updated = service
            .update_organization(org.organization_id, req.clone(), false)
            .await
            .unwrap();
        assert!(!updated.is_blocked);
        assert_eq!(updated.order, DEFAULT_ORDER);

        let updated = service
            .update_organization(org.organization_id, req, true)
            .await
            .unwrap();
        assert!(updated.is_blocked);
        assert_eq!(updated.order, 1);
    }

    #[tokio::test]
    async fn test_opened_today_is_ordered_subset_of_active_by_category() {
        let orgs = Arc::new(MockOrgRepository::default());
        let categories = Arc::new(MockCategoryRepository::with_category(1, "Shops", false));
        let hours = Arc::new(MockHoursRepository::default());
        let service = service(orgs.clone(), categories, hours.clone());

        // Three active entries; only the first and third are open Wednesdays.
        let a = orgs.seed_org(1, "Alpha", 1, 1).await;
        let b = orgs.seed_org(2, "Beta", 1, 1).await;
        let c = orgs.seed_org(3, "Gamma", 1, 1).await;
        hours
            .seed_week(
                a.organization_id,
                OpeningHoursWeek {
                    wed: Some(open_day(1)),
                    ..OpeningHoursWeek::default()
                },
            )
            .await;
        hours
            .seed_week(b.organization_id, OpeningHoursWeek::default())
            .await;
        hours
            .seed_week(
                c.organization_id,
                OpeningHoursWeek {
                    wed: Some(open_day(2)),
                    ..OpeningHoursWeek::default()
                },
            )
            .await;

        let all = service.list_active_by_category(1).await.unwrap();
        let open = service.opened_today(Some(1), wednesday()).await.unwrap();

        let open_ids: Vec<i64> = open.iter().map(|o| o.organization_id).collect();
        assert_eq!(open_ids, vec![1, 3]);

        // Subset preserving the relative order of the full listing.
        let all_ids: Vec<i64> = all
            .iter()
            .map(|o| o.organization_id)
            .filter(|id| open_ids.contains(id))
            .collect();
        assert_eq!(all_ids, open_ids);
    }

    #[tokio::test]
    async fn test_double_toggle_restores_rooms_available() {
        let orgs = Arc::new(MockOrgRepository::default());
        let categories = Arc::new(MockCategoryRepository::with_category(1, "Hotels", true));
        let hours = Arc::new(MockHoursRepository::default());
        let service = service(orgs.clone(), categories, hours);

        let org = orgs.seed_org(1, "Hotel", 1, 1).await;
        assert!(!org.rooms_available);

        assert!(service.toggle_rooms_available(1).await.unwrap());
        assert!(!service.toggle_rooms_available(1).await.unwrap());
        let reloaded = service.get_organization(1).await.unwrap().unwrap();
        assert!(!reloaded.rooms_available);
    }
}
