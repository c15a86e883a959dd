//! In-memory repository implementations shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::constants::DEFAULT_ORDER;
use crate::domain::opening_hours::{DayOpeningHours, OpeningHoursWeek, WEEKDAYS};
use crate::domain::organization::{
    Address, NewAddress, NewOrganization, Organization, OrganizationCategory, OrganizationUpdate,
};
use crate::repository::{CategoryRepository, OpeningHoursRepository, OrganizationRepository};

/// An active, approved, unblocked member organization with no schedules.
pub fn organization(
    organization_id: i64,
    name: &str,
    category_id: i64,
    owner_id: i64,
) -> Organization {
    Organization {
        organization_id,
        external_id: Uuid::new_v4(),
        name: name.to_string(),
        category_id,
        order: DEFAULT_ORDER,
        phone_nr: String::new(),
        website: None,
        description: None,
        owner_id,
        update_hours_daily: false,
        today_hours_id: None,
        mon_hours_id: None,
        tue_hours_id: None,
        wed_hours_id: None,
        thu_hours_id: None,
        fri_hours_id: None,
        sat_hours_id: None,
        sun_hours_id: None,
        is_active: true,
        is_approved: true,
        is_blocked: false,
        is_member: true,
        rooms_available: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct MockOrgRepository {
    pub orgs: Mutex<Vec<Organization>>,
    pub addresses: Mutex<Vec<Address>>,
    next_id: AtomicI64,
}

impl MockOrgRepository {
    pub async fn seed_org(
        &self,
        organization_id: i64,
        name: &str,
        category_id: i64,
        owner_id: i64,
    ) -> Organization {
        let org = organization(organization_id, name, category_id, owner_id);
        self.orgs.lock().unwrap().push(org.clone());
        org
    }
}

fn is_active(org: &Organization) -> bool {
    org.is_active && !org.is_blocked && org.is_approved
}

#[async_trait]
impl OrganizationRepository for MockOrgRepository {
    async fn find_by_id(&self, organization_id: i64) -> Result<Option<Organization>> {
        let orgs = self.orgs.lock().unwrap();
        Ok(orgs
            .iter()
            .find(|o| o.organization_id == organization_id)
            .cloned())
    }

    async fn insert_with_address(
        &self,
        new_org: NewOrganization,
        new_address: NewAddress,
    ) -> Result<Organization> {
        let organization_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let org = Organization {
            order: new_org.order,
            phone_nr: new_org.phone_nr,
            website: new_org.website,
            description: new_org.description,
            update_hours_daily: false,
            is_approved: false,
            rooms_available: new_org.rooms_available,
            ..organization(
                organization_id,
                &new_org.name,
                new_org.category_id,
                new_org.owner_id,
            )
        };
        self.orgs.lock().unwrap().push(org.clone());

        let mut addresses = self.addresses.lock().unwrap();
        let next_address_id = addresses.len() as i64 + 1;
        addresses.push(Address {
            address_id: next_address_id,
            address: new_address.address,
            postal_code: new_address.postal_code,
            city: new_address.city,
            country: new_address.country,
            organization_id,
        });
        Ok(org)
    }

    async fn update_organization(
        &self,
        organization_id: i64,
        update: OrganizationUpdate,
    ) -> Result<Organization> {
        let mut orgs = self.orgs.lock().unwrap();
        let org = orgs
            .iter_mut()
            .find(|o| o.organization_id == organization_id)
            .ok_or_else(|| anyhow!("organization not found"))?;

        org.name = update.name;
        org.category_id = update.category_id;
        org.phone_nr = update.phone_nr;
        org.website = update.website;
        org.description = update.description;
        org.rooms_available = update.rooms_available;
        if let Some(v) = update.update_hours_daily {
            org.update_hours_daily = v;
        }
        if let Some(v) = update.order {
            org.order = v;
        }
        if let Some(v) = update.is_active {
            org.is_active = v;
        }
        if let Some(v) = update.is_approved {
            org.is_approved = v;
        }
        if let Some(v) = update.is_blocked {
            org.is_blocked = v;
        }
        if let Some(v) = update.is_member {
            org.is_member = v;
        }
        org.updated_at = Utc::now();
        Ok(org.clone())
    }

    async fn first_address(&self, organization_id: i64) -> Result<Option<Address>> {
        let addresses = self.addresses.lock().unwrap();
        Ok(addresses
            .iter()
            .find(|a| a.organization_id == organization_id)
            .cloned())
    }

    async fn update_address(&self, organization_id: i64, address: NewAddress) -> Result<()> {
        let mut addresses = self.addresses.lock().unwrap();
        match addresses
            .iter_mut()
            .find(|a| a.organization_id == organization_id)
        {
            Some(existing) => {
                existing.address = address.address;
                existing.postal_code = address.postal_code;
                existing.city = address.city;
                existing.country = address.country;
            }
            None => {
                let address_id = addresses.len() as i64 + 1;
                addresses.push(Address {
                    address_id,
                    address: address.address,
                    postal_code: address.postal_code,
                    city: address.city,
                    country: address.country,
                    organization_id,
                });
            }
        }
        Ok(())
    }

    async fn delete_organization(&self, organization_id: i64) -> Result<()> {
        self.orgs
            .lock()
            .unwrap()
            .retain(|o| o.organization_id != organization_id);
        Ok(())
    }

    async fn toggle_rooms_available(&self, organization_id: i64) -> Result<bool> {
        let mut orgs = self.orgs.lock().unwrap();
        let org = orgs
            .iter_mut()
            .find(|o| o.organization_id == organization_id)
            .ok_or_else(|| anyhow!("organization not found"))?;
        org.rooms_available = !org.rooms_available;
        Ok(org.rooms_available)
    }

    async fn list_active(&self) -> Result<Vec<Organization>> {
        let orgs = self.orgs.lock().unwrap();
        Ok(orgs.iter().filter(|o| is_active(o)).cloned().collect())
    }

    async fn list_active_by_category(&self, category_id: i64) -> Result<Vec<Organization>> {
        let orgs = self.orgs.lock().unwrap();
        let mut result: Vec<Organization> = orgs
            .iter()
            .filter(|o| is_active(o) && o.category_id == category_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            b.is_member
                .cmp(&a.is_member)
                .then(a.order.cmp(&b.order))
                .then(a.name.cmp(&b.name))
        });
        Ok(result)
    }

    async fn list_sorted_by_order(&self) -> Result<Vec<Organization>> {
        let orgs = self.orgs.lock().unwrap();
        let mut result: Vec<Organization> = orgs.iter().cloned().collect();
        result.sort_by(|a, b| a.order.cmp(&b.order).then(a.name.cmp(&b.name)));
        Ok(result)
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Organization>> {
        let orgs = self.orgs.lock().unwrap();
        let mut result: Vec<Organization> = orgs
            .iter()
            .filter(|o| o.owner_id == owner_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }
}

pub struct MockCategoryRepository {
    pub categories: Mutex<Vec<OrganizationCategory>>,
}

impl MockCategoryRepository {
    pub fn with_category(category_id: i64, name: &str, rooms_available_applies: bool) -> Self {
        Self {
            categories: Mutex::new(vec![OrganizationCategory {
                category_id,
                name: name.to_string(),
                rooms_available_applies,
            }]),
        }
    }
}

#[async_trait]
impl CategoryRepository for MockCategoryRepository {
    async fn find_by_id(&self, category_id: i64) -> Result<Option<OrganizationCategory>> {
        let categories = self.categories.lock().unwrap();
        Ok(categories
            .iter()
            .find(|c| c.category_id == category_id)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<OrganizationCategory>> {
        let mut categories = self.categories.lock().unwrap().clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn with_active_organizations(&self) -> Result<Vec<OrganizationCategory>> {
        self.list_all().await
    }
}

#[derive(Default)]
pub struct MockHoursRepository {
    pub rows: Mutex<HashMap<i64, DayOpeningHours>>,
    pub weeks: Mutex<HashMap<i64, OpeningHoursWeek>>,
    next_id: AtomicI64,
}

impl MockHoursRepository {
    pub async fn seed_week(&self, organization_id: i64, week: OpeningHoursWeek) {
        let mut rows = self.rows.lock().unwrap();
        for day in week
            .today
            .iter()
            .chain(WEEKDAYS.iter().filter_map(|w| week.day(*w)))
        {
            rows.insert(day.hours_id, day.clone());
        }
        self.weeks.lock().unwrap().insert(organization_id, week);
    }

    fn new_row(&self) -> DayOpeningHours {
        DayOpeningHours {
            hours_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1000,
            ..DayOpeningHours::default()
        }
    }
}

#[async_trait]
impl OpeningHoursRepository for MockHoursRepository {
    async fn find_by_id(&self, hours_id: i64) -> Result<Option<DayOpeningHours>> {
        Ok(self.rows.lock().unwrap().get(&hours_id).cloned())
    }

    async fn week_for(&self, org: &Organization) -> Result<OpeningHoursWeek> {
        let weeks = self.weeks.lock().unwrap();
        let mut week = weeks
            .get(&org.organization_id)
            .cloned()
            .unwrap_or_default();
        week.update_daily = org.update_hours_daily;
        Ok(week)
    }

    async fn ensure_week(&self, org: &Organization) -> Result<OpeningHoursWeek> {
        let mut week = self.week_for(org).await?;
        if org.update_hours_daily {
            if week.today.is_none() {
                week.today = Some(self.new_row());
            }
        } else {
            for weekday in WEEKDAYS {
                if week.day(weekday).is_none() {
                    *week.day_mut(weekday) = Some(self.new_row());
                }
            }
        }
        self.seed_week(org.organization_id, week.clone()).await;
        Ok(week)
    }

    async fn save_week(&self, days: &[DayOpeningHours]) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        for day in days {
            rows.insert(day.hours_id, day.clone());
        }
        drop(rows);

        let mut weeks = self.weeks.lock().unwrap();
        for week in weeks.values_mut() {
            for day in days {
                if let Some(today) = &mut week.today
                    && today.hours_id == day.hours_id
                {
                    *today = day.clone();
                }
                for weekday in WEEKDAYS {
                    if let Some(existing) = week.day_mut(weekday).as_mut()
                        && existing.hours_id == day.hours_id
                    {
                        *existing = day.clone();
                    }
                }
            }
        }
        Ok(())
    }
}
