use anyhow::{Result, anyhow};
use async_trait::async_trait;

use sqlx::{PgConnection, PgPool};

use super::{Group, NewGroup, NewUser, User};
use crate::domain::opening_hours::{DayOpeningHours, OpeningHoursWeek, WEEKDAYS, day_slug};
use crate::domain::organization::{
    Address, NewAddress, NewOrganization, Organization, OrganizationCategory, OrganizationUpdate,
};
use crate::repository::{
    CategoryRepository, GroupRepository, OpeningHoursRepository, OrganizationRepository,
    UserRepository,
};

/// Column lists shared across queries to avoid repetition.
const ORG_COLUMNS: &str = r#"organization_id, external_id, name, category_id, "order", phone_nr, website, description, owner_id, update_hours_daily, today_hours_id, mon_hours_id, tue_hours_id, wed_hours_id, thu_hours_id, fri_hours_id, sat_hours_id, sun_hours_id, is_active, is_approved, is_blocked, is_member, rooms_available, created_at, updated_at"#;

const HOURS_COLUMNS: &str = "hours_id, open_first, close_first, open_second, close_second";

const USER_COLUMNS: &str =
    "user_id, external_id, email, username, password_hash, created_at, updated_at";

/// Filter shared by every "shown on the website" query.
const ACTIVE_FILTER: &str = "is_active AND NOT is_blocked AND is_approved";

pub struct PgUserRepository {
    pub pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let rec = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let rec = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec)
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        let rec = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec)
    }

    async fn insert_user(&self, new_user: NewUser) -> Result<User> {
        let query = format!(
            "INSERT INTO users (external_id, email, username, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );
        let rec = sqlx::query_as::<_, User>(&query)
            .bind(new_user.external_id)
            .bind(&new_user.email)
            .bind(&new_user.username)
            .bind(&new_user.password_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec)
    }

    async fn get_user_groups(&self, user_id: i64) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT g.group_id, g.name, g.description, g.created_at
             FROM groups g
             INNER JOIN user_groups ug ON g.group_id = ug.group_id
             WHERE ug.user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }
}

pub struct PgGroupRepository {
    pub pool: PgPool,
}

impl PgGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Group>> {
        let rec = sqlx::query_as::<_, Group>(
            "SELECT group_id, name, description, created_at FROM groups WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rec)
    }

    async fn ensure_group(&self, new_group: NewGroup) -> Result<Group> {
        // DO UPDATE instead of DO NOTHING so the row is returned either way.
        let rec = sqlx::query_as::<_, Group>(
            "INSERT INTO groups (name, description) VALUES ($1, $2)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING group_id, name, description, created_at",
        )
        .bind(&new_group.name)
        .bind(&new_group.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(rec)
    }

    async fn ensure_group_permission(
        &self,
        group_id: i64,
        codename: &str,
        name: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO group_permissions (group_id, codename, name) VALUES ($1, $2, $3)
             ON CONFLICT (group_id, codename) DO NOTHING",
        )
        .bind(group_id)
        .bind(codename)
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn assign_user_to_group(&self, user_id: i64, group_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_groups (user_id, group_id) VALUES ($1, $2)
             ON CONFLICT (user_id, group_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(group_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct PgCategoryRepository {
    pub pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_by_id(&self, category_id: i64) -> Result<Option<OrganizationCategory>> {
        let rec = sqlx::query_as::<_, OrganizationCategory>(
            "SELECT category_id, name, rooms_available_applies
             FROM organization_categories WHERE category_id = $1",
        )
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rec)
    }

    async fn list_all(&self) -> Result<Vec<OrganizationCategory>> {
        let recs = sqlx::query_as::<_, OrganizationCategory>(
            "SELECT category_id, name, rooms_available_applies
             FROM organization_categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(recs)
    }

    async fn with_active_organizations(&self) -> Result<Vec<OrganizationCategory>> {
        let recs = sqlx::query_as::<_, OrganizationCategory>(
            "SELECT DISTINCT c.category_id, c.name, c.rooms_available_applies
             FROM organization_categories c
             INNER JOIN organizations o ON o.category_id = c.category_id
             WHERE o.is_active AND NOT o.is_blocked AND o.is_approved
             ORDER BY c.name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(recs)
    }
}

pub struct PgOrganizationRepository {
    pub pool: PgPool,
}

impl PgOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn find_by_id(&self, organization_id: i64) -> Result<Option<Organization>> {
        let query = format!("SELECT {ORG_COLUMNS} FROM organizations WHERE organization_id = $1");
        let rec = sqlx::query_as::<_, Organization>(&query)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec)
    }

    async fn insert_with_address(
        &self,
        new_org: NewOrganization,
        new_address: NewAddress,
    ) -> Result<Organization> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"INSERT INTO organizations (external_id, name, category_id, "order", phone_nr, website, description, owner_id, rooms_available)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING {ORG_COLUMNS}"#
        );
        let org = sqlx::query_as::<_, Organization>(&query)
            .bind(uuid::Uuid::new_v4())
            .bind(&new_org.name)
            .bind(new_org.category_id)
            .bind(new_org.order)
            .bind(&new_org.phone_nr)
            .bind(&new_org.website)
            .bind(&new_org.description)
            .bind(new_org.owner_id)
            .bind(new_org.rooms_available)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO addresses (address, postal_code, city, country, organization_id)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&new_address.address)
        .bind(&new_address.postal_code)
        .bind(&new_address.city)
        .bind(&new_address.country)
        .bind(org.organization_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(org)
    }

    async fn update_organization(
        &self,
        organization_id: i64,
        update: OrganizationUpdate,
    ) -> Result<Organization> {
        let query = format!(
            r#"UPDATE organizations SET
                 name = $2,
                 category_id = $3,
                 phone_nr = $4,
                 website = $5,
                 description = $6,
                 rooms_available = $7,
                 update_hours_daily = COALESCE($8, update_hours_daily),
                 "order" = COALESCE($9, "order"),
                 is_active = COALESCE($10, is_active),
                 is_approved = COALESCE($11, is_approved),
                 is_blocked = COALESCE($12, is_blocked),
                 is_member = COALESCE($13, is_member),
                 updated_at = now()
               WHERE organization_id = $1
               RETURNING {ORG_COLUMNS}"#
        );
        let rec = sqlx::query_as::<_, Organization>(&query)
            .bind(organization_id)
            .bind(&update.name)
            .bind(update.category_id)
            .bind(&update.phone_nr)
            .bind(&update.website)
            .bind(&update.description)
            .bind(update.rooms_available)
            .bind(update.update_hours_daily)
            .bind(update.order)
            .bind(update.is_active)
            .bind(update.is_approved)
            .bind(update.is_blocked)
            .bind(update.is_member)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec)
    }

    async fn first_address(&self, organization_id: i64) -> Result<Option<Address>> {
        let rec = sqlx::query_as::<_, Address>(
            "SELECT address_id, address, postal_code, city, country, organization_id
             FROM addresses WHERE organization_id = $1
             ORDER BY address_id LIMIT 1",
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rec)
    }

    async fn update_address(&self, organization_id: i64, address: NewAddress) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT address_id FROM addresses WHERE organization_id = $1
             ORDER BY address_id LIMIT 1",
        )
        .bind(organization_id)
        .fetch_optional(&mut *tx)
        .await?;

        match existing {
            Some(address_id) => {
                sqlx::query(
                    "UPDATE addresses SET address = $1, postal_code = $2, city = $3, country = $4
                     WHERE address_id = $5",
                )
                .bind(&address.address)
                .bind(&address.postal_code)
                .bind(&address.city)
                .bind(&address.country)
                .bind(address_id)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO addresses (address, postal_code, city, country, organization_id)
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(&address.address)
                .bind(&address.postal_code)
                .bind(&address.city)
                .bind(&address.country)
                .bind(organization_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_organization(&self, organization_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM organizations WHERE organization_id = $1")
            .bind(organization_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn toggle_rooms_available(&self, organization_id: i64) -> Result<bool> {
        let rooms_available: bool = sqlx::query_scalar(
            "UPDATE organizations
             SET rooms_available = NOT rooms_available, updated_at = now()
             WHERE organization_id = $1
             RETURNING rooms_available",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(rooms_available)
    }

    async fn list_active(&self) -> Result<Vec<Organization>> {
        let query = format!("SELECT {ORG_COLUMNS} FROM organizations WHERE {ACTIVE_FILTER}");
        let recs = sqlx::query_as::<_, Organization>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(recs)
    }

    async fn list_active_by_category(&self, category_id: i64) -> Result<Vec<Organization>> {
        let query = format!(
            r#"SELECT {ORG_COLUMNS} FROM organizations
               WHERE {ACTIVE_FILTER} AND category_id = $1
               ORDER BY is_member DESC, "order" ASC, name ASC"#
        );
        let recs = sqlx::query_as::<_, Organization>(&query)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(recs)
    }

    async fn list_sorted_by_order(&self) -> Result<Vec<Organization>> {
        let query =
            format!(r#"SELECT {ORG_COLUMNS} FROM organizations ORDER BY "order" ASC, name ASC"#);
        let recs = sqlx::query_as::<_, Organization>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(recs)
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Organization>> {
        let query = format!(
            "SELECT {ORG_COLUMNS} FROM organizations WHERE owner_id = $1 ORDER BY name ASC"
        );
        let recs = sqlx::query_as::<_, Organization>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(recs)
    }
}

pub struct PgOpeningHoursRepository {
    pub pool: PgPool,
}

impl PgOpeningHoursRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn fetch_day(conn: &mut PgConnection, hours_id: i64) -> Result<Option<DayOpeningHours>> {
    let query = format!("SELECT {HOURS_COLUMNS} FROM day_opening_hours WHERE hours_id = $1");
    let rec = sqlx::query_as::<_, DayOpeningHours>(&query)
        .bind(hours_id)
        .fetch_optional(conn)
        .await?;
    Ok(rec)
}

async fn insert_empty_day(conn: &mut PgConnection) -> Result<DayOpeningHours> {
    let query =
        format!("INSERT INTO day_opening_hours DEFAULT VALUES RETURNING {HOURS_COLUMNS}");
    let rec = sqlx::query_as::<_, DayOpeningHours>(&query)
        .fetch_one(conn)
        .await?;
    Ok(rec)
}

/// `slot` must be one of the fixed slot names ("today" or a weekday slug);
/// callers never pass user input here.
async fn set_slot(
    conn: &mut PgConnection,
    organization_id: i64,
    slot: &str,
    hours_id: i64,
) -> Result<()> {
    let query = format!(
        "UPDATE organizations SET {slot}_hours_id = $1, updated_at = now()
         WHERE organization_id = $2"
    );
    sqlx::query(&query)
        .bind(hours_id)
        .bind(organization_id)
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl OpeningHoursRepository for PgOpeningHoursRepository {
    async fn find_by_id(&self, hours_id: i64) -> Result<Option<DayOpeningHours>> {
        let mut conn = self.pool.acquire().await?;
        fetch_day(&mut *conn, hours_id).await
    }

    async fn week_for(&self, org: &Organization) -> Result<OpeningHoursWeek> {
        let mut conn = self.pool.acquire().await?;
        let mut week = OpeningHoursWeek {
            update_daily: org.update_hours_daily,
            ..OpeningHoursWeek::default()
        };

        if let Some(hours_id) = org.today_hours_id {
            week.today = fetch_day(&mut *conn, hours_id).await?;
        }
        for weekday in WEEKDAYS {
            if let Some(hours_id) = org.day_slot(weekday) {
                *week.day_mut(weekday) = fetch_day(&mut *conn, hours_id).await?;
            }
        }
        Ok(week)
    }

    async fn ensure_week(&self, org: &Organization) -> Result<OpeningHoursWeek> {
        let mut tx = self.pool.begin().await?;
        let mut week = OpeningHoursWeek {
            update_daily: org.update_hours_daily,
            ..OpeningHoursWeek::default()
        };

        if org.update_hours_daily {
            let hours = match org.today_hours_id {
                Some(hours_id) => fetch_day(&mut *tx, hours_id)
                    .await?
                    .ok_or_else(|| anyhow!("today schedule {hours_id} is missing"))?,
                None => {
                    let hours = insert_empty_day(&mut *tx).await?;
                    set_slot(&mut *tx, org.organization_id, "today", hours.hours_id).await?;
                    hours
                }
            };
            week.today = Some(hours);
        } else {
            for weekday in WEEKDAYS {
                let slug = day_slug(weekday);
                let hours = match org.day_slot(weekday) {
                    Some(hours_id) => fetch_day(&mut *tx, hours_id)
                        .await?
                        .ok_or_else(|| anyhow!("{slug} schedule {hours_id} is missing"))?,
                    None => {
                        let hours = insert_empty_day(&mut *tx).await?;
                        set_slot(&mut *tx, org.organization_id, slug, hours.hours_id).await?;
                        hours
                    }
                };
                *week.day_mut(weekday) = Some(hours);
            }
        }

        tx.commit().await?;
        Ok(week)
    }

    async fn save_week(&self, days: &[DayOpeningHours]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for day in days {
            sqlx::query(
                "UPDATE day_opening_hours
                 SET open_first = $1, close_first = $2, open_second = $3, close_second = $4
                 WHERE hours_id = $5",
            )
            .bind(day.open_first)
            .bind(day.close_first)
            .bind(day.open_second)
            .bind(day.close_second)
            .bind(day.hours_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
