use chrono::Weekday;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A directory entry: one local organization (business, club, ...) with its
/// listing flags and the per-day opening-hours slots it owns.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    pub organization_id: i64,
    pub external_id: Uuid,
    pub name: String,
    pub category_id: i64,
    /// Manual rank within a category listing; entries left at the default
    /// sort after every ranked one.
    pub order: i32,
    pub phone_nr: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub owner_id: i64,
    /// When set, a single floating "today" schedule applies every day and
    /// the seven weekday slots are ignored.
    pub update_hours_daily: bool,
    pub today_hours_id: Option<i64>,
    pub mon_hours_id: Option<i64>,
    pub tue_hours_id: Option<i64>,
    pub wed_hours_id: Option<i64>,
    pub thu_hours_id: Option<i64>,
    pub fri_hours_id: Option<i64>,
    pub sat_hours_id: Option<i64>,
    pub sun_hours_id: Option<i64>,
    /// Listed on the website at all.
    pub is_active: bool,
    /// Cleared until a directory admin approves the entry.
    pub is_approved: bool,
    pub is_blocked: bool,
    pub is_member: bool,
    pub rooms_available: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Organization {
    /// The opening-hours row id owned by the given weekday slot.
    pub fn day_slot(&self, weekday: Weekday) -> Option<i64> {
        match weekday {
            Weekday::Mon => self.mon_hours_id,
            Weekday::Tue => self.tue_hours_id,
            Weekday::Wed => self.wed_hours_id,
            Weekday::Thu => self.thu_hours_id,
            Weekday::Fri => self.fri_hours_id,
            Weekday::Sat => self.sat_hours_id,
            Weekday::Sun => self.sun_hours_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub category_id: i64,
    pub order: i32,
    pub phone_nr: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub owner_id: i64,
    pub rooms_available: bool,
}

/// Field set applied by the update form. The admin-only fields are `None`
/// for regular owners and left untouched in the database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationUpdate {
    pub name: String,
    pub category_id: i64,
    pub phone_nr: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub rooms_available: bool,
    pub update_hours_daily: Option<bool>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
    pub is_approved: Option<bool>,
    pub is_blocked: Option<bool>,
    pub is_member: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrganizationCategory {
    pub category_id: i64,
    pub name: String,
    /// Whether the "rooms available" flag makes sense for entries of this
    /// category (e.g. hotels yes, sports clubs no).
    pub rooms_available_applies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub address_id: i64,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub organization_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAddress {
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}
