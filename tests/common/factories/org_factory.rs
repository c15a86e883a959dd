use chrono::Utc;
use townbook::constants::DEFAULT_ORDER;
use townbook::domain::organization::Organization;
use uuid::Uuid;

/// An active, approved, unblocked member organization with empty schedule
/// slots, ready to be tweaked per test.
#[allow(dead_code)]
pub fn organization(organization_id: i64, name: &str, owner_id: i64) -> Organization {
    Organization {
        organization_id,
        external_id: Uuid::new_v4(),
        name: name.to_string(),
        category_id: 1,
        order: DEFAULT_ORDER,
        phone_nr: "+49 2821 000".to_string(),
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
