use axum::{
    extract::{Extension, Form, Path},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::collections::HashMap;
use std::sync::Arc;
use tera::Context;

use crate::api::deserializers::parse_hhmm;
use crate::domain::opening_hours::{DAY_SLUGS, OpeningHoursWeek, WEEKDAYS};
use crate::domain::organization::Organization;
use crate::handler::auth::{AuthenticatedUser, can_manage, is_organizations_admin};
use crate::handler::errors::ErrorResponse;
use crate::repository::sqlx_impl::{
    PgCategoryRepository, PgOpeningHoursRepository, PgOrganizationRepository, PgUserRepository,
};
use crate::services::opening_hours_service::{
    DayHoursInput, OpeningHoursService, SaveWeekError, WeekInput,
};
use crate::services::organization_service::{
    CreateOrganizationRequest, OrganizationService, UpdateOrganizationRequest,
};
use crate::services::user_service::UserService;

type OrgSvc =
    OrganizationService<PgOrganizationRepository, PgCategoryRepository, PgOpeningHoursRepository>;
type HoursSvc = OpeningHoursService<PgOpeningHoursRepository>;
type UserSvc = UserService<PgUserRepository>;

/// Form labels per weekday slug, Monday-start.
const DAY_LABELS: [(&str, &str); 7] = [
    ("mon", "Monday"),
    ("tue", "Tuesday"),
    ("wed", "Wednesday"),
    ("thu", "Thursday"),
    ("fri", "Friday"),
    ("sat", "Saturday"),
    ("sun", "Sunday"),
];

#[derive(serde::Deserialize)]
pub struct OrganizationFormData {
    pub name: String,
    pub category_id: i64,
    pub phone_nr: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rooms_available: Option<String>,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    // Present only on the admin variant of the form.
    #[serde(default)]
    pub update_hours_daily: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub is_active: Option<String>,
    #[serde(default)]
    pub is_approved: Option<String>,
    #[serde(default)]
    pub is_blocked: Option<String>,
    #[serde(default)]
    pub is_member: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let s = s.trim().to_string();
        if s.is_empty() { None } else { Some(s) }
    })
}

fn checked(value: &Option<String>) -> bool {
    value.is_some()
}

async fn load_organization(
    service: &OrgSvc,
    organization_id: i64,
) -> Result<Organization, Response> {
    match service.get_organization(organization_id).await {
        Ok(Some(org)) => Ok(org),
        Ok(None) => Err(ErrorResponse::not_found("Organization not found").into_response()),
        Err(e) => {
            tracing::error!("Failed to fetch organization: {:?}", e);
            Err(ErrorResponse::internal_server_error("Database error").into_response())
        }
    }
}

fn check_manage(user: &AuthenticatedUser, org: &Organization) -> Result<(), Response> {
    if can_manage(user, org) {
        Ok(())
    } else {
        Err(ErrorResponse::forbidden("You do not manage this organization").into_response())
    }
}

fn render(tmpl: &tera::Tera, template: &str, ctx: &Context) -> Response {
    match tmpl.render(template, ctx) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            ErrorResponse::internal_server_error("Template error").into_response()
        }
    }
}

/// GET /organizations
pub async fn list_page(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(service): Extension<Arc<OrgSvc>>,
    Extension(tmpl): Extension<tera::Tera>,
) -> impl IntoResponse {
    let is_admin = is_organizations_admin(&user);
    let organizations = match service.list_for(user.user_id, is_admin).await {
        Ok(orgs) => orgs,
        Err(e) => {
            tracing::error!("Failed to list organizations: {:?}", e);
            return ErrorResponse::internal_server_error("Database error").into_response();
        }
    };

    let mut ctx = Context::new();
    ctx.insert("title", "Organizations");
    ctx.insert("organizations", &organizations);
    ctx.insert("is_organization_admin", &is_admin);
    render(&tmpl, "organizations/list.html", &ctx)
}

async fn form_context(
    service: &OrgSvc,
    title: &str,
    form_action: &str,
) -> Result<Context, Response> {
    let categories = match service.list_categories().await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::error!("Failed to list categories: {:?}", e);
            return Err(ErrorResponse::internal_server_error("Database error").into_response());
        }
    };
    let mut ctx = Context::new();
    ctx.insert("title", title);
    ctx.insert("form_action", form_action);
    ctx.insert("categories", &categories);
    Ok(ctx)
}

/// GET /organizations/create
pub async fn create_page(
    Extension(service): Extension<Arc<OrgSvc>>,
    Extension(tmpl): Extension<tera::Tera>,
) -> impl IntoResponse {
    let ctx = match form_context(&service, "Create organization", "create").await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    render(&tmpl, "organizations/form.html", &ctx)
}

/// POST /organizations/create
pub async fn create_post(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(service): Extension<Arc<OrgSvc>>,
    Extension(tmpl): Extension<tera::Tera>,
    Form(payload): Form<OrganizationFormData>,
) -> impl IntoResponse {
    let req = CreateOrganizationRequest {
        name: payload.name.clone(),
        category_id: payload.category_id,
        phone_nr: payload.phone_nr.clone(),
        website: non_empty(payload.website.clone()),
        description: non_empty(payload.description.clone()),
        rooms_available: checked(&payload.rooms_available),
        address: payload.address.clone(),
        postal_code: payload.postal_code.clone(),
        city: payload.city.clone(),
    };

    match service.create_organization(req, user.user_id).await {
        Ok(_) => Redirect::to("/organizations").into_response(),
        Err(e) => {
            let mut ctx = match form_context(&service, "Create organization", "create").await {
                Ok(ctx) => ctx,
                Err(response) => return response,
            };
            ctx.insert("error", &e.to_string());
            ctx.insert("form", &payload_as_context(&payload));
            (
                StatusCode::BAD_REQUEST,
                render(&tmpl, "organizations/form.html", &ctx),
            )
                .into_response()
        }
    }
}

fn payload_as_context(payload: &OrganizationFormData) -> serde_json::Value {
    serde_json::json!({
        "name": payload.name,
        "category_id": payload.category_id,
        "phone_nr": payload.phone_nr,
        "website": payload.website,
        "description": payload.description,
        "rooms_available": checked(&payload.rooms_available),
        "address": payload.address,
        "postal_code": payload.postal_code,
        "city": payload.city,
    })
}

/// GET /organizations/{id}
pub async fn detail_page(
    Extension(service): Extension<Arc<OrgSvc>>,
    Extension(tmpl): Extension<tera::Tera>,
    Path(organization_id): Path<i64>,
) -> impl IntoResponse {
    let org = match load_organization(&service, organization_id).await {
        Ok(org) => org,
        Err(response) => return response,
    };
    let address = match service.first_address(organization_id).await {
        Ok(address) => address,
        Err(e) => {
            tracing::error!("Failed to fetch address: {:?}", e);
            return ErrorResponse::internal_server_error("Database error").into_response();
        }
    };

    let mut ctx = Context::new();
    ctx.insert("title", &org.name);
    ctx.insert("organization", &org);
    ctx.insert("address", &address);
    render(&tmpl, "organizations/detail.html", &ctx)
}

/// GET /organizations/update/{id}
pub async fn update_page(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(org_service): Extension<Arc<OrgSvc>>,
    Extension(user_service): Extension<Arc<UserSvc>>,
    Extension(tmpl): Extension<tera::Tera>,
    Path(organization_id): Path<i64>,
) -> impl IntoResponse {
    let org = match load_organization(&org_service, organization_id).await {
        Ok(org) => org,
        Err(response) => return response,
    };
    if let Err(response) = check_manage(&user, &org) {
        return response;
    }

    let address = match org_service.first_address(organization_id).await {
        Ok(address) => address,
        Err(e) => {
            tracing::error!("Failed to fetch address: {:?}", e);
            return ErrorResponse::internal_server_error("Database error").into_response();
        }
    };

    let mut ctx = match form_context(&org_service, "Update organization", "update").await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let is_admin = is_organizations_admin(&user);
    ctx.insert("pk", &organization_id);
    ctx.insert("organization", &org);
    ctx.insert("address", &address);
    ctx.insert("is_admin_form", &is_admin);
    ctx.insert("is_active", &org.is_active);
    ctx.insert("is_blocked", &org.is_blocked);
    ctx.insert("is_approved", &org.is_approved);
    if is_admin {
        match user_service.get_user_email(org.owner_id).await {
            Ok(owner_email) => ctx.insert("owner_email", &owner_email),
            Err(e) => {
                tracing::error!("Failed to fetch owner email: {:?}", e);
                return ErrorResponse::internal_server_error("Database error").into_response();
            }
        }
    }
    render(&tmpl, "organizations/form.html", &ctx)
}

/// POST /organizations/update/{id}
pub async fn update_post(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(service): Extension<Arc<OrgSvc>>,
    Extension(tmpl): Extension<tera::Tera>,
    Path(organization_id): Path<i64>,
    Form(payload): Form<OrganizationFormData>,
) -> impl IntoResponse {
    let org = match load_organization(&service, organization_id).await {
        Ok(org) => org,
        Err(response) => return response,
    };
    if let Err(response) = check_manage(&user, &org) {
        return response;
    }

    let is_admin = is_organizations_admin(&user);
    // Checkboxes only submit when checked, so the admin form's flags are
    // reconstructed from presence; owners never get them applied at all.
    let admin_flag = |value: &Option<String>| is_admin.then(|| checked(value));
    let req = UpdateOrganizationRequest {
        name: payload.name.clone(),
        category_id: payload.category_id,
        phone_nr: payload.phone_nr.clone(),
        website: non_empty(payload.website.clone()),
        description: non_empty(payload.description.clone()),
        rooms_available: checked(&payload.rooms_available),
        address: payload.address.clone(),
        postal_code: payload.postal_code.clone(),
        city: payload.city.clone(),
        update_hours_daily: admin_flag(&payload.update_hours_daily),
        order: if is_admin { payload.order } else { None },
        is_active: admin_flag(&payload.is_active),
        is_approved: admin_flag(&payload.is_approved),
        is_blocked: admin_flag(&payload.is_blocked),
        is_member: admin_flag(&payload.is_member),
    };

    match service
        .update_organization(organization_id, req, is_admin)
        .await
    {
        Ok(_) => Redirect::to(&format!("/organizations/update/{organization_id}")).into_response(),
        Err(e) => {
            let mut ctx = match form_context(&service, "Update organization", "update").await {
                Ok(ctx) => ctx,
                Err(response) => return response,
            };
            ctx.insert("pk", &organization_id);
            ctx.insert("error", &e.to_string());
            ctx.insert("form", &payload_as_context(&payload));
            ctx.insert("is_admin_form", &is_admin);
            (
                StatusCode::BAD_REQUEST,
                render(&tmpl, "organizations/form.html", &ctx),
            )
                .into_response()
        }
    }
}

/// GET /organizations/delete/{id}
pub async fn delete_page(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(service): Extension<Arc<OrgSvc>>,
    Extension(tmpl): Extension<tera::Tera>,
    Path(organization_id): Path<i64>,
) -> impl IntoResponse {
    let org = match load_organization(&service, organization_id).await {
        Ok(org) => org,
        Err(response) => return response,
    };
    if let Err(response) = check_manage(&user, &org) {
        return response;
    }

    let mut ctx = Context::new();
    ctx.insert("title", "Delete organization");
    ctx.insert("organization", &org);
    render(&tmpl, "organizations/confirm_delete.html", &ctx)
}

/// POST /organizations/delete/{id}
pub async fn delete_post(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(service): Extension<Arc<OrgSvc>>,
    Path(organization_id): Path<i64>,
) -> impl IntoResponse {
    let org = match load_organization(&service, organization_id).await {
        Ok(org) => org,
        Err(response) => return response,
    };
    if let Err(response) = check_manage(&user, &org) {
        return response;
    }

    match service.delete_organization(organization_id).await {
        Ok(()) => Redirect::to("/organizations").into_response(),
        Err(e) => {
            tracing::error!("Failed to delete organization: {:?}", e);
            ErrorResponse::internal_server_error("Database error").into_response()
        }
    }
}

/// GET /organizations/rooms-available/{id}
pub async fn rooms_available_toggle(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(service): Extension<Arc<OrgSvc>>,
    Path(organization_id): Path<i64>,
) -> impl IntoResponse {
    let org = match load_organization(&service, organization_id).await {
        Ok(org) => org,
        Err(response) => return response,
    };
    if let Err(response) = check_manage(&user, &org) {
        return response;
    }

    match service.toggle_rooms_available(organization_id).await {
        Ok(_) => Redirect::to("/organizations").into_response(),
        Err(e) => {
            tracing::error!("Failed to toggle rooms-available: {:?}", e);
            ErrorResponse::internal_server_error("Database error").into_response()
        }
    }
}

/// Template data for one day's sub-form, values as "HH:MM" strings.
fn day_form(label: &str, prefix: &str, day: Option<&crate::domain::opening_hours::DayOpeningHours>) -> serde_json::Value {
    let fmt = |t: Option<chrono::NaiveTime>| {
        t.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()
    };
    let day = day.cloned().unwrap_or_default();
    serde_json::json!({
        "label": label,
        "prefix": prefix,
        "open_first": fmt(day.open_first),
        "close_first": fmt(day.close_first),
        "open_second": fmt(day.open_second),
        "close_second": fmt(day.close_second),
    })
}

fn hours_context(organization_id: i64, week: &OpeningHoursWeek) -> Context {
    let mut ctx = Context::new();
    ctx.insert("title", "Opening hours");
    ctx.insert("pk", &organization_id);
    ctx.insert("update_daily", &week.update_daily);

    if week.update_daily {
        ctx.insert("today_form", &day_form("Today", "today", week.today.as_ref()));
    } else {
        let forms: Vec<serde_json::Value> = DAY_LABELS
            .into_iter()
            .zip(WEEKDAYS)
            .map(|((slug, label), weekday)| day_form(label, slug, week.day(weekday)))
            .collect();
        ctx.insert("day_forms", &forms);
    }
    ctx
}

/// GET /organizations/opening-hours/{id}
pub async fn opening_hours_page(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(org_service): Extension<Arc<OrgSvc>>,
    Extension(hours_service): Extension<Arc<HoursSvc>>,
    Extension(tmpl): Extension<tera::Tera>,
    Path(organization_id): Path<i64>,
) -> impl IntoResponse {
    let org = match load_organization(&org_service, organization_id).await {
        Ok(org) => org,
        Err(response) => return response,
    };
    if let Err(response) = check_manage(&user, &org) {
        return response;
    }

    let week = match hours_service.edit_week(&org).await {
        Ok(week) => week,
        Err(e) => {
            tracing::error!("Failed to prepare opening hours: {:?}", e);
            return ErrorResponse::internal_server_error("Database error").into_response();
        }
    };

    let ctx = hours_context(organization_id, &week);
    render(&tmpl, "organizations/opening_hours.html", &ctx)
}

/// Parses one "{prefix}-{field}" time field out of the submitted form.
fn parse_field(
    form: &HashMap<String, String>,
    prefix: &str,
    field: &str,
) -> Result<Option<chrono::NaiveTime>, String> {
    match form.get(&format!("{prefix}-{field}")) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => parse_hhmm(value).map(Some),
    }
}

fn parse_day(
    form: &HashMap<String, String>,
    prefix: &str,
) -> Result<DayHoursInput, String> {
    Ok(DayHoursInput {
        open_first: parse_field(form, prefix, "open_first")?,
        close_first: parse_field(form, prefix, "close_first")?,
        open_second: parse_field(form, prefix, "open_second")?,
        close_second: parse_field(form, prefix, "close_second")?,
    })
}

/// Template context rebuilt from the raw submission, so a rejected form
/// comes back with what the user typed.
fn submitted_context(organization_id: i64, update_daily: bool, form: &HashMap<String, String>) -> Context {
    let raw = |prefix: &str, field: &str| {
        form.get(&format!("{prefix}-{field}")).cloned().unwrap_or_default()
    };
    let day = |label: &str, prefix: &str| {
        serde_json::json!({
            "label": label,
            "prefix": prefix,
            "open_first": raw(prefix, "open_first"),
            "close_first": raw(prefix, "close_first"),
            "open_second": raw(prefix, "open_second"),
            "close_second": raw(prefix, "close_second"),
        })
    };

    let mut ctx = Context::new();
    ctx.insert("title", "Opening hours");
    ctx.insert("pk", &organization_id);
    ctx.insert("update_daily", &update_daily);
    if update_daily {
        ctx.insert("today_form", &day("Today", "today"));
    } else {
        let forms: Vec<serde_json::Value> = DAY_LABELS
            .into_iter()
            .map(|(slug, label)| day(label, slug))
            .collect();
        ctx.insert("day_forms", &forms);
    }
    ctx
}

/// POST /organizations/opening-hours/{id}
///
/// Every submitted day is validated before anything is written; one bad
/// day rejects the whole submission.
pub async fn opening_hours_post(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(org_service): Extension<Arc<OrgSvc>>,
    Extension(hours_service): Extension<Arc<HoursSvc>>,
    Extension(tmpl): Extension<tera::Tera>,
    Path(organization_id): Path<i64>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let org = match load_organization(&org_service, organization_id).await {
        Ok(org) => org,
        Err(response) => return response,
    };
    if let Err(response) = check_manage(&user, &org) {
        return response;
    }

    let mut input = WeekInput::default();
    let parsed: Result<(), String> = (|| {
        if org.update_hours_daily {
            input.today = parse_day(&form, "today")?;
        } else {
            for (weekday, slug) in WEEKDAYS.into_iter().zip(DAY_SLUGS) {
                *input.day_mut(weekday) = parse_day(&form, slug)?;
            }
        }
        Ok(())
    })();

    if let Err(message) = parsed {
        let mut ctx = submitted_context(organization_id, org.update_hours_daily, &form);
        ctx.insert("error", &message);
        return (
            StatusCode::BAD_REQUEST,
            render(&tmpl, "organizations/opening_hours.html", &ctx),
        )
            .into_response();
    }

    // The form may be posted before the slots ever existed; materialize
    // them and reload so every day has a row to write to.
    if let Err(e) = hours_service.edit_week(&org).await {
        tracing::error!("Failed to prepare opening hours: {:?}", e);
        return ErrorResponse::internal_server_error("Database error").into_response();
    }
    let org = match load_organization(&org_service, organization_id).await {
        Ok(org) => org,
        Err(response) => return response,
    };

    match hours_service.save_week(&org, &input).await {
        Ok(()) => {
            let week = match hours_service.week_for(&org).await {
                Ok(week) => week,
                Err(e) => {
                    tracing::error!("Failed to reload opening hours: {:?}", e);
                    return ErrorResponse::internal_server_error("Database error").into_response();
                }
            };
            render(&tmpl, "organizations/opening_hours.html", &hours_context(organization_id, &week))
        }
        Err(SaveWeekError::Validation(e)) => {
            let mut ctx = submitted_context(organization_id, org.update_hours_daily, &form);
            ctx.insert("error", &e.to_string());
            (
                StatusCode::BAD_REQUEST,
                render(&tmpl, "organizations/opening_hours.html", &ctx),
            )
                .into_response()
        }
        Err(SaveWeekError::Other(e)) => {
            tracing::error!("Failed to save opening hours: {:?}", e);
            ErrorResponse::internal_server_error("Database error").into_response()
        }
    }
}
