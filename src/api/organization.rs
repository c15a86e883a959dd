use axum::{
    Extension,
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::deserializers::deserialize_hhmm;
use crate::domain::opening_hours::OpeningHoursWeek;
use crate::domain::organization::Organization;
use crate::handler::auth::{AuthenticatedUser, can_manage, is_organizations_admin};
use crate::handler::errors::ErrorResponse;
use crate::repository::sqlx_impl::{
    PgCategoryRepository, PgOpeningHoursRepository, PgOrganizationRepository,
};
use crate::services::opening_hours_service::{
    DayHoursInput, OpeningHoursService, SaveWeekError, WeekInput,
};
use crate::services::organization_service::{
    CreateOrganizationRequest, OrganizationService, UpdateOrganizationRequest,
};

type OrgSvc =
    OrganizationService<PgOrganizationRepository, PgCategoryRepository, PgOpeningHoursRepository>;
type HoursSvc = OpeningHoursService<PgOpeningHoursRepository>;

async fn load_organization(
    service: &OrgSvc,
    organization_id: i64,
) -> Result<Organization, ErrorResponse> {
    match service.get_organization(organization_id).await {
        Ok(Some(org)) => Ok(org),
        Ok(None) => Err(ErrorResponse::not_found("Organization not found")),
        Err(e) => {
            tracing::error!("Failed to fetch organization: {:?}", e);
            Err(ErrorResponse::internal_server_error("Database error"))
        }
    }
}

/// Owner-or-admin gate; runs before any mutation.
fn check_manage(
    user: &AuthenticatedUser,
    org: &Organization,
) -> Result<(), ErrorResponse> {
    if can_manage(user, org) {
        Ok(())
    } else {
        Err(ErrorResponse::forbidden(
            "You do not manage this organization",
        ))
    }
}

/// GET /api/organizations
#[utoipa::path(
    get,
    path = "/api/organizations",
    responses(
        (status = 200, description = "Organizations managed by the caller: all of them for admins, owned ones otherwise")
    ),
    security(("bearer_auth" = [])),
    tag = "organizations"
)]
pub async fn list_organizations(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(service): Extension<Arc<OrgSvc>>,
) -> impl IntoResponse {
    match service
        .list_for(user.user_id, is_organizations_admin(&user))
        .await
    {
        Ok(orgs) => Json(orgs).into_response(),
        Err(e) => {
            tracing::error!("Failed to list organizations: {:?}", e);
            ErrorResponse::internal_server_error("Database error").into_response()
        }
    }
}

/// POST /api/organizations
#[utoipa::path(
    post,
    path = "/api/organizations",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "Organization created with its address"),
        (status = 400, description = "Invalid organization data")
    ),
    security(("bearer_auth" = [])),
    tag = "organizations"
)]
pub async fn create_organization(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(service): Extension<Arc<OrgSvc>>,
    Json(payload): Json<CreateOrganizationRequest>,
) -> impl IntoResponse {
    match service.create_organization(payload, user.user_id).await {
        Ok(org) => (StatusCode::CREATED, Json(org)).into_response(),
        Err(e) => ErrorResponse::bad_request(&e.to_string()).into_response(),
    }
}

/// GET /api/organizations/{id}
#[utoipa::path(
    get,
    path = "/api/organizations/{id}",
    responses(
        (status = 200, description = "Organization detail with its address"),
        (status = 404, description = "Organization not found")
    ),
    security(("bearer_auth" = [])),
    tag = "organizations"
)]
pub async fn get_organization(
    Extension(service): Extension<Arc<OrgSvc>>,
    Path(organization_id): Path<i64>,
) -> impl IntoResponse {
    let org = match load_organization(&service, organization_id).await {
        Ok(org) => org,
        Err(e) => return e.into_response(),
    };

    let address = match service.first_address(organization_id).await {
        Ok(address) => address,
        Err(e) => {
            tracing::error!("Failed to fetch address: {:?}", e);
            return ErrorResponse::internal_server_error("Database error").into_response();
        }
    };

    Json(serde_json::json!({
        "organization": org,
        "address": address,
    }))
    .into_response()
}

/// PATCH /api/organizations/{id}
#[utoipa::path(
    patch,
    path = "/api/organizations/{id}",
    request_body = UpdateOrganizationRequest,
    responses(
        (status = 200, description = "Organization updated"),
        (status = 403, description = "Not the owner or an organizations admin"),
        (status = 404, description = "Organization not found")
    ),
    security(("bearer_auth" = [])),
    tag = "organizations"
)]
pub async fn update_organization(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(service): Extension<Arc<OrgSvc>>,
    Path(organization_id): Path<i64>,
    Json(payload): Json<UpdateOrganizationRequest>,
) -> impl IntoResponse {
    let org = match load_organization(&service, organization_id).await {
        Ok(org) => org,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = check_manage(&user, &org) {
        return e.into_response();
    }

    match service
        .update_organization(organization_id, payload, is_organizations_admin(&user))
        .await
    {
        Ok(org) => Json(org).into_response(),
        Err(e) => ErrorResponse::bad_request(&e.to_string()).into_response(),
    }
}

/// DELETE /api/organizations/{id}
#[utoipa::path(
    delete,
    path = "/api/organizations/{id}",
    responses(
        (status = 204, description = "Organization deleted"),
        (status = 403, description = "Not the owner or an organizations admin"),
        (status = 404, description = "Organization not found")
    ),
    security(("bearer_auth" = [])),
    tag = "organizations"
)]
pub async fn delete_organization(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(service): Extension<Arc<OrgSvc>>,
    Path(organization_id): Path<i64>,
) -> impl IntoResponse {
    let org = match load_organization(&service, organization_id).await {
        Ok(org) => org,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = check_manage(&user, &org) {
        return e.into_response();
    }

    match service.delete_organization(organization_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Failed to delete organization: {:?}", e);
            ErrorResponse::internal_server_error("Database error").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OpenedTodayQuery {
    pub category: Option<i64>,
}

/// GET /api/organizations/opened-today
#[utoipa::path(
    get,
    path = "/api/organizations/opened-today",
    params(("category" = Option<i64>, Query, description = "Restrict to one category")),
    responses(
        (status = 200, description = "Active organizations that are open today")
    ),
    tag = "organizations"
)]
pub async fn opened_today(
    Extension(service): Extension<Arc<OrgSvc>>,
    Query(query): Query<OpenedTodayQuery>,
) -> impl IntoResponse {
    match service.opened_today(query.category, Utc::now()).await {
        Ok(orgs) => Json(orgs).into_response(),
        Err(e) => {
            tracing::error!("Failed to resolve opened-today list: {:?}", e);
            ErrorResponse::internal_server_error("Database error").into_response()
        }
    }
}

/// GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Categories that have at least one active organization")
    ),
    tag = "organizations"
)]
pub async fn list_categories(
    Extension(service): Extension<Arc<OrgSvc>>,
) -> impl IntoResponse {
    match service.categories_with_active_organizations().await {
        Ok(categories) => Json(categories).into_response(),
        Err(e) => {
            tracing::error!("Failed to list categories: {:?}", e);
            ErrorResponse::internal_server_error("Database error").into_response()
        }
    }
}

/// One day in an opening-hours submission; times are "HH:MM" strings.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub struct DayHoursPayload {
    #[serde(default, deserialize_with = "deserialize_hhmm")]
    #[schema(value_type = Option<String>, example = "09:00")]
    pub open_first: Option<NaiveTime>,
    #[serde(default, deserialize_with = "deserialize_hhmm")]
    #[schema(value_type = Option<String>, example = "17:00")]
    pub close_first: Option<NaiveTime>,
    #[serde(default, deserialize_with = "deserialize_hhmm")]
    #[schema(value_type = Option<String>)]
    pub open_second: Option<NaiveTime>,
    #[serde(default, deserialize_with = "deserialize_hhmm")]
    #[schema(value_type = Option<String>)]
    pub close_second: Option<NaiveTime>,
}

impl From<DayHoursPayload> for DayHoursInput {
    fn from(payload: DayHoursPayload) -> Self {
        Self {
            open_first: payload.open_first,
            close_first: payload.close_first,
            open_second: payload.open_second,
            close_second: payload.close_second,
        }
    }
}

/// Opening-hours submission. Daily-override organizations send `today`;
/// everyone else the weekday entries, with missing days treated as closed.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct WeekPayload {
    #[serde(default)]
    pub today: Option<DayHoursPayload>,
    #[serde(default)]
    pub mon: Option<DayHoursPayload>,
    #[serde(default)]
    pub tue: Option<DayHoursPayload>,
    #[serde(default)]
    pub wed: Option<DayHoursPayload>,
    #[serde(default)]
    pub thu: Option<DayHoursPayload>,
    #[serde(default)]
    pub fri: Option<DayHoursPayload>,
    #[serde(default)]
    pub sat: Option<DayHoursPayload>,
    #[serde(default)]
    pub sun: Option<DayHoursPayload>,
}

impl From<WeekPayload> for WeekInput {
    fn from(payload: WeekPayload) -> Self {
        let day = |p: Option<DayHoursPayload>| p.map(DayHoursInput::from).unwrap_or_default();
        Self {
            today: day(payload.today),
            days: [
                day(payload.mon),
                day(payload.tue),
                day(payload.wed),
                day(payload.thu),
                day(payload.fri),
                day(payload.sat),
                day(payload.sun),
            ],
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DayHoursView {
    pub open_first: Option<String>,
    pub close_first: Option<String>,
    pub open_second: Option<String>,
    pub close_second: Option<String>,
}

fn fmt_time(time: Option<NaiveTime>) -> Option<String> {
    time.map(|t| t.format("%H:%M").to_string())
}

impl DayHoursView {
    fn from_week_day(day: Option<&crate::domain::opening_hours::DayOpeningHours>) -> Option<Self> {
        day.map(|d| Self {
            open_first: fmt_time(d.open_first),
            close_first: fmt_time(d.close_first),
            open_second: fmt_time(d.open_second),
            close_second: fmt_time(d.close_second),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OpeningHoursResponse {
    pub update_daily: bool,
    pub today: Option<DayHoursView>,
    pub mon: Option<DayHoursView>,
    pub tue: Option<DayHoursView>,
    pub wed: Option<DayHoursView>,
    pub thu: Option<DayHoursView>,
    pub fri: Option<DayHoursView>,
    pub sat: Option<DayHoursView>,
    pub sun: Option<DayHoursView>,
}

impl From<&OpeningHoursWeek> for OpeningHoursResponse {
    fn from(week: &OpeningHoursWeek) -> Self {
        Self {
            update_daily: week.update_daily,
            today: DayHoursView::from_week_day(week.today.as_ref()),
            mon: DayHoursView::from_week_day(week.mon.as_ref()),
            tue: DayHoursView::from_week_day(week.tue.as_ref()),
            wed: DayHoursView::from_week_day(week.wed.as_ref()),
            thu: DayHoursView::from_week_day(week.thu.as_ref()),
            fri: DayHoursView::from_week_day(week.fri.as_ref()),
            sat: DayHoursView::from_week_day(week.sat.as_ref()),
            sun: DayHoursView::from_week_day(week.sun.as_ref()),
        }
    }
}

/// GET /api/organizations/{id}/opening-hours
#[utoipa::path(
    get,
    path = "/api/organizations/{id}/opening-hours",
    responses(
        (status = 200, description = "The organization's opening hours", body = OpeningHoursResponse),
        (status = 403, description = "Not the owner or an organizations admin"),
        (status = 404, description = "Organization not found")
    ),
    security(("bearer_auth" = [])),
    tag = "opening-hours"
)]
pub async fn get_opening_hours(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(org_service): Extension<Arc<OrgSvc>>,
    Extension(hours_service): Extension<Arc<HoursSvc>>,
    Path(organization_id): Path<i64>,
) -> impl IntoResponse {
    let org = match load_organization(&org_service, organization_id).await {
        Ok(org) => org,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = check_manage(&user, &org) {
        return e.into_response();
    }

    match hours_service.week_for(&org).await {
        Ok(week) => Json(OpeningHoursResponse::from(&week)).into_response(),
        Err(e) => {
            tracing::error!("Failed to load opening hours: {:?}", e);
            ErrorResponse::internal_server_error("Database error").into_response()
        }
    }
}

/// PUT /api/organizations/{id}/opening-hours
#[utoipa::path(
    put,
    path = "/api/organizations/{id}/opening-hours",
    request_body = WeekPayload,
    responses(
        (status = 200, description = "Opening hours saved", body = OpeningHoursResponse),
        (status = 400, description = "A day failed validation; nothing was saved"),
        (status = 403, description = "Not the owner or an organizations admin"),
        (status = 404, description = "Organization not found")
    ),
    security(("bearer_auth" = [])),
    tag = "opening-hours"
)]
pub async fn put_opening_hours(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(org_service): Extension<Arc<OrgSvc>>,
    Extension(hours_service): Extension<Arc<HoursSvc>>,
    Path(organization_id): Path<i64>,
    Json(payload): Json<WeekPayload>,
) -> impl IntoResponse {
    let org = match load_organization(&org_service, organization_id).await {
        Ok(org) => org,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = check_manage(&user, &org) {
        return e.into_response();
    }

    // Materialize missing slots, then reload so the slot ids are visible.
    if let Err(e) = hours_service.edit_week(&org).await {
        tracing::error!("Failed to prepare opening hours: {:?}", e);
        return ErrorResponse::internal_server_error("Database error").into_response();
    }
    let org = match load_organization(&org_service, organization_id).await {
        Ok(org) => org,
        Err(e) => return e.into_response(),
    };

    let input = WeekInput::from(payload);
    match hours_service.save_week(&org, &input).await {
        Ok(()) => match hours_service.week_for(&org).await {
            Ok(week) => Json(OpeningHoursResponse::from(&week)).into_response(),
            Err(e) => {
                tracing::error!("Failed to reload opening hours: {:?}", e);
                ErrorResponse::internal_server_error("Database error").into_response()
            }
        },
        Err(SaveWeekError::Validation(e)) => ErrorResponse::bad_request(&e.to_string()).into_response(),
        Err(SaveWeekError::Other(e)) => {
            tracing::error!("Failed to save opening hours: {:?}", e);
            ErrorResponse::internal_server_error("Database error").into_response()
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoomsAvailableResponse {
    pub organization_id: i64,
    pub rooms_available: bool,
}

/// POST /api/organizations/{id}/rooms-available
#[utoipa::path(
    post,
    path = "/api/organizations/{id}/rooms-available",
    responses(
        (status = 200, description = "Flag toggled", body = RoomsAvailableResponse),
        (status = 403, description = "Not the owner or an organizations admin"),
        (status = 404, description = "Organization not found")
    ),
    security(("bearer_auth" = [])),
    tag = "organizations"
)]
pub async fn toggle_rooms_available(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(service): Extension<Arc<OrgSvc>>,
    Path(organization_id): Path<i64>,
) -> impl IntoResponse {
    let org = match load_organization(&service, organization_id).await {
        Ok(org) => org,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = check_manage(&user, &org) {
        return e.into_response();
    }

    match service.toggle_rooms_available(organization_id).await {
        Ok(rooms_available) => Json(RoomsAvailableResponse {
            organization_id,
            rooms_available,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to toggle rooms-available: {:?}", e);
            ErrorResponse::internal_server_error("Database error").into_response()
        }
    }
}
