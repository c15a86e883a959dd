use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

use crate::api;
use crate::services::organization_service::{
    CreateOrganizationRequest, UpdateOrganizationRequest,
};
use crate::services::user_service::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        api::auth::register_api,
        api::auth::login_api,
        api::auth::me_api,
        api::organization::list_organizations,
        api::organization::create_organization,
        api::organization::get_organization,
        api::organization::update_organization,
        api::organization::delete_organization,
        api::organization::opened_today,
        api::organization::list_categories,
        api::organization::get_opening_hours,
        api::organization::put_opening_hours,
        api::organization::toggle_rooms_available,
        api::health::health_check,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        UserResponse,
        CreateOrganizationRequest,
        UpdateOrganizationRequest,
        api::organization::DayHoursPayload,
        api::organization::WeekPayload,
        api::organization::DayHoursView,
        api::organization::OpeningHoursResponse,
        api::organization::RoomsAvailableResponse,
        api::health::HealthResponse,
        api::health::DatabaseHealth,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "organizations", description = "Directory management"),
        (name = "opening-hours", description = "Per-day opening hours"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
