use axum::{
    extract::{Extension, Query},
    response::{Html, IntoResponse},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tera::Context;

use crate::domain::opening_hours::day_slug;
use crate::handler::errors::ErrorResponse;
use crate::repository::sqlx_impl::{
    PgCategoryRepository, PgOpeningHoursRepository, PgOrganizationRepository,
};
use crate::services::opening_hours_service::OpeningHoursService;
use crate::services::organization_service::OrganizationService;

type OrgSvc =
    OrganizationService<PgOrganizationRepository, PgCategoryRepository, PgOpeningHoursRepository>;
type HoursSvc = OpeningHoursService<PgOpeningHoursRepository>;

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    pub category: Option<i64>,
}

/// GET /
///
/// Without a category: the categories that have active organizations.
/// With `?category=<id>`: that category's active organizations, each with
/// today's opening hours.
pub async fn home_page(
    Extension(org_service): Extension<Arc<OrgSvc>>,
    Extension(hours_service): Extension<Arc<HoursSvc>>,
    Extension(tmpl): Extension<tera::Tera>,
    Query(query): Query<HomeQuery>,
) -> impl IntoResponse {
    let now = Utc::now();
    let mut ctx = Context::new();
    ctx.insert("title", "Home");
    ctx.insert("day", day_slug(chrono::Datelike::weekday(&now)));

    if let Some(category_id) = query.category {
        let category = match org_service.get_category(category_id).await {
            Ok(Some(category)) => category,
            Ok(None) => return ErrorResponse::not_found("Category not found").into_response(),
            Err(e) => {
                tracing::error!("Failed to load category: {:?}", e);
                return ErrorResponse::internal_server_error("Database error").into_response();
            }
        };

        let organizations = match org_service.list_active_by_category(category_id).await {
            Ok(orgs) => orgs,
            Err(e) => {
                tracing::error!("Failed to list organizations: {:?}", e);
                return ErrorResponse::internal_server_error("Database error").into_response();
            }
        };

        // One entry per organization with today's sessions rendered for the
        // template; organizations without a schedule show as closed.
        let mut entries = Vec::with_capacity(organizations.len());
        for org in &organizations {
            let week = match hours_service.week_for(org).await {
                Ok(week) => week,
                Err(e) => {
                    tracing::error!("Failed to load opening hours: {:?}", e);
                    return ErrorResponse::internal_server_error("Database error").into_response();
                }
            };
            let sessions: Vec<(String, String)> = week
                .schedule_for(now)
                .map(|day| {
                    day.sessions()
                        .into_iter()
                        .map(|(open, close)| {
                            (
                                open.format("%H:%M").to_string(),
                                close.format("%H:%M").to_string(),
                            )
                        })
                        .collect()
                })
                .unwrap_or_default();

            entries.push(serde_json::json!({
                "organization": org,
                "open_today": week.open_today(now),
                "sessions": sessions,
            }));
        }

        ctx.insert("category", &category);
        ctx.insert("organizations", &entries);
    } else {
        let categories = match org_service.categories_with_active_organizations().await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::error!("Failed to list categories: {:?}", e);
                return ErrorResponse::internal_server_error("Database error").into_response();
            }
        };
        ctx.insert("organization_types", &categories);
    }

    match tmpl.render("home.html", &ctx) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            ErrorResponse::internal_server_error("Template error").into_response()
        }
    }
}
