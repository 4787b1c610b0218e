//! Template CRUD and preview routes.

use crate::error::AppError;
use crate::http::{ApiErr, AppState};
use crate::models::template::validate_rating_range;
use crate::models::{NewTemplate, ReplyTemplate, TemplateUpdate};
use crate::services::template_engine;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct TemplateListQuery {
    #[serde(default)]
    active_only: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewRequest {
    content: String,
    #[serde(default = "default_author")]
    author_name: String,
    #[serde(default = "default_location")]
    location_name: String,
    #[serde(default = "default_rating")]
    rating: i64,
}

fn default_author() -> String {
    "Jane Doe".to_string()
}

fn default_location() -> String {
    "My Business".to_string()
}

fn default_rating() -> i64 {
    5
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewResponse {
    rendered_content: String,
    placeholders_used: Vec<String>,
}

/// Build the template routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/templates", get(list_templates).post(create_template))
        .route(
            "/templates/{id}",
            get(get_template)
                .put(update_template)
                .delete(delete_template),
        )
        .route("/templates/preview", post(preview_template))
}

/// GET /templates?active_only=true — list templates.
async fn list_templates(
    State(state): State<AppState>,
    Query(params): Query<TemplateListQuery>,
) -> Result<Json<Vec<ReplyTemplate>>, ApiErr> {
    let base = "SELECT id, name, content, rating_min, rating_max, is_active, created_at, updated_at FROM templates";

    let templates: Vec<ReplyTemplate> = if params.active_only {
        sqlx::query_as(&format!(
            "{} WHERE is_active = 1 ORDER BY rating_min, created_at",
            base
        ))
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as(&format!("{} ORDER BY rating_min, created_at", base))
            .fetch_all(&state.db)
            .await?
    };

    Ok(Json(templates))
}

/// POST /templates — create a template.
async fn create_template(
    State(state): State<AppState>,
    Json(input): Json<NewTemplate>,
) -> Result<(StatusCode, Json<ReplyTemplate>), ApiErr> {
    if input.name.trim().is_empty() {
        return Err(ApiErr::from(AppError::invalid_input_field(
            "Template name must not be empty",
            "name",
        )));
    }
    validate_rating_range(input.rating_min, input.rating_max).map_err(ApiErr::from)?;
    template_engine::validate_content(&input.content).map_err(ApiErr::from)?;

    let template: ReplyTemplate = sqlx::query_as(
        r#"
        INSERT INTO templates (name, content, rating_min, rating_max, is_active)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, name, content, rating_min, rating_max, is_active, created_at, updated_at
        "#,
    )
    .bind(&input.name)
    .bind(&input.content)
    .bind(input.rating_min)
    .bind(input.rating_max)
    .bind(input.is_active)
    .fetch_one(&state.db)
    .await?;

    log::info!(
        "Created template {} covering ratings {}-{}",
        template.id,
        template.rating_min,
        template.rating_max
    );

    Ok((StatusCode::CREATED, Json(template)))
}

/// GET /templates/:id — fetch a template.
async fn get_template(
    State(state): State<AppState>,
    Path(template_id): Path<i64>,
) -> Result<Json<ReplyTemplate>, ApiErr> {
    let template = fetch_template(&state, template_id).await?;
    Ok(Json(template))
}

/// PUT /templates/:id — partially update a template.
async fn update_template(
    State(state): State<AppState>,
    Path(template_id): Path<i64>,
    Json(input): Json<TemplateUpdate>,
) -> Result<Json<ReplyTemplate>, ApiErr> {
    let existing = fetch_template(&state, template_id).await?;

    if let Some(content) = &input.content {
        template_engine::validate_content(content).map_err(ApiErr::from)?;
    }
    if let Some(name) = &input.name {
        if name.trim().is_empty() {
            return Err(ApiErr::from(AppError::invalid_input_field(
                "Template name must not be empty",
                "name",
            )));
        }
    }

    // Validate the range that would result from the update
    let rating_min = input.rating_min.unwrap_or(existing.rating_min);
    let rating_max = input.rating_max.unwrap_or(existing.rating_max);
    validate_rating_range(rating_min, rating_max).map_err(ApiErr::from)?;

    let template: ReplyTemplate = sqlx::query_as(
        r#"
        UPDATE templates
        SET name = ?, content = ?, rating_min = ?, rating_max = ?, is_active = ?,
            updated_at = strftime('%s', 'now')
        WHERE id = ?
        RETURNING id, name, content, rating_min, rating_max, is_active, created_at, updated_at
        "#,
    )
    .bind(input.name.as_ref().unwrap_or(&existing.name))
    .bind(input.content.as_ref().unwrap_or(&existing.content))
    .bind(rating_min)
    .bind(rating_max)
    .bind(input.is_active.unwrap_or(existing.is_active))
    .bind(template_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(template))
}

/// DELETE /templates/:id — delete a template.
async fn delete_template(
    State(state): State<AppState>,
    Path(template_id): Path<i64>,
) -> Result<StatusCode, ApiErr> {
    let deleted = sqlx::query("DELETE FROM templates WHERE id = ?")
        .bind(template_id)
        .execute(&state.db)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(ApiErr::from(AppError::not_found_with_id(
            "Template",
            template_id.to_string(),
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /templates/preview — render a template body with sample values.
async fn preview_template(
    Json(input): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, ApiErr> {
    let placeholders_used =
        template_engine::validate_content(&input.content).map_err(ApiErr::from)?;

    let vars = template_engine::TemplateVars {
        author: &input.author_name,
        rating: input.rating,
        comment: "",
        location: &input.location_name,
    };

    Ok(Json(PreviewResponse {
        rendered_content: template_engine::render(&input.content, &vars),
        placeholders_used,
    }))
}

async fn fetch_template(state: &AppState, template_id: i64) -> Result<ReplyTemplate, ApiErr> {
    let template: Option<ReplyTemplate> = sqlx::query_as(
        "SELECT id, name, content, rating_min, rating_max, is_active, created_at, updated_at FROM templates WHERE id = ?",
    )
    .bind(template_id)
    .fetch_optional(&state.db)
    .await?;

    template.ok_or_else(|| {
        ApiErr::from(AppError::not_found_with_id(
            "Template",
            template_id.to_string(),
        ))
    })
}
