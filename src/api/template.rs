//! Email template endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::Result;
use crate::server::AppState;
use crate::template::{CreateEmailTemplateRequest, EmailTemplate, RenderRequest, RenderedEmail};

#[derive(Debug, Default, Deserialize)]
pub struct ListTemplatesQuery {
    /// Only return templates with exactly this name
    pub name: Option<String>,
}

/// GET /api/template-service/email-templates - List email templates
#[tracing::instrument(name = "http.list_email_templates", skip(state))]
pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<Json<Vec<EmailTemplate>>> {
    let templates = state.template_store.list(query.name.as_deref()).await?;
    Ok(Json(templates))
}

/// GET /api/template-service/email-templates/{template_id} - Get a specific template
#[tracing::instrument(name = "http.get_email_template", skip(state))]
pub async fn get_template(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
) -> Result<Json<EmailTemplate>> {
    let template = state.template_store.get(&template_id).await?;
    Ok(Json(template))
}

/// POST /api/template-service/email-templates - Create a new template
#[tracing::instrument(name = "http.create_email_template", skip(state, body))]
pub async fn create_template(
    State(state): State<AppState>,
    body: std::result::Result<Json<CreateEmailTemplateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EmailTemplate>)> {
    let Json(request) = body?;
    let template = request.into_template()?;

    let created = state.template_store.create(template).await?;

    tracing::info!(
        template_id = %created.id,
        name = %created.name,
        "Email template created"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/template-service/email-templates/{template_id} - Delete a template
#[tracing::instrument(name = "http.delete_email_template", skip(state))]
pub async fn delete_template(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
) -> Result<StatusCode> {
    state.template_store.delete(&template_id).await?;

    tracing::info!(template_id = %template_id, "Email template deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/template-service/email-templates/{template_id}/render - Substitute tokens
#[tracing::instrument(name = "http.render_email_template", skip(state, body))]
pub async fn render_template(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
    body: std::result::Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Json<RenderedEmail>> {
    let Json(request) = body?;

    let template = state.template_store.get(&template_id).await?;
    let rendered = template.render(&request.substitutions)?;

    Ok(Json(rendered))
}
