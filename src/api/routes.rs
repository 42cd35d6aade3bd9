use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};

use super::health::health;
use super::metrics::prometheus_metrics;
use super::template::{
    create_template, delete_template, get_template, list_templates, render_template,
};

pub fn api_routes(state: AppState) -> Router<AppState> {
    let templates = Router::new()
        .route(
            "/email-templates",
            get(list_templates).post(create_template),
        )
        .route(
            "/email-templates/{template_id}",
            get(get_template).delete(delete_template),
        )
        .route(
            "/email-templates/{template_id}/render",
            post(render_template),
        )
        .route_layer(middleware::from_fn_with_state(state, api_key_auth));

    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .nest("/api/template-service", templates)
}
