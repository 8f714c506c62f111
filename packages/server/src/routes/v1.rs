use axum::extract::DefaultBodyLimit;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// Headroom above the avatar limit for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/users", user_routes(config))
}

fn user_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let body_limit = config.storage.max_avatar_size as usize + MULTIPART_OVERHEAD;

    OpenApiRouter::new()
        .routes(routes!(
            handlers::user::list_users,
            handlers::user::create_user
        ))
        .routes(routes!(
            handlers::user::get_user,
            handlers::user::update_user,
            handlers::user::delete_user
        ))
        .routes(routes!(
            handlers::avatar::get_avatar,
            handlers::avatar::upload_avatar,
            handlers::avatar::delete_avatar
        ))
        .layer(DefaultBodyLimit::max(body_limit))
}
