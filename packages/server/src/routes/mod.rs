use axum::extract::DefaultBodyLimit;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::ServerConfig;
use crate::handlers;
use crate::state::AppState;

pub fn app_routes(config: &ServerConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::home::home))
        .routes(routes!(handlers::home::health))
        .routes(routes!(handlers::session::logout))
        .nest("/files", file_routes(config))
}

fn file_routes(config: &ServerConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::experiment::new_experiment_form,
            handlers::experiment::create_experiment
        ))
        .routes(routes!(handlers::files::list_files))
        .routes(routes!(handlers::files::view_file))
        .routes(routes!(handlers::files::download_file))
        .layer(DefaultBodyLimit::max(config.max_upload_size))
}
