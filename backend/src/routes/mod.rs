//! Route definitions for the Barn Tracker API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - horses and blanketing
        .nest("/horses", horse_routes(&state))
        .nest("/blanketing", blanketing_routes(&state))
        .nest("/weather", weather_routes(&state))
        // Protected routes - daily tasks
        .nest("/tasks", task_routes(&state))
        // Protected routes - feed room
        .nest("/supplements", supplement_routes(&state))
        .nest("/shavings", shavings_routes(&state))
        // Protected routes - journal
        .nest("/journal", journal_routes(&state))
}

/// Horse routes (protected)
fn horse_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_horses).post(handlers::create_horse))
        .route(
            "/:horse_id",
            get(handlers::get_horse)
                .put(handlers::update_horse)
                .delete(handlers::delete_horse),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Blanketing routes (protected)
fn blanketing_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_barn_blanketing))
        .route("/:horse_id", get(handlers::get_horse_blanketing))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Weather routes (protected)
fn weather_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/current", get(handlers::get_current_weather))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Task routes (protected)
fn task_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_tasks).post(handlers::create_task))
        .route("/export", get(handlers::export_completions))
        .route(
            "/:task_id",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/:task_id/complete", post(handlers::complete_task))
        .route("/:task_id/uncomplete", post(handlers::uncomplete_task))
        .route("/:task_id/history", get(handlers::get_task_history))
        .route("/:task_id/reminder", get(handlers::get_task_reminder))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Supplement routes (protected)
fn supplement_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_supplements).post(handlers::create_supplement),
        )
        .route(
            "/:supplement_id",
            get(handlers::get_supplement)
                .put(handlers::update_supplement)
                .delete(handlers::delete_supplement),
        )
        .route(
            "/:supplement_id/deliveries",
            post(handlers::record_supplement_delivery),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Shavings routes (protected)
fn shavings_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_shavings).put(handlers::update_shavings))
        .route(
            "/deliveries",
            get(handlers::list_shavings_deliveries).post(handlers::record_shavings_delivery),
        )
        .route("/order", post(handlers::place_shavings_order))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Journal routes (protected)
fn journal_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_entries).post(handlers::create_entry))
        .route("/stats", get(handlers::get_journal_stats))
        .route(
            "/:entry_id",
            get(handlers::get_entry)
                .put(handlers::update_entry)
                .delete(handlers::delete_entry),
        )
        .route("/:entry_id/photos", post(handlers::add_photo))
        .route("/:entry_id/audio", post(handlers::add_audio))
        .route(
            "/:entry_id/photos/:photo_id/analyze",
            post(handlers::analyze_photo),
        )
        .route(
            "/:entry_id/audio/:audio_id/transcribe",
            post(handlers::transcribe_audio),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}
