use std::sync::Arc;

use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/users", post(handlers::users::register_user))
        .route("/api/turfs", get(handlers::turfs::list_turfs))
        .route("/api/turfs/:id", get(handlers::turfs::get_turf))
        .route(
            "/api/turfs/:id/availability",
            get(handlers::turfs::get_availability),
        )
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::bookings::cancel_booking),
        )
        .route("/api/owner/summary", get(handlers::owner::get_summary))
        .route(
            "/api/owner/turfs",
            get(handlers::owner::list_turfs).post(handlers::owner::create_turf),
        )
        .route("/api/owner/turfs/:id", put(handlers::owner::update_turf))
        .route(
            "/api/owner/turfs/:id/bookings",
            get(handlers::owner::turf_bookings),
        )
        .route(
            "/api/owner/bookings/:id/status",
            patch(handlers::owner::update_booking_status),
        )
        .route(
            "/api/owner/bookings/:id/verify-payment",
            post(handlers::owner::verify_payment),
        )
        .route(
            "/api/owner/notifications",
            get(handlers::owner::get_notifications),
        )
        .route(
            "/api/owner/notifications/mark-read",
            post(handlers::owner::mark_notifications_read),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
