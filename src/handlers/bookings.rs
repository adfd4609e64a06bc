use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, Requester};
use crate::services::allocator::{self, BookingRequest};
use crate::services::notify::BookingEvent;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub turf_id: String,
    pub date: String,
    pub slot_starts: Vec<String>,
    pub user_id: String,
    pub user_name: Option<String>,
    pub phone: Option<String>,
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let date = NaiveDate::parse_from_str(&body.date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date: {}", body.date)))?;

    let request = BookingRequest {
        turf_id: body.turf_id,
        date,
        slot_starts: body.slot_starts,
        user_id: body.user_id,
        user_name: body.user_name,
        phone: body.phone,
    };
    let booking = allocator::request_booking(&state.db, &state.turf_locks, &request)?;

    notify(&state, |turf, booking| BookingEvent::created(turf, booking), &booking).await;

    Ok((StatusCode::CREATED, Json(booking)))
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(actor): Json<Requester>,
) -> Result<Json<Booking>, AppError> {
    let booking = allocator::cancel_booking(&state.db, &id, &actor)?;

    notify(&state, |turf, booking| BookingEvent::cancelled(turf, booking), &booking).await;

    Ok(Json(booking))
}

/// Look up the turf and fan out a transition event. Dispatch failures are
/// logged, never surfaced: the booking change itself already committed.
pub(crate) async fn notify<F>(state: &Arc<AppState>, make_event: F, booking: &Booking)
where
    F: FnOnce(&crate::models::Turf, &Booking) -> BookingEvent,
{
    let turf = {
        let conn = state.db.lock().unwrap();
        queries::get_turf(&conn, &booking.turf_id).ok().flatten()
    };
    let Some(turf) = turf else {
        return;
    };

    let event = make_event(&turf, booking);
    if let Err(e) = state.notifier.dispatch(&event).await {
        tracing::warn!(error = %e, booking_id = %booking.id, "failed to dispatch notification");
    }
}
