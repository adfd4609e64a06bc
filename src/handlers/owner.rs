use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::bookings::notify;
use crate::models::{Booking, BookingStatus, Notification, OperatingHours, Turf, TurfStatus};
use crate::services::allocator;
use crate::services::notify::BookingEvent;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct OwnerQuery {
    pub owner_id: String,
}

// GET /api/owner/summary
#[derive(Serialize)]
pub struct SummaryResponse {
    pub bookings_today: i64,
    pub upcoming_bookings: i64,
    pub pending_approvals: i64,
    pub earnings_today: i64,
    pub earnings_month: i64,
}

pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<SummaryResponse>, AppError> {
    check_auth(&headers, &state.config.owner_token)?;

    let now = chrono::Utc::now().naive_utc();
    let summary = {
        let conn = state.db.lock().unwrap();
        queries::get_owner_summary(&conn, &query.owner_id, &now)?
    };

    Ok(Json(SummaryResponse {
        bookings_today: summary.bookings_today,
        upcoming_bookings: summary.upcoming_bookings,
        pending_approvals: summary.pending_approvals,
        earnings_today: summary.earnings_today,
        earnings_month: summary.earnings_month,
    }))
}

// GET /api/owner/turfs
pub async fn list_turfs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<Vec<Turf>>, AppError> {
    check_auth(&headers, &state.config.owner_token)?;

    let conn = state.db.lock().unwrap();
    let turfs = queries::list_turfs_for_owner(&conn, &query.owner_id)?;
    Ok(Json(turfs))
}

// POST /api/owner/turfs
#[derive(Deserialize)]
pub struct TurfRequest {
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub turf_type: Option<String>,
    pub price_per_hour: i64,
    #[serde(default)]
    pub max_players: i32,
    pub hours: OperatingHours,
    #[serde(default)]
    pub buffer_mins: i64,
    pub slot_duration_mins: Option<i64>,
    pub status: Option<TurfStatus>,
}

fn validate_turf(body: &TurfRequest) -> Result<(), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("turf name is required".to_string()));
    }
    if body.price_per_hour <= 0 {
        return Err(AppError::BadRequest(
            "price_per_hour must be positive".to_string(),
        ));
    }
    if body.buffer_mins < 0 {
        return Err(AppError::BadRequest(
            "buffer_mins must not be negative".to_string(),
        ));
    }
    if body.slot_duration_mins.is_some_and(|d| d <= 0) {
        return Err(AppError::BadRequest(
            "slot_duration_mins must be positive".to_string(),
        ));
    }
    body.hours
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(())
}

pub async fn create_turf(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TurfRequest>,
) -> Result<(StatusCode, Json<Turf>), AppError> {
    check_auth(&headers, &state.config.owner_token)?;
    validate_turf(&body)?;

    let now = chrono::Utc::now().naive_utc();
    let turf = Turf {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: body.owner_id,
        name: body.name,
        description: body.description,
        address: body.address,
        amenities: body.amenities,
        turf_type: body.turf_type,
        price_per_hour: body.price_per_hour,
        max_players: body.max_players,
        hours: body.hours,
        buffer_mins: body.buffer_mins,
        slot_duration_mins: body
            .slot_duration_mins
            .unwrap_or(crate::models::DEFAULT_SLOT_DURATION_MINS),
        status: body.status.unwrap_or(TurfStatus::Active),
        created_at: now,
        updated_at: now,
    };

    {
        let conn = state.db.lock().unwrap();
        queries::create_turf(&conn, &turf)?;
    }

    tracing::info!(turf_id = %turf.id, owner_id = %turf.owner_id, "turf created");
    Ok((StatusCode::CREATED, Json(turf)))
}

// PUT /api/owner/turfs/:id
pub async fn update_turf(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<TurfRequest>,
) -> Result<Json<Turf>, AppError> {
    check_auth(&headers, &state.config.owner_token)?;
    validate_turf(&body)?;

    let conn = state.db.lock().unwrap();
    let existing = queries::get_turf(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("turf {id}")))?;

    let turf = Turf {
        id: existing.id,
        owner_id: existing.owner_id,
        name: body.name,
        description: body.description,
        address: body.address,
        amenities: body.amenities,
        turf_type: body.turf_type,
        price_per_hour: body.price_per_hour,
        max_players: body.max_players,
        hours: body.hours,
        buffer_mins: body.buffer_mins,
        slot_duration_mins: body
            .slot_duration_mins
            .unwrap_or(existing.slot_duration_mins),
        status: body.status.unwrap_or(existing.status),
        created_at: existing.created_at,
        updated_at: chrono::Utc::now().naive_utc(),
    };
    queries::update_turf(&conn, &turf)?;

    Ok(Json(turf))
}

// GET /api/owner/turfs/:id/bookings
pub async fn turf_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.owner_token)?;

    let conn = state.db.lock().unwrap();
    queries::get_turf(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("turf {id}")))?;
    let bookings = queries::list_bookings_for_turf(&conn, &id, 100)?;
    Ok(Json(bookings))
}

// PATCH /api/owner/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: BookingStatus,
}

pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.owner_token)?;

    let booking = allocator::transition_status(&state.db, &id, body.status)?;

    if body.status == BookingStatus::Cancelled {
        notify(&state, |turf, b| BookingEvent::cancelled(turf, b), &booking).await;
    }

    Ok(Json(booking))
}

// POST /api/owner/bookings/:id/verify-payment
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.owner_token)?;

    let booking = allocator::verify_payment(&state.db, &id)?;
    notify(&state, |turf, b| BookingEvent::payment_verified(turf, b), &booking).await;

    Ok(Json(booking))
}

// GET /api/owner/notifications
pub async fn get_notifications(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    check_auth(&headers, &state.config.owner_token)?;

    let conn = state.db.lock().unwrap();
    let notifications = queries::list_notifications(&conn, &query.owner_id, 50)?;
    Ok(Json(notifications))
}

// POST /api/owner/notifications/mark-read
#[derive(Deserialize)]
pub struct MarkReadRequest {
    pub owner_id: String,
}

pub async fn mark_notifications_read(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<MarkReadRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.owner_token)?;

    let updated = {
        let conn = state.db.lock().unwrap();
        queries::mark_notifications_read(&conn, &body.owner_id)?
    };
    Ok(Json(serde_json::json!({ "ok": true, "updated": updated })))
}
