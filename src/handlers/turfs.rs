use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Turf;
use crate::services::availability::{compute_availability, SlotAvailability};
use crate::state::AppState;

// GET /api/turfs
#[derive(Deserialize)]
pub struct BrowseQuery {
    pub q: Option<String>,
    pub location: Option<String>,
    pub turf_type: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort: Option<String>,
}

pub async fn list_turfs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<Vec<Turf>>, AppError> {
    let mut turfs = {
        let conn = state.db.lock().unwrap();
        queries::list_active_turfs(&conn)?
    };

    if let Some(q) = &query.q {
        let needle = q.to_lowercase();
        turfs.retain(|t| {
            t.name.to_lowercase().contains(&needle)
                || t.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        });
    }
    if let Some(location) = &query.location {
        let needle = location.to_lowercase();
        turfs.retain(|t| {
            t.address
                .as_deref()
                .is_some_and(|a| a.to_lowercase().contains(&needle))
        });
    }
    if let Some(turf_type) = &query.turf_type {
        turfs.retain(|t| t.turf_type.as_deref() == Some(turf_type.as_str()));
    }
    if let Some(min) = query.min_price {
        turfs.retain(|t| t.price_per_hour >= min);
    }
    if let Some(max) = query.max_price {
        turfs.retain(|t| t.price_per_hour <= max);
    }

    match query.sort.as_deref() {
        Some("price_asc") => turfs.sort_by_key(|t| t.price_per_hour),
        Some("price_desc") => turfs.sort_by_key(|t| std::cmp::Reverse(t.price_per_hour)),
        _ => {}
    }

    Ok(Json(turfs))
}

// GET /api/turfs/:id
pub async fn get_turf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Turf>, AppError> {
    let conn = state.db.lock().unwrap();
    let turf = queries::get_turf(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("turf {id}")))?;
    Ok(Json(turf))
}

// GET /api/turfs/:id/availability?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub turf_id: String,
    pub date: String,
    pub slot_duration_mins: i64,
    pub slots: Vec<SlotAvailability>,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date: {}", query.date)))?;

    let conn = state.db.lock().unwrap();
    let turf = queries::get_turf(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("turf {id}")))?;

    // Pad the day by the buffer so bookings just across midnight still block
    let pad = Duration::minutes(turf.buffer_mins.max(0));
    let day_start = date.and_time(chrono::NaiveTime::MIN);
    let range_start = day_start - pad;
    let range_end = day_start + Duration::days(1) + pad;
    let bookings = queries::get_blocking_bookings(&conn, &turf.id, &range_start, &range_end)?;

    let slots = compute_availability(&turf, date, &bookings, turf.slot_duration_mins);
    Ok(Json(AvailabilityResponse {
        turf_id: turf.id.clone(),
        date: query.date,
        slot_duration_mins: turf.slot_duration_mins,
        slots,
    }))
}
