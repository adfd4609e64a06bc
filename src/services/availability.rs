use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{Booking, Turf, TurfStatus};
use crate::services::slots::{generate_slots, Slot};

#[derive(Debug, Clone, Serialize)]
pub struct SlotAvailability {
    #[serde(flatten)]
    pub slot: Slot,
    pub free: bool,
}

/// Whether `[start, end)` intersects any live booking's interval padded by
/// `buffer_mins` on both sides. Cancelled and completed bookings never block.
pub fn interval_blocked(
    bookings: &[Booking],
    buffer_mins: i64,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> bool {
    let buffer = Duration::minutes(buffer_mins.max(0));
    bookings.iter().any(|b| {
        b.status.blocks_slots() && start < b.end_time + buffer && end > b.start_time - buffer
    })
}

/// Classify every slot on the turf's grid for `date` as free or blocked.
///
/// Pure over its inputs: the result depends only on the turf configuration
/// and the booking set passed in. A paused turf blocks everything.
pub fn compute_availability(
    turf: &Turf,
    date: NaiveDate,
    bookings: &[Booking],
    slot_duration_mins: i64,
) -> Vec<SlotAvailability> {
    let relevant: Vec<Booking> = bookings
        .iter()
        .filter(|b| b.turf_id == turf.id)
        .cloned()
        .collect();

    generate_slots(turf, date, slot_duration_mins)
        .into_iter()
        .map(|slot| {
            let free = turf.status != TurfStatus::Paused
                && !interval_blocked(&relevant, turf.buffer_mins, slot.start, slot.end);
            SlotAvailability { slot, free }
        })
        .collect()
}
