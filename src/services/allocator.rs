use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Booking, BookingStatus, Requester, Turf, TurfStatus};
use crate::services::availability::interval_blocked;
use crate::services::slots::{generate_slots, Slot};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("requested slots are unavailable")]
    SlotUnavailable { conflicting: Vec<String> },

    #[error("invalid slot selection: {0}")]
    InvalidSelection(String),

    #[error("turf not found: {0}")]
    TurfNotFound(String),

    #[error("booking not found: {0}")]
    BookingNotFound(String),

    #[error("booking is {from}, cannot change to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("not allowed to modify this booking")]
    Forbidden,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// One lock per turf id. Commits for the same turf are serial; different
/// turfs proceed independently. This is the only write-side synchronization
/// the booking path needs: the recheck-then-insert sequence runs entirely
/// under the turf's lock, so two racing requests for conflicting ranges can
/// never both pass the recheck.
#[derive(Default)]
pub struct TurfLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TurfLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn for_turf(&self, turf_id: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap();
        map.entry(turf_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub turf_id: String,
    pub date: NaiveDate,
    pub slot_starts: Vec<String>,
    pub user_id: String,
    pub user_name: Option<String>,
    pub phone: Option<String>,
}

/// Validate a slot selection and commit it as a single booking.
///
/// Validation errors (unknown turf, empty or non-contiguous selection) are
/// reported before taking the turf lock. Availability is recomputed from the
/// live booking set inside the lock, never from a caller snapshot, and the
/// booking is inserted in the same critical section.
pub fn request_booking(
    db: &Mutex<Connection>,
    locks: &TurfLocks,
    req: &BookingRequest,
) -> Result<Booking, BookingError> {
    let turf = {
        let conn = db.lock().unwrap();
        queries::get_turf(&conn, &req.turf_id)?
            .ok_or_else(|| BookingError::TurfNotFound(req.turf_id.clone()))?
    };

    resolve_selection(&turf, req)?;

    let lock = locks.for_turf(&req.turf_id);
    let _guard = lock.lock().unwrap();

    let conn = db.lock().unwrap();

    // Re-read inside the critical section: the turf may have been paused or
    // reconfigured, and new bookings may have landed since validation. The
    // selection is resolved again against the fresh grid, so a concurrent
    // hours or slot-duration change cannot commit an off-grid booking.
    let turf = queries::get_turf(&conn, &req.turf_id)?
        .ok_or_else(|| BookingError::TurfNotFound(req.turf_id.clone()))?;
    let selection = resolve_selection(&turf, req)?;

    if turf.status == TurfStatus::Paused {
        return Err(BookingError::SlotUnavailable {
            conflicting: selection.iter().map(slot_label).collect(),
        });
    }

    let pad = Duration::minutes(turf.buffer_mins.max(0));
    let range_start = selection[0].start - pad;
    let range_end = selection[selection.len() - 1].end + pad;
    let existing = queries::get_blocking_bookings(&conn, &turf.id, &range_start, &range_end)?;

    let conflicting: Vec<String> = selection
        .iter()
        .filter(|s| interval_blocked(&existing, turf.buffer_mins, s.start, s.end))
        .map(slot_label)
        .collect();
    if !conflicting.is_empty() {
        return Err(BookingError::SlotUnavailable { conflicting });
    }

    let start_time = selection[0].start;
    let end_time = selection[selection.len() - 1].end;
    let total_mins = (end_time - start_time).num_minutes();
    let now = Utc::now().naive_utc();

    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        turf_id: turf.id.clone(),
        user_id: req.user_id.clone(),
        user_name: req.user_name.clone(),
        phone: req.phone.clone(),
        start_time,
        end_time,
        price: turf.price_per_hour * total_mins / 60,
        status: BookingStatus::Pending,
        payment_verified: false,
        created_at: now,
        updated_at: now,
    };
    queries::create_booking(&conn, &booking)?;

    tracing::info!(
        booking_id = %booking.id,
        turf_id = %booking.turf_id,
        start = %booking.start_time,
        "booking created"
    );
    Ok(booking)
}

/// Map the requested start times onto the turf's slot grid for the date and
/// require a non-empty, contiguous run inside a single operating window.
fn resolve_selection(turf: &Turf, req: &BookingRequest) -> Result<Vec<Slot>, BookingError> {
    if req.slot_starts.is_empty() {
        return Err(BookingError::InvalidSelection(
            "no slots requested".to_string(),
        ));
    }

    let grid = generate_slots(turf, req.date, turf.slot_duration_mins);

    let mut selection = vec![];
    for raw in &req.slot_starts {
        let time = NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| {
            BookingError::InvalidSelection(format!("invalid slot start: {raw}"))
        })?;
        let start = req.date.and_time(time);
        let slot = grid.iter().find(|s| s.start == start).ok_or_else(|| {
            BookingError::InvalidSelection(format!("{raw} is not a bookable slot on this date"))
        })?;
        selection.push(*slot);
    }

    selection.sort_by_key(|s| s.start);
    selection.dedup_by_key(|s| s.start);

    for pair in selection.windows(2) {
        if pair[1].start != pair[0].end {
            return Err(BookingError::InvalidSelection(
                "requested slots must be contiguous".to_string(),
            ));
        }
        // Adjacent windows can produce back-to-back slots; a booking still
        // must not cross the boundary between them.
        if pair[1].window != pair[0].window {
            return Err(BookingError::InvalidSelection(
                "requested slots must fall within a single operating window".to_string(),
            ));
        }
    }
    Ok(selection)
}

fn slot_label(slot: &Slot) -> String {
    slot.start.format("%H:%M").to_string()
}

/// Cancel a pending or confirmed booking. Only the booking's customer or an
/// owner may cancel. The freed range is visible to the next availability
/// read immediately because availability always derives from live status.
pub fn cancel_booking(
    db: &Mutex<Connection>,
    booking_id: &str,
    actor: &Requester,
) -> Result<Booking, BookingError> {
    let conn = db.lock().unwrap();
    let booking = queries::get_booking_by_id(&conn, booking_id)?
        .ok_or_else(|| BookingError::BookingNotFound(booking_id.to_string()))?;

    if !actor.is_owner() && actor.user_id != booking.user_id {
        return Err(BookingError::Forbidden);
    }
    if !booking.status.can_transition_to(BookingStatus::Cancelled) {
        return Err(BookingError::InvalidTransition {
            from: booking.status.as_str().to_string(),
            to: BookingStatus::Cancelled.as_str().to_string(),
        });
    }

    queries::update_booking_status(&conn, booking_id, BookingStatus::Cancelled)?;
    tracing::info!(booking_id = %booking_id, "booking cancelled");

    queries::get_booking_by_id(&conn, booking_id)?
        .ok_or_else(|| BookingError::BookingNotFound(booking_id.to_string()))
}

/// Owner-driven lifecycle change (approve, reject, complete). Enforces the
/// transition graph; terminal bookings never move again.
pub fn transition_status(
    db: &Mutex<Connection>,
    booking_id: &str,
    next: BookingStatus,
) -> Result<Booking, BookingError> {
    let conn = db.lock().unwrap();
    let booking = queries::get_booking_by_id(&conn, booking_id)?
        .ok_or_else(|| BookingError::BookingNotFound(booking_id.to_string()))?;

    if !booking.status.can_transition_to(next) {
        return Err(BookingError::InvalidTransition {
            from: booking.status.as_str().to_string(),
            to: next.as_str().to_string(),
        });
    }

    queries::update_booking_status(&conn, booking_id, next)?;
    tracing::info!(booking_id = %booking_id, status = next.as_str(), "booking status changed");

    queries::get_booking_by_id(&conn, booking_id)?
        .ok_or_else(|| BookingError::BookingNotFound(booking_id.to_string()))
}

/// Mark the payment proof verified. Does not touch the booking status.
pub fn verify_payment(db: &Mutex<Connection>, booking_id: &str) -> Result<Booking, BookingError> {
    let conn = db.lock().unwrap();
    if !queries::set_payment_verified(&conn, booking_id)? {
        return Err(BookingError::BookingNotFound(booking_id.to_string()));
    }

    queries::get_booking_by_id(&conn, booking_id)?
        .ok_or_else(|| BookingError::BookingNotFound(booking_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{OperatingHours, UserRole};
    use chrono::NaiveDate;

    fn setup_db() -> Mutex<Connection> {
        Mutex::new(db::init_db(":memory:").unwrap())
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn seed_turf_with_hours(
        db: &Mutex<Connection>,
        hours_json: &str,
        buffer_mins: i64,
        status: TurfStatus,
    ) -> Turf {
        let now = Utc::now().naive_utc();
        let turf = Turf {
            id: "turf-1".to_string(),
            owner_id: "owner-1".to_string(),
            name: "Green Field".to_string(),
            description: None,
            address: None,
            amenities: vec![],
            turf_type: None,
            price_per_hour: 800,
            max_players: 22,
            hours: OperatingHours::from_json(hours_json).unwrap(),
            buffer_mins,
            slot_duration_mins: 60,
            status,
            created_at: now,
            updated_at: now,
        };
        queries::create_turf(&db.lock().unwrap(), &turf).unwrap();
        turf
    }

    fn seed_turf(db: &Mutex<Connection>, buffer_mins: i64, status: TurfStatus) -> Turf {
        seed_turf_with_hours(
            db,
            r#"{"windows":[{"day_rule":"everyday","start":"06:00","end":"22:00"}]}"#,
            buffer_mins,
            status,
        )
    }

    fn req(starts: &[&str]) -> BookingRequest {
        BookingRequest {
            turf_id: "turf-1".to_string(),
            date: date("2025-10-03"),
            slot_starts: starts.iter().map(|s| s.to_string()).collect(),
            user_id: "u-1".to_string(),
            user_name: Some("Rahul".to_string()),
            phone: Some("9999999999".to_string()),
        }
    }

    #[test]
    fn test_successful_booking_spans_selection() {
        let db = setup_db();
        seed_turf(&db, 15, TurfStatus::Active);
        let locks = TurfLocks::new();

        let booking = request_booking(&db, &locks, &req(&["10:00", "11:00"])).unwrap();
        assert_eq!(booking.start_time.format("%H:%M").to_string(), "10:00");
        assert_eq!(booking.end_time.format("%H:%M").to_string(), "12:00");
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.price, 1600);
        assert!(!booking.payment_verified);
    }

    #[test]
    fn test_unordered_selection_accepted() {
        let db = setup_db();
        seed_turf(&db, 0, TurfStatus::Active);
        let locks = TurfLocks::new();

        let booking = request_booking(&db, &locks, &req(&["11:00", "10:00"])).unwrap();
        assert_eq!(booking.start_time.format("%H:%M").to_string(), "10:00");
        assert_eq!(booking.end_time.format("%H:%M").to_string(), "12:00");
    }

    #[test]
    fn test_empty_selection_rejected() {
        let db = setup_db();
        seed_turf(&db, 0, TurfStatus::Active);
        let locks = TurfLocks::new();

        let err = request_booking(&db, &locks, &req(&[])).unwrap_err();
        assert!(matches!(err, BookingError::InvalidSelection(_)));
    }

    #[test]
    fn test_non_contiguous_selection_rejected() {
        let db = setup_db();
        seed_turf(&db, 0, TurfStatus::Active);
        let locks = TurfLocks::new();

        let err = request_booking(&db, &locks, &req(&["10:00", "12:00"])).unwrap_err();
        assert!(matches!(err, BookingError::InvalidSelection(_)));
    }

    #[test]
    fn test_selection_crossing_adjacent_windows_rejected() {
        let db = setup_db();
        // Back-to-back windows: the 11:00 and 12:00 slots touch but belong
        // to different windows, so booking them together must fail.
        seed_turf_with_hours(
            &db,
            r#"{"windows":[
                {"day_rule":"everyday","start":"09:00","end":"12:00"},
                {"day_rule":"everyday","start":"12:00","end":"17:00"}
            ]}"#,
            0,
            TurfStatus::Active,
        );
        let locks = TurfLocks::new();

        let err = request_booking(&db, &locks, &req(&["11:00", "12:00"])).unwrap_err();
        assert!(matches!(err, BookingError::InvalidSelection(_)));

        // Each side of the boundary is still bookable on its own
        request_booking(&db, &locks, &req(&["11:00"])).unwrap();
        request_booking(&db, &locks, &req(&["12:00"])).unwrap();
    }

    #[test]
    fn test_off_grid_start_rejected() {
        let db = setup_db();
        seed_turf(&db, 0, TurfStatus::Active);
        let locks = TurfLocks::new();

        let err = request_booking(&db, &locks, &req(&["10:30"])).unwrap_err();
        assert!(matches!(err, BookingError::InvalidSelection(_)));
    }

    #[test]
    fn test_unknown_turf_rejected() {
        let db = setup_db();
        let locks = TurfLocks::new();

        let mut request = req(&["10:00"]);
        request.turf_id = "nope".to_string();
        let err = request_booking(&db, &locks, &request).unwrap_err();
        assert!(matches!(err, BookingError::TurfNotFound(_)));
    }

    #[test]
    fn test_conflict_rejected_whole_request() {
        let db = setup_db();
        seed_turf(&db, 15, TurfStatus::Active);
        let locks = TurfLocks::new();

        request_booking(&db, &locks, &req(&["10:00"])).unwrap();

        // 11:00 sits inside the first booking's buffer; 12:00 alone would be
        // fine but the whole request fails as a unit.
        let err = request_booking(&db, &locks, &req(&["11:00", "12:00"])).unwrap_err();
        match err {
            BookingError::SlotUnavailable { conflicting } => {
                assert_eq!(conflicting, vec!["11:00".to_string()]);
            }
            other => panic!("expected SlotUnavailable, got {other:?}"),
        }

        // Nothing partial was written
        let count: i64 = db
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_paused_turf_always_unavailable() {
        let db = setup_db();
        seed_turf(&db, 0, TurfStatus::Paused);
        let locks = TurfLocks::new();

        let err = request_booking(&db, &locks, &req(&["10:00"])).unwrap_err();
        assert!(matches!(err, BookingError::SlotUnavailable { .. }));
    }

    #[test]
    fn test_cancel_frees_slot_for_rebooking() {
        let db = setup_db();
        seed_turf(&db, 15, TurfStatus::Active);
        let locks = TurfLocks::new();

        let booking = request_booking(&db, &locks, &req(&["10:00"])).unwrap();
        assert!(matches!(
            request_booking(&db, &locks, &req(&["10:00"])).unwrap_err(),
            BookingError::SlotUnavailable { .. }
        ));

        let actor = Requester {
            user_id: "u-1".to_string(),
            role: None,
        };
        let cancelled = cancel_booking(&db, &booking.id, &actor).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        request_booking(&db, &locks, &req(&["10:00"])).unwrap();
    }

    #[test]
    fn test_cancel_requires_matching_user_or_owner() {
        let db = setup_db();
        seed_turf(&db, 0, TurfStatus::Active);
        let locks = TurfLocks::new();
        let booking = request_booking(&db, &locks, &req(&["10:00"])).unwrap();

        let stranger = Requester {
            user_id: "someone-else".to_string(),
            role: None,
        };
        assert!(matches!(
            cancel_booking(&db, &booking.id, &stranger).unwrap_err(),
            BookingError::Forbidden
        ));

        let owner = Requester {
            user_id: "someone-else".to_string(),
            role: Some(UserRole::Owner),
        };
        cancel_booking(&db, &booking.id, &owner).unwrap();
    }

    #[test]
    fn test_cancel_terminal_booking_rejected() {
        let db = setup_db();
        seed_turf(&db, 0, TurfStatus::Active);
        let locks = TurfLocks::new();
        let booking = request_booking(&db, &locks, &req(&["10:00"])).unwrap();

        let actor = Requester {
            user_id: "u-1".to_string(),
            role: None,
        };
        cancel_booking(&db, &booking.id, &actor).unwrap();
        assert!(matches!(
            cancel_booking(&db, &booking.id, &actor).unwrap_err(),
            BookingError::InvalidTransition { .. }
        ));
    }

    #[test]
    fn test_transition_graph_enforced() {
        let db = setup_db();
        seed_turf(&db, 0, TurfStatus::Active);
        let locks = TurfLocks::new();
        let booking = request_booking(&db, &locks, &req(&["10:00"])).unwrap();

        // pending -> completed skips confirmation
        assert!(matches!(
            transition_status(&db, &booking.id, BookingStatus::Completed).unwrap_err(),
            BookingError::InvalidTransition { .. }
        ));

        let confirmed = transition_status(&db, &booking.id, BookingStatus::Confirmed).unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        let completed = transition_status(&db, &booking.id, BookingStatus::Completed).unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
    }

    #[test]
    fn test_verify_payment_keeps_status() {
        let db = setup_db();
        seed_turf(&db, 0, TurfStatus::Active);
        let locks = TurfLocks::new();
        let booking = request_booking(&db, &locks, &req(&["10:00"])).unwrap();

        let verified = verify_payment(&db, &booking.id).unwrap();
        assert!(verified.payment_verified);
        assert_eq!(verified.status, BookingStatus::Pending);

        assert!(matches!(
            verify_payment(&db, "missing").unwrap_err(),
            BookingError::BookingNotFound(_)
        ));
    }

    #[test]
    fn test_reconfigured_hours_rechecked_under_lock() {
        let db = Arc::new(setup_db());
        let turf = seed_turf(&db, 0, TurfStatus::Active);
        let locks = Arc::new(TurfLocks::new());

        // Hold the turf lock so the request blocks after its first
        // validation, then shrink the hours out from under it.
        let lock = locks.for_turf("turf-1");
        let guard = lock.lock().unwrap();

        let handle = {
            let db = Arc::clone(&db);
            let locks = Arc::clone(&locks);
            std::thread::spawn(move || request_booking(&db, &locks, &req(&["10:00"])))
        };
        std::thread::sleep(std::time::Duration::from_millis(50));

        let mut reconfigured = turf;
        reconfigured.hours = OperatingHours::from_json(
            r#"{"windows":[{"day_rule":"everyday","start":"14:00","end":"17:00"}]}"#,
        )
        .unwrap();
        queries::update_turf(&db.lock().unwrap(), &reconfigured).unwrap();

        drop(guard);
        let err = handle.join().unwrap().unwrap_err();
        assert!(matches!(err, BookingError::InvalidSelection(_)));
    }

    #[test]
    fn test_racing_requests_one_winner() {
        let db = Arc::new(setup_db());
        seed_turf(&db, 15, TurfStatus::Active);
        let locks = Arc::new(TurfLocks::new());

        let mut handles = vec![];
        for i in 0..2 {
            let db = Arc::clone(&db);
            let locks = Arc::clone(&locks);
            handles.push(std::thread::spawn(move || {
                let mut request = req(&["10:00"]);
                request.user_id = format!("u-{i}");
                request_booking(&db, &locks, &request)
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let losses = results
            .iter()
            .filter(|r| matches!(r, Err(BookingError::SlotUnavailable { .. })))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(losses, 1);
    }
}
