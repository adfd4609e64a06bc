use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Booking, NotificationKind, Turf};

/// A booking state transition worth telling the turf owner about.
#[derive(Debug, Clone)]
pub struct BookingEvent {
    pub owner_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub booking_id: String,
}

impl BookingEvent {
    pub fn created(turf: &Turf, booking: &Booking) -> Self {
        let who = booking.user_name.as_deref().unwrap_or("A player");
        Self {
            owner_id: turf.owner_id.clone(),
            kind: NotificationKind::BookingCreated,
            title: "New booking request".to_string(),
            body: format!(
                "{who} requested {} - {} at {}",
                booking.start_time.format("%H:%M"),
                booking.end_time.format("%H:%M"),
                turf.name
            ),
            booking_id: booking.id.clone(),
        }
    }

    pub fn cancelled(turf: &Turf, booking: &Booking) -> Self {
        let who = booking.user_name.as_deref().unwrap_or("A player");
        Self {
            owner_id: turf.owner_id.clone(),
            kind: NotificationKind::BookingCancelled,
            title: "Booking cancelled".to_string(),
            body: format!(
                "{who} cancelled {} on {} at {}",
                booking.start_time.format("%H:%M"),
                booking.start_time.format("%b %-d"),
                turf.name
            ),
            booking_id: booking.id.clone(),
        }
    }

    pub fn payment_verified(turf: &Turf, booking: &Booking) -> Self {
        Self {
            owner_id: turf.owner_id.clone(),
            kind: NotificationKind::PaymentVerified,
            title: "Payment verified".to_string(),
            body: format!(
                "Payment for {} on {} was verified",
                turf.name,
                booking.start_time.format("%b %-d"),
            ),
            booking_id: booking.id.clone(),
        }
    }
}

/// Fan-out seam for booking transitions. The default implementation writes
/// to the owner's notification inbox; tests substitute a recorder.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, event: &BookingEvent) -> anyhow::Result<()>;
}

pub struct InboxDispatcher {
    db: Arc<Mutex<Connection>>,
}

impl InboxDispatcher {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationDispatcher for InboxDispatcher {
    async fn dispatch(&self, event: &BookingEvent) -> anyhow::Result<()> {
        let conn = self.db.lock().unwrap();
        queries::insert_notification(
            &conn,
            &event.owner_id,
            event.kind,
            &event.title,
            &event.body,
            Some(&event.booking_id),
        )?;
        Ok(())
    }
}
