use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub owner_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub booking_id: Option<String>,
    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingCreated,
    BookingCancelled,
    PaymentVerified,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BookingCreated => "booking_created",
            NotificationKind::BookingCancelled => "booking_cancelled",
            NotificationKind::PaymentVerified => "payment_verified",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "booking_cancelled" => NotificationKind::BookingCancelled,
            "payment_verified" => NotificationKind::PaymentVerified,
            _ => NotificationKind::BookingCreated,
        }
    }
}
