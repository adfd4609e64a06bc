pub mod booking;
pub mod notification;
pub mod turf;
pub mod user;

pub use booking::{Booking, BookingStatus};
pub use notification::{Notification, NotificationKind};
pub use turf::{OperatingHours, OperatingWindow, Turf, TurfStatus, DEFAULT_SLOT_DURATION_MINS};
pub use user::{Requester, User, UserRole};
