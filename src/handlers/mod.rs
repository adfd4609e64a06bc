pub mod bookings;
pub mod health;
pub mod owner;
pub mod turfs;
pub mod users;
