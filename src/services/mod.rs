pub mod allocator;
pub mod availability;
pub mod notify;
pub mod slots;
