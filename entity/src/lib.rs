//! sea-orm models for the hotel gateway tables.

pub mod enrollments;
pub mod hotels;
pub mod rooms;
pub mod sessions;
pub mod ticket_types;
pub mod tickets;
pub mod users;
