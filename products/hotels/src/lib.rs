//! Hotel catalog slice.
//!
//! [`EligibilityChecker`] decides whether a user may see hotel data and
//! [`CatalogReader`] serves the catalog once that decision is positive. Both
//! read through an injected [`BookingStore`].

mod catalog;
mod eligibility;
mod model;
mod store;

pub use catalog::{CatalogReader, parse_hotel_id};
pub use eligibility::{Eligibility, EligibilityChecker, UNPAID_TICKET_MESSAGE};
pub use model::{
    Enrollment, EnrollmentId, Hotel, HotelId, HotelWithRooms, Room, Ticket, TicketStatus,
    TicketType, UserId,
};
pub use store::BookingStore;

#[cfg(test)]
pub(crate) mod testing;
