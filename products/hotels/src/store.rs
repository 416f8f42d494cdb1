use anyhow::Result;
use async_trait::async_trait;

use crate::model::{Enrollment, EnrollmentId, Hotel, HotelId, HotelWithRooms, Ticket, UserId};

/// Read access to the records the hotel slice classifies and serves.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_enrollment_by_user(&self, user_id: UserId) -> Result<Option<Enrollment>>;

    /// The enrollment's ticket joined with its ticket type.
    async fn find_ticket_by_enrollment(&self, enrollment_id: EnrollmentId)
    -> Result<Option<Ticket>>;

    async fn find_all_hotels(&self) -> Result<Vec<Hotel>>;

    /// `None` when no hotel has this id. A hotel without rooms yields
    /// `Some` with an empty room list.
    async fn find_rooms_by_hotel(&self, hotel_id: HotelId) -> Result<Option<HotelWithRooms>>;
}
