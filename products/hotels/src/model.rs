use chrono::{DateTime, Utc};
use serde::Serialize;

pub type UserId = i32;
pub type EnrollmentId = i32;
pub type HotelId = i32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub name: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TicketStatus {
    Reserved,
    Paid,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketType {
    pub id: i32,
    pub name: String,
    pub is_remote: bool,
    pub includes_hotel: bool,
}

impl TicketType {
    /// Only in-person tickets that bundle lodging grant hotel access.
    pub fn grants_hotel_access(&self) -> bool {
        self.includes_hotel && !self.is_remote
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub id: i32,
    pub enrollment_id: EnrollmentId,
    pub status: TicketStatus,
    pub ticket_type: TicketType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: HotelId,
    pub name: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i32,
    pub name: String,
    pub capacity: i32,
    pub hotel_id: HotelId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A hotel together with its rooms, serialized as the hotel object plus a
/// `Rooms` array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HotelWithRooms {
    #[serde(flatten)]
    pub hotel: Hotel,
    #[serde(rename = "Rooms")]
    pub rooms: Vec<Room>,
}
