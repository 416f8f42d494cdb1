use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::{
    BookingStore,
    model::{
        Enrollment, EnrollmentId, Hotel, HotelId, HotelWithRooms, Room, Ticket, TicketStatus,
        TicketType, UserId,
    },
};

#[derive(Default)]
pub struct MemoryStore {
    enrollments: Vec<Enrollment>,
    tickets: Vec<Ticket>,
    hotels: Vec<Hotel>,
    rooms: Vec<Room>,
    fail_reads: bool,
    reads: AtomicUsize,
    ticket_lookups: Mutex<Vec<EnrollmentId>>,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub fn with_enrollment(mut self, user_id: UserId) -> Self {
        let id = user_id * 10;
        self.enrollments.push(Enrollment {
            id,
            user_id,
            name: format!("user-{user_id}"),
        });
        self
    }

    pub fn with_ticket(
        mut self,
        user_id: UserId,
        includes_hotel: bool,
        is_remote: bool,
        status: TicketStatus,
    ) -> Self {
        let enrollment_id = user_id * 10;
        self.tickets.push(Ticket {
            id: enrollment_id + 1,
            enrollment_id,
            status,
            ticket_type: TicketType {
                id: 1,
                name: "ticket type".into(),
                is_remote,
                includes_hotel,
            },
        });
        self
    }

    pub fn with_hotel(mut self, id: HotelId, room_count: i32) -> Self {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        self.hotels.push(Hotel {
            id,
            name: format!("Hotel {id}"),
            image: format!("https://img.test/{id}.png"),
            created_at: at,
            updated_at: at,
        });
        for n in 0..room_count {
            self.rooms.push(Room {
                id: id * 100 + n,
                name: format!("{}", 100 + n),
                capacity: 2 + n % 2,
                hotel_id: id,
                created_at: at,
                updated_at: at,
            });
        }
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn ticket_lookups(&self) -> Vec<EnrollmentId> {
        self.ticket_lookups.lock().unwrap().clone()
    }

    fn read(&self) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            bail!("simulated read failure");
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_enrollment_by_user(&self, user_id: UserId) -> Result<Option<Enrollment>> {
        self.read()?;
        Ok(self
            .enrollments
            .iter()
            .find(|e| e.user_id == user_id)
            .cloned())
    }

    async fn find_ticket_by_enrollment(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Option<Ticket>> {
        self.read()?;
        self.ticket_lookups.lock().unwrap().push(enrollment_id);
        Ok(self
            .tickets
            .iter()
            .find(|t| t.enrollment_id == enrollment_id)
            .cloned())
    }

    async fn find_all_hotels(&self) -> Result<Vec<Hotel>> {
        self.read()?;
        Ok(self.hotels.clone())
    }

    async fn find_rooms_by_hotel(&self, hotel_id: HotelId) -> Result<Option<HotelWithRooms>> {
        self.read()?;
        Ok(self
            .hotels
            .iter()
            .find(|h| h.id == hotel_id)
            .map(|hotel| HotelWithRooms {
                hotel: hotel.clone(),
                rooms: self
                    .rooms
                    .iter()
                    .filter(|r| r.hotel_id == hotel_id)
                    .cloned()
                    .collect(),
            }))
    }
}
