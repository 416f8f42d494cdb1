use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use entity::{enrollments, hotels, rooms, sessions, ticket_types, tickets};
use platform_authn::SessionStore;
use products_hotels::{
    BookingStore, Enrollment, EnrollmentId, Hotel, HotelId, HotelWithRooms, Room, Ticket,
    TicketStatus, TicketType, UserId,
};
use sea_orm::{
    ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::DbPool;

/// sea-orm backed implementation of the booking and session ports.
#[derive(Clone)]
pub struct SeaOrmStore {
    pool: DbPool,
}

impl SeaOrmStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl BookingStore for SeaOrmStore {
    async fn find_enrollment_by_user(&self, user_id: UserId) -> Result<Option<Enrollment>> {
        let row = enrollments::Entity::find()
            .filter(enrollments::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await
            .with_context(|| format!("loading enrollment for user {user_id}"))?;
        Ok(row.map(enrollment_from_row))
    }

    async fn find_ticket_by_enrollment(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Option<Ticket>> {
        let row = tickets::Entity::find()
            .filter(tickets::Column::EnrollmentId.eq(enrollment_id))
            .order_by_desc(tickets::Column::CreatedAt)
            .find_also_related(ticket_types::Entity)
            .one(&self.pool)
            .await
            .with_context(|| format!("loading ticket for enrollment {enrollment_id}"))?;
        let Some((ticket, ticket_type)) = row else {
            return Ok(None);
        };
        let ticket_type = ticket_type.ok_or_else(|| {
            anyhow!(
                "ticket {} references missing ticket type {}",
                ticket.id,
                ticket.ticket_type_id
            )
        })?;
        Ok(Some(ticket_from_rows(ticket, ticket_type)))
    }

    async fn find_all_hotels(&self) -> Result<Vec<Hotel>> {
        let rows = hotels::Entity::find()
            .order_by_asc(hotels::Column::Id)
            .all(&self.pool)
            .await
            .context("loading hotels")?;
        Ok(rows.into_iter().map(hotel_from_row).collect())
    }

    async fn find_rooms_by_hotel(&self, hotel_id: HotelId) -> Result<Option<HotelWithRooms>> {
        let Some(hotel) = hotels::Entity::find_by_id(hotel_id)
            .one(&self.pool)
            .await
            .with_context(|| format!("loading hotel {hotel_id}"))?
        else {
            return Ok(None);
        };
        let rooms = hotel
            .find_related(rooms::Entity)
            .order_by_asc(rooms::Column::Id)
            .all(&self.pool)
            .await
            .with_context(|| format!("loading rooms for hotel {hotel_id}"))?;
        Ok(Some(HotelWithRooms {
            hotel: hotel_from_row(hotel),
            rooms: rooms.into_iter().map(room_from_row).collect(),
        }))
    }
}

#[async_trait]
impl SessionStore for SeaOrmStore {
    async fn session_exists(&self, token: &str) -> Result<bool> {
        let count = sessions::Entity::find()
            .filter(sessions::Column::Token.eq(token))
            .count(&self.pool)
            .await
            .context("looking up session")?;
        Ok(count > 0)
    }
}

fn enrollment_from_row(row: enrollments::Model) -> Enrollment {
    Enrollment {
        id: row.id,
        user_id: row.user_id,
        name: row.name,
    }
}

fn ticket_from_rows(ticket: tickets::Model, ticket_type: ticket_types::Model) -> Ticket {
    Ticket {
        id: ticket.id,
        enrollment_id: ticket.enrollment_id,
        status: match ticket.status {
            tickets::Status::Reserved => TicketStatus::Reserved,
            tickets::Status::Paid => TicketStatus::Paid,
        },
        ticket_type: TicketType {
            id: ticket_type.id,
            name: ticket_type.name,
            is_remote: ticket_type.is_remote,
            includes_hotel: ticket_type.includes_hotel,
        },
    }
}

fn hotel_from_row(row: hotels::Model) -> Hotel {
    Hotel {
        id: row.id,
        name: row.name,
        image: row.image,
        created_at: row.created_at.with_timezone(&Utc),
        updated_at: row.updated_at.with_timezone(&Utc),
    }
}

fn room_from_row(row: rooms::Model) -> Room {
    Room {
        id: row.id,
        name: row.name,
        capacity: row.capacity,
        hotel_id: row.hotel_id,
        created_at: row.created_at.with_timezone(&Utc),
        updated_at: row.updated_at.with_timezone(&Utc),
    }
}
