//! Demo fixtures for local development.

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use entity::{enrollments, hotels, rooms, sessions, ticket_types, tickets, users};
use platform_authn::{AuthConfig, issue_token};
use platform_db::DbPool;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::info;

const DEMO_EMAIL: &str = "demo@hotel-gateway.test";

#[derive(Debug)]
pub struct SeedReport {
    pub user_id: i32,
    pub token: String,
    pub created_fixtures: bool,
}

/// Creates the demo user with a paid hotel ticket and two hotels, one of them
/// without rooms. Re-running only opens a fresh session for the demo user.
pub async fn run(pool: &DbPool, auth: &AuthConfig) -> Result<SeedReport> {
    let txn = pool.begin().await?;
    let existing = users::Entity::find()
        .filter(users::Column::Email.eq(DEMO_EMAIL))
        .one(&txn)
        .await?;
    let (user_id, created_fixtures) = match existing {
        Some(user) => (user.id, false),
        None => {
            let user = insert_user(&txn, DEMO_EMAIL).await?;
            let enrollment = insert_enrollment(&txn, user.id, "12345678909").await?;
            insert_ticket(&txn, enrollment.id, true, false, tickets::Status::Paid).await?;
            insert_hotel(
                &txn,
                "Driven Resort",
                &[("101", 1), ("102", 2), ("201", 3)],
            )
            .await?;
            insert_hotel(&txn, "Driven Palace", &[]).await?;
            (user.id, true)
        }
    };
    let token = open_session(&txn, user_id, auth).await?;
    txn.commit().await?;
    info!(user_id, created_fixtures, "seed complete");
    Ok(SeedReport {
        user_id,
        token,
        created_fixtures,
    })
}

pub(crate) async fn insert_user<C: ConnectionTrait>(db: &C, email: &str) -> Result<users::Model> {
    let now = Utc::now();
    users::ActiveModel {
        email: Set(email.to_string()),
        password: Set("!".into()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .with_context(|| format!("inserting user {email}"))
}

pub(crate) async fn insert_enrollment<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    cpf: &str,
) -> Result<enrollments::Model> {
    let now = Utc::now();
    let birthday = Utc
        .with_ymd_and_hms(1990, 5, 17, 0, 0, 0)
        .single()
        .unwrap_or(now);
    enrollments::ActiveModel {
        name: Set("Demo Guest".into()),
        cpf: Set(cpf.to_string()),
        birthday: Set(birthday.into()),
        phone: Set("(21) 98999-9999".into()),
        user_id: Set(user_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .with_context(|| format!("inserting enrollment for user {user_id}"))
}

pub(crate) async fn insert_ticket<C: ConnectionTrait>(
    db: &C,
    enrollment_id: i32,
    includes_hotel: bool,
    is_remote: bool,
    status: tickets::Status,
) -> Result<tickets::Model> {
    let now = Utc::now();
    let name = match (is_remote, includes_hotel) {
        (true, _) => "Online",
        (false, true) => "Presencial + Hotel",
        (false, false) => "Presencial",
    };
    let ticket_type = ticket_types::ActiveModel {
        name: Set(name.into()),
        price: Set(if includes_hotel { 600 } else { 250 }),
        is_remote: Set(is_remote),
        includes_hotel: Set(includes_hotel),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .context("inserting ticket type")?;
    tickets::ActiveModel {
        ticket_type_id: Set(ticket_type.id),
        enrollment_id: Set(enrollment_id),
        status: Set(status),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .with_context(|| format!("inserting ticket for enrollment {enrollment_id}"))
}

pub(crate) async fn insert_hotel<C: ConnectionTrait>(
    db: &C,
    name: &str,
    room_specs: &[(&str, i32)],
) -> Result<hotels::Model> {
    let now = Utc::now();
    let hotel = hotels::ActiveModel {
        name: Set(name.to_string()),
        image: Set(format!(
            "https://images.hotel-gateway.test/{}.jpg",
            name.to_lowercase().replace(' ', "-")
        )),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .with_context(|| format!("inserting hotel {name}"))?;
    for (room_name, capacity) in room_specs {
        rooms::ActiveModel {
            name: Set((*room_name).to_string()),
            capacity: Set(*capacity),
            hotel_id: Set(hotel.id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(db)
        .await
        .with_context(|| format!("inserting room {room_name} for hotel {}", hotel.id))?;
    }
    Ok(hotel)
}

/// Issues a token for the user and stores it as a session.
pub(crate) async fn open_session<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    auth: &AuthConfig,
) -> Result<String> {
    let token = issue_token(user_id, auth).context("signing session token")?;
    let now = Utc::now();
    sessions::ActiveModel {
        user_id: Set(user_id),
        token: Set(token.clone()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .with_context(|| format!("opening session for user {user_id}"))?;
    Ok(token)
}
