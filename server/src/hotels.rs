use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use platform_api::{ApiError, ApiResult};
use products_hotels::{Hotel, HotelWithRooms, parse_hotel_id};
use tracing::{debug, instrument};

use crate::{auth::AuthUser, http::AppState};

#[instrument(name = "http.hotels.list", skip_all, fields(user_id = user.id))]
pub async fn list_hotels(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Hotel>>> {
    state.eligibility.evaluate(user.id).await?;
    let hotels = state.catalog.list_hotels().await?;
    Ok(Json(hotels))
}

#[instrument(name = "http.hotels.rooms", skip_all, fields(user_id = user.id))]
pub async fn show_hotel_rooms(
    State(state): State<AppState>,
    user: AuthUser,
    raw_id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<HotelWithRooms>> {
    state.eligibility.evaluate(user.id).await?;
    // Ids that do not even decode are treated like unknown hotels.
    let Path(raw_id) = raw_id.map_err(|rejection| {
        debug!(%rejection, "undecodable hotel id");
        ApiError::NotFound
    })?;
    let hotel_id = parse_hotel_id(&raw_id)?;
    let hotel = state.catalog.list_rooms(hotel_id).await?;
    Ok(Json(hotel))
}
