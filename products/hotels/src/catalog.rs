use std::sync::Arc;

use platform_api::{ApiError, ApiResult};
use tracing::{debug, instrument};

use crate::{
    BookingStore,
    model::{Hotel, HotelId, HotelWithRooms},
};

/// Parses a hotel id taken from a request path.
///
/// Anything that is not a positive integer is reported as
/// [`ApiError::NotFound`], the same as an id no hotel carries.
pub fn parse_hotel_id(raw: &str) -> ApiResult<HotelId> {
    match raw.trim().parse::<HotelId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::NotFound),
    }
}

/// Serves the hotel catalog. Callers check eligibility first.
#[derive(Clone)]
pub struct CatalogReader {
    store: Arc<dyn BookingStore>,
}

impl CatalogReader {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    #[instrument(name = "hotels.list", skip(self))]
    pub async fn list_hotels(&self) -> ApiResult<Vec<Hotel>> {
        Ok(self.store.find_all_hotels().await?)
    }

    /// An existing hotel without rooms is returned with an empty room list;
    /// only an unknown hotel is `NotFound`.
    #[instrument(name = "hotels.rooms", skip(self))]
    pub async fn list_rooms(&self, hotel_id: HotelId) -> ApiResult<HotelWithRooms> {
        match self.store.find_rooms_by_hotel(hotel_id).await? {
            Some(hotel) => Ok(hotel),
            None => {
                debug!("hotel does not exist");
                Err(ApiError::NotFound)
            }
        }
    }
}
