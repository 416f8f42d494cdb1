use std::sync::Arc;

use platform_api::{ApiError, ApiResult};
use tracing::{debug, instrument};

use crate::{
    BookingStore,
    model::{Enrollment, Ticket, TicketStatus, UserId},
};

pub const UNPAID_TICKET_MESSAGE: &str = "Ticket must be paid";

/// What a successful check resolved, for handlers that need more than a yes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Eligibility {
    pub enrollment: Enrollment,
    pub ticket: Ticket,
}

/// Decides whether a user may browse hotel data.
///
/// Checks run in a fixed order and the first failure wins:
///
/// 1. no enrollment: [`ApiError::Unauthorized`]
/// 2. no ticket, or a ticket type without lodging or remote-only:
///    [`ApiError::NotFound`]
/// 3. ticket still reserved: [`ApiError::InvalidData`]
///
/// Missing and ineligible tickets share one outcome on purpose.
#[derive(Clone)]
pub struct EligibilityChecker {
    store: Arc<dyn BookingStore>,
}

impl EligibilityChecker {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    #[instrument(name = "hotels.eligibility", skip(self))]
    pub async fn evaluate(&self, user_id: UserId) -> ApiResult<Eligibility> {
        let Some(enrollment) = self.store.find_enrollment_by_user(user_id).await? else {
            debug!("no enrollment");
            return Err(ApiError::Unauthorized);
        };

        let ticket = match self.store.find_ticket_by_enrollment(enrollment.id).await? {
            Some(ticket) if ticket.ticket_type.grants_hotel_access() => ticket,
            Some(ticket) => {
                debug!(ticket_id = ticket.id, "ticket type excludes hotel");
                return Err(ApiError::NotFound);
            }
            None => {
                debug!(enrollment_id = enrollment.id, "no ticket");
                return Err(ApiError::NotFound);
            }
        };

        match ticket.status {
            TicketStatus::Reserved => {
                debug!(ticket_id = ticket.id, "ticket not paid");
                Err(ApiError::invalid_data([UNPAID_TICKET_MESSAGE]))
            }
            TicketStatus::Paid => Ok(Eligibility { enrollment, ticket }),
        }
    }
}
