//! Caller identity extracted from request headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{CartOwner, CustomerId, SessionId};
use uuid::Uuid;

use crate::error::ApiError;

/// Who is making the request.
///
/// Identity arrives in headers: `x-customer-id` for signed-in customers,
/// `x-session-id` for anonymous shoppers. Authentication itself is handled
/// upstream; this service trusts the gateway-provided headers.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub customer_id: Option<CustomerId>,
    pub session_id: Option<SessionId>,
}

impl RequestContext {
    /// The cart owner for this caller. Customers take precedence over
    /// sessions when both headers are present.
    pub fn owner(&self) -> Result<CartOwner, ApiError> {
        if let Some(customer_id) = self.customer_id {
            Ok(CartOwner::Customer(customer_id))
        } else if let Some(session_id) = self.session_id {
            Ok(CartOwner::Anonymous(session_id))
        } else {
            Err(ApiError::BadRequest(
                "x-customer-id or x-session-id header required".to_string(),
            ))
        }
    }

    /// Requires a signed-in customer (checkout, orders, reviews).
    pub fn require_customer(&self) -> Result<CustomerId, ApiError> {
        self.customer_id
            .ok_or_else(|| ApiError::BadRequest("x-customer-id header required".to_string()))
    }
}

fn parse_uuid_header(parts: &Parts, name: &str) -> Result<Option<Uuid>, ApiError> {
    match parts.headers.get(name) {
        None => Ok(None),
        Some(value) => {
            let text = value
                .to_str()
                .map_err(|_| ApiError::BadRequest(format!("invalid {name} header")))?;
            let uuid = Uuid::parse_str(text)
                .map_err(|e| ApiError::BadRequest(format!("invalid {name} header: {e}")))?;
            Ok(Some(uuid))
        }
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestContext {
            customer_id: parse_uuid_header(parts, "x-customer-id")?.map(CustomerId::from_uuid),
            session_id: parse_uuid_header(parts, "x-session-id")?.map(SessionId::from_uuid),
        })
    }
}
