//! Caller identity extractor
//!
//! The upstream auth layer sets `x-customer-id` for logged-in customers.
//! Guests are recognised by the `x-device-id` fingerprint their client
//! sends. Neither is authenticated here; only the session token is.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use http::request::Parts;
use shared::error::AppError;
use shared::models::{GuestInfo, SessionOwner, TableSession};

pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";
pub const DEVICE_ID_HEADER: &str = "x-device-id";
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";
pub const SESSION_COOKIE: &str = "table_session";

/// Who is making the request
#[derive(Debug, Clone, Default)]
pub struct CallerIdentity {
    pub customer_id: Option<i64>,
    pub device_id: Option<String>,
    pub ip_address: Option<String>,
    /// Raw session token; never log it
    pub session_token: Option<String>,
}

impl CallerIdentity {
    /// Owner to record on a session opened by this caller.
    ///
    /// `None` when the caller is neither a customer nor carries a device id.
    pub fn as_owner(&self) -> Option<SessionOwner> {
        if let Some(customer_id) = self.customer_id {
            return Some(SessionOwner::Customer { customer_id });
        }
        self.device_id.as_ref().map(|device_id| {
            SessionOwner::Guest(GuestInfo {
                device_id: device_id.clone(),
                ip_address: self.ip_address.clone(),
            })
        })
    }

    /// Ownership match: same customer when both sides have one, otherwise
    /// same guest device. Heuristic for guests.
    pub fn owns(&self, session: &TableSession) -> bool {
        if let (Some(mine), Some(theirs)) = (self.customer_id, session.customer_id) {
            return mine == theirs;
        }
        match (&self.device_id, &session.guest_device_id) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => false,
        }
    }
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer_id = match header_str(parts, CUSTOMER_ID_HEADER) {
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                AppError::invalid_request(format!("Malformed {CUSTOMER_ID_HEADER} header"))
            })?),
            None => None,
        };

        let device_id = header_str(parts, DEVICE_ID_HEADER).map(str::to_string);

        let session_token = cookie_value(parts, SESSION_COOKIE)
            .or_else(|| header_str(parts, SESSION_TOKEN_HEADER))
            .map(str::to_string);

        let ip_address = header_str(parts, "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            });

        Ok(Self {
            customer_id,
            device_id,
            ip_address,
            session_token,
        })
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}
