//! Identity context carried by request headers.
//!
//! Authentication happens upstream (gateway, wallet, session layer). By the
//! time a request reaches this service the caller's principal is asserted in
//! `x-principal-id`; value riding along with the call is in `x-attached-value`.

use axum::http::HeaderMap;

use coursemart_core::{Amount, PrincipalId};
use coursemart_marketplace::CallContext;

pub const PRINCIPAL_HEADER: &str = "x-principal-id";
pub const ATTACHED_VALUE_HEADER: &str = "x-attached-value";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    MissingPrincipal,
    InvalidPrincipal,
    InvalidAttachedValue,
}

/// Build the call context for a request.
pub fn call_context(headers: &HeaderMap) -> Result<CallContext, IdentityError> {
    let caller = headers
        .get(PRINCIPAL_HEADER)
        .ok_or(IdentityError::MissingPrincipal)?
        .to_str()
        .map_err(|_| IdentityError::InvalidPrincipal)?
        .trim()
        .parse::<PrincipalId>()
        .map_err(|_| IdentityError::InvalidPrincipal)?;

    let attached = match headers.get(ATTACHED_VALUE_HEADER) {
        None => 0,
        Some(v) => v
            .to_str()
            .map_err(|_| IdentityError::InvalidAttachedValue)?
            .trim()
            .parse::<Amount>()
            .map_err(|_| IdentityError::InvalidAttachedValue)?,
    };

    Ok(CallContext::with_value(caller, attached))
}
