use crate::{AppState, auth::session::Identity, errors::Error, types::abbrev_uuid};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{instrument, trace};

/// Authenticate the request's bearer token.
///
/// The resulting [`Identity`] is cached in the request extensions, so later extractors and
/// handlers in the same request reuse it instead of verifying the token again.
#[instrument(skip_all)]
pub fn authenticate_parts(parts: &mut Parts, state: &AppState) -> Result<Identity, Error> {
    if let Some(identity) = parts.extensions.get::<Identity>() {
        trace!("Identity already attached to request");
        return Ok(identity.clone());
    }

    let header = match parts.headers.get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| Error::MissingCredential)?),
        None => None,
    };

    let identity = state.authenticator.authenticate_request(header)?;
    trace!(user_id = %abbrev_uuid(&identity.user_id), "Authenticated bearer token");
    parts.extensions.insert(identity.clone());
    Ok(identity)
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate_parts(parts, state)
    }
}
