//! Request extractors
//!
//! Same as axum's `Json`, `Path` and `Query`, but a malformed body, path or
//! query string is answered with the shared `ErrorResponse` body and a 400.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ClockSrvError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ClockSrvError))]
pub struct ApiJson<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ClockSrvError))]
pub struct ApiPath<T>(pub T);

/// Query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ClockSrvError))]
pub struct ApiQuery<T>(pub T);
