use failure::Fail;
use gotham::{helpers::http::response::create_empty_response, state::State};
use http::{header, HeaderValue, Method, Response, StatusCode};
use hyper::Body;

/// Request failures that map directly onto an HTTP status.
#[derive(Debug, Fail)]
pub enum ApiError {
    /// The body is not JSON or lacks a required field
    #[fail(display = "malformed request body")]
    BadRequest,
    #[fail(display = "authentication required")]
    Unauthenticated,
    /// Wrong owner, or a missing or mismatched CSRF token
    #[fail(display = "permission denied")]
    Forbidden,
    #[fail(display = "resource not found")]
    NotFound,
    /// Carries the methods the endpoint does accept
    #[fail(display = "method not allowed")]
    MethodNotAllowed(&'static [Method]),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn to_response(&self, state: &State) -> Response<Body> {
        let mut response = create_empty_response(state, self.status());
        if let ApiError::MethodNotAllowed(allowed) = self {
            let list = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&list) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}
