use futures::{future, Future, Stream};
use gotham::{
    handler::{HandlerFuture, IntoHandlerError},
    helpers::http::response::create_response,
    state::{FromState, State},
};
use http::{Method, Response, StatusCode};
use hyper::Body;
use log::{debug, error};
use mime::APPLICATION_JSON as JSON;
use serde::{de::DeserializeOwned, Serialize};

use crate::{error::ApiError, session::Session};

pub mod articles;
pub mod comments;
pub mod users;


pub type ApiResult = Result<Response<Body>, failure::Error>;

/// Every method the router forwards to handlers, so that the handlers themselves decide on 405.
pub fn all_methods() -> Vec<Method> {
    vec![
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ]
}

/// Creates a `HandlerFuture` that runs the given function
pub fn body_handler<F>(mut state: State, op: F) -> Box<HandlerFuture>
where
    F: FnOnce(&State, Vec<u8>) -> Response<Body> + Send + 'static,
{
    let f = Body::take_from(&mut state)
        .concat2()
        .then(|result| match result {
            Ok(body) => {
                let response = op(&state, body.to_vec());
                future::ok((state, response))
            }
            Err(e) => future::err((state, e.into_handler_error())),
        });

    Box::new(f)
}

pub fn error_response(state: &State, error: failure::Error) -> Response<Body> {
    match error.downcast::<ApiError>() {
        Ok(api_error) => {
            debug!("{} {}: {}", Method::borrow_from(state), api_error.status(), api_error);
            api_error.to_response(state)
        }
        Err(error) => {
            error!("internal error: {}", error);
            create_response(
                state,
                StatusCode::INTERNAL_SERVER_ERROR,
                mime::TEXT_PLAIN,
                format!("{}", error),
            )
        }
    }
}

pub fn response(state: &State, result: ApiResult) -> Response<Body> {
    match result {
        Ok(response) => response,
        Err(error) => error_response(state, error),
    }
}

/// Returns the request method if `allowed` contains it.
pub fn allow(state: &State, allowed: &'static [Method]) -> Result<Method, ApiError> {
    let method = Method::borrow_from(state);
    if allowed.contains(method) {
        Ok(method.clone())
    } else {
        Err(ApiError::MethodNotAllowed(allowed))
    }
}

/// The id of the signed in user.
pub fn caller(state: &State) -> Result<i32, ApiError> {
    Session::try_borrow_from(state)
        .and_then(|session| session.user)
        .ok_or(ApiError::Unauthenticated)
}

/// Decodes a JSON request body. Anything that doesn't fit `T` is a bad request.
pub fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::BadRequest)
}

pub fn json<T: Serialize>(state: &State, status: StatusCode, value: &T) -> ApiResult {
    let content = serde_json::to_string(value)?;
    Ok(create_response(state, status, JSON, content))
}

#[macro_export]
macro_rules! body_handler {
    ($handler_fn:path) => {
        |state| {
            crate::handler::body_handler(state, |state, post| {
                crate::handler::response(&state, $handler_fn(state, post))
            })
        }
    };
}
