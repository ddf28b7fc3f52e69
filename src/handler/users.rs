use gotham::{
    helpers::http::response::create_empty_response,
    state::{FromState, State},
};
use http::{Method, StatusCode};

use super::{allow, parse, ApiResult};
use crate::{
    config::Settings,
    error::ApiError,
    session::{self, Session},
    user::{self, Credentials},
    DbConnection,
};

const GET: &[Method] = &[Method::GET];
const POST: &[Method] = &[Method::POST];

/// Hands out the CSRF token via cookie, starting an anonymous session if needed.
pub fn token(state: &State, _post: Vec<u8>) -> ApiResult {
    allow(state, GET)?;
    let settings = Settings::borrow_from(state);

    let session = match Session::try_borrow_from(state) {
        Some(session) => session.clone(),
        None => {
            let connection = &DbConnection::from_state(state)?;
            session::start(connection, settings)?
        }
    };

    let mut response = create_empty_response(state, StatusCode::NO_CONTENT);
    session::set_cookies(&mut response, &session, settings)?;
    Ok(response)
}

pub fn signup(state: &State, post: Vec<u8>) -> ApiResult {
    allow(state, POST)?;
    let credentials: Credentials = parse(&post)?;

    let connection = &DbConnection::from_state(state)?;
    let cost = Settings::borrow_from(state).hash_cost;
    if user::create(connection, &credentials, cost)?.is_none() {
        return Err(ApiError::BadRequest.into());
    }
    Ok(create_empty_response(state, StatusCode::CREATED))
}

pub fn signin(state: &State, post: Vec<u8>) -> ApiResult {
    allow(state, POST)?;
    let credentials: Credentials = parse(&post)?;

    let connection = &DbConnection::from_state(state)?;
    let user = match user::authenticate(connection, &credentials)? {
        Some(user) => user,
        None => return Err(ApiError::Unauthenticated.into()),
    };

    let settings = Settings::borrow_from(state);
    let previous = Session::try_borrow_from(state);
    let session = session::login(connection, previous, user.id, settings)?;

    let mut response = create_empty_response(state, StatusCode::NO_CONTENT);
    session::set_cookies(&mut response, &session, settings)?;
    Ok(response)
}

pub fn signout(state: &State, _post: Vec<u8>) -> ApiResult {
    allow(state, GET)?;
    // Without any session there is nothing to sign out of.
    let session = match Session::try_borrow_from(state) {
        Some(session) => session,
        None => return Err(ApiError::Unauthenticated.into()),
    };
    session::check_csrf(state)?;
    if session.user.is_none() {
        return Err(ApiError::Unauthenticated.into());
    }
    let connection = &DbConnection::from_state(state)?;
    session::logout(connection, session)?;
    Ok(create_empty_response(state, StatusCode::NO_CONTENT))
}
