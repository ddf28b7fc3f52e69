//! Sessions and the CSRF double-submit gate.
//!
//! A session is identified by the `sessionid` cookie and owns a CSRF token that the client
//! receives in the `csrftoken` cookie. Every unsafe request must echo that token in the
//! `X-CSRFToken` header before any handler sees it.

use chrono::{Duration, NaiveDateTime, Utc};
use cookie::{Cookie, CookieJar};
use diesel::prelude::*;
use diesel::Connection as _;
use futures::future;
use gotham::{
    handler::HandlerFuture,
    middleware::Middleware,
    state::{FromState, State},
};
use gotham_derive::{NewMiddleware, StateData};
use http::{header, HeaderMap, HeaderValue, Method, Response};
use hyper::Body;
use log::{debug, info};
use rand::prelude::*;

use crate::{
    config::Settings, db::DieselResult, error::ApiError, handler, schema::sessions, Connection,
    DbConnection,
};

const TOKEN_LEN: usize = 32;

pub const SESSION_COOKIE: &str = "sessionid";
pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "x-csrftoken";

#[derive(Clone, Debug, Queryable, Insertable, StateData)]
#[table_name = "sessions"]
pub struct Session {
    pub id: String,
    /// The signed in user, if any
    pub user: Option<i32>,
    pub csrf_token: String,
    pub expires: NaiveDateTime,
}

impl Session {
    /// Generates a new session with fresh id and CSRF token.
    ///
    /// NB: Must be inserted into the database for the session to be valid.
    pub fn new(user: Option<i32>, settings: &Settings) -> Session {
        Session {
            id: random_token(),
            user,
            csrf_token: random_token(),
            expires: Utc::now().naive_utc() + Duration::days(settings.cookies.max_age_days),
        }
    }

    /// Get the unexpired session with the specified id
    pub fn from_id(id: &str, connection: &Connection) -> DieselResult<Option<Session>> {
        use crate::schema::sessions::dsl;

        dsl::sessions
            .find(id)
            .filter(dsl::expires.gt(Utc::now().naive_utc()))
            .first(connection)
            .optional()
    }
}

fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    StdRng::from_entropy().fill(&mut bytes[..]);
    base64::encode_config(&bytes, base64::URL_SAFE_NO_PAD)
}

fn insert(connection: &Connection, session: &Session) -> DieselResult<()> {
    use crate::schema::sessions::dsl;

    // Piggyback expiry cleanup on session creation.
    diesel::delete(dsl::sessions.filter(dsl::expires.le(Utc::now().naive_utc())))
        .execute(connection)?;
    diesel::insert_into(sessions::table)
        .values(session)
        .execute(connection)?;
    Ok(())
}

/// Creates and stores an anonymous session.
pub fn start(connection: &Connection, settings: &Settings) -> DieselResult<Session> {
    let session = Session::new(None, settings);
    insert(connection, &session)?;
    Ok(session)
}

/// Replaces `previous` with an authenticated session for `user`.
///
/// Both the session id and the CSRF token are rotated, so tokens handed out before signing in
/// stop working.
pub fn login(
    connection: &Connection,
    previous: Option<&Session>,
    user: i32,
    settings: &Settings,
) -> DieselResult<Session> {
    use crate::schema::sessions::dsl;

    connection.transaction(|| {
        if let Some(previous) = previous {
            diesel::delete(dsl::sessions.find(&previous.id)).execute(connection)?;
        }
        let session = Session::new(Some(user), settings);
        insert(connection, &session)?;
        info!("user {} signed in", user);
        Ok(session)
    })
}

/// Clears the user from a session, keeping its CSRF token.
pub fn logout(connection: &Connection, session: &Session) -> DieselResult<usize> {
    use crate::schema::sessions::dsl;

    let none: Option<i32> = None;
    let updated = diesel::update(dsl::sessions.find(&session.id))
        .set(dsl::user.eq(none))
        .execute(connection)?;
    if let Some(user) = session.user {
        info!("user {} signed out", user);
    }
    Ok(updated)
}

/// Writes the `sessionid` and `csrftoken` cookies for `session` to the response.
pub fn set_cookies(
    response: &mut Response<Body>,
    session: &Session,
    settings: &Settings,
) -> Result<(), failure::Error> {
    let options = &settings.cookies;
    let cookies = vec![
        (SESSION_COOKIE, session.id.clone(), true),
        (CSRF_COOKIE, session.csrf_token.clone(), false),
    ];
    for (name, value, http_only) in cookies {
        let mut builder = Cookie::build(name, value)
            .path("/")
            .http_only(http_only)
            .secure(options.secure)
            .max_age(time::Duration::days(options.max_age_days));
        if let Some(domain) = &options.domain {
            builder = builder.domain(domain.clone());
        }
        let cookie = builder.finish();
        response
            .headers_mut()
            .append(header::SET_COOKIE, HeaderValue::from_str(&cookie.to_string())?);
    }
    Ok(())
}

/// Methods that never change server state and so skip the CSRF check.
fn is_safe(method: &Method) -> bool {
    match *method {
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE => true,
        _ => false,
    }
}

/// Compares two tokens without bailing out at the first differing byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}

/// Checks the double-submitted CSRF token against the cookie and the session.
pub fn check_csrf(state: &State) -> Result<(), ApiError> {
    let header = HeaderMap::borrow_from(state)
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok());
    let cookie = CookieJar::borrow_from(state)
        .get(CSRF_COOKIE)
        .map(|cookie| cookie.value());
    let session = Session::try_borrow_from(state);

    match (header, cookie, session) {
        (Some(header), Some(cookie), Some(session))
            if constant_time_eq(header, cookie)
                && constant_time_eq(cookie, &session.csrf_token) =>
        {
            Ok(())
        }
        (header, cookie, session) => {
            debug!(
                "CSRF check failed (header: {}, cookie: {}, session: {})",
                header.is_some(),
                cookie.is_some(),
                session.is_some()
            );
            Err(ApiError::Forbidden)
        }
    }
}

/// Loads the session named by the `sessionid` cookie into the state, then rejects unsafe
/// requests that fail the CSRF check.
#[derive(Clone, NewMiddleware)]
pub struct SessionMiddleware;

impl Middleware for SessionMiddleware {
    fn call<C>(self, mut state: State, chain: C) -> Box<HandlerFuture>
    where
        C: FnOnce(State) -> Box<HandlerFuture>,
    {
        let put_session = |state: &mut State| -> Result<(), failure::Error> {
            let found = {
                let connection = DbConnection::from_state(state)?;
                let cookie = CookieJar::borrow_from(state)
                    .get(SESSION_COOKIE)
                    .map(|cookie| cookie.value());
                match cookie {
                    Some(id) => Session::from_id(id, &connection)?,
                    None => None,
                }
            };
            if let Some(session) = found {
                state.put(session);
            }
            if !is_safe(Method::borrow_from(state)) {
                check_csrf(state)?;
            }
            Ok(())
        };
        match put_session(&mut state) {
            Ok(()) => chain(state),
            Err(e) => {
                let response = handler::error_response(&state, e);
                Box::new(future::ok((state, response)))
            }
        }
    }
}
