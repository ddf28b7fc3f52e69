use gotham::{
    helpers::http::response::create_empty_response,
    state::{FromState, State},
};
use gotham_derive::{StateData, StaticResponseExtender};
use http::{Method, StatusCode};

use super::{allow, caller, json, parse, ApiResult};
use crate::{
    article,
    comment::{self, CommentChanges},
    error::ApiError,
    handler::articles::ArticlePath,
    DbConnection,
};

const COLLECTION: &[Method] = &[Method::GET, Method::POST];
const ITEM: &[Method] = &[Method::GET, Method::PUT, Method::DELETE];

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct CommentPath {
    id: i32,
}

/// `/api/article/:id/comment/`
pub fn list(state: &State, post: Vec<u8>) -> ApiResult {
    let method = allow(state, COLLECTION)?;
    let user = caller(state)?;
    let article_id = ArticlePath::borrow_from(state).id;
    let connection = &DbConnection::from_state(state)?;

    if article::get(connection, article_id)?.is_none() {
        return Err(ApiError::NotFound.into());
    }

    match method {
        Method::POST => {
            let new: CommentChanges = parse(&post)?;
            let comment = comment::submit(connection, article_id, user, &new)?;
            json(state, StatusCode::CREATED, &comment)
        }
        _ => json(state, StatusCode::OK, &comment::list(connection, article_id)?),
    }
}

/// `/api/comment/:id/`
pub fn item(state: &State, post: Vec<u8>) -> ApiResult {
    let method = allow(state, ITEM)?;
    let user = caller(state)?;
    let id = CommentPath::borrow_from(state).id;
    let connection = &DbConnection::from_state(state)?;

    let comment = comment::get(connection, id)?.ok_or(ApiError::NotFound)?;
    if method == Method::GET {
        return json(state, StatusCode::OK, &comment);
    }

    if comment.author != user {
        return Err(ApiError::Forbidden.into());
    }
    match method {
        Method::PUT => {
            let changes: CommentChanges = parse(&post)?;
            let comment = comment::edit(connection, id, &changes)?;
            json(state, StatusCode::CREATED, &comment)
        }
        _ => {
            comment::delete(connection, id)?;
            Ok(create_empty_response(state, StatusCode::OK))
        }
    }
}
