use gotham::{
    helpers::http::response::create_empty_response,
    state::{FromState, State},
};
use gotham_derive::{StateData, StaticResponseExtender};
use http::{Method, StatusCode};

use super::{allow, caller, json, parse, ApiResult};
use crate::{
    article::{self, ArticleChanges},
    error::ApiError,
    DbConnection,
};

const COLLECTION: &[Method] = &[Method::GET, Method::POST];
const ITEM: &[Method] = &[Method::GET, Method::PUT, Method::DELETE];

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct ArticlePath {
    pub id: i32,
}

fn changes(post: &[u8]) -> Result<ArticleChanges, ApiError> {
    let changes: ArticleChanges = parse(post)?;
    if changes.is_valid() {
        Ok(changes)
    } else {
        Err(ApiError::BadRequest)
    }
}

/// `/api/article/`
pub fn collection(state: &State, post: Vec<u8>) -> ApiResult {
    let method = allow(state, COLLECTION)?;
    let user = caller(state)?;
    let connection = &DbConnection::from_state(state)?;

    match method {
        Method::POST => {
            let new = changes(&post)?;
            let article = article::submit(connection, user, &new)?;
            json(state, StatusCode::CREATED, &article)
        }
        _ => json(state, StatusCode::OK, &article::list(connection)?),
    }
}

/// `/api/article/:id/`
pub fn item(state: &State, post: Vec<u8>) -> ApiResult {
    let method = allow(state, ITEM)?;
    let user = caller(state)?;
    let id = ArticlePath::borrow_from(state).id;
    let connection = &DbConnection::from_state(state)?;

    let article = article::get(connection, id)?.ok_or(ApiError::NotFound)?;
    if method == Method::GET {
        return json(state, StatusCode::OK, &article);
    }

    if article.author != user {
        return Err(ApiError::Forbidden.into());
    }
    match method {
        Method::PUT => {
            let update = changes(&post)?;
            let article = article::edit(connection, id, &update)?;
            // Updates answer 201, same as creation.
            json(state, StatusCode::CREATED, &article)
        }
        _ => {
            article::delete(connection, id)?;
            Ok(create_empty_response(state, StatusCode::OK))
        }
    }
}
