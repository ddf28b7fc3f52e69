//! A session authenticated JSON API for a small blog.
//!
//! It has the following address scheme:
//! * `/api` - JSON interface
//!     * `/token/` - `GET` sets the `csrftoken` and `sessionid` cookies
//!     * `/signup/` - `POST` creates a user
//!     * `/signin/` - `POST` signs in, rotating the session and CSRF token
//!     * `/signout/` - `GET` signs out
//!     * `/article/` - `GET` lists all articles, `POST` submits one
//!         * `/<id>/` - `GET`, `PUT` or `DELETE` the article with `id`
//!             * `/comment/` - `GET` lists the article's comments, `POST` submits one
//!     * `/comment/<id>/` - `GET`, `PUT` or `DELETE` the comment with `id`
//!
//! Every request with a method other than `GET`, `HEAD`, `OPTIONS` or `TRACE` must carry the
//! value of the `csrftoken` cookie in an `X-CSRFToken` header.

#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;
#[macro_use]
extern crate serde;

pub mod article;
pub mod comment;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod schema;
pub mod session;
pub mod user;

pub use crate::db::{Connection, DbConnection};
use gotham::{
    middleware::cookie::CookieParser,
    middleware::state::StateMiddleware,
    pipeline::new_pipeline,
    pipeline::single::single_pipeline,
    router::builder::{build_router, DefineSingleRoute, DrawRoutes},
    router::response::extender::ResponseExtender,
    router::Router,
    state::State,
};
use http::status::StatusCode;
use hyper::{Body, Response};
use log::info;

use std::path::{Path, PathBuf};

use crate::{config::Settings, session::SessionMiddleware};

/// Response extender for 404 errors
pub struct NotFound;

impl ResponseExtender<Body> for NotFound {
    fn extend(&self, _state: &mut State, res: &mut Response<Body>) {
        let body = res.body_mut();
        *body = "404 File not found".into();
    }
}

/// Builds the request router
pub fn router(settings: &Settings) -> Result<Router, failure::Error> {
    // Set up shared state
    let connection = DbConnection::from_url(&settings.database_url)?;
    // Build pipeline
    let (chain, pipelines) = single_pipeline(
        new_pipeline()
            .add(StateMiddleware::new(connection))
            .add(StateMiddleware::new(settings.clone()))
            .add(CookieParser)
            .add(SessionMiddleware)
            .build(),
    );

    Ok(build_router(chain, pipelines, |route| {
        use crate::handler::{all_methods, articles, comments, users};

        route.scope("/api", |route| {
            route
                .request(all_methods(), "/token/")
                .to(body_handler!(users::token));
            route
                .request(all_methods(), "/signup/")
                .to(body_handler!(users::signup));
            route
                .request(all_methods(), "/signin/")
                .to(body_handler!(users::signin));
            route
                .request(all_methods(), "/signout/")
                .to(body_handler!(users::signout));

            route
                .request(all_methods(), "/article/")
                .to(body_handler!(articles::collection));
            route
                .request(all_methods(), "/article/:id/")
                .with_path_extractor::<articles::ArticlePath>()
                .to(body_handler!(articles::item));
            route
                .request(all_methods(), "/article/:id/comment/")
                .with_path_extractor::<articles::ArticlePath>()
                .to(body_handler!(comments::list));
            route
                .request(all_methods(), "/comment/:id/")
                .with_path_extractor::<comments::CommentPath>()
                .to(body_handler!(comments::item));
        });

        // Error responders
        route.add_response_extender(StatusCode::NOT_FOUND, NotFound);
    }))
}

/// Picks the configuration file: `$BLOG_API_CONFIG`, then the system wide file, then the
/// working directory.
fn settings_path() -> PathBuf {
    if let Some(path) = std::env::var_os("BLOG_API_CONFIG") {
        PathBuf::from(path)
    } else if Path::new("/etc/blog-api/blog-api.toml").is_file() {
        PathBuf::from("/etc/blog-api/blog-api.toml")
    } else {
        PathBuf::from("blog-api.toml")
    }
}

fn main() -> Result<(), failure::Error> {
    env_logger::init();

    let path = settings_path();
    let settings = Settings::load(&path)?;
    info!("Loaded settings from {}", path.display());

    let address = settings.host_address.clone();
    let router = router(&settings)?;
    info!("Running at {}", address);
    gotham::start(address, router);
    Ok(())
}
