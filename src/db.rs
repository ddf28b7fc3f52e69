use diesel::connection::SimpleConnection;
use diesel_migrations::embed_migrations;
use gotham::state::FromState;
use gotham_derive::StateData;
use log::info;

use std::sync::{Arc, Mutex, MutexGuard};

pub use diesel::sqlite::SqliteConnection as Connection;

pub type DieselResult<T> = Result<T, diesel::result::Error>;

embed_migrations!();

/// The wrapper for a database connection that can shared via gotham's state data
#[derive(Clone, StateData)]
pub struct DbConnection {
    connection: Arc<Mutex<Connection>>,
}

impl DbConnection {
    pub fn from_url(url: &str) -> Result<Self, failure::Error> {
        Ok(Self {
            connection: Arc::new(Mutex::new(connect(url)?)),
        })
    }

    pub fn from_state(
        state: &gotham::state::State,
    ) -> Result<MutexGuard<Connection>, failure::Error> {
        Self::borrow_from(state).lock()
    }

    pub fn lock(&self) -> Result<MutexGuard<Connection>, failure::Error> {
        match self.connection.lock() {
            Ok(lock) => Ok(lock),
            Err(_) => Err(failure::err_msg("failed to get lock")),
        }
    }
}

pub fn connect(url: &str) -> Result<Connection, failure::Error> {
    let connection: Connection = diesel::Connection::establish(url)?;

    // SQLite leaves foreign keys off unless asked per connection.
    connection.batch_execute("PRAGMA foreign_keys = ON;")?;

    // Run migrations.
    embedded_migrations::run(&connection)?;
    info!("database at {} is up to date", url);

    Ok(connection)
}
