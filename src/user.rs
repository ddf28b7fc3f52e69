use bcrypt::BcryptError;
use diesel::{
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};
use rand::prelude::*;
use sha2::{Digest, Sha256};

use crate::{schema::users, Connection};

const SALT_LEN: usize = 16;

/// A registered account. Has no `Serialize` impl, the hash and salt stay on the server.
#[derive(Debug, Queryable)]
pub struct User {
    pub id: i32,
    /// The unique username/login
    pub username: String,
    /// The hashed password
    hash: String,
    /// The salt for the password
    salt: Vec<u8>,
}

impl User {
    /// Verify the supplied password matches the users
    pub fn verify(&self, password: &str) -> Result<bool, BcryptError> {
        verify(password, &self.salt, &self.hash)
    }
}

/// Username and password as posted to signup and signin.
///
/// NOTE: This structure contains the user's unencrypted password, handle it with great care!
#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    password: String,
}

#[derive(Insertable)]
#[table_name = "users"]
struct NewUser<'a> {
    username: &'a str,
    hash: &'a str,
    salt: &'a [u8],
}

/// Password hashing function. Inspired by [Dropbox's password storage policy][1].
///
/// First the password and salt are combined, then hashed with SHA256 to prevent DoS attacks. The
/// password is then hashed with bcrypt.
///
/// [1]: https://blogs.dropbox.com/tech/2016/09/how-dropbox-securely-stores-your-passwords/
fn hash(key: &str, salt: &[u8], cost: u32) -> Result<String, BcryptError> {
    let digest = Sha256::new().chain(key).chain(salt).finalize();
    // base64 encode to avoid zero-bytes
    bcrypt::hash(base64::encode(&digest), cost)
}

fn verify(key: &str, salt: &[u8], hash: &str) -> Result<bool, BcryptError> {
    let digest = Sha256::new().chain(key).chain(salt).finalize();
    bcrypt::verify(&base64::encode(&digest), hash)
}

/// Generates a new salt of length `SALT_LEN`
fn generate_salt() -> [u8; SALT_LEN] {
    let mut bytes = [0u8; SALT_LEN];

    StdRng::from_entropy().fill(&mut bytes[..]);

    bytes
}

/// Creates a user. Returns `None` if the username is taken.
pub fn create(
    connection: &Connection,
    credentials: &Credentials,
    cost: u32,
) -> Result<Option<User>, failure::Error> {
    use crate::schema::users::dsl;

    let taken: i64 = dsl::users
        .filter(dsl::username.eq(&credentials.username))
        .count()
        .get_result(connection)?;
    if taken > 0 {
        return Ok(None);
    }

    let salt = generate_salt();
    let hash = hash(&credentials.password, &salt, cost)?;
    let new = NewUser {
        username: &credentials.username,
        hash: &hash,
        salt: &salt,
    };

    let inserted = diesel::insert_into(users::table)
        .values(&new)
        .execute(connection);
    // Unique constraint as a backstop for the count above.
    match inserted {
        Ok(_) => (),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let user = dsl::users
        .filter(dsl::username.eq(&credentials.username))
        .first(connection)?;
    Ok(Some(user))
}

/// Look up a user by credentials. `None` on unknown user or wrong password.
pub fn authenticate(
    connection: &Connection,
    credentials: &Credentials,
) -> Result<Option<User>, failure::Error> {
    use crate::schema::users::dsl;

    let user: Option<User> = dsl::users
        .filter(dsl::username.eq(&credentials.username))
        .first(connection)
        .optional()?;
    match user {
        Some(user) if user.verify(&credentials.password)? => Ok(Some(user)),
        _ => Ok(None),
    }
}
