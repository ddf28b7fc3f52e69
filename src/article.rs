use diesel::prelude::*;
use diesel::Connection as _;

use std::fmt;

use crate::{db::DieselResult, schema::articles, Connection};

/// Longest accepted title, in characters.
pub const TITLE_MAX: usize = 64;

#[derive(Debug, Serialize, Queryable)]
pub struct Article {
    /// The article's numeric id
    pub id: i32,
    /// The title of the article
    pub title: String,
    /// The article's content/body
    pub content: String,
    /// The id of the article's author
    pub author: i32,
}

impl fmt::Display for Article {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// The editable fields of an article, as posted by clients.
#[derive(AsChangeset, Deserialize)]
#[table_name = "articles"]
pub struct ArticleChanges {
    pub title: String,
    pub content: String,
}

impl ArticleChanges {
    pub fn is_valid(&self) -> bool {
        self.title.chars().count() <= TITLE_MAX
    }
}

#[derive(Insertable)]
#[table_name = "articles"]
struct NewArticle<'a> {
    title: &'a str,
    content: &'a str,
    author: i32,
}

pub fn list(connection: &Connection) -> DieselResult<Vec<Article>> {
    use crate::schema::articles::dsl::*;

    articles.order(id.asc()).load::<Article>(connection)
}

pub fn get(connection: &Connection, article_id: i32) -> DieselResult<Option<Article>> {
    use crate::schema::articles::dsl::*;

    articles.find(article_id).first(connection).optional()
}

pub fn submit(
    connection: &Connection,
    author: i32,
    changes: &ArticleChanges,
) -> DieselResult<Article> {
    use crate::schema::articles::dsl;

    let new = NewArticle {
        title: &changes.title,
        content: &changes.content,
        author,
    };
    connection.transaction(|| {
        diesel::insert_into(articles::table)
            .values(&new)
            .execute(connection)?;
        dsl::articles.order(dsl::id.desc()).first(connection)
    })
}

pub fn edit(connection: &Connection, id: i32, changes: &ArticleChanges) -> DieselResult<Article> {
    use crate::schema::articles::dsl;

    connection.transaction(|| {
        diesel::update(dsl::articles.find(id))
            .set(changes)
            .execute(connection)?;
        dsl::articles.find(id).first(connection)
    })
}

/// Deletes an article together with its comments.
pub fn delete(connection: &Connection, id: i32) -> DieselResult<usize> {
    use crate::schema::articles::dsl as a;
    use crate::schema::comments::dsl as c;

    connection.transaction(|| {
        diesel::delete(c::comments.filter(c::article.eq(id))).execute(connection)?;
        diesel::delete(a::articles.find(id)).execute(connection)
    })
}
