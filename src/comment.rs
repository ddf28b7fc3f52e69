use diesel::prelude::*;
use diesel::Connection as _;

use std::fmt;

use crate::{db::DieselResult, schema::comments, Connection};

#[derive(Clone, Debug, Serialize, Queryable)]
pub struct Comment {
    /// The unique id of this comment
    pub id: i32,
    /// The id of the article this comment belongs to
    pub article: i32,
    /// The comment's content
    pub content: String,
    /// The user who submitted the comment
    pub author: i32,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.content)
    }
}

#[derive(Clone, Debug, Deserialize, AsChangeset)]
#[table_name = "comments"]
pub struct CommentChanges {
    pub content: String,
}

#[derive(Insertable)]
#[table_name = "comments"]
struct NewComment<'a> {
    article: i32,
    content: &'a str,
    author: i32,
}

/// Get the comments of an article, oldest first
pub fn list(connection: &Connection, article: i32) -> DieselResult<Vec<Comment>> {
    use crate::schema::comments::dsl;

    dsl::comments
        .filter(dsl::article.eq(article))
        .order(dsl::id.asc())
        .load::<Comment>(connection)
}

pub fn get(connection: &Connection, id: i32) -> DieselResult<Option<Comment>> {
    use crate::schema::comments::dsl;

    dsl::comments.find(id).first(connection).optional()
}

pub fn submit(
    connection: &Connection,
    article: i32,
    author: i32,
    changes: &CommentChanges,
) -> DieselResult<Comment> {
    use crate::schema::comments::dsl;

    let new = NewComment {
        article,
        content: &changes.content,
        author,
    };
    connection.transaction(|| {
        diesel::insert_into(comments::table)
            .values(&new)
            .execute(connection)?;
        dsl::comments.order(dsl::id.desc()).first(connection)
    })
}

pub fn edit(connection: &Connection, id: i32, changes: &CommentChanges) -> DieselResult<Comment> {
    use crate::schema::comments::dsl;

    connection.transaction(|| {
        diesel::update(dsl::comments.find(id))
            .set(changes)
            .execute(connection)?;
        dsl::comments.find(id).first(connection)
    })
}

pub fn delete(connection: &Connection, id: i32) -> DieselResult<usize> {
    use crate::schema::comments::dsl;

    diesel::delete(dsl::comments.find(id)).execute(connection)
}

#[cfg(test)]
mod tests {
    use super::Comment;

    fn new(id: i32, article: i32) -> Comment {
        Comment {
            id,
            article,
            content: String::from("test_content"),
            author: 1,
        }
    }

    #[test]
    fn displays_as_content() {
        assert_eq!(new(1, 1).to_string(), "test_content");
    }

    #[test]
    fn json_encode() {
        let json = serde_json::to_string(&new(2, 5)).unwrap();
        assert_eq!(
            json,
            r#"{"id":2,"article":5,"content":"test_content","author":1}"#
        );
    }
}
