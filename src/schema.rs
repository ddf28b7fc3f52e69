table! {
    articles (id) {
        id -> Integer,
        title -> Text,
        content -> Text,
        author -> Integer,
    }
}

table! {
    comments (id) {
        id -> Integer,
        article -> Integer,
        content -> Text,
        author -> Integer,
    }
}

table! {
    sessions (id) {
        id -> Text,
        user -> Nullable<Integer>,
        csrf_token -> Text,
        expires -> Timestamp,
    }
}

table! {
    users (id) {
        id -> Integer,
        username -> Text,
        hash -> Text,
        salt -> Binary,
    }
}

joinable!(articles -> users (author));
joinable!(comments -> articles (article));
joinable!(comments -> users (author));
joinable!(sessions -> users (user));

allow_tables_to_appear_in_same_query!(articles, comments, sessions, users,);
