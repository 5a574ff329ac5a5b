// Mirrors migrations/2024-01-01-000000_create_catalog/up.sql.

diesel::table! {
    authors (id) {
        id -> Uuid,
        first_name -> Text,
        family_name -> Text,
        date_of_birth -> Nullable<Date>,
        date_of_death -> Nullable<Date>,
    }
}

diesel::table! {
    genres (id) {
        id -> Uuid,
        name -> Text,
    }
}

diesel::table! {
    books (id) {
        id -> Uuid,
        title -> Text,
        author_id -> Uuid,
        summary -> Text,
        isbn -> Text,
    }
}

diesel::table! {
    book_genres (book_id, genre_id) {
        book_id -> Uuid,
        genre_id -> Uuid,
    }
}

diesel::table! {
    book_instances (id) {
        id -> Uuid,
        book_id -> Uuid,
        imprint -> Text,
        status -> Text,
        due_back -> Nullable<Date>,
    }
}

diesel::joinable!(books -> authors (author_id));
diesel::joinable!(book_genres -> books (book_id));
diesel::joinable!(book_genres -> genres (genre_id));
diesel::joinable!(book_instances -> books (book_id));

diesel::allow_tables_to_appear_in_same_query!(authors, genres, books, book_genres, book_instances);
