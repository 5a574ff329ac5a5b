//! Service layer between the controllers and the repositories.

pub mod aggregate;

pub use aggregate::{
    author_with_books, book_detail, book_form_references, book_instance_form_books,
    book_with_instances, books_with_authors, dangling_book_references, genre_with_books,
    instances_with_books, library_counts, BookDetail, DanglingReferences, LibraryCounts,
};
