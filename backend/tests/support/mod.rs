#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::NaiveDate;
use local_library::db::repository::{
    AuthorRepository, BookInstanceRepository, BookRepository, GenreRepository,
};
use local_library::db::LocalRepository;
use local_library::models::{
    Author, Book, BookInstance, BookStatus, Genre, NewAuthor, NewBook, NewBookInstance, NewGenre,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process environment across parallel tests.
///
/// `Some(v)` sets a variable, `None` removes it.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A small catalog: one author with one book in one genre, and one
/// available copy of that book.
pub struct Seeded {
    pub repo: LocalRepository,
    pub author: Author,
    pub genre: Genre,
    pub book: Book,
    pub copy: BookInstance,
}

pub async fn seeded_catalog() -> Seeded {
    let repo = LocalRepository::new();
    let author = repo
        .insert_author(NewAuthor {
            first_name: "Frank".into(),
            family_name: "Herbert".into(),
            date_of_birth: Some(date(1920, 10, 8)),
            date_of_death: Some(date(1986, 2, 11)),
        })
        .await
        .unwrap();
    let genre = repo
        .insert_genre(NewGenre {
            name: "Science Fiction".into(),
        })
        .await
        .unwrap();
    let book = repo
        .insert_book(NewBook {
            title: "Dune".into(),
            author: author.id,
            summary: "Desert planet politics.".into(),
            isbn: "9780441013593".into(),
            genre: vec![genre.id],
        })
        .await
        .unwrap();
    let copy = repo
        .insert_book_instance(NewBookInstance {
            book: book.id,
            imprint: "Ace, 1990".into(),
            status: BookStatus::Available,
            due_back: None,
        })
        .await
        .unwrap();

    Seeded {
        repo,
        author,
        genre,
        book,
        copy,
    }
}
