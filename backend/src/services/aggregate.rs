//! Fan-out/fan-in lookups shared by the catalog controllers.
//!
//! Every helper issues its independent repository calls concurrently and
//! returns either all results or the first failure.

use std::collections::{BTreeSet, HashMap};

use futures::future::try_join_all;
use futures::try_join;

use crate::db::repository::{
    AuthorRepository, BookInstanceRepository, BookRepository, FullRepository, GenreRepository,
    RepositoryResult,
};
use crate::models::{
    Author, AuthorId, Book, BookId, BookInstance, BookStatus, Genre, GenreId, NewBook,
};

/// A book with everything its detail page shows.
#[derive(Debug, Clone)]
pub struct BookDetail {
    pub book: Book,
    pub author: Option<Author>,
    pub genres: Vec<Genre>,
    pub instances: Vec<BookInstance>,
}

/// Record counts for the home page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct LibraryCounts {
    pub book_count: u64,
    pub book_instance_count: u64,
    pub book_instance_available_count: u64,
    pub author_count: u64,
    pub genre_count: u64,
}

/// References in a book submission that name no stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DanglingReferences {
    pub author: Option<AuthorId>,
    pub genres: Vec<GenreId>,
}

impl DanglingReferences {
    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.genres.is_empty()
    }
}

pub async fn author_with_books(
    repo: &dyn FullRepository,
    id: AuthorId,
) -> RepositoryResult<(Option<Author>, Vec<Book>)> {
    try_join!(repo.get_author(id), repo.books_by_author(id))
}

pub async fn genre_with_books(
    repo: &dyn FullRepository,
    id: GenreId,
) -> RepositoryResult<(Option<Genre>, Vec<Book>)> {
    try_join!(repo.get_genre(id), repo.books_by_genre(id))
}

pub async fn book_with_instances(
    repo: &dyn FullRepository,
    id: BookId,
) -> RepositoryResult<(Option<Book>, Vec<BookInstance>)> {
    try_join!(repo.get_book(id), repo.instances_of_book(id))
}

/// Book plus copies, then its author and genres once the references are known.
pub async fn book_detail(
    repo: &dyn FullRepository,
    id: BookId,
) -> RepositoryResult<Option<BookDetail>> {
    let (book, instances) = book_with_instances(repo, id).await?;
    let Some(book) = book else {
        return Ok(None);
    };

    let (author, genres) = try_join!(repo.get_author(book.author), repo.get_genres(&book.genre))?;
    Ok(Some(BookDetail {
        book,
        author,
        genres,
        instances,
    }))
}

/// Resolve each distinct author id once.
async fn resolve_authors(
    repo: &dyn FullRepository,
    ids: impl IntoIterator<Item = AuthorId>,
) -> RepositoryResult<HashMap<AuthorId, Author>> {
    let distinct: BTreeSet<AuthorId> = ids.into_iter().collect();
    let found = try_join_all(distinct.into_iter().map(|id| repo.get_author(id))).await?;
    Ok(found
        .into_iter()
        .flatten()
        .map(|author| (author.id, author))
        .collect())
}

/// All books by title, each paired with its author when it still exists.
pub async fn books_with_authors(
    repo: &dyn FullRepository,
) -> RepositoryResult<Vec<(Book, Option<Author>)>> {
    let books = repo.list_books().await?;
    let authors = resolve_authors(repo, books.iter().map(|b| b.author)).await?;
    Ok(books
        .into_iter()
        .map(|book| {
            let author = authors.get(&book.author).cloned();
            (book, author)
        })
        .collect())
}

/// All copies, each paired with its book when it still exists.
pub async fn instances_with_books(
    repo: &dyn FullRepository,
) -> RepositoryResult<Vec<(BookInstance, Option<Book>)>> {
    let (instances, books) = try_join!(repo.list_book_instances(), repo.list_books())?;
    let books: HashMap<BookId, Book> = books.into_iter().map(|b| (b.id, b)).collect();
    Ok(instances
        .into_iter()
        .map(|instance| {
            let book = books.get(&instance.book).cloned();
            (instance, book)
        })
        .collect())
}

/// Selectable authors and genres for the book form, case-insensitively sorted.
pub async fn book_form_references(
    repo: &dyn FullRepository,
) -> RepositoryResult<(Vec<Author>, Vec<Genre>)> {
    let (mut authors, mut genres) = try_join!(repo.list_authors(), repo.list_genres())?;
    authors.sort_by_cached_key(|a| a.name().to_lowercase());
    genres.sort_by_cached_key(|g| g.name.to_lowercase());
    Ok((authors, genres))
}

/// Look up a book's author and genres together and report the ids that are
/// not on file.
pub async fn dangling_book_references(
    repo: &dyn FullRepository,
    book: &NewBook,
) -> RepositoryResult<DanglingReferences> {
    let (author, genres) = try_join!(repo.get_author(book.author), repo.get_genres(&book.genre))?;
    let found: BTreeSet<GenreId> = genres.iter().map(|g| g.id).collect();
    let missing: BTreeSet<GenreId> = book
        .genre
        .iter()
        .filter(|id| !found.contains(id))
        .copied()
        .collect();

    Ok(DanglingReferences {
        author: author.is_none().then_some(book.author),
        genres: missing.into_iter().collect(),
    })
}

/// Selectable books for the copy form, case-insensitively sorted by title.
pub async fn book_instance_form_books(repo: &dyn FullRepository) -> RepositoryResult<Vec<Book>> {
    let mut books = repo.list_books().await?;
    books.sort_by_cached_key(|b| b.title.to_lowercase());
    Ok(books)
}

pub async fn library_counts(repo: &dyn FullRepository) -> RepositoryResult<LibraryCounts> {
    let (
        book_count,
        book_instance_count,
        book_instance_available_count,
        author_count,
        genre_count,
    ) = try_join!(
        repo.count_books(),
        repo.count_book_instances(),
        repo.count_book_instances_with_status(BookStatus::Available),
        repo.count_authors(),
        repo.count_genres(),
    )?;

    Ok(LibraryCounts {
        book_count,
        book_instance_count,
        book_instance_available_count,
        author_count,
        genre_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::models::{NewAuthor, NewBook, NewBookInstance, NewGenre};

    async fn seeded() -> (LocalRepository, Author, Genre, Book) {
        let repo = LocalRepository::new();
        let author = repo
            .insert_author(NewAuthor {
                first_name: "Ursula".into(),
                family_name: "LeGuin".into(),
                date_of_birth: None,
                date_of_death: None,
            })
            .await
            .unwrap();
        let genre = repo
            .insert_genre(NewGenre {
                name: "Fantasy".into(),
            })
            .await
            .unwrap();
        let book = repo
            .insert_book(NewBook {
                title: "A Wizard of Earthsea".into(),
                author: author.id,
                summary: "Ged".into(),
                isbn: "9780547773742".into(),
                genre: vec![genre.id],
            })
            .await
            .unwrap();
        (repo, author, genre, book)
    }

    #[tokio::test]
    async fn test_book_detail_joins_references() {
        let (repo, author, genre, book) = seeded().await;
        repo.insert_book_instance(NewBookInstance {
            book: book.id,
            imprint: "Parnassus".into(),
            status: BookStatus::Available,
            due_back: None,
        })
        .await
        .unwrap();

        let detail = book_detail(&repo, book.id).await.unwrap().unwrap();
        assert_eq!(detail.author, Some(author));
        assert_eq!(detail.genres, vec![genre]);
        assert_eq!(detail.instances.len(), 1);

        assert!(book_detail(&repo, BookId::generate()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_library_counts() {
        let (repo, _, _, book) = seeded().await;
        for status in [BookStatus::Available, BookStatus::Loaned] {
            repo.insert_book_instance(NewBookInstance {
                book: book.id,
                imprint: "Ace".into(),
                status,
                due_back: None,
            })
            .await
            .unwrap();
        }

        let counts = library_counts(&repo).await.unwrap();
        assert_eq!(
            counts,
            LibraryCounts {
                book_count: 1,
                book_instance_count: 2,
                book_instance_available_count: 1,
                author_count: 1,
                genre_count: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_any_failed_lookup_fails_the_join() {
        let (repo, author, _, _) = seeded().await;
        repo.set_offline(true);
        assert!(author_with_books(&repo, author.id).await.is_err());
        assert!(library_counts(&repo).await.is_err());
    }

    #[tokio::test]
    async fn test_form_references_sort_case_insensitively() {
        let (repo, _, _, _) = seeded().await;
        repo.insert_genre(NewGenre {
            name: "biography".into(),
        })
        .await
        .unwrap();
        let (_, genres) = book_form_references(&repo).await.unwrap();
        let names: Vec<_> = genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["biography", "Fantasy"]);
    }

    #[tokio::test]
    async fn test_dangling_book_references() {
        let (repo, author, genre, book) = seeded().await;
        let mut submission = NewBook {
            title: book.title.clone(),
            author: author.id,
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre: vec![genre.id],
        };
        assert!(dangling_book_references(&repo, &submission)
            .await
            .unwrap()
            .is_empty());

        let ghost_author = AuthorId::generate();
        let ghost_genre = GenreId::generate();
        submission.author = ghost_author;
        submission.genre = vec![genre.id, ghost_genre, ghost_genre];
        let dangling = dangling_book_references(&repo, &submission).await.unwrap();
        assert_eq!(dangling.author, Some(ghost_author));
        assert_eq!(dangling.genres, vec![ghost_genre]);
    }
}
