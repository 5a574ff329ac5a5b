//! In-memory repository for unit testing and local development.
//!
//! All four collections live behind a single `parking_lot::RwLock`. Each
//! repository call takes the lock once; nothing spans calls, so a sequence like
//! "check dependents, then delete" is not atomic. Genre name uniqueness is
//! checked under the same write lock as the write itself.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;

use crate::db::repository::{
    AuthorRepository, BookInstanceRepository, BookRepository, ErrorContext, GenreRepository,
    LibraryRepository, RepositoryError, RepositoryResult,
};
use crate::models::{
    Author, AuthorId, Book, BookId, BookInstance, BookInstanceId, BookStatus, Genre, GenreId,
    NewAuthor, NewBook, NewBookInstance, NewGenre,
};

#[derive(Debug, Default)]
struct LocalData {
    authors: HashMap<AuthorId, Author>,
    genres: HashMap<GenreId, Genre>,
    books: HashMap<BookId, Book>,
    book_instances: HashMap<BookInstanceId, BookInstance>,
}

/// In-memory catalog store.
///
/// Cloning shares the underlying data.
#[derive(Debug, Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
    offline: Arc<AtomicBool>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable store: while offline every call fails with a
    /// retryable connection error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    fn ensure_online(&self, operation: &str) -> RepositoryResult<()> {
        if self.is_offline() {
            return Err(RepositoryError::connection_with_context(
                "local repository is offline",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }
}

fn missing(operation: &str, entity: &str, id: impl ToString) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("{} does not exist", entity),
        ErrorContext::new(operation)
            .with_entity(entity)
            .with_entity_id(id),
    )
}

fn duplicate_genre(operation: &str, name: &str) -> RepositoryError {
    RepositoryError::conflict_with_context(
        format!("genre \"{}\" already exists", name),
        ErrorContext::new(operation)
            .with_entity("genre")
            .with_details("constraint=genres_name_key"),
    )
}

fn sorted_by<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(key);
    items
}

#[async_trait]
impl AuthorRepository for LocalRepository {
    async fn list_authors(&self) -> RepositoryResult<Vec<Author>> {
        self.ensure_online("list_authors")?;
        let data = self.data.read();
        Ok(sorted_by(data.authors.values().cloned().collect(), |a: &Author| {
            a.family_name.clone()
        }))
    }

    async fn get_author(&self, id: AuthorId) -> RepositoryResult<Option<Author>> {
        self.ensure_online("get_author")?;
        Ok(self.data.read().authors.get(&id).cloned())
    }

    async fn insert_author(&self, author: NewAuthor) -> RepositoryResult<Author> {
        self.ensure_online("insert_author")?;
        let author = author.with_id(AuthorId::generate());
        debug!("inserting author {}", author.id);
        self.data.write().authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn update_author(&self, id: AuthorId, author: NewAuthor) -> RepositoryResult<Author> {
        self.ensure_online("update_author")?;
        let mut data = self.data.write();
        let slot = data
            .authors
            .get_mut(&id)
            .ok_or_else(|| missing("update_author", "author", id))?;
        *slot = author.with_id(id);
        Ok(slot.clone())
    }

    async fn delete_author(&self, id: AuthorId) -> RepositoryResult<bool> {
        self.ensure_online("delete_author")?;
        Ok(self.data.write().authors.remove(&id).is_some())
    }

    async fn count_authors(&self) -> RepositoryResult<u64> {
        self.ensure_online("count_authors")?;
        Ok(self.data.read().authors.len() as u64)
    }
}

#[async_trait]
impl GenreRepository for LocalRepository {
    async fn list_genres(&self) -> RepositoryResult<Vec<Genre>> {
        self.ensure_online("list_genres")?;
        let data = self.data.read();
        Ok(sorted_by(data.genres.values().cloned().collect(), |g: &Genre| {
            g.name.clone()
        }))
    }

    async fn get_genre(&self, id: GenreId) -> RepositoryResult<Option<Genre>> {
        self.ensure_online("get_genre")?;
        Ok(self.data.read().genres.get(&id).cloned())
    }

    async fn get_genres(&self, ids: &[GenreId]) -> RepositoryResult<Vec<Genre>> {
        self.ensure_online("get_genres")?;
        let data = self.data.read();
        Ok(sorted_by(
            ids.iter()
                .filter_map(|id| data.genres.get(id).cloned())
                .collect(),
            |g: &Genre| g.name.clone(),
        ))
    }

    async fn find_genre_by_name(&self, name: &str) -> RepositoryResult<Option<Genre>> {
        self.ensure_online("find_genre_by_name")?;
        Ok(self
            .data
            .read()
            .genres
            .values()
            .find(|g| g.name == name)
            .cloned())
    }

    async fn insert_genre(&self, genre: NewGenre) -> RepositoryResult<Genre> {
        self.ensure_online("insert_genre")?;
        let mut data = self.data.write();
        if data.genres.values().any(|g| g.name == genre.name) {
            return Err(duplicate_genre("insert_genre", &genre.name));
        }
        let genre = genre.with_id(GenreId::generate());
        debug!("inserting genre {}", genre.id);
        data.genres.insert(genre.id, genre.clone());
        Ok(genre)
    }

    async fn update_genre(&self, id: GenreId, genre: NewGenre) -> RepositoryResult<Genre> {
        self.ensure_online("update_genre")?;
        let mut data = self.data.write();
        if data.genres.values().any(|g| g.id != id && g.name == genre.name) {
            return Err(duplicate_genre("update_genre", &genre.name));
        }
        let slot = data
            .genres
            .get_mut(&id)
            .ok_or_else(|| missing("update_genre", "genre", id))?;
        *slot = genre.with_id(id);
        Ok(slot.clone())
    }

    async fn delete_genre(&self, id: GenreId) -> RepositoryResult<bool> {
        self.ensure_online("delete_genre")?;
        Ok(self.data.write().genres.remove(&id).is_some())
    }

    async fn count_genres(&self) -> RepositoryResult<u64> {
        self.ensure_online("count_genres")?;
        Ok(self.data.read().genres.len() as u64)
    }
}

#[async_trait]
impl BookRepository for LocalRepository {
    async fn list_books(&self) -> RepositoryResult<Vec<Book>> {
        self.ensure_online("list_books")?;
        let data = self.data.read();
        Ok(sorted_by(data.books.values().cloned().collect(), |b: &Book| {
            b.title.clone()
        }))
    }

    async fn get_book(&self, id: BookId) -> RepositoryResult<Option<Book>> {
        self.ensure_online("get_book")?;
        Ok(self.data.read().books.get(&id).cloned())
    }

    async fn books_by_author(&self, author: AuthorId) -> RepositoryResult<Vec<Book>> {
        self.ensure_online("books_by_author")?;
        let data = self.data.read();
        Ok(sorted_by(
            data.books
                .values()
                .filter(|b| b.author == author)
                .cloned()
                .collect(),
            |b: &Book| b.title.clone(),
        ))
    }

    async fn books_by_genre(&self, genre: GenreId) -> RepositoryResult<Vec<Book>> {
        self.ensure_online("books_by_genre")?;
        let data = self.data.read();
        Ok(sorted_by(
            data.books
                .values()
                .filter(|b| b.has_genre(genre))
                .cloned()
                .collect(),
            |b: &Book| b.title.clone(),
        ))
    }

    async fn insert_book(&self, book: NewBook) -> RepositoryResult<Book> {
        self.ensure_online("insert_book")?;
        let book = book.with_id(BookId::generate());
        debug!("inserting book {}", book.id);
        self.data.write().books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update_book(&self, id: BookId, book: NewBook) -> RepositoryResult<Book> {
        self.ensure_online("update_book")?;
        let mut data = self.data.write();
        let slot = data
            .books
            .get_mut(&id)
            .ok_or_else(|| missing("update_book", "book", id))?;
        *slot = book.with_id(id);
        Ok(slot.clone())
    }

    async fn delete_book(&self, id: BookId) -> RepositoryResult<bool> {
        self.ensure_online("delete_book")?;
        Ok(self.data.write().books.remove(&id).is_some())
    }

    async fn count_books(&self) -> RepositoryResult<u64> {
        self.ensure_online("count_books")?;
        Ok(self.data.read().books.len() as u64)
    }
}

#[async_trait]
impl BookInstanceRepository for LocalRepository {
    async fn list_book_instances(&self) -> RepositoryResult<Vec<BookInstance>> {
        self.ensure_online("list_book_instances")?;
        Ok(self.data.read().book_instances.values().cloned().collect())
    }

    async fn get_book_instance(
        &self,
        id: BookInstanceId,
    ) -> RepositoryResult<Option<BookInstance>> {
        self.ensure_online("get_book_instance")?;
        Ok(self.data.read().book_instances.get(&id).cloned())
    }

    async fn instances_of_book(&self, book: BookId) -> RepositoryResult<Vec<BookInstance>> {
        self.ensure_online("instances_of_book")?;
        Ok(self
            .data
            .read()
            .book_instances
            .values()
            .filter(|i| i.book == book)
            .cloned()
            .collect())
    }

    async fn insert_book_instance(
        &self,
        instance: NewBookInstance,
    ) -> RepositoryResult<BookInstance> {
        self.ensure_online("insert_book_instance")?;
        let instance = instance.with_id(BookInstanceId::generate());
        debug!("inserting book instance {}", instance.id);
        self.data
            .write()
            .book_instances
            .insert(instance.id, instance.clone());
        Ok(instance)
    }

    async fn update_book_instance(
        &self,
        id: BookInstanceId,
        instance: NewBookInstance,
    ) -> RepositoryResult<BookInstance> {
        self.ensure_online("update_book_instance")?;
        let mut data = self.data.write();
        let slot = data
            .book_instances
            .get_mut(&id)
            .ok_or_else(|| missing("update_book_instance", "book_instance", id))?;
        *slot = instance.with_id(id);
        Ok(slot.clone())
    }

    async fn delete_book_instance(&self, id: BookInstanceId) -> RepositoryResult<bool> {
        self.ensure_online("delete_book_instance")?;
        Ok(self.data.write().book_instances.remove(&id).is_some())
    }

    async fn count_book_instances(&self) -> RepositoryResult<u64> {
        self.ensure_online("count_book_instances")?;
        Ok(self.data.read().book_instances.len() as u64)
    }

    async fn count_book_instances_with_status(
        &self,
        status: BookStatus,
    ) -> RepositoryResult<u64> {
        self.ensure_online("count_book_instances_with_status")?;
        Ok(self
            .data
            .read()
            .book_instances
            .values()
            .filter(|i| i.status == status)
            .count() as u64)
    }
}

#[async_trait]
impl LibraryRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(!self.is_offline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_author(first: &str, family: &str) -> NewAuthor {
        NewAuthor {
            first_name: first.to_string(),
            family_name: family.to_string(),
            date_of_birth: None,
            date_of_death: None,
        }
    }

    #[tokio::test]
    async fn test_authors_listed_by_family_name() {
        let repo = LocalRepository::new();
        repo.insert_author(new_author("Isaac", "Asimov")).await.unwrap();
        repo.insert_author(new_author("Ben", "Bova")).await.unwrap();
        repo.insert_author(new_author("Frank", "Herbert")).await.unwrap();

        let names: Vec<_> = repo
            .list_authors()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.family_name)
            .collect();
        assert_eq!(names, vec!["Asimov", "Bova", "Herbert"]);
    }

    #[tokio::test]
    async fn test_update_keeps_identifier() {
        let repo = LocalRepository::new();
        let author = repo.insert_author(new_author("Frank", "Herbert")).await.unwrap();
        let updated = repo
            .update_author(author.id, new_author("Brian", "Herbert"))
            .await
            .unwrap();
        assert_eq!(updated.id, author.id);
        assert_eq!(
            repo.get_author(author.id).await.unwrap().unwrap().first_name,
            "Brian"
        );
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let repo = LocalRepository::new();
        let err = repo
            .update_genre(GenreId::generate(), NewGenre { name: "x".into() })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_offline_repository_fails_every_call() {
        let repo = LocalRepository::new();
        repo.set_offline(true);
        let err = repo.list_genres().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(!repo.health_check().await.unwrap());

        repo.set_offline(false);
        assert!(repo.list_genres().await.is_ok());
    }

    #[tokio::test]
    async fn test_genre_name_lookup_is_case_sensitive() {
        let repo = LocalRepository::new();
        repo.insert_genre(NewGenre { name: "Fantasy".into() })
            .await
            .unwrap();
        assert!(repo.find_genre_by_name("Fantasy").await.unwrap().is_some());
        assert!(repo.find_genre_by_name("fantasy").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_genre_name_is_a_conflict() {
        let repo = LocalRepository::new();
        let fantasy = repo
            .insert_genre(NewGenre { name: "Fantasy".into() })
            .await
            .unwrap();
        let horror = repo
            .insert_genre(NewGenre { name: "Horror".into() })
            .await
            .unwrap();

        let err = repo
            .insert_genre(NewGenre { name: "Fantasy".into() })
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(err.message(), "genre \"Fantasy\" already exists");
        assert_eq!(repo.count_genres().await.unwrap(), 2);

        let err = repo
            .update_genre(horror.id, NewGenre { name: "Fantasy".into() })
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        // Saving a genre under its own name is not a conflict.
        repo.update_genre(fantasy.id, NewGenre { name: "Fantasy".into() })
            .await
            .unwrap();
    }
}
