//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//!
//! Foreign keys reject deleting an author, genre or book that is still
//! referenced, so a dependent created between a controller's dependent check
//! and its delete surfaces as a query error instead of an orphan. A unique
//! index on `genres.name` turns a duplicate genre into
//! [`RepositoryError::Conflict`].
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, warn};
use tokio::task;
use uuid::Uuid;

use crate::db::repository::{
    AuthorRepository, BookInstanceRepository, BookRepository, ErrorContext, GenreRepository,
    LibraryRepository, RepositoryError, RepositoryResult,
};
use crate::models::{
    Author, AuthorId, Book, BookId, BookInstance, BookInstanceId, BookStatus, Genre, GenreId,
    NewAuthor, NewBook, NewBookInstance, NewGenre,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from the environment variables listed in the
    /// module docs. Unparseable numeric values fall back to the defaults.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;
        let defaults = Self::default();

        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed catalog store.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Migration failed: {}", e),
                    ErrorContext::new("run_migrations"),
                )
            })?;
        }

        Ok(Self { pool, config })
    }

    /// Run `f` on a pooled connection inside `spawn_blocking`, retrying
    /// retryable failures with exponential backoff up to `max_retries` times.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    debug!("{}: retry {} after {:?}", operation, attempt, retry_delay);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new(operation)
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            warn!("{}: connection attempt {} failed", operation, attempt + 1);
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e.with_operation(operation)),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

/// Attach each book's genre ids from `book_genres`.
fn with_genres(conn: &mut PgConnection, rows: Vec<BookRow>) -> RepositoryResult<Vec<Book>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let links: Vec<BookGenreRow> = book_genres::table
        .filter(book_genres::book_id.eq_any(&ids))
        .select(BookGenreRow::as_select())
        .load(conn)?;

    let mut by_book: HashMap<Uuid, Vec<GenreId>> = HashMap::new();
    for link in links {
        by_book
            .entry(link.book_id)
            .or_default()
            .push(GenreId::new(link.genre_id));
    }
    Ok(rows
        .into_iter()
        .map(|row| {
            let genre = by_book.remove(&row.id).unwrap_or_default();
            row.into_book(genre)
        })
        .collect())
}

fn insert_links(conn: &mut PgConnection, links: &[BookGenreRow]) -> RepositoryResult<()> {
    if !links.is_empty() {
        diesel::insert_into(book_genres::table)
            .values(links)
            .execute(conn)?;
    }
    Ok(())
}

#[async_trait]
impl AuthorRepository for PostgresRepository {
    async fn list_authors(&self) -> RepositoryResult<Vec<Author>> {
        self.with_conn("list_authors", |conn| {
            let rows = authors::table
                .order_by(authors::family_name)
                .select(AuthorRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Author::from).collect())
        })
        .await
    }

    async fn get_author(&self, id: AuthorId) -> RepositoryResult<Option<Author>> {
        self.with_conn("get_author", move |conn| {
            let row = authors::table
                .find(id.value())
                .select(AuthorRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(Author::from))
        })
        .await
    }

    async fn insert_author(&self, author: NewAuthor) -> RepositoryResult<Author> {
        let row = AuthorRow::new(AuthorId::generate(), author);
        debug!("Inserting author {}", row.id);
        self.with_conn("insert_author", move |conn| {
            let row = diesel::insert_into(authors::table)
                .values(&row)
                .returning(AuthorRow::as_returning())
                .get_result(conn)?;
            Ok(Author::from(row))
        })
        .await
    }

    async fn update_author(&self, id: AuthorId, author: NewAuthor) -> RepositoryResult<Author> {
        let row = AuthorRow::new(id, author);
        self.with_conn("update_author", move |conn| {
            let row = diesel::update(authors::table.find(id.value()))
                .set(&row)
                .returning(AuthorRow::as_returning())
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_entity("author", id))?;
            Ok(Author::from(row))
        })
        .await
    }

    async fn delete_author(&self, id: AuthorId) -> RepositoryResult<bool> {
        self.with_conn("delete_author", move |conn| {
            let deleted = diesel::delete(authors::table.find(id.value())).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn count_authors(&self) -> RepositoryResult<u64> {
        self.with_conn("count_authors", |conn| {
            Ok(count(authors::table.count().get_result(conn)?))
        })
        .await
    }
}

#[async_trait]
impl GenreRepository for PostgresRepository {
    async fn list_genres(&self) -> RepositoryResult<Vec<Genre>> {
        self.with_conn("list_genres", |conn| {
            let rows = genres::table
                .order_by(genres::name)
                .select(GenreRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Genre::from).collect())
        })
        .await
    }

    async fn get_genre(&self, id: GenreId) -> RepositoryResult<Option<Genre>> {
        self.with_conn("get_genre", move |conn| {
            let row = genres::table
                .find(id.value())
                .select(GenreRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(Genre::from))
        })
        .await
    }

    async fn get_genres(&self, ids: &[GenreId]) -> RepositoryResult<Vec<Genre>> {
        let ids: Vec<Uuid> = ids.iter().map(GenreId::value).collect();
        self.with_conn("get_genres", move |conn| {
            let rows = genres::table
                .filter(genres::id.eq_any(&ids))
                .order_by(genres::name)
                .select(GenreRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Genre::from).collect())
        })
        .await
    }

    async fn find_genre_by_name(&self, name: &str) -> RepositoryResult<Option<Genre>> {
        let name = name.to_string();
        self.with_conn("find_genre_by_name", move |conn| {
            let row = genres::table
                .filter(genres::name.eq(&name))
                .select(GenreRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(Genre::from))
        })
        .await
    }

    async fn insert_genre(&self, genre: NewGenre) -> RepositoryResult<Genre> {
        let row = GenreRow::new(GenreId::generate(), genre);
        self.with_conn("insert_genre", move |conn| {
            let row = diesel::insert_into(genres::table)
                .values(&row)
                .returning(GenreRow::as_returning())
                .get_result(conn)?;
            Ok(Genre::from(row))
        })
        .await
    }

    async fn update_genre(&self, id: GenreId, genre: NewGenre) -> RepositoryResult<Genre> {
        let row = GenreRow::new(id, genre);
        self.with_conn("update_genre", move |conn| {
            let row = diesel::update(genres::table.find(id.value()))
                .set(&row)
                .returning(GenreRow::as_returning())
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_entity("genre", id))?;
            Ok(Genre::from(row))
        })
        .await
    }

    async fn delete_genre(&self, id: GenreId) -> RepositoryResult<bool> {
        self.with_conn("delete_genre", move |conn| {
            let deleted = diesel::delete(genres::table.find(id.value())).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn count_genres(&self) -> RepositoryResult<u64> {
        self.with_conn("count_genres", |conn| {
            Ok(count(genres::table.count().get_result(conn)?))
        })
        .await
    }
}

#[async_trait]
impl BookRepository for PostgresRepository {
    async fn list_books(&self) -> RepositoryResult<Vec<Book>> {
        self.with_conn("list_books", |conn| {
            let rows = books::table
                .order_by(books::title)
                .select(BookRow::as_select())
                .load(conn)?;
            with_genres(conn, rows)
        })
        .await
    }

    async fn get_book(&self, id: BookId) -> RepositoryResult<Option<Book>> {
        self.with_conn("get_book", move |conn| {
            let row = books::table
                .find(id.value())
                .select(BookRow::as_select())
                .first(conn)
                .optional()?;
            Ok(with_genres(conn, row.into_iter().collect())?.pop())
        })
        .await
    }

    async fn books_by_author(&self, author: AuthorId) -> RepositoryResult<Vec<Book>> {
        self.with_conn("books_by_author", move |conn| {
            let rows = books::table
                .filter(books::author_id.eq(author.value()))
                .order_by(books::title)
                .select(BookRow::as_select())
                .load(conn)?;
            with_genres(conn, rows)
        })
        .await
    }

    async fn books_by_genre(&self, genre: GenreId) -> RepositoryResult<Vec<Book>> {
        self.with_conn("books_by_genre", move |conn| {
            let rows = books::table
                .inner_join(book_genres::table)
                .filter(book_genres::genre_id.eq(genre.value()))
                .order_by(books::title)
                .select(BookRow::as_select())
                .load(conn)?;
            with_genres(conn, rows)
        })
        .await
    }

    async fn insert_book(&self, book: NewBook) -> RepositoryResult<Book> {
        let id = BookId::generate();
        self.with_conn("insert_book", move |conn| {
            conn.transaction(|tx| {
                diesel::insert_into(books::table)
                    .values(&BookRow::new(id, &book))
                    .execute(tx)?;
                insert_links(tx, &BookGenreRow::for_book(id, &book))?;
                Ok(book.clone().with_id(id))
            })
        })
        .await
    }

    async fn update_book(&self, id: BookId, book: NewBook) -> RepositoryResult<Book> {
        self.with_conn("update_book", move |conn| {
            conn.transaction(|tx| {
                let updated = diesel::update(books::table.find(id.value()))
                    .set(&BookRow::new(id, &book))
                    .execute(tx)?;
                if updated == 0 {
                    return Err(RepositoryError::not_found("Book does not exist")
                        .with_entity("book", id));
                }
                diesel::delete(book_genres::table.filter(book_genres::book_id.eq(id.value())))
                    .execute(tx)?;
                insert_links(tx, &BookGenreRow::for_book(id, &book))?;
                Ok(book.clone().with_id(id))
            })
        })
        .await
    }

    async fn delete_book(&self, id: BookId) -> RepositoryResult<bool> {
        self.with_conn("delete_book", move |conn| {
            conn.transaction(|tx| {
                diesel::delete(book_genres::table.filter(book_genres::book_id.eq(id.value())))
                    .execute(tx)?;
                let deleted = diesel::delete(books::table.find(id.value())).execute(tx)?;
                Ok(deleted > 0)
            })
        })
        .await
    }

    async fn count_books(&self) -> RepositoryResult<u64> {
        self.with_conn("count_books", |conn| {
            Ok(count(books::table.count().get_result(conn)?))
        })
        .await
    }
}

#[async_trait]
impl BookInstanceRepository for PostgresRepository {
    async fn list_book_instances(&self) -> RepositoryResult<Vec<BookInstance>> {
        self.with_conn("list_book_instances", |conn| {
            let rows = book_instances::table
                .select(BookInstanceRow::as_select())
                .load(conn)?;
            rows.into_iter().map(BookInstance::try_from).collect()
        })
        .await
    }

    async fn get_book_instance(
        &self,
        id: BookInstanceId,
    ) -> RepositoryResult<Option<BookInstance>> {
        self.with_conn("get_book_instance", move |conn| {
            let row = book_instances::table
                .find(id.value())
                .select(BookInstanceRow::as_select())
                .first(conn)
                .optional()?;
            row.map(BookInstance::try_from).transpose()
        })
        .await
    }

    async fn instances_of_book(&self, book: BookId) -> RepositoryResult<Vec<BookInstance>> {
        self.with_conn("instances_of_book", move |conn| {
            let rows = book_instances::table
                .filter(book_instances::book_id.eq(book.value()))
                .select(BookInstanceRow::as_select())
                .load(conn)?;
            rows.into_iter().map(BookInstance::try_from).collect()
        })
        .await
    }

    async fn insert_book_instance(
        &self,
        instance: NewBookInstance,
    ) -> RepositoryResult<BookInstance> {
        let row = BookInstanceRow::new(BookInstanceId::generate(), instance);
        self.with_conn("insert_book_instance", move |conn| {
            let row = diesel::insert_into(book_instances::table)
                .values(&row)
                .returning(BookInstanceRow::as_returning())
                .get_result(conn)?;
            BookInstance::try_from(row)
        })
        .await
    }

    async fn update_book_instance(
        &self,
        id: BookInstanceId,
        instance: NewBookInstance,
    ) -> RepositoryResult<BookInstance> {
        let row = BookInstanceRow::new(id, instance);
        self.with_conn("update_book_instance", move |conn| {
            let row = diesel::update(book_instances::table.find(id.value()))
                .set(&row)
                .returning(BookInstanceRow::as_returning())
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_entity("book_instance", id))?;
            BookInstance::try_from(row)
        })
        .await
    }

    async fn delete_book_instance(&self, id: BookInstanceId) -> RepositoryResult<bool> {
        self.with_conn("delete_book_instance", move |conn| {
            let deleted = diesel::delete(book_instances::table.find(id.value())).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn count_book_instances(&self) -> RepositoryResult<u64> {
        self.with_conn("count_book_instances", |conn| {
            Ok(count(book_instances::table.count().get_result(conn)?))
        })
        .await
    }

    async fn count_book_instances_with_status(
        &self,
        status: BookStatus,
    ) -> RepositoryResult<u64> {
        self.with_conn("count_book_instances_with_status", move |conn| {
            Ok(count(
                book_instances::table
                    .filter(book_instances::status.eq(status.as_str()))
                    .count()
                    .get_result(conn)?,
            ))
        })
        .await
    }
}

#[async_trait]
impl LibraryRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1").execute(conn)?;
            Ok(true)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PostgresConfig::with_url("postgres://localhost/library");
        assert_eq!(config.database_url, "postgres://localhost/library");
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay_ms, 100);
    }

    #[test]
    fn test_instance_row_rejects_unknown_status() {
        let row = BookInstanceRow {
            id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            imprint: "Ace".into(),
            status: "Lost".into(),
            due_back: None,
        };
        let err = BookInstance::try_from(row).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(err.context().entity.as_deref(), Some("book_instance"));
    }
}
