//! Catalog persistence.
//!
//! Storage sits behind the repository traits in [`repository`], so the
//! controllers never see a concrete backend:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP layer (axum handlers)                             │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Controllers (routes) + aggregate helpers (services)    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/)                        │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │ LocalRepository  │ Postgres  │
//!     │ (in-memory)      │ (Diesel)  │
//!     └──────────────────────────────┘
//! ```
//!
//! Backend selection lives in [`factory`]: `$LIBRARY_CONFIG` names a
//! `repository.toml`, otherwise `REPOSITORY_TYPE` / `DATABASE_URL` decide.
//!
//! ```ignore
//! use local_library::db::{RepositoryFactory, RepositoryType};
//!
//! let repo = RepositoryFactory::create(RepositoryType::Local, None).await?;
//! let authors = repo.list_authors().await?;
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::PostgresConfig;
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    AuthorRepository, BookInstanceRepository, BookRepository, ErrorContext, FullRepository,
    GenreRepository, LibraryRepository, RepositoryError, RepositoryResult,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Build the repository selected by the runtime configuration.
pub async fn create_repository() -> RepositoryResult<Arc<dyn FullRepository>> {
    RepositoryFactory::from_env_or_config_file().await
}

/// Initialize the global repository singleton. Later calls are no-ops.
pub async fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let repo = create_repository()
        .await
        .context("Failed to initialize catalog repository")?;
    log::info!("Catalog repository ready");
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
