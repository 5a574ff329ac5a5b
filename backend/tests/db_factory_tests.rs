//! Tests for repository selection: environment variables and `repository.toml`.

mod support;

use std::io::Write;
use std::str::FromStr;

use local_library::db::repo_config::CONFIG_PATH_ENV;
use local_library::db::repository::LibraryRepository;
use local_library::db::{RepositoryConfig, RepositoryFactory, RepositoryType};

#[test]
fn test_repository_type_from_str() {
    assert_eq!(
        RepositoryType::from_str("POSTGRES").unwrap(),
        RepositoryType::Postgres
    );
    assert_eq!(
        RepositoryType::from_str("local").unwrap(),
        RepositoryType::Local
    );

    let err = RepositoryType::from_str("sqlite").unwrap_err();
    assert!(err.to_string().contains("Unknown repository type: sqlite"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[test]
fn test_repository_type_from_env_with_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/library")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres),
    );
}

#[test]
fn test_explicit_repository_type_wins() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://localhost/library")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[test]
fn test_invalid_repository_type_falls_back() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("carrier-pigeon")),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[test]
fn test_config_path_from_env() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[repository]\ntype = \"local\"").unwrap();
    let path = file.path().to_string_lossy().into_owned();

    let config = support::with_scoped_env(&[(CONFIG_PATH_ENV, Some(path.as_str()))], || {
        RepositoryConfig::from_default_location()
    })
    .unwrap();
    assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
}

#[test]
fn test_config_path_pointing_nowhere_is_an_error() {
    let result = support::with_scoped_env(
        &[(CONFIG_PATH_ENV, Some("/no/such/dir/repository.toml"))],
        RepositoryConfig::from_default_location,
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn test_from_config_file_builds_local_repository() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[repository]\ntype = \"local\"").unwrap();

    let repo = RepositoryFactory::from_config_file(file.path())
        .await
        .unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn test_from_config_file_rejects_garbage() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "this is = = not toml").unwrap();

    assert!(RepositoryFactory::from_config_file(file.path())
        .await
        .is_err());
}
