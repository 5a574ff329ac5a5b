use log::warn;
use serde::Serialize;

use super::view::Outcome;
use crate::db::repository::FullRepository;
use crate::services::{self, LibraryCounts};

pub const INDEX_TEMPLATE: &str = "index";

/// Home page counts. A failed count is reported on the page, not as an error.
#[derive(Debug, Clone, Serialize)]
pub struct Home {
    pub data: Option<LibraryCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn index(repo: &dyn FullRepository) -> Outcome<Home> {
    let home = match services::library_counts(repo).await {
        Ok(counts) => Home {
            data: Some(counts),
            error: None,
        },
        Err(e) => {
            warn!("Failed to count catalog records: {}", e);
            Home {
                data: None,
                error: Some(e.to_string()),
            }
        }
    };
    Outcome::render(INDEX_TEMPLATE, "Local Library Home", home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;

    #[tokio::test]
    async fn test_index_counts_empty_catalog() {
        let repo = LocalRepository::new();
        let outcome = index(&repo).await;
        let view = outcome.view().unwrap();
        assert_eq!(view.title, "Local Library Home");
        assert_eq!(view.data.data, Some(LibraryCounts::default()));
        assert!(view.data.error.is_none());
    }

    #[tokio::test]
    async fn test_index_reports_store_failure_inline() {
        let repo = LocalRepository::new();
        repo.set_offline(true);
        let outcome = index(&repo).await;
        let view = outcome.view().unwrap();
        assert!(view.data.data.is_none());
        assert!(view.data.error.as_deref().unwrap().contains("offline"));
    }
}
