use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{format_date, AuthorId, CATALOG_ROOT};

/// A book author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub first_name: String,
    pub family_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_death: Option<NaiveDate>,
}

/// Author fields without an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl NewAuthor {
    pub fn with_id(self, id: AuthorId) -> Author {
        Author {
            id,
            first_name: self.first_name,
            family_name: self.family_name,
            date_of_birth: self.date_of_birth,
            date_of_death: self.date_of_death,
        }
    }
}

impl Author {
    /// Display name, "family_name, first_name".
    ///
    /// Empty when either part is missing so that views never show a dangling comma.
    pub fn name(&self) -> String {
        if self.first_name.is_empty() || self.family_name.is_empty() {
            return String::new();
        }
        format!("{}, {}", self.family_name, self.first_name)
    }

    /// Birth and death dates joined with " - ", each "unknown" when absent.
    pub fn lifespan(&self) -> String {
        let fmt = |d: Option<NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "unknown".to_string())
        };
        format!("{} - {}", fmt(self.date_of_birth), fmt(self.date_of_death))
    }

    pub fn date_of_birth_formatted(&self) -> String {
        format_date(self.date_of_birth)
    }

    pub fn date_of_death_formatted(&self) -> String {
        format_date(self.date_of_death)
    }

    pub fn url(&self) -> String {
        format!("{}/author/{}", CATALOG_ROOT, self.id)
    }
}
