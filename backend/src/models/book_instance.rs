use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{format_date, BookId, BookInstanceId, CATALOG_ROOT};

/// Circulation status of a physical copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BookStatus {
    #[default]
    Maintenance,
    Available,
    Loaned,
    Reserved,
}

impl BookStatus {
    pub const ALL: [BookStatus; 4] = [
        BookStatus::Maintenance,
        BookStatus::Available,
        BookStatus::Loaned,
        BookStatus::Reserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Maintenance => "Maintenance",
            BookStatus::Available => "Available",
            BookStatus::Loaned => "Loaned",
            BookStatus::Reserved => "Reserved",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown book status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for BookStatus {
    type Err = UnknownStatus;

    /// Exact, case-sensitive match against the four literals.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A physical copy of a [`super::Book`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInstance {
    pub id: BookInstanceId,
    pub book: BookId,
    pub imprint: String,
    pub status: BookStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_back: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookInstance {
    pub book: BookId,
    pub imprint: String,
    pub status: BookStatus,
    pub due_back: Option<NaiveDate>,
}

impl NewBookInstance {
    pub fn with_id(self, id: BookInstanceId) -> BookInstance {
        BookInstance {
            id,
            book: self.book,
            imprint: self.imprint,
            status: self.status,
            due_back: self.due_back,
        }
    }
}

impl BookInstance {
    pub fn url(&self) -> String {
        format!("{}/bookinstance/{}", CATALOG_ROOT, self.id)
    }

    pub fn due_back_formatted(&self) -> String {
        format_date(self.due_back)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parses_exact_literals() {
        for status in BookStatus::ALL {
            assert_eq!(status.as_str().parse::<BookStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_status_rejects_other_values() {
        assert!("available".parse::<BookStatus>().is_err());
        assert!("Lost".parse::<BookStatus>().is_err());
        assert!("".parse::<BookStatus>().is_err());
    }

    #[test]
    fn test_default_status_is_maintenance() {
        assert_eq!(BookStatus::default(), BookStatus::Maintenance);
    }

    #[test]
    fn test_due_back_formatted() {
        let copy = NewBookInstance {
            book: BookId::generate(),
            imprint: "Ace, 2005".to_string(),
            status: BookStatus::Loaned,
            due_back: NaiveDate::from_ymd_opt(2024, 3, 9),
        }
        .with_id(BookInstanceId::generate());
        assert_eq!(copy.due_back_formatted(), "Mar 9, 2024");
        assert!(copy.url().starts_with("/catalog/bookinstance/"));
    }
}
