//! What a controller hands back to the HTTP layer.
//!
//! A controller either renders a named view with a title, its data and any
//! validation errors, or redirects to another catalog URL. The summaries below
//! are the entity shapes the views receive: persisted fields plus the computed
//! display and URL helpers.

use serde::Serialize;

use crate::models::{Author, Book, BookInstance, Genre};
use crate::validation::FieldError;

/// A rendered page.
#[derive(Debug, Clone, Serialize)]
pub struct View<T> {
    pub template: &'static str,
    pub title: String,
    #[serde(flatten)]
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl<T> View<T> {
    pub fn new(template: &'static str, title: impl Into<String>, data: T) -> Self {
        Self {
            template,
            title: title.into(),
            data,
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }
}

/// Result of a controller operation that did not fail.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    Render(View<T>),
    Redirect(String),
}

impl<T> Outcome<T> {
    pub fn render(template: &'static str, title: impl Into<String>, data: T) -> Self {
        Outcome::Render(View::new(template, title, data))
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        Outcome::Redirect(url.into())
    }

    pub fn view(&self) -> Option<&View<T>> {
        match self {
            Outcome::Render(view) => Some(view),
            Outcome::Redirect(_) => None,
        }
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Outcome::Redirect(url) => Some(url),
            Outcome::Render(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorSummary {
    #[serde(flatten)]
    pub author: Author,
    pub name: String,
    pub lifespan: String,
    pub date_of_birth_formatted: String,
    pub date_of_death_formatted: String,
    pub url: String,
}

impl From<&Author> for AuthorSummary {
    fn from(author: &Author) -> Self {
        Self {
            name: author.name(),
            lifespan: author.lifespan(),
            date_of_birth_formatted: author.date_of_birth_formatted(),
            date_of_death_formatted: author.date_of_death_formatted(),
            url: author.url(),
            author: author.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreSummary {
    #[serde(flatten)]
    pub genre: Genre,
    pub url: String,
}

impl From<&Genre> for GenreSummary {
    fn from(genre: &Genre) -> Self {
        Self {
            url: genre.url(),
            genre: genre.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookSummary {
    #[serde(flatten)]
    pub book: Book,
    pub url: String,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            url: book.url(),
            book: book.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceSummary {
    #[serde(flatten)]
    pub instance: BookInstance,
    pub due_back_formatted: String,
    pub url: String,
}

impl From<&BookInstance> for BookInstanceSummary {
    fn from(instance: &BookInstance) -> Self {
        Self {
            due_back_formatted: instance.due_back_formatted(),
            url: instance.url(),
            instance: instance.clone(),
        }
    }
}

pub(crate) fn summaries<'a, E: 'a, S: From<&'a E>>(items: impl IntoIterator<Item = &'a E>) -> Vec<S> {
    items.into_iter().map(S::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorId, NewAuthor};
    use chrono::NaiveDate;

    #[test]
    fn test_view_flattens_data_and_hides_empty_errors() {
        #[derive(Serialize)]
        struct Data {
            count: u32,
        }
        let json = serde_json::to_value(View::new("index", "Home", Data { count: 3 })).unwrap();
        assert_eq!(json["template"], "index");
        assert_eq!(json["count"], 3);
        assert!(json.get("errors").is_none());

        let with_errors = View::new("index", "Home", Data { count: 0 })
            .with_errors(vec![FieldError::new("name", "Genre name required")]);
        let json = serde_json::to_value(with_errors).unwrap();
        assert_eq!(json["errors"][0]["message"], "Genre name required");
    }

    #[test]
    fn test_author_summary_carries_computed_fields() {
        let author = NewAuthor {
            first_name: "Isaac".into(),
            family_name: "Asimov".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1920, 1, 2),
            date_of_death: None,
        }
        .with_id(AuthorId::generate());
        let json = serde_json::to_value(AuthorSummary::from(&author)).unwrap();
        assert_eq!(json["name"], "Asimov, Isaac");
        assert_eq!(json["date_of_birth_formatted"], "Jan 2, 1920");
        assert_eq!(json["first_name"], "Isaac");
        assert_eq!(json["url"], author.url());
    }

    #[test]
    fn test_outcome_accessors() {
        let redirect: Outcome<()> = Outcome::redirect("/catalog/authors");
        assert_eq!(redirect.redirect_target(), Some("/catalog/authors"));
        assert!(redirect.view().is_none());
    }
}
