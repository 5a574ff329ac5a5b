//! Per-entity form schemas: the rule set plus the typed terminal builder.

use super::form::{FieldValue, FormValues};
use super::rules::{FieldError, FieldRule, RuleSet, Sanitized};
use super::FormSchema;
use crate::models::{
    Author, Book, BookInstance, BookStatus, Genre, NewAuthor, NewBook, NewBookInstance, NewGenre,
};

const STATUS_LITERALS: &[&str] = &["Maintenance", "Available", "Loaned", "Reserved"];

fn single(values: &mut FormValues, field: &str, value: impl Into<String>) {
    values.insert(field.to_string(), FieldValue::Single(value.into()));
}

fn date_text(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Parse a field that the rule set already checked with `identifier`.
fn parse_ref<T: std::str::FromStr>(
    values: &Sanitized,
    field: &str,
    message: &str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match values.text(field).parse() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

pub struct AuthorForm;

impl FormSchema for AuthorForm {
    type Output = NewAuthor;
    type Entity = Author;

    fn rules() -> RuleSet {
        RuleSet::new()
            .rule(
                FieldRule::required("first_name")
                    .trim()
                    .not_empty("First name must be specified.")
                    .escape()
                    .alphanumeric("First name has non-alphanumeric characters."),
            )
            .rule(
                FieldRule::required("family_name")
                    .trim()
                    .not_empty("Family name must be specified.")
                    .escape()
                    .alphanumeric("Family name has non-alphanumeric characters."),
            )
            .rule(FieldRule::optional("date_of_birth").iso_date("Invalid date of birth"))
            .rule(FieldRule::optional("date_of_death").iso_date("Invalid date of death"))
    }

    fn build(values: &Sanitized) -> Result<NewAuthor, Vec<FieldError>> {
        Ok(NewAuthor {
            first_name: values.text("first_name").to_string(),
            family_name: values.text("family_name").to_string(),
            date_of_birth: values.date("date_of_birth"),
            date_of_death: values.date("date_of_death"),
        })
    }

    fn values_from(author: &Author) -> FormValues {
        let mut values = FormValues::new();
        single(&mut values, "first_name", author.first_name.as_str());
        single(&mut values, "family_name", author.family_name.as_str());
        single(&mut values, "date_of_birth", date_text(author.date_of_birth));
        single(&mut values, "date_of_death", date_text(author.date_of_death));
        values
    }
}

pub struct GenreForm;

impl FormSchema for GenreForm {
    type Output = NewGenre;
    type Entity = Genre;

    fn rules() -> RuleSet {
        RuleSet::new().rule(
            FieldRule::required("name")
                .trim()
                .not_empty("Genre name required")
                .escape(),
        )
    }

    fn build(values: &Sanitized) -> Result<NewGenre, Vec<FieldError>> {
        Ok(NewGenre {
            name: values.text("name").to_string(),
        })
    }

    fn values_from(genre: &Genre) -> FormValues {
        let mut values = FormValues::new();
        single(&mut values, "name", genre.name.as_str());
        values
    }
}

pub struct BookForm;

impl FormSchema for BookForm {
    type Output = NewBook;
    type Entity = Book;

    fn rules() -> RuleSet {
        RuleSet::new()
            .rule(
                FieldRule::required("title")
                    .trim()
                    .not_empty("Title can't be empty")
                    .escape(),
            )
            .rule(
                FieldRule::required("author")
                    .trim()
                    .not_empty("Author can't be empty")
                    .escape()
                    .identifier("Author must be a valid identifier"),
            )
            .rule(
                FieldRule::required("summary")
                    .trim()
                    .not_empty("Summary can't be empty")
                    .escape(),
            )
            .rule(
                FieldRule::required("isbn")
                    .trim()
                    .not_empty("ISBN can't be empty")
                    .escape(),
            )
            .rule(
                FieldRule::each("genre")
                    .escape()
                    .identifier("Genre must be a valid identifier"),
            )
    }

    fn build(values: &Sanitized) -> Result<NewBook, Vec<FieldError>> {
        let mut errors = Vec::new();
        let author = parse_ref(
            values,
            "author",
            "Author must be a valid identifier",
            &mut errors,
        );
        let mut genre = Vec::new();
        for raw in values.list("genre") {
            match raw.parse() {
                Ok(id) => genre.push(id),
                Err(_) => errors.push(FieldError::new("genre", "Genre must be a valid identifier")),
            }
        }

        match author {
            Some(author) if errors.is_empty() => Ok(NewBook {
                title: values.text("title").to_string(),
                author,
                summary: values.text("summary").to_string(),
                isbn: values.text("isbn").to_string(),
                genre,
            }),
            _ => Err(errors),
        }
    }

    fn values_from(book: &Book) -> FormValues {
        let mut values = FormValues::new();
        single(&mut values, "title", book.title.as_str());
        single(&mut values, "author", book.author.to_string());
        single(&mut values, "summary", book.summary.as_str());
        single(&mut values, "isbn", book.isbn.as_str());
        values.insert(
            "genre".to_string(),
            FieldValue::List(book.genre.iter().map(ToString::to_string).collect()),
        );
        values
    }
}

pub struct BookInstanceForm;

impl FormSchema for BookInstanceForm {
    type Output = NewBookInstance;
    type Entity = BookInstance;

    fn rules() -> RuleSet {
        RuleSet::new()
            .rule(
                FieldRule::required("book")
                    .trim()
                    .not_empty("Book must be specified")
                    .escape()
                    .identifier("Book must be a valid identifier"),
            )
            .rule(
                FieldRule::required("imprint")
                    .trim()
                    .not_empty("Imprint must be specified")
                    .escape(),
            )
            .rule(
                FieldRule::required("status")
                    .escape()
                    .one_of(STATUS_LITERALS, "Invalid status"),
            )
            .rule(FieldRule::optional("due_back").iso_date("Invalid date"))
    }

    fn build(values: &Sanitized) -> Result<NewBookInstance, Vec<FieldError>> {
        let mut errors = Vec::new();
        let book = parse_ref(values, "book", "Book must be a valid identifier", &mut errors);
        let status = match values.text("status").parse::<BookStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                errors.push(FieldError::new("status", "Invalid status"));
                None
            }
        };

        match (book, status) {
            (Some(book), Some(status)) => Ok(NewBookInstance {
                book,
                imprint: values.text("imprint").to_string(),
                status,
                due_back: values.date("due_back"),
            }),
            _ => Err(errors),
        }
    }

    fn values_from(instance: &BookInstance) -> FormValues {
        let mut values = FormValues::new();
        single(&mut values, "book", instance.book.to_string());
        single(&mut values, "imprint", instance.imprint.as_str());
        single(&mut values, "status", instance.status.as_str());
        single(&mut values, "due_back", date_text(instance.due_back));
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorId, GenreId};
    use crate::validation::{validate, FormData};

    fn messages(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn test_author_form_builds_dates() {
        let form = FormData::new()
            .with("first_name", "Frank")
            .with("family_name", "Herbert")
            .with("date_of_birth", "1920-10-08")
            .with("date_of_death", "");
        let author = validate::<AuthorForm>(&form).unwrap();
        assert_eq!(author.date_of_birth, chrono::NaiveDate::from_ymd_opt(1920, 10, 8));
        assert_eq!(author.date_of_death, None);
    }

    #[test]
    fn test_author_form_reports_in_rule_order() {
        let form = FormData::new()
            .with("first_name", "J.R.R.")
            .with("family_name", "")
            .with("date_of_birth", "someday");
        let rejected = validate::<AuthorForm>(&form).unwrap_err();
        assert_eq!(
            messages(&rejected.errors),
            vec![
                "First name has non-alphanumeric characters.",
                "Family name must be specified.",
                "Family name has non-alphanumeric characters.",
                "Invalid date of birth",
            ]
        );
        assert_eq!(rejected.values["date_of_birth"].as_str(), "someday");
    }

    #[test]
    fn test_book_form_title_required() {
        let form = FormData::new()
            .with("title", "")
            .with("author", AuthorId::generate().to_string())
            .with("summary", "...")
            .with("isbn", "9780441013593");
        let rejected = validate::<BookForm>(&form).unwrap_err();
        assert_eq!(messages(&rejected.errors), vec!["Title can't be empty"]);
    }

    #[test]
    fn test_book_form_escapes_and_collects_genres() {
        let g1 = GenreId::generate();
        let g2 = GenreId::generate();
        let form = FormData::new()
            .with("title", "  Tom & Jerry ")
            .with("author", AuthorId::generate().to_string())
            .with("summary", "<p>cat</p>")
            .with("isbn", "123")
            .with("genre", g1.to_string())
            .with("genre", g2.to_string());
        let book = validate::<BookForm>(&form).unwrap();
        assert_eq!(book.title, "Tom &amp; Jerry");
        assert_eq!(book.summary, "&lt;p&gt;cat&lt;&#x2F;p&gt;");
        assert_eq!(book.genre, vec![g1, g2]);
    }

    #[test]
    fn test_book_form_rejects_malformed_references() {
        let form = FormData::new()
            .with("title", "Dune")
            .with("author", "nobody")
            .with("summary", "...")
            .with("isbn", "1")
            .with("genre", "sci-fi");
        let rejected = validate::<BookForm>(&form).unwrap_err();
        assert_eq!(
            messages(&rejected.errors),
            vec![
                "Author must be a valid identifier",
                "Genre must be a valid identifier"
            ]
        );
    }

    #[test]
    fn test_book_instance_status_must_be_listed() {
        let form = FormData::new()
            .with("book", crate::models::BookId::generate().to_string())
            .with("imprint", "Ace")
            .with("status", "Lost");
        let rejected = validate::<BookInstanceForm>(&form).unwrap_err();
        assert_eq!(messages(&rejected.errors), vec!["Invalid status"]);
    }

    #[test]
    fn test_genre_values_from_entity() {
        let genre = NewGenre {
            name: "Poetry".into(),
        }
        .with_id(GenreId::generate());
        let values = GenreForm::values_from(&genre);
        assert_eq!(values["name"].as_str(), "Poetry");
    }
}
