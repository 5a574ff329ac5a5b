use serde::{Deserialize, Serialize};

use super::{AuthorId, BookId, GenreId, CATALOG_ROOT};

/// A catalogued title. Copies of it are [`super::BookInstance`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: AuthorId,
    pub summary: String,
    pub isbn: String,
    /// Referenced genres. Order carries no meaning.
    pub genre: Vec<GenreId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: AuthorId,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<GenreId>,
}

impl NewBook {
    /// Attach an identifier. Repeated genre references collapse to one.
    pub fn with_id(self, id: BookId) -> Book {
        let mut genre = self.genre;
        genre.sort();
        genre.dedup();
        Book {
            id,
            title: self.title,
            author: self.author,
            summary: self.summary,
            isbn: self.isbn,
            genre,
        }
    }
}

impl Book {
    pub fn url(&self) -> String {
        format!("{}/book/{}", CATALOG_ROOT, self.id)
    }

    pub fn has_genre(&self, genre: GenreId) -> bool {
        self.genre.contains(&genre)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_genres_collapse() {
        let g = GenreId::generate();
        let book = NewBook {
            title: "Dune".to_string(),
            author: AuthorId::generate(),
            summary: "Spice".to_string(),
            isbn: "9780441013593".to_string(),
            genre: vec![g, g],
        }
        .with_id(BookId::generate());
        assert_eq!(book.genre, vec![g]);
        assert!(book.has_genre(g));
    }
}
