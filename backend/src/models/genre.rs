use serde::{Deserialize, Serialize};

use super::{GenreId, CATALOG_ROOT};

/// A book genre. Names are unique by exact value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGenre {
    pub name: String,
}

impl NewGenre {
    pub fn with_id(self, id: GenreId) -> Genre {
        Genre {
            id,
            name: self.name,
        }
    }
}

impl Genre {
    pub fn url(&self) -> String {
        format!("{}/genre/{}", CATALOG_ROOT, self.id)
    }
}
