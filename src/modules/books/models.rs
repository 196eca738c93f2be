use serde::{Deserialize, Serialize};

/// A catalog entry keyed by ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Primary key; never changes after creation
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    /// Page count, never negative
    pub pages: i64,
    pub publisher: String,
    pub title: String,
    pub year: i64,
}

/// Fields supplied by a partial update. `None` leaves the stored value as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookPatch {
    pub amazon_url: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub pages: Option<i64>,
    pub publisher: Option<String>,
    pub title: Option<String>,
    pub year: Option<i64>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// `{ "book": ... }`
#[derive(Debug, Serialize, Deserialize)]
pub struct BookEnvelope {
    pub book: Book,
}

/// `{ "books": [...] }`
#[derive(Debug, Serialize, Deserialize)]
pub struct BookList {
    pub books: Vec<Book>,
}

/// `{ "message": ... }`
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}
