use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::models::{Book, BookPatch};

const COLUMNS: &str = "isbn, amazon_url, author, language, pages, publisher, title, year";

#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("book {0} not found")]
    NotFound(String),

    #[error("book {0} already exists")]
    Conflict(String),

    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Persistence operations on books. Implementations hold no cached state.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All books in insertion order
    async fn list_all(&self) -> RepositoryResult<Vec<Book>>;
    async fn get_by_isbn(&self, isbn: &str) -> RepositoryResult<Book>;
    /// Inserts `book`; a duplicate ISBN is reported by the store as [`RepositoryError::Conflict`]
    async fn create(&self, book: &Book) -> RepositoryResult<Book>;
    /// Applies only the supplied fields and returns the full updated record
    async fn update(&self, isbn: &str, patch: &BookPatch) -> RepositoryResult<Book>;
    async fn delete(&self, isbn: &str) -> RepositoryResult<()>;
}

#[derive(Debug, Clone)]
pub struct SqlBookRepository {
    pool: SqlitePool,
}

impl SqlBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for SqlBookRepository {
    async fn list_all(&self) -> RepositoryResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {COLUMNS} FROM books ORDER BY rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = books.len(), "listed books");
        Ok(books)
    }

    async fn get_by_isbn(&self, isbn: &str) -> RepositoryResult<Book> {
        sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM books WHERE isbn = ?"))
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(isbn.to_string()))
    }

    async fn create(&self, book: &Book) -> RepositoryResult<Book> {
        let created = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
        ))
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                tracing::warn!(isbn = %book.isbn, "duplicate isbn rejected by store");
                RepositoryError::Conflict(book.isbn.clone())
            }
            other => RepositoryError::Store(other),
        })?;

        tracing::debug!(isbn = %created.isbn, "created book");
        Ok(created)
    }

    async fn update(&self, isbn: &str, patch: &BookPatch) -> RepositoryResult<Book> {
        if patch.is_empty() {
            return self.get_by_isbn(isbn).await;
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE books SET ");
        let mut assignments = builder.separated(", ");
        for (column, value) in [
            ("amazon_url", &patch.amazon_url),
            ("author", &patch.author),
            ("language", &patch.language),
            ("publisher", &patch.publisher),
            ("title", &patch.title),
        ] {
            if let Some(value) = value {
                assignments.push(format!("{column} = "));
                assignments.push_bind_unseparated(value.clone());
            }
        }
        for (column, value) in [("pages", patch.pages), ("year", patch.year)] {
            if let Some(value) = value {
                assignments.push(format!("{column} = "));
                assignments.push_bind_unseparated(value);
            }
        }
        builder.push(" WHERE isbn = ");
        builder.push_bind(isbn);
        builder.push(format!(" RETURNING {COLUMNS}"));

        let updated = builder
            .build_query_as::<Book>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(isbn.to_string()))?;

        tracing::debug!(isbn, "updated book");
        Ok(updated)
    }

    async fn delete(&self, isbn: &str) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = ?")
            .bind(isbn)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(isbn.to_string()));
        }

        tracing::debug!(isbn, "deleted book");
        Ok(())
    }
}
