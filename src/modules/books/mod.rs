pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookstore_db::SchemaStatement;
use bookstore_kernel::{InitCtx, Module};
use serde_json::json;

use repository::SqlBookRepository;

/// The books catalog: validation, persistence and the `/books` routes
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Default for BooksModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        let repo = Arc::new(SqlBookRepository::new(ctx.db.pool().clone()));
        routes::router(repo)
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let book_ref = json!({ "$ref": "#/components/schemas/Book" });
        let error_ref = json!({
            "description": "Error",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        });
        let envelope = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": {
                            "type": "object",
                            "properties": { "book": book_ref },
                            "required": ["book"]
                        }
                    }
                }
            })
        };
        let isbn_param = json!([{
            "name": "isbn",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        }]);

        Some(json!({
            "paths": {
                "/books": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "All books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "books": { "type": "array", "items": book_ref }
                                            }
                                        }
                                    }
                                }
                            },
                            "500": error_ref
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Book" }
                                }
                            }
                        },
                        "responses": {
                            "201": envelope("Created book"),
                            "400": error_ref,
                            "500": error_ref
                        }
                    }
                },
                "/books/{isbn}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": isbn_param,
                        "responses": {
                            "200": envelope("The book"),
                            "404": error_ref
                        }
                    },
                    "put": {
                        "summary": "Partially update a book",
                        "tags": ["Books"],
                        "parameters": isbn_param,
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookPatch" }
                                }
                            }
                        },
                        "responses": {
                            "200": envelope("Updated book"),
                            "400": error_ref,
                            "404": error_ref
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": isbn_param,
                        "responses": {
                            "200": {
                                "description": "Deleted",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": { "message": { "type": "string" } }
                                        }
                                    }
                                }
                            },
                            "404": error_ref
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "isbn": { "type": "string" },
                            "amazon_url": { "type": "string" },
                            "author": { "type": "string" },
                            "language": { "type": "string" },
                            "pages": { "type": "integer", "minimum": 0 },
                            "publisher": { "type": "string" },
                            "title": { "type": "string" },
                            "year": { "type": "integer" }
                        },
                        "required": [
                            "isbn", "amazon_url", "author", "language",
                            "pages", "publisher", "title", "year"
                        ],
                        "additionalProperties": false
                    },
                    "BookPatch": {
                        "type": "object",
                        "properties": {
                            "amazon_url": { "type": "string" },
                            "author": { "type": "string" },
                            "language": { "type": "string" },
                            "pages": { "type": "integer", "minimum": 0 },
                            "publisher": { "type": "string" },
                            "title": { "type": "string" },
                            "year": { "type": "integer" }
                        },
                        "additionalProperties": false
                    }
                }
            }
        }))
    }

    fn schema(&self) -> Vec<SchemaStatement> {
        vec![SchemaStatement {
            id: "books_001_table",
            up: r#"
                CREATE TABLE IF NOT EXISTS books (
                    isbn       TEXT PRIMARY KEY,
                    amazon_url TEXT NOT NULL,
                    author     TEXT NOT NULL,
                    language   TEXT NOT NULL,
                    pages      INTEGER NOT NULL CHECK (pages >= 0),
                    publisher  TEXT NOT NULL,
                    title      TEXT NOT NULL,
                    year       INTEGER NOT NULL
                )
                "#,
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new())
}
