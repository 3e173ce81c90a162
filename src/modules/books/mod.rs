//! Book catalog module: entity, repository, service and HTTP routes.

pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod seed;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use libris_kernel::{InitCtx, Module};
use serde_json::json;
use tokio_util::sync::CancellationToken;

pub use error::{BookError, BookResult};
pub use models::{Book, BookId, BookStatus, CreateBook, UpdateBook};
pub use repository::{BookRepository, InMemoryBookRepository};
pub use routes::BooksState;
pub use seed::seed_sample_data;
pub use service::{BookService, InMemoryUnitOfWork, UnitOfWork};

/// Books module wiring one [`BookService`] into the module lifecycle.
pub struct BooksModule<U: UnitOfWork> {
    state: BooksState<U>,
}

impl BooksModule<InMemoryUnitOfWork> {
    /// Module backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(InMemoryUnitOfWork::new(Arc::new(
            InMemoryBookRepository::new(),
        )))
    }
}

impl<U: UnitOfWork> BooksModule<U> {
    pub fn new(uow: U) -> Self {
        Self {
            state: BooksState {
                service: Arc::new(BookService::new(uow)),
                shutdown: CancellationToken::new(),
            },
        }
    }

    pub fn service(&self) -> &Arc<BookService<U>> {
        &self.state.service
    }
}

#[async_trait]
impl<U: UnitOfWork + 'static> Module for BooksModule<U> {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            seed_sample_data = ctx.settings.library.seed_sample_data,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if ctx.settings.library.seed_sample_data {
            // A half-seeded catalog is still usable, so this is not fatal.
            if let Err(err) = seed_sample_data(self.state.service.as_ref(), &self.state.shutdown).await {
                tracing::error!(module = self.name(), error = %err, "failed to seed sample data");
            }
        }
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.state.shutdown.cancel();
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module over an in-memory store
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::in_memory())
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn id_parameter() -> serde_json::Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string", "format": "uuid" }
    })
}

fn openapi_fragment() -> serde_json::Value {
    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "All books in the catalog",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        }
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CreateBook" }
                            }
                        }
                    },
                    "responses": {
                        "201": book_response("Created book; Location header points at it"),
                        "400": error_response("Invalid book data"),
                        "409": error_response("Book already exists")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": {
                                "text/plain": { "schema": { "type": "string" } }
                            }
                        }
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": book_response("The requested book"),
                        "404": error_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Update a book's details",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/UpdateBook" }
                            }
                        }
                    },
                    "responses": {
                        "200": book_response("Updated book"),
                        "400": error_response("Invalid book data"),
                        "404": error_response("Book not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "204": { "description": "Deleted" },
                        "404": error_response("Book not found")
                    }
                }
            },
            "/{id}/checkout": {
                "post": {
                    "summary": "Check a book out",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": book_response("Checked-out book"),
                        "404": error_response("Book not found"),
                        "409": error_response("Book is not available")
                    }
                }
            },
            "/{id}/return": {
                "post": {
                    "summary": "Return a checked-out book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": book_response("Returned book"),
                        "404": error_response("Book not found"),
                        "409": error_response("Book is not checked out")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "BookStatus": {
                    "type": "string",
                    "enum": ["available", "checked_out", "reserved", "out_of_service"]
                },
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "isbn": { "type": "string" },
                        "published_date": { "type": "string", "format": "date-time" },
                        "page_count": { "type": "integer", "minimum": 1 },
                        "status": { "$ref": "#/components/schemas/BookStatus" },
                        "created_at": { "type": "string", "format": "date-time" },
                        "updated_at": { "type": ["string", "null"], "format": "date-time" }
                    },
                    "required": [
                        "id", "title", "author", "isbn", "published_date",
                        "page_count", "status", "created_at"
                    ]
                },
                "CreateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "isbn": { "type": "string" },
                        "published_date": { "type": "string", "format": "date-time" },
                        "page_count": { "type": "integer", "minimum": 1 }
                    },
                    "required": ["title", "author", "isbn", "published_date", "page_count"]
                },
                "UpdateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "page_count": { "type": "integer", "minimum": 1 }
                    },
                    "required": ["title", "author", "page_count"]
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_kernel::Settings;

    #[tokio::test]
    async fn start_seeds_when_enabled() {
        let module = BooksModule::in_memory();
        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        module.init(&ctx).await.unwrap();
        module.start(&ctx).await.unwrap();

        let books = module
            .service()
            .get_all_books(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(books.len(), 3);
    }

    #[tokio::test]
    async fn start_skips_seed_when_disabled() {
        let module = BooksModule::in_memory();
        let mut settings = Settings::default();
        settings.library.seed_sample_data = false;
        let ctx = InitCtx {
            settings: &settings,
        };

        module.start(&ctx).await.unwrap();

        let books = module
            .service()
            .get_all_books(&CancellationToken::new())
            .await
            .unwrap();
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn stop_cancels_shared_token() {
        let module = BooksModule::in_memory();
        module.stop().await.unwrap();
        assert!(module.state.shutdown.is_cancelled());
        assert!(module.state.request_token().is_cancelled());
    }

    #[test]
    fn openapi_documents_every_route() {
        let spec = BooksModule::in_memory().openapi().unwrap();
        for path in ["/", "/health", "/{id}", "/{id}/checkout", "/{id}/return"] {
            assert!(spec["paths"][path].is_object(), "missing {path}");
        }
        assert!(spec["components"]["schemas"]["Book"].is_object());
    }
}
