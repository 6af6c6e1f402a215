pub mod models;
pub mod registry;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Module};
use serde_json::json;

use registry::BookRegistry;

/// Books module: owns the registry and exposes it over `/books`
pub struct BooksModule {
    registry: Arc<BookRegistry>,
}

impl BooksModule {
    pub fn new(registry: Arc<BookRegistry>) -> Self {
        Self { registry }
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

    fn routes(&self) -> Router {
        routes::router(self.registry.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let fail = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let success = |description: &str, schema: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": format!("#/components/schemas/{schema}") }
                    }
                }
            })
        };
        let book_id_param = json!({
            "name": "bookId",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        });
        let flag_param = |name: &str| {
            json!({
                "name": name,
                "in": "query",
                "required": false,
                "description": "0 for false, any other number for true",
                "schema": { "type": "string" }
            })
        };
        let payload_body = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookPayload" }
                }
            }
        });

        Some(json!({
            "paths": {
                "/books": {
                    "post": {
                        "summary": "Add a book",
                        "tags": ["Books"],
                        "requestBody": payload_body,
                        "responses": {
                            "201": success("Book added", "BookCreated"),
                            "400": fail("Missing name or readPage greater than pageCount")
                        }
                    },
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "name",
                                "in": "query",
                                "required": false,
                                "description": "Case-insensitive substring of the book name",
                                "schema": { "type": "string" }
                            },
                            flag_param("reading"),
                            flag_param("finished")
                        ],
                        "responses": {
                            "200": success("Matching books", "BookList"),
                            "400": fail("Non-numeric reading/finished filter")
                        }
                    }
                },
                "/books/{bookId}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [book_id_param],
                        "responses": {
                            "200": success("The book", "BookDetail"),
                            "404": fail("Book not found")
                        }
                    },
                    "put": {
                        "summary": "Replace a book",
                        "tags": ["Books"],
                        "parameters": [book_id_param],
                        "requestBody": payload_body,
                        "responses": {
                            "200": success("Book updated", "Message"),
                            "400": fail("Missing name or readPage greater than pageCount"),
                            "404": fail("Id not found")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [book_id_param],
                        "responses": {
                            "200": success("Book deleted", "Message"),
                            "404": fail("Id not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" },
                            "year": { "type": ["integer", "null"] },
                            "author": { "type": "string" },
                            "summary": { "type": "string" },
                            "publisher": { "type": "string" },
                            "pageCount": { "type": "integer", "minimum": 0 },
                            "readPage": { "type": "integer", "minimum": 0 },
                            "finished": { "type": "boolean" },
                            "reading": { "type": "boolean" },
                            "insertedAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": [
                            "id", "name", "year", "author", "summary", "publisher", "pageCount",
                            "readPage", "finished", "reading", "insertedAt", "updatedAt"
                        ]
                    },
                    "BookPayload": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "year": { "type": "integer" },
                            "author": { "type": "string" },
                            "summary": { "type": "string" },
                            "publisher": { "type": "string" },
                            "pageCount": { "type": "integer", "minimum": 0 },
                            "readPage": { "type": "integer", "minimum": 0 },
                            "reading": { "type": "boolean" }
                        },
                        "required": ["name"]
                    },
                    "BookSummary": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" },
                            "publisher": { "type": "string" }
                        },
                        "required": ["id", "name", "publisher"]
                    },
                    "BookCreated": {
                        "type": "object",
                        "properties": {
                            "status": { "type": "string" },
                            "message": { "type": "string" },
                            "data": {
                                "type": "object",
                                "properties": { "bookId": { "type": "string" } },
                                "required": ["bookId"]
                            }
                        },
                        "required": ["status", "message", "data"]
                    },
                    "BookList": {
                        "type": "object",
                        "properties": {
                            "status": { "type": "string" },
                            "data": {
                                "type": "object",
                                "properties": {
                                    "books": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/BookSummary" }
                                    }
                                },
                                "required": ["books"]
                            }
                        },
                        "required": ["status", "data"]
                    },
                    "BookDetail": {
                        "type": "object",
                        "properties": {
                            "status": { "type": "string" },
                            "data": {
                                "type": "object",
                                "properties": {
                                    "book": { "$ref": "#/components/schemas/Book" }
                                },
                                "required": ["book"]
                            }
                        },
                        "required": ["status", "data"]
                    },
                    "Message": {
                        "type": "object",
                        "properties": {
                            "status": { "type": "string" },
                            "message": { "type": "string" }
                        },
                        "required": ["status", "message"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        // Nothing is persisted; whatever is left in the registry is discarded.
        let discarded = self.registry.len()?;
        tracing::info!(module = self.name(), discarded, "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module with an empty registry
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new(Arc::new(BookRegistry::new())))
}
