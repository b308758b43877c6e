pub mod client;
pub mod models;
pub mod routes;
pub mod service;
pub mod transform;

use std::sync::Arc;

use async_trait::async_trait;
use ane_kernel::settings::CatalogSettings;
use ane_kernel::{InitCtx, Module};
use axum::Router;
use serde_json::json;

use client::ThingiverseClient;
use service::CatalogService;

/// Catalog proxy in front of the Thingiverse API, mounted at `/api/models`.
pub struct ModelsModule {
    service: Arc<CatalogService>,
}

impl ModelsModule {
    pub fn new(service: Arc<CatalogService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for ModelsModule {
    fn name(&self) -> &'static str {
        "models"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let client = self.service.client();

        match client.ensure_token() {
            Ok(token) => tracing::info!(
                module = self.name(),
                upstream = %client.base_url(),
                token = %token.preview(),
                "models module initialized"
            ),
            Err(_) if ctx.settings.catalog.require_token => {
                anyhow::bail!("catalog.require_token is set but no Thingiverse token is configured")
            }
            Err(_) => tracing::warn!(
                module = self.name(),
                "no Thingiverse token configured; model requests will fail until one is set"
            ),
        }

        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(Arc::clone(&self.service))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error_response = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List popular models",
                        "tags": ["Models"],
                        "parameters": [{
                            "name": "page",
                            "in": "query",
                            "required": false,
                            "description": "1-based page; 12 items per page",
                            "schema": { "type": "integer", "minimum": 1 }
                        }],
                        "responses": {
                            "200": {
                                "description": "Popular models in upstream order",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/ModelSummary" }
                                        }
                                    }
                                }
                            },
                            "500": error_response("Missing token or invalid upstream response"),
                            "default": error_response("Upstream status passed through")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get model details",
                        "tags": ["Models"],
                        "parameters": [{
                            "name": "id",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": {
                                "description": "Model with resolved gallery",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ModelDetail" }
                                    }
                                }
                            },
                            "404": error_response("Unknown model"),
                            "500": error_response("Missing token or internal failure")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "ModelSummary": {
                        "type": "object",
                        "properties": {
                            "id": { "type": ["integer", "string"], "description": "Upstream identifier" },
                            "name": { "type": "string" },
                            "price": { "type": "integer", "description": "Always 0" },
                            "image": { "type": ["string", "null"] },
                            "category": { "type": "string" },
                            "rating": { "type": "number" },
                            "description": { "type": ["string", "null"] },
                            "downloads": { "type": "integer" },
                            "like_count": { "type": ["integer", "null"] }
                        },
                        "required": ["id", "name", "price", "category", "rating", "downloads"]
                    },
                    "ModelDetail": {
                        "type": "object",
                        "properties": {
                            "id": { "type": ["integer", "string"], "description": "Upstream identifier" },
                            "name": { "type": "string" },
                            "price": { "type": "integer", "description": "Always 0" },
                            "image": { "type": ["string", "null"] },
                            "images": { "type": "array", "items": { "type": "string" } },
                            "category": { "type": "string" },
                            "rating": { "type": "number" },
                            "description": { "type": ["string", "null"] },
                            "downloads": { "type": "integer" },
                            "like_count": { "type": ["integer", "null"] },
                            "creator": { "type": ["string", "null"] },
                            "license": { "type": ["string", "null"] }
                        },
                        "required": ["id", "name", "price", "images", "category", "rating", "downloads"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "models module stopped");
        Ok(())
    }
}

/// Build the proxy service from catalog settings; the token is captured here once.
pub fn create_service(settings: &CatalogSettings) -> anyhow::Result<Arc<CatalogService>> {
    let client = ThingiverseClient::new(settings)?;
    Ok(Arc::new(CatalogService::new(client)))
}

/// Create a new instance of the models module
pub fn create_module(settings: &CatalogSettings) -> anyhow::Result<Arc<dyn Module>> {
    Ok(Arc::new(ModelsModule::new(create_service(settings)?)))
}
