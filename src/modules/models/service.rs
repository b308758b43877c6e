//! The two proxy operations: popular list and single-item detail.

use tracing::{info, warn};

use super::client::{CatalogError, ThingiverseClient};
use super::models::{ModelDetail, ModelSummary};
use super::transform;

/// Stateless front for the catalog provider. Every call goes upstream.
#[derive(Debug, Clone)]
pub struct CatalogService {
    client: ThingiverseClient,
}

impl CatalogService {
    pub fn new(client: ThingiverseClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ThingiverseClient {
        &self.client
    }

    /// One page of popular items, in upstream order.
    ///
    /// Pages past the end come back as whatever upstream returns, usually empty.
    pub async fn list_popular(&self, page: u64) -> Result<Vec<ModelSummary>, CatalogError> {
        let things = self.client.popular(page).await?;

        info!(page, count = things.len(), "fetched popular models");

        Ok(things.into_iter().map(transform::summarize).collect())
    }

    /// Item record and gallery, fetched concurrently.
    ///
    /// A failed record fetch fails the call; a failed gallery fetch only
    /// empties `images`.
    pub async fn get_detail(&self, id: &str) -> Result<ModelDetail, CatalogError> {
        self.client.ensure_token()?;

        // Both futures are polled together; neither cancels the other.
        let (record, gallery) =
            tokio::join!(self.client.thing(id), self.client.thing_images(id));

        let thing = record?;
        let gallery = gallery.unwrap_or_else(|e| {
            warn!(thing_id = %id, error = %e, "gallery unavailable, returning no images");
            Vec::new()
        });

        info!(thing_id = %id, images = gallery.len(), "fetched model details");

        Ok(transform::detail(thing, &gallery))
    }
}
