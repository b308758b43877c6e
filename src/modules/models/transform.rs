//! Upstream → storefront reshaping rules.
//!
//! Everything here is pure so the CDN naming heuristics can be changed
//! without touching the HTTP plumbing.

use super::models::{ModelDetail, ModelSummary, Thing, ThingImage};

/// Category tag the storefront filters Thingiverse items by.
pub const CATEGORY: &str = "Thinkiverse";

/// Catalog items are browse-only; ordering happens outside the site.
pub const PRICE: u32 = 0;

/// Gallery renditions to prefer, best first.
pub const GALLERY_PRIORITY: [&str; 3] = ["display_large", "large", "original"];

/// Rewrite a Thingiverse thumbnail URL to its large rendition.
///
/// ```text
/// .../renders/ab/cd/img_thumb_medium.jpg -> .../renders/ab/cd/img_large.jpg
/// .../renders/ab/cd/img_thumb_small.jpg  -> .../renders/ab/cd/img_large.jpg
/// .../renders/ab/cd/img_preview.jpg      -> unchanged
/// ```
///
/// The result is not checked for existence on the CDN.
pub fn high_res_thumbnail(url: &str) -> String {
    url.replace("thumb_medium", "large")
        .replace("thumb_small", "large")
}

/// Rating shown in the popular list.
pub fn list_rating(like_count: Option<u64>) -> f64 {
    if like_count.unwrap_or(0) > 100 {
        5.0
    } else {
        4.0
    }
}

/// Rating shown on the detail page. Deliberately not the list formula.
pub fn detail_rating(like_count: Option<u64>) -> f64 {
    if like_count.unwrap_or(0) > 50 {
        4.8
    } else {
        4.2
    }
}

/// Pick the best URL for one gallery image.
///
/// Named variants in [`GALLERY_PRIORITY`] win regardless of position, then the
/// first listed rendition, then the image's own URL.
pub fn resolve_gallery_image(image: &ThingImage) -> Option<String> {
    GALLERY_PRIORITY
        .iter()
        .find_map(|name| image.sizes.iter().find(|s| s.is_variant(name)))
        .or_else(|| image.sizes.first())
        .map(|s| s.url.clone())
        .or_else(|| image.url.clone())
}

pub fn summarize(thing: Thing) -> ModelSummary {
    let image = thing.thumbnail.as_deref().map(high_res_thumbnail);

    ModelSummary {
        id: thing.id,
        name: thing.name,
        price: PRICE,
        image,
        category: CATEGORY,
        rating: list_rating(thing.like_count),
        description: thing.description,
        downloads: thing.download_count.unwrap_or(0),
        like_count: thing.like_count,
    }
}

/// Build the detail view. The thumbnail is passed through as-is here.
pub fn detail(thing: Thing, gallery: &[ThingImage]) -> ModelDetail {
    let images = gallery.iter().filter_map(resolve_gallery_image).collect();

    ModelDetail {
        id: thing.id,
        name: thing.name,
        price: PRICE,
        image: thing.thumbnail,
        images,
        category: CATEGORY,
        rating: detail_rating(thing.like_count),
        description: thing.description,
        downloads: thing.download_count.unwrap_or(0),
        like_count: thing.like_count,
        creator: thing.creator.and_then(|c| c.name),
        license: thing.license,
    }
}
