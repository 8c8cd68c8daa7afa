//! Motion Clip Catalog
//!
//! This crate defines the set of retargeted motion clips the explorer can
//! show, how the target characters of a clip are paged into a carousel, and
//! how a `(clip, character, format)` triple maps onto an asset path.
//!
//! The catalog is fixed for the lifetime of a session. A built-in catalog
//! ships with the crate; a JSON catalog can replace it at startup.

pub mod carousel;
pub mod clip;
pub mod locator;

pub use carousel::{Carousel, DEFAULT_TARGETS_PER_PAGE};
pub use clip::{Catalog, CatalogError, MotionClip};
pub use locator::{AssetExtension, AssetLocator, DownloadLink, display_character};

/// Returns the catalog crate version string.
pub fn catalog_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
