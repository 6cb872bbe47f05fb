//! oEmbed discovery and validation.

pub mod discovery;
pub mod validate;

pub use discovery::{Discovery, OEmbedDiscoverer};
pub use validate::{validate_response, OEMBED_FIELDS};
