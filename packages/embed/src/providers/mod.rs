//! Provider registry and the known-provider directory.
//!
//! - [`ProviderRegistry`] - custom [`crate::Provider`] plugins, tried in
//!   registration order
//! - [`ProviderDirectory`] - static list of sites with published oEmbed
//!   endpoints

mod directory;
mod registry;

pub use directory::{KnownMatch, KnownProvider, ProviderDirectory};
pub use registry::ProviderRegistry;

// Re-export from traits for convenience
pub use crate::traits::provider::{Provider, ProviderOutcome};
