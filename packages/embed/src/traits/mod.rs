//! Core trait abstractions.
//!
//! Applications implement these to plug custom embed sources into the
//! resolver.

pub mod provider;
