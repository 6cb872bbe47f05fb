//! Request, payload and configuration types.

pub mod config;
pub mod payload;
pub mod request;
