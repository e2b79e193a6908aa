// tests/integration/mod.rs
//! Integration tests for catalog-fetch
//!
//! These run the real reqwest client against wiremock servers, checking how
//! responses are classified and how the engine pages through them.

#[cfg(test)]
mod http_client;

#[cfg(test)]
mod engine_pipeline;
