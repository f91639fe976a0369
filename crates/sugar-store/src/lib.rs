//! Sugar Store: document store implementations.
//!
//! Provides the in-process `DocumentStore` used by the API server and by
//! integration tests.

pub mod memory_document_store;
