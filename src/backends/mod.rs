//! Backend client implementations.
//!
//! Both the search engine and the relational fallback are reached through
//! [`http::HttpBackend`]; tests substitute in-memory `SearchBackend`s.

pub mod http;

pub use http::HttpBackend;
