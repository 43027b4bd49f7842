//! HTTP client shared by remote adapters

mod client;

pub use client::{HttpClient, HttpClientBuilder};
