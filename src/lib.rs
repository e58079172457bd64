pub mod api_docs;
pub mod app;
pub mod audit;
pub mod bootstrap;
pub mod config;
pub mod entities;
pub mod extractor;
pub mod middleware;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
