pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod models;
pub mod prediction;
pub mod service;
pub mod workers;

#[cfg(test)]
pub(crate) mod testing;
