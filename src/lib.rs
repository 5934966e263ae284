pub mod api;
pub mod blobs;
pub mod clock;
pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod notify;
pub mod overrides;
pub mod repository;
pub mod state;
pub mod store;
