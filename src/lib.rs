pub mod achievements;
pub mod auth;
pub mod cli;
pub mod config;
pub mod engine;
pub mod json_store;
pub mod limits;
pub mod model;
pub mod observability;
pub mod persistence;
pub mod seed;
pub mod stats;
pub mod wal;
