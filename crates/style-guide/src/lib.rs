pub mod anchor;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod model;
pub mod parser;
pub mod search;
pub mod server;
pub mod update;
pub mod validate;
