#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else, clippy::missing_errors_doc)]

#[macro_use]
extern crate tracing;

pub mod blob_store;
pub mod config;
pub mod data;
pub mod display;
pub mod error;
pub mod fetch;
pub mod maud_conveniences;
pub mod routes;
pub mod state;
