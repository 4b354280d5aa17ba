pub mod access_control;
pub mod client;
pub mod cmd;
pub mod codec;
pub mod config;
pub mod context;
pub mod domain;
pub mod logging;
pub mod models;
pub mod orchestrator;

mod controllers;
mod cors;
mod error;
mod routes;
mod shutdown;

pub use routes::router;
