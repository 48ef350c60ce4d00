// Public API for integration tests and potential library usage

pub mod aggregate;
pub mod api;
pub mod chart;
pub mod config;
pub mod error;
pub mod protocol;
pub mod ranking;
pub mod results;
pub mod reveal;
pub mod state;
pub mod store;
pub mod types;
