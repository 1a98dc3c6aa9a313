pub mod aggregator;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod retry;
pub mod service;
pub mod trigger;
