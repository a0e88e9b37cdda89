// Library for tests to access modules

pub mod aggregator;
pub mod api_client;
pub mod charts;
pub mod config;
pub mod credentials;
pub mod environment;
pub mod models;
pub mod poller;
pub mod relay;
pub mod routes;
pub mod state;
pub mod version;
