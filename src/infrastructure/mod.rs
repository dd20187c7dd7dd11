// Infrastructure layer - External dependencies and adapters
pub mod broker_bridge;
pub mod chart_feed;
pub mod chunked_json;
pub mod config;
pub mod http_publisher;
pub mod http_response;
pub mod local_broker;
pub mod pacer;
pub mod prediction_client;
