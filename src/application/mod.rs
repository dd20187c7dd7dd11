// Application layer - Use cases and service traits
pub mod broker_link;
pub mod dataset_parser;
pub mod display_coalescer;
pub mod prediction_gate;
pub mod prediction_service;
pub mod publish_pipeline;
pub mod publish_transport;
pub mod publisher_service;
pub mod render_sink;
pub mod series_store;
pub mod subscription_registry;
pub mod subscription_service;
pub mod telemetry_router;
pub mod telemetry_session;
