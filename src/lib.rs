pub mod analyzer;
pub mod api;
pub mod config;
pub mod data_models;
pub mod error;
pub mod geo;
pub mod intent;
pub mod justification;
pub mod labels;
pub mod pipeline;
pub mod places;
pub mod scoring;
