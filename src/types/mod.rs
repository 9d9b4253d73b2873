pub mod credentials;
pub mod frames;
pub mod pipeline_config;
pub mod station;
pub mod temperature_point;
