pub mod config;
pub mod error;
pub mod generation;
pub mod model;
pub mod pipeline;
pub mod training;
