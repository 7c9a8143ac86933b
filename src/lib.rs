pub mod chart;
pub mod cli;
pub mod document;
pub mod error;
pub mod generate;
pub mod load_config;
pub mod position;
pub mod upload;
