pub mod audit;
pub mod config;
pub mod error;
pub mod model;
pub mod prompts;
pub mod web;
