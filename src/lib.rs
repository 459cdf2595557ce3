pub mod app;
pub mod config;
pub mod document;
pub mod domain;
pub mod ena;
pub mod error;
pub mod member;
pub mod output;
pub mod project;
pub mod range;
pub mod run_index;
