pub mod activity;
pub mod aggregate;
pub mod audit;
pub mod classify;
pub mod clean;
pub mod config;
pub mod content;
pub mod dedupe;
pub mod paths;
pub mod payload;
pub mod pipeline;
pub mod reader;
pub mod rules;
pub mod state;
pub mod timestamp;
pub mod util;
