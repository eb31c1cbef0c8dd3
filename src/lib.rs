//! menubot - daily restaurant menu pipeline.
//!
//! Captures restaurant menu images (webpage screenshots or Slack photo
//! downloads), extracts structured menu data with the Gemini API, generates
//! a Czech daily summary, and posts it to a Slack channel.

pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod scrapers;
pub mod slack;
pub mod tasks;
pub mod utils;
