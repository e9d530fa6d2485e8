//! 具体端点实现

pub mod slack;

pub use slack::{SlackClient, SlackConfig, DEFAULT_API_BASE_URL};
