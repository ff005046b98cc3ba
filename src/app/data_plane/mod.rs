//! Data Plane Services Module
//!
//! AWS data plane integrations: services that read data out of resources
//! rather than describe or manage the resources themselves.
//!
//! ## Available Services
//!
//! - **CloudWatch Logs**: Filter and page through log events of a log group

pub mod cloudwatch_logs;

pub use cloudwatch_logs::{CloudWatchLogsClient, LogSource};
