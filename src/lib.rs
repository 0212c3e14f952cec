//! Field-task photo log.
//!
//! Photos are captured against a task code, stored in SQLite, summarized per
//! day as photo counts per task, and exported as a zip archive with one folder
//! per task code.

pub mod capture;
pub mod config;
pub mod day;
pub mod db;
pub mod device;
pub mod export;
pub mod logging;
pub mod paths;
pub mod report;
pub mod storage;
