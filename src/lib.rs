//! Dry-weight normalization of LC-MS compound reports.
//!
//! Joins per-compound measurement sheets with a sample weight table,
//! normalizes Area Ratio by dry weight, summarizes each Sample ID group and
//! writes a merged workbook, a chart workbook and one plot per compound.

pub mod app;
pub mod cli;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod report;
