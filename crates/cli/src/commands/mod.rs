//! CLI Commands

pub mod fields;
pub mod lint;
pub mod report;
