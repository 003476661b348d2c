//! A3S Build CLI - build context packaging driven by a YAML config.

pub mod commands;
pub mod output;
