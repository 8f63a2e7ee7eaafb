//! Converts recognized fragments of legacy pages into block tables for
//! content migration.
//!
//! Each [`blocks::Pattern`] has its own transform that reads one fragment,
//! builds a [`table::TableMatrix`] (a header row naming the block, then data
//! rows) and replaces the fragment with the rendered `<table>`.

pub mod blocks;
pub mod dom;
pub mod error;
pub mod importer;
pub mod settings;
pub mod table;
