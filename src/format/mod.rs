//! On-disk container format.
//!
//! This module handles:
//! - Item and host descriptors
//! - The table of item records
//! - The trailer that locates the table from the end of the file

pub mod table;
pub mod trailer;
mod types;
mod wire;

pub use table::{read_items, read_table, read_table_header, write_table, TableHeader};
pub use trailer::{detect, read_trailer, write_trailer};
pub use types::{validate_name, HostDescriptor, ItemDescriptor, ItemFlags, Version};
