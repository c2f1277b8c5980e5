//! Parasite
//!
//! Appends payload files to the end of a host file behind a self-locating
//! trailer. The host stays byte-identical up to a recorded boundary, so the
//! payloads can later be listed, extracted, verified and the original host
//! restored.
//!
//! # Features
//!
//! - **O(1) detection**: the last 8 bytes of an infected file are a fixed tag
//! - **Self-locating table**: the trailer stores the table position
//! - **LZ4 compression**: optional, per item
//! - **Integrity checks**: 16-byte digest of every original payload
//! - **Restore**: copy the host back out, up to the base offset
//!
//! # Layout
//!
//! ```text
//! [host bytes][item 1]...[item N][table][header_offset][b"Parasite"]
//!             ^ base_offset      ^ header_offset
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use parasite::{HostAccess, ItemDescriptor, ParasiteConfig, ParasiteHost};
//! use std::path::Path;
//!
//! let config = ParasiteConfig::new(true, false);
//!
//! // Infect a host
//! let path = Path::new("host.bin");
//! let mut host = ParasiteHost::open(path, HostAccess::ReadWrite, config.clone())?;
//! let item = ItemDescriptor::from_file(Path::new("secret.txt"), config.item_flags())?;
//! host.infect(vec![item])?;
//! host.close()?;
//!
//! // Read it back
//! let mut host = ParasiteHost::open(path, HostAccess::Read, config)?;
//! host.read_header()?;
//! host.read_file_table()?;
//! host.extract_all(Some(Path::new("out")))?;
//! host.restore(Path::new("original.bin"))?;
//! # Ok::<(), parasite::Error>(())
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod host;
pub mod storage;

pub use codec::Verification;
pub use config::ParasiteConfig;
pub use error::{Error, Result};
pub use format::{HostDescriptor, ItemDescriptor, ItemFlags, Version};
pub use host::{Extraction, HostAccess, ParasiteHost};
