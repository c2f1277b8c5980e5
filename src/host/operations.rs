//! Container engine - the main interface.

use crate::codec::{verify, Verification};
use crate::config::{ParasiteConfig, TABLE_HEADER_LEN, TRAILER_LEN};
use crate::error::{Error, Result};
use crate::format::{
    detect, read_items, read_table_header, read_trailer, write_table, HostDescriptor,
    ItemDescriptor,
};
use crate::storage::{copy_prefix, load_item, store_item, stream_len, truncate, Region};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How the carrier is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAccess {
    /// Detection, listing, extraction and restore.
    Read,
    /// Everything in `Read`, plus infection.
    ReadWrite,
}

/// How much of the container has been parsed in this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SessionState {
    Opened,
    HeaderLoaded,
    TableLoaded,
}

/// Result of extracting one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Item name.
    pub name: String,
    /// Where the bytes were written.
    pub path: PathBuf,
    /// Number of bytes written.
    pub size: u64,
    /// Digest check outcome. A mismatch leaves the file in place.
    pub verification: Verification,
}

/// An open carrier file and its ordered item list.
pub struct ParasiteHost {
    file: File,
    path: PathBuf,
    access: HostAccess,
    config: ParasiteConfig,
    host: HostDescriptor,
    items: Vec<ItemDescriptor>,
    state: SessionState,
}

impl ParasiteHost {
    /// Open a carrier and measure its size.
    ///
    /// Nothing is parsed here; call [`read_header`](Self::read_header) and
    /// [`read_file_table`](Self::read_file_table) before extracting.
    pub fn open(path: &Path, access: HostAccess, config: ParasiteConfig) -> Result<Self> {
        let mut file = match access {
            HostAccess::Read => File::open(path)?,
            HostAccess::ReadWrite => OpenOptions::new().read(true).write(true).open(path)?,
        };
        let carrier_size = stream_len(&mut file)?;

        debug!(path = %path.display(), carrier_size, ?access, "Opened carrier");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            access,
            config,
            host: HostDescriptor::new(carrier_size),
            items: Vec::new(),
            state: SessionState::Opened,
        })
    }

    /// Path the carrier was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Carrier size measured at open time.
    pub fn carrier_size(&self) -> u64 {
        self.host.carrier_size
    }

    /// Host descriptor as currently known.
    pub fn header(&self) -> &HostDescriptor {
        &self.host
    }

    /// Items in table order.
    pub fn items(&self) -> &[ItemDescriptor] {
        &self.items
    }

    /// First item with exactly this name.
    pub fn find_item(&self, name: &str) -> Option<&ItemDescriptor> {
        self.items.iter().find(|item| item.name == name)
    }

    /// Whether the carrier ends with a parasite trailer.
    pub fn has_parasite(&mut self) -> Result<bool> {
        detect(&mut self.file)
    }

    /// Read the trailer and the fixed table header.
    pub fn read_header(&mut self) -> Result<&HostDescriptor> {
        if !self.has_parasite()? {
            return Err(Error::NotInfected(self.path.clone()));
        }

        let len = stream_len(&mut self.file)?;
        let header_offset = read_trailer(&mut self.file)?;
        let header = read_table_header(&mut self.file, header_offset, len)?;

        self.host.version = header.version;
        self.host.item_count = header.item_count;
        self.host.base_offset = header.base_offset;
        self.host.header_offset = header.header_offset;
        self.items.clear();
        self.state = SessionState::HeaderLoaded;

        if self.config.verbose {
            info!(
                version = %self.host.version,
                item_count = self.host.item_count,
                base_offset = self.host.base_offset,
                header_offset = self.host.header_offset,
                "Read parasite header"
            );
        }

        Ok(&self.host)
    }

    /// Parse the item records of the table located by `read_header`.
    pub fn read_file_table(&mut self) -> Result<&[ItemDescriptor]> {
        if self.state < SessionState::HeaderLoaded {
            return Err(Error::InvalidState(
                "read_header must be called before read_file_table".to_string(),
            ));
        }

        let len = stream_len(&mut self.file)?;
        let records_start = self.host.header_offset as u64 + TABLE_HEADER_LEN;
        self.file.seek(SeekFrom::Start(records_start))?;
        self.items = read_items(
            &mut self.file,
            self.host.item_count,
            len.saturating_sub(TRAILER_LEN),
        )?;
        self.state = SessionState::TableLoaded;

        debug!(items = self.items.len(), "Read file table");
        Ok(&self.items)
    }

    /// Infect a clean carrier with `items`.
    ///
    /// Items are appended after the host bytes in order, followed by the
    /// table and trailer: `[host][item1][item2]...[table][trailer]`.
    pub fn infect(&mut self, items: Vec<ItemDescriptor>) -> Result<()> {
        self.require_writable()?;
        if self.has_parasite()? {
            return Err(Error::AlreadyInfected(self.path.clone()));
        }

        ensure_unique_names(&items)?;

        let base_offset = u32::try_from(self.host.carrier_size).map_err(|_| {
            Error::CarrierTooLarge {
                position: self.host.carrier_size,
            }
        })?;
        self.host.base_offset = base_offset;

        if self.config.verbose {
            info!(base_offset, "Writing items starting at base offset");
        }

        let mut region = Region::fresh(self.host.carrier_size);
        let mut stored = Vec::with_capacity(items.len());
        for mut item in items {
            self.store_into(&mut region, &mut item)?;
            stored.push(item);
        }

        self.items = stored;
        self.finish_table(region.position())?;

        info!(
            path = %self.path.display(),
            items = self.items.len(),
            "Infected carrier"
        );
        Ok(())
    }

    /// Add one item to an already infected carrier.
    ///
    /// The item is written over the old table, then a new table covering
    /// every item is written after it.
    pub fn infect_more(&mut self, mut item: ItemDescriptor) -> Result<()> {
        self.require_writable()?;
        if !self.has_parasite()? {
            return Err(Error::NotInfected(self.path.clone()));
        }
        if self.state != SessionState::TableLoaded {
            return Err(Error::InvalidState(
                "read_header and read_file_table must be called before infect_more".to_string(),
            ));
        }

        let live = read_trailer(&mut self.file)?;
        if live != self.host.header_offset {
            return Err(Error::StaleTable {
                expected: self.host.header_offset,
                found: live,
            });
        }
        if self.find_item(&item.name).is_some() {
            return Err(Error::DuplicateName(item.name));
        }
        if self.items.len() >= u16::MAX as usize {
            return Err(Error::TooManyItems(self.items.len() + 1));
        }

        if self.config.verbose {
            info!(
                header_offset = self.host.header_offset,
                "Reclaiming old table region"
            );
        }

        let mut region = Region::reclaim(self.host.header_offset);
        self.store_into(&mut region, &mut item)?;
        self.items.push(item);
        self.finish_table(region.position())?;

        info!(
            path = %self.path.display(),
            items = self.items.len(),
            "Added item to carrier"
        );
        Ok(())
    }

    /// Extract the first item named `name` into `dest_dir` (or the
    /// working directory).
    ///
    /// A digest mismatch is logged and reported in the returned
    /// [`Extraction`]; the written file is kept.
    pub fn extract_item(&mut self, name: &str, dest_dir: Option<&Path>) -> Result<Extraction> {
        self.require_table()?;

        let item = self
            .find_item(name)
            .cloned()
            .ok_or_else(|| Error::ItemNotFound(name.to_string()))?;

        let target = match dest_dir {
            Some(dir) => dir.join(&item.name),
            None => PathBuf::from(&item.name),
        };

        if self.config.verbose {
            info!(name = %item.name, target = %target.display(), "Extracting item");
        }

        let len = stream_len(&mut self.file)?;
        let data = load_item(&mut self.file, &item, len)?;
        std::fs::write(&target, &data)?;

        let verification = verify(&data, &item.digest);
        if let Verification::Mismatch { expected, actual } = verification {
            warn!(
                name = %item.name,
                expected = %hex::encode(expected),
                actual = %hex::encode(actual),
                "Digest mismatch; extracted file may be corrupt"
            );
        }

        Ok(Extraction {
            name: item.name,
            path: target,
            size: data.len() as u64,
            verification,
        })
    }

    /// Extract every item in table order, stopping at the first failure.
    pub fn extract_all(&mut self, dest_dir: Option<&Path>) -> Result<Vec<Extraction>> {
        self.require_table()?;

        let names: Vec<String> = self.items.iter().map(|item| item.name.clone()).collect();
        let mut extracted = Vec::with_capacity(names.len());
        for name in names {
            extracted.push(self.extract_item(&name, dest_dir)?);
        }
        Ok(extracted)
    }

    /// Write the original host bytes (everything before `base_offset`) to
    /// `dest`.
    pub fn restore(&mut self, dest: &Path) -> Result<u64> {
        if self.state < SessionState::HeaderLoaded {
            return Err(Error::InvalidState(
                "read_header must be called before restore".to_string(),
            ));
        }

        let base_offset = self.host.base_offset;
        if base_offset as u64 > self.host.carrier_size {
            return Err(Error::CorruptBaseOffset {
                base_offset,
                carrier_size: self.host.carrier_size,
            });
        }

        if self.config.verbose {
            info!(dest = %dest.display(), base_offset, "Restoring host");
        }

        copy_prefix(&mut self.file, base_offset as u64, dest)
    }

    /// Flush pending writes and close the carrier.
    pub fn close(mut self) -> Result<()> {
        if self.access == HostAccess::ReadWrite {
            self.file.flush()?;
            self.file.sync_all()?;
        }
        debug!(path = %self.path.display(), "Closed carrier");
        Ok(())
    }

    fn require_writable(&self) -> Result<()> {
        match self.access {
            HostAccess::ReadWrite => Ok(()),
            HostAccess::Read => Err(Error::ReadOnly(self.path.clone())),
        }
    }

    fn require_table(&self) -> Result<()> {
        if self.state != SessionState::TableLoaded {
            return Err(Error::InvalidState(
                "read_header and read_file_table must be called first".to_string(),
            ));
        }
        Ok(())
    }

    /// Read an item's source, store it at the region cursor.
    fn store_into(&mut self, region: &mut Region, item: &mut ItemDescriptor) -> Result<()> {
        let source_path = item.local_path.clone().ok_or_else(|| {
            Error::InvalidState(format!("item {} has no source path", item.name))
        })?;
        let source = std::fs::read(&source_path)?;

        if self.config.verbose {
            info!(
                name = %item.name,
                source = %source_path.display(),
                size = source.len(),
                compress = item.is_compressed(),
                "Infecting with item"
            );
        }

        let at = region.position();
        store_item(&mut self.file, item, &source, at)?;
        region.allocate(item.stored_size as u64)?;

        if self.config.verbose {
            info!(
                name = %item.name,
                digest = %hex::encode(item.digest),
                stored_size = item.stored_size,
                "Stored item"
            );
        }
        Ok(())
    }

    /// Write the table at `at`, then cut the file just past the trailer.
    fn finish_table(&mut self, at: u64) -> Result<()> {
        let end = write_table(&mut self.file, &mut self.host, &self.items, Some(at))?;
        truncate(&self.file, end)?;
        self.state = SessionState::TableLoaded;
        Ok(())
    }
}

fn ensure_unique_names(items: &[ItemDescriptor]) -> Result<()> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.name.as_str()) {
            return Err(Error::DuplicateName(item.name.clone()));
        }
    }
    Ok(())
}
