// nand/session.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Implements the Session, which holds everything that's known about an opened NAND dump.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::info;
use crate::nand::crypto::NandKey;
use crate::nand::dump::NandDump;
use crate::nand::keys::{self, KeySource};
use crate::nand::layout::{ConsoleType, Layout};
use crate::nand::superblock::Superblock;
use crate::nand::NANDError;

/// An opened NAND dump, along with its detected layout, console, and superblock. Reading
/// clusters also requires the NAND key, while the FAT and FST can be read without it.
#[derive(Debug)]
pub struct Session<R: Read + Seek> {
    dump: NandDump<R>,
    layout: Layout,
    console: ConsoleType,
    superblock: Superblock,
    key: Option<NandKey>,
}

impl Session<File> {
    /// Opens a NAND dump from a file and detects everything needed to read it, apart from the
    /// key.
    pub fn open(path: &Path) -> Result<Self, NANDError> {
        Session::new(NandDump::open(path)?)
    }
}

impl<R: Read + Seek> Session<R> {
    /// Creates a new Session from a dump by detecting its layout and console type and then
    /// locating the superblock.
    pub fn new(dump: NandDump<R>) -> Result<Self, NANDError> {
        let layout = Layout::detect(&dump)?;
        let console = ConsoleType::detect(&dump, &layout)?;
        info!("detected {} NAND ({} dump)", console, layout.dump_type);
        let superblock = Superblock::locate(&dump, &layout, console)?;
        Ok(Session::from_parts(dump, layout, console, superblock, None))
    }

    /// Creates a new Session from already known parts.
    pub fn from_parts(dump: NandDump<R>, layout: Layout, console: ConsoleType, superblock: Superblock,
                      key: Option<NandKey>) -> Self {
        Session {
            dump,
            layout,
            console,
            superblock,
            key,
        }
    }

    /// Sets the key used to decrypt clusters.
    pub fn with_key(mut self, key: NandKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Finds the NAND key from the dump or the given key files and sets it on the Session.
    pub fn resolve_key(self, otp_path: &Path, keys_path: &Path) -> Result<(Self, KeySource), NANDError> {
        let (key, source) = keys::resolve_key(&self.dump, &self.layout, self.console, otp_path, keys_path)?;
        Ok((self.with_key(key), source))
    }

    pub fn dump(&self) -> &NandDump<R> {
        &self.dump
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn console(&self) -> ConsoleType {
        self.console
    }

    pub fn superblock(&self) -> &Superblock {
        &self.superblock
    }

    pub fn key(&self) -> Option<&NandKey> {
        self.key.as_ref()
    }
}
