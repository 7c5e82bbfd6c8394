// nand/fst.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Implements the structures and methods required for reading entries from the File Status Table.

use std::io::{Cursor, Read, Seek};
use byteorder::{BigEndian, ReadBytesExt};
use crate::nand::session::Session;
use crate::nand::{NANDError, FST_NONE};

pub const FST_ENTRY_SIZE: u64 = 0x20;
// Every 64 entries (one page of data), the table is interrupted by the page's spare area.
const FST_ENTRIES_PER_PAGE: u16 = 64;
const FST_SPARE_ENTRIES: u64 = 2;
const FST_SPARE_SIZE: u64 = 0x40;
// Entries that cross the spare area are split this far in, in the middle of the size field.
const FST_SIZE_SPLIT: usize = 0x14;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EntryKind {
    Directory,
    File,
}

/// A single entry in the FST, which describes either a file or a directory.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FSTEntry {
    pub name: [u8; 12],
    pub mode: u8,
    pub attr: u8,
    /// The first child for a directory, or the first cluster for a file.
    pub sub: u16,
    pub sib: u16,
    pub size: u32,
    pub uid: u32,
    pub gid: u16,
    pub x3: u32,
}

impl FSTEntry {
    /// Creates a new FSTEntry from the 32 bytes of a contiguous entry.
    pub fn from_bytes(data: &[u8]) -> Result<Self, NANDError> {
        let mut buf = Cursor::new(data);
        let mut name = [0u8; 12];
        buf.read_exact(&mut name)?;
        // Only the lowest bit of the mode means anything, the rest holds permissions.
        let mode = buf.read_u8()? & 1;
        let attr = buf.read_u8()?;
        let sub = buf.read_u16::<BigEndian>()?;
        let sib = buf.read_u16::<BigEndian>()?;
        let size = buf.read_u32::<BigEndian>()?;
        let uid = buf.read_u32::<BigEndian>()?;
        let gid = buf.read_u16::<BigEndian>()?;
        let x3 = buf.read_u32::<BigEndian>()?;
        Ok(FSTEntry {
            name,
            mode,
            attr,
            sub,
            sib,
            size,
            uid,
            gid,
            x3,
        })
    }

    /// Gets the entry's name, which is only NUL-terminated when it's shorter than 12 bytes.
    pub fn name_str(&self) -> String {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..len]).into_owned()
    }

    pub fn kind(&self) -> Option<EntryKind> {
        match self.mode {
            0 => Some(EntryKind::Directory),
            1 => Some(EntryKind::File),
            _ => None,
        }
    }

    /// Gets the first child of a directory, if it has any.
    pub fn child(&self) -> Option<u16> {
        (self.sub != FST_NONE).then_some(self.sub)
    }

    pub fn sibling(&self) -> Option<u16> {
        (self.sib != FST_NONE).then_some(self.sib)
    }
}

impl<R: Read + Seek> Session<R> {
    /// Gets the byte offset of an FST entry in the dump.
    pub fn fst_entry_offset(&self, index: u16) -> u64 {
        let stride = if self.layout().has_ecc() { FST_SPARE_ENTRIES } else { 0 };
        let slot = (index / FST_ENTRIES_PER_PAGE) as u64 * stride + index as u64;
        self.superblock().fst_offset() + slot * FST_ENTRY_SIZE
    }

    /// Reads an entry from the FST.
    pub fn fst_entry(&self, index: u16) -> Result<FSTEntry, NANDError> {
        let offset = self.fst_entry_offset(index);
        let mut data = [0u8; FST_ENTRY_SIZE as usize];
        if index % FST_ENTRIES_PER_PAGE == FST_ENTRIES_PER_PAGE - 1 {
            // The last entry before a spare area has its size field split in half by it.
            self.dump().read_at(offset, &mut data[..FST_SIZE_SPLIT])?;
            self.dump().read_at(offset + FST_SIZE_SPLIT as u64 + FST_SPARE_SIZE, &mut data[FST_SIZE_SPLIT..])?;
        } else {
            self.dump().read_at(offset, &mut data)?;
        }
        FSTEntry::from_bytes(&data)
    }
}
