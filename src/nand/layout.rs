// nand/layout.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Implements detection of the NAND dump format and the console the NAND came from.

use std::fmt;
use std::io::{Read, Seek};
use crate::nand::dump::NandDump;
use crate::nand::{NANDError, CLUSTER_COUNT};

pub const PAGE_DATA_SIZE: u64 = 0x800;
pub const PAGE_SPARE_SIZE: u64 = 0x40;
pub const PAGES_PER_CLUSTER: u64 = 8;
/// Size of the keys.bin data that BootMii appends to its dumps.
pub const BOOTMII_TRAILER_SIZE: u64 = 0x400;

const SFFS_MAGIC: u32 = 0x53464653;
const SFS_MAGIC: u32 = 0x53465321;
// The last superblock slot, which is always present on a valid NAND.
const CONSOLE_MAGIC_CLUSTER: u64 = 0x7FF0;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DumpType {
    /// Page data only, with the spare areas stripped out.
    NoEcc,
    /// Page data followed by the 64-byte spare (ECC) area for every page.
    Ecc,
    /// An ECC dump with BootMii's 0x400-byte keys.bin appended.
    BootMii,
}

impl fmt::Display for DumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpType::NoEcc => write!(f, "No ECC"),
            DumpType::Ecc => write!(f, "ECC"),
            DumpType::BootMii => write!(f, "BootMii"),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ConsoleType {
    Wii,
    WiiU,
}

impl ConsoleType {
    /// Detects the console a NAND belongs to from the filesystem magic in the final superblock
    /// slot.
    pub fn detect<R: Read + Seek>(dump: &NandDump<R>, layout: &Layout) -> Result<Self, NANDError> {
        let magic = dump.read_u32_at(layout.cluster_offset(CONSOLE_MAGIC_CLUSTER))?;
        ConsoleType::from_magic(magic, layout)
    }

    /// Matches a filesystem magic number against the known consoles.
    pub fn from_magic(magic: u32, layout: &Layout) -> Result<Self, NANDError> {
        match magic {
            SFFS_MAGIC => Ok(ConsoleType::Wii),
            SFS_MAGIC => {
                // BootMii only exists on the Wii, so its key trailer can't be on a Wii U dump.
                if layout.has_trailer() {
                    return Err(NANDError::InvalidCombination);
                }
                Ok(ConsoleType::WiiU)
            },
            x => Err(NANDError::UnknownMagic(x)),
        }
    }

    /// Gets the magic number every superblock for this console starts with.
    pub fn magic(&self) -> u32 {
        match self {
            ConsoleType::Wii => SFFS_MAGIC,
            ConsoleType::WiiU => SFS_MAGIC,
        }
    }

    /// Gets the first cluster of the region that holds the superblocks.
    pub fn superblock_start_cluster(&self) -> u64 {
        match self {
            ConsoleType::Wii => 0x7F00,
            ConsoleType::WiiU => 0x7C00,
        }
    }
}

impl fmt::Display for ConsoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleType::Wii => write!(f, "Wii"),
            ConsoleType::WiiU => write!(f, "Wii U"),
        }
    }
}

/// The physical layout of a NAND dump, which every offset calculation depends on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Layout {
    pub dump_type: DumpType,
}

impl Layout {
    pub fn new(dump_type: DumpType) -> Self {
        Layout { dump_type }
    }

    /// Detects the layout of a dump from its length, which must exactly match one of the known
    /// dump sizes.
    pub fn detect<R: Read + Seek>(dump: &NandDump<R>) -> Result<Self, NANDError> {
        Layout::from_len(dump.len())
    }

    pub fn from_len(len: u64) -> Result<Self, NANDError> {
        [DumpType::NoEcc, DumpType::Ecc, DumpType::BootMii].into_iter()
            .map(Layout::new)
            .find(|layout| layout.expected_len() == len)
            .ok_or(NANDError::UnrecognizedSize(len))
    }

    pub fn has_ecc(&self) -> bool {
        !matches!(self.dump_type, DumpType::NoEcc)
    }

    pub fn has_trailer(&self) -> bool {
        matches!(self.dump_type, DumpType::BootMii)
    }

    /// Gets the size of a page as stored in the dump, including the spare area if present.
    pub fn page_size(&self) -> u64 {
        if self.has_ecc() {
            PAGE_DATA_SIZE + PAGE_SPARE_SIZE
        } else {
            PAGE_DATA_SIZE
        }
    }

    pub fn cluster_size(&self) -> u64 {
        self.page_size() * PAGES_PER_CLUSTER
    }

    pub fn cluster_offset(&self, cluster: u64) -> u64 {
        cluster * self.cluster_size()
    }

    /// Gets the length of the NAND data itself, without any trailer.
    pub fn data_len(&self) -> u64 {
        self.cluster_size() * CLUSTER_COUNT as u64
    }

    /// Gets the exact length a dump with this layout must have.
    pub fn expected_len(&self) -> u64 {
        if self.has_trailer() {
            self.data_len() + BOOTMII_TRAILER_SIZE
        } else {
            self.data_len()
        }
    }
}
