// nand/superblock.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Implements locating the newest copy of the superblock, which holds the FAT and FST.

use std::io::{Read, Seek};
use tracing::debug;
use crate::nand::dump::NandDump;
use crate::nand::layout::{ConsoleType, Layout};
use crate::nand::{NANDError, CLUSTER_COUNT};

/// Number of clusters taken up by each superblock copy.
pub const SUPERBLOCK_CLUSTERS: u64 = 0x10;
// Magic (4), version (4), and 4 bytes of padding come before the FAT.
const SUPERBLOCK_HEADER_SIZE: u64 = 0x0C;

/// The location of the superblock that the filesystem is read from.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Superblock {
    offset: u64,
    cluster_size: u64,
}

impl Superblock {
    /// Creates a Superblock at a known byte offset.
    pub fn new(offset: u64, layout: &Layout) -> Self {
        Superblock { offset, cluster_size: layout.cluster_size() }
    }

    /// Scans the superblock slots for the newest copy. Slots are read in order for as long as
    /// their version keeps increasing. The first slot whose version doesn't increase ends the
    /// scan, and the slot before it is used.
    ///
    /// Slots without the filesystem magic are skipped, but they are counted, and that count is
    /// what gets backed over if the scan runs all the way to the end of the NAND. A break resets
    /// the count, so after a break the result is always one slot back from where the scan
    /// stopped.
    pub fn locate<R: Read + Seek>(dump: &NandDump<R>, layout: &Layout, console: ConsoleType) -> Result<Self, NANDError> {
        let cluster_size = layout.cluster_size();
        let end = CLUSTER_COUNT as u64 * cluster_size;
        let stride = cluster_size * SUPERBLOCK_CLUSTERS;
        let mut loc = console.superblock_start_cluster() * cluster_size;
        let mut last: u32 = 0;
        let mut rewind: u64 = 1;
        while loc < end {
            let magic = dump.read_u32_at(loc)?;
            if magic != console.magic() {
                debug!("no superblock in slot at {:#X}", loc);
                rewind += 1;
                loc += stride;
                continue;
            }
            let version = dump.read_u32_at(loc + 4)?;
            if version > last {
                last = version;
            } else {
                rewind = 1;
                break;
            }
            loc += stride;
        }
        if last == 0 {
            return Err(NANDError::SuperblockNotFound);
        }
        let offset = loc - stride * rewind;
        debug!("using superblock at {:#X} (newest version {})", offset, last);
        Ok(Superblock { offset, cluster_size })
    }

    /// Gets the byte offset of the superblock in the dump.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn cluster(&self) -> u64 {
        self.offset / self.cluster_size
    }

    /// Gets the NAND block (64 clusters) the superblock starts in.
    pub fn block(&self) -> u64 {
        self.cluster() / 64
    }

    /// The FAT starts with the superblock header, which is accounted for by the FAT itself.
    pub fn fat_offset(&self) -> u64 {
        self.offset
    }

    pub fn fst_offset(&self) -> u64 {
        self.offset + SUPERBLOCK_HEADER_SIZE + self.cluster_size * 4
    }
}
