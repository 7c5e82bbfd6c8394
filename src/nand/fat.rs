// nand/fat.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Implements reading and decrypting clusters, and following cluster chains through the FAT.

use std::collections::HashSet;
use std::io::{Read, Seek};
use tracing::{debug, warn};
use crate::nand::crypto::decrypt_cluster;
use crate::nand::fst::FSTEntry;
use crate::nand::layout::PAGE_DATA_SIZE;
use crate::nand::session::Session;
use crate::nand::{NANDError, CLUSTER_COUNT, CLUSTER_DATA_SIZE, FAT_CHAIN_END};

// The superblock header (magic, version, and padding) takes up the first 6 FAT slots.
const FAT_HEADER_ENTRIES: u64 = 6;
// Every 0x400 entries (one page of data), the FAT is interrupted by the page's spare area.
const FAT_ENTRIES_PER_PAGE: u64 = 0x400;
const FAT_SPARE_ENTRIES: u64 = 0x20;
const MAX_FILE_SIZE: u64 = CLUSTER_COUNT as u64 * CLUSTER_DATA_SIZE as u64;

impl<R: Read + Seek> Session<R> {
    /// Reads a cluster and decrypts it. Only the data area of each page is used, so the result
    /// is always 0x4000 bytes no matter whether the dump has ECC data or not.
    pub fn read_cluster(&self, cluster: u16) -> Result<Vec<u8>, NANDError> {
        if cluster as u32 >= CLUSTER_COUNT {
            return Err(NANDError::ClusterOutOfRange(cluster));
        }
        let key = self.key().ok_or(NANDError::KeyUnavailable)?;
        let base = self.layout().cluster_offset(cluster as u64);
        let mut data = vec![0u8; CLUSTER_DATA_SIZE];
        for (page, chunk) in data.chunks_mut(PAGE_DATA_SIZE as usize).enumerate() {
            self.dump().read_at(base + page as u64 * self.layout().page_size(), chunk)?;
        }
        decrypt_cluster(key, &mut data)?;
        Ok(data)
    }

    /// Gets the byte offset of the FAT link for a cluster.
    pub fn fat_link_offset(&self, cluster: u16) -> u64 {
        let mut entry = cluster as u64 + FAT_HEADER_ENTRIES;
        if self.layout().has_ecc() {
            entry += (entry / FAT_ENTRIES_PER_PAGE) * FAT_SPARE_ENTRIES;
        }
        self.superblock().fat_offset() + entry * 2
    }

    /// Reads the FAT link for a cluster, which is the next cluster in its chain or a value of
    /// 0xFFF0 or above if it doesn't have one.
    pub fn fat_link(&self, cluster: u16) -> Result<u16, NANDError> {
        Ok(self.dump().read_u16_at(self.fat_link_offset(cluster))?)
    }

    /// Follows a cluster chain starting at the given cluster.
    pub fn cluster_chain(&self, first: u16) -> ClusterChain<'_, R> {
        ClusterChain {
            session: self,
            next: first,
            seen: HashSet::new(),
            failed: false,
        }
    }

    /// Reads the full contents of a file by decrypting every cluster in its chain. The result is
    /// cut down (or padded, if the chain is too short) to the size stored in the FST. Sizes that
    /// couldn't fit in the NAND are rejected.
    pub fn read_file(&self, entry: &FSTEntry) -> Result<Vec<u8>, NANDError> {
        if entry.size as u64 > MAX_FILE_SIZE {
            return Err(NANDError::FileTooLarge(entry.size));
        }
        let mut data: Vec<u8> = Vec::new();
        for (i, cluster) in self.cluster_chain(entry.sub).enumerate() {
            let cluster = cluster?;
            debug!("extracting {} cluster {} ({:#06X})", entry.name_str(), i, cluster);
            data.extend(self.read_cluster(cluster)?);
        }
        if data.len() < entry.size as usize {
            warn!("cluster chain for \"{}\" only holds {:#X} of {:#X} bytes", entry.name_str(), data.len(), entry.size);
        }
        data.resize(entry.size as usize, 0);
        Ok(data)
    }
}

/// An iterator over the clusters in a chain. A chain that loops back on itself or leaves the
/// NAND yields an error and then ends.
pub struct ClusterChain<'a, R: Read + Seek> {
    session: &'a Session<R>,
    next: u16,
    seen: HashSet<u16>,
    failed: bool,
}

impl<R: Read + Seek> Iterator for ClusterChain<'_, R> {
    type Item = Result<u16, NANDError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next >= FAT_CHAIN_END {
            return None;
        }
        let cluster = self.next;
        if cluster as u32 >= CLUSTER_COUNT {
            self.failed = true;
            return Some(Err(NANDError::ClusterOutOfRange(cluster)));
        }
        if !self.seen.insert(cluster) {
            self.failed = true;
            return Some(Err(NANDError::FatCycle(cluster)));
        }
        match self.session.fat_link(cluster) {
            Ok(link) => self.next = link,
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        }
        Some(Ok(cluster))
    }
}
