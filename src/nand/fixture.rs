// nand/fixture.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Builds synthetic NAND dumps for tests. Dumps are sparse temporary files of the real dump
// sizes, and only the structures a test needs are written into them. Offsets here are worked
// out from the on-disk format directly rather than through the library.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use tempfile::NamedTempFile;
use crate::nand::crypto::{encrypt_cluster, NandKey};
use crate::nand::dump::NandDump;
use crate::nand::layout::{ConsoleType, DumpType, Layout};

pub const TEST_KEY: NandKey = [0xab, 0x01, 0xb9, 0xd8, 0xe1, 0x62, 0x2b, 0x08, 0xaf, 0xba, 0xd8, 0x4d, 0xbf, 0xc2, 0xa5, 0x5d];

/// Builds the raw 32-byte form of an FST entry.
pub fn fst_record(name: &[u8], mode: u8, sub: u16, sib: u16, size: u32, uid: u32, gid: u16) -> [u8; 32] {
    let mut record = [0u8; 32];
    record[..name.len()].copy_from_slice(name);
    record[0x0C] = mode;
    record[0x0E..0x10].copy_from_slice(&sub.to_be_bytes());
    record[0x10..0x12].copy_from_slice(&sib.to_be_bytes());
    record[0x12..0x16].copy_from_slice(&size.to_be_bytes());
    record[0x16..0x1A].copy_from_slice(&uid.to_be_bytes());
    record[0x1A..0x1C].copy_from_slice(&gid.to_be_bytes());
    record
}

pub struct NandFixture {
    file: NamedTempFile,
    pub layout: Layout,
}

impl NandFixture {
    pub fn new(dump_type: DumpType) -> Self {
        let layout = Layout::new(dump_type);
        let file = NamedTempFile::new().unwrap();
        file.as_file().set_len(layout.expected_len()).unwrap();
        NandFixture { file, layout }
    }

    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    pub fn dump(&self) -> NandDump<File> {
        NandDump::new(self.file.reopen().unwrap()).unwrap()
    }

    pub fn write_bytes(&self, offset: u64, data: &[u8]) {
        let mut file = self.file.as_file();
        file.seek(SeekFrom::Start(offset)).unwrap();
        file.write_all(data).unwrap();
    }

    pub fn superblock_offset(&self, console: ConsoleType, slot: u64) -> u64 {
        let start = match console {
            ConsoleType::Wii => 0x7F00,
            ConsoleType::WiiU => 0x7C00,
        };
        (start + slot * 0x10) * self.layout.cluster_size()
    }

    /// Writes a superblock header into each slot that has a version, leaving the rest blank.
    pub fn write_superblocks(&self, console: ConsoleType, versions: &[Option<u32>]) {
        let magic: &[u8; 4] = match console {
            ConsoleType::Wii => b"SFFS",
            ConsoleType::WiiU => b"SFS!",
        };
        for (slot, version) in versions.iter().enumerate() {
            if let Some(version) = version {
                let offset = self.superblock_offset(console, slot as u64);
                self.write_bytes(offset, magic);
                self.write_bytes(offset + 4, &version.to_be_bytes());
            }
        }
    }

    /// Fills every superblock slot with increasing versions, so that the last slot (the one the
    /// console magic is read from) is the newest.
    pub fn write_all_superblocks(&self, console: ConsoleType) -> u64 {
        let slots = (0x8000 - self.superblock_offset(console, 0) / self.layout.cluster_size()) / 0x10;
        let versions: Vec<Option<u32>> = (1..=slots as u32).map(Some).collect();
        self.write_superblocks(console, &versions);
        self.superblock_offset(console, slots - 1)
    }

    pub fn write_fat(&self, superblock: u64, cluster: u16, link: u16) {
        let mut entry = cluster as u64 + 6;
        if self.layout.has_ecc() {
            entry += (entry / 0x400) * 0x20;
        }
        self.write_bytes(superblock + entry * 2, &link.to_be_bytes());
    }

    /// Links the given clusters into a chain and terminates it.
    pub fn write_chain(&self, superblock: u64, clusters: &[u16]) {
        for pair in clusters.windows(2) {
            self.write_fat(superblock, pair[0], pair[1]);
        }
        if let Some(last) = clusters.last() {
            self.write_fat(superblock, *last, 0xFFFB);
        }
    }

    pub fn fst_entry_offset(&self, superblock: u64, index: u16) -> u64 {
        let fst = superblock + 0x0C + self.layout.cluster_size() * 4;
        let stride = if self.layout.has_ecc() { 2 } else { 0 };
        fst + ((index as u64 / 64) * stride + index as u64) * 32
    }

    pub fn write_fst(&self, superblock: u64, index: u16, record: &[u8; 32]) {
        let offset = self.fst_entry_offset(superblock, index);
        if index % 64 == 63 {
            // The size field of this entry straddles a spare area.
            self.write_bytes(offset, &record[..0x14]);
            self.write_bytes(offset + 0x14 + 0x40, &record[0x14..]);
        } else {
            self.write_bytes(offset, record);
        }
    }

    /// Encrypts a cluster's worth of data and writes it out page by page, filling the spare
    /// areas with junk so that reading them by mistake shows up.
    pub fn write_cluster(&self, key: &NandKey, cluster: u16, plain: &[u8]) {
        let mut data = plain.to_vec();
        data.resize(0x4000, 0);
        encrypt_cluster(key, &mut data).unwrap();
        let base = cluster as u64 * self.layout.cluster_size();
        for (page, chunk) in data.chunks(0x800).enumerate() {
            let offset = base + page as u64 * self.layout.page_size();
            self.write_bytes(offset, chunk);
            if self.layout.has_ecc() {
                self.write_bytes(offset + 0x800, &[0xEC; 0x40]);
            }
        }
    }

    pub fn write_trailer_key(&self, key: &NandKey) {
        self.write_bytes(self.layout.data_len() + 0x158, key);
    }
}
