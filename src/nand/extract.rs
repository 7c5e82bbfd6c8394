// nand/extract.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Implements extracting the contents of a NAND to a directory on the host.

use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use crate::nand::fst::FSTEntry;
use crate::nand::session::Session;
use crate::nand::walker::{self, FstVisitor, NandPath};
use crate::nand::NANDError;

/// Totals for an extraction run.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct ExtractStats {
    pub directories: usize,
    pub files: usize,
    pub bytes: u64,
    /// Files that couldn't be read out of the NAND or written to the host.
    pub failed: usize,
    /// Directories that couldn't be created on the host.
    pub failed_directories: usize,
}

/// An FST visitor that recreates the NAND's directory tree under a host directory.
pub struct Extractor {
    out_dir: PathBuf,
    stats: ExtractStats,
}

impl Extractor {
    pub fn new(out_dir: &Path) -> Self {
        Extractor {
            out_dir: out_dir.to_path_buf(),
            stats: ExtractStats::default(),
        }
    }

    pub fn stats(&self) -> ExtractStats {
        self.stats
    }

    /// Extracts every file in the NAND. The output directory is created if it doesn't exist.
    pub fn extract_all<R: Read + Seek>(session: &Session<R>, out_dir: &Path) -> Result<ExtractStats, NANDError> {
        fs::create_dir_all(out_dir)?;
        let mut extractor = Extractor::new(out_dir);
        walker::walk(session, &mut extractor)?;
        Ok(extractor.stats)
    }

    fn write_file<R: Read + Seek>(&self, session: &Session<R>, entry: &FSTEntry, out_path: &Path) -> Result<(), NANDError> {
        let data = session.read_file(entry)?;
        fs::write(out_path, data)?;
        Ok(())
    }
}

impl FstVisitor for Extractor {
    fn directory<R: Read + Seek>(&mut self, _: &Session<R>, _: &FSTEntry, path: &NandPath) -> Result<(), NANDError> {
        let out_path = path.to_host_path(&self.out_dir);
        // Anything inside will fail on its own, so keep going.
        match fs::create_dir_all(&out_path) {
            Ok(()) => {
                info!("dir: {}", out_path.display());
                self.stats.directories += 1;
            },
            Err(e) => {
                warn!("failed to create directory \"{}\" for \"{}\": {}", out_path.display(), path, e);
                self.stats.failed_directories += 1;
            },
        }
        Ok(())
    }

    fn file<R: Read + Seek>(&mut self, session: &Session<R>, entry: &FSTEntry, path: &NandPath) -> Result<(), NANDError> {
        let out_path = path.to_host_path(&self.out_dir);
        // A single bad file shouldn't stop the rest of the NAND from being extracted.
        match self.write_file(session, entry, &out_path) {
            Ok(()) => {
                info!("extracted file: {}", path);
                self.stats.files += 1;
                self.stats.bytes += entry.size as u64;
            },
            Err(NANDError::KeyUnavailable) => return Err(NANDError::KeyUnavailable),
            Err(e) => {
                warn!("failed to extract \"{}\" to \"{}\": {}", path, out_path.display(), e);
                self.stats.failed += 1;
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use crate::nand::fixture::{fst_record, NandFixture, TEST_KEY};
    use crate::nand::layout::{ConsoleType, DumpType};

    #[test]
    fn test_extract_minimal_nand() {
        // One directory holding one 1-byte file.
        let fixture = NandFixture::new(DumpType::Ecc);
        let superblock = fixture.write_all_superblocks(ConsoleType::Wii);
        fixture.write_fst(superblock, 0, &fst_record(b"/", 0x16, 1, 0xFFFF, 0, 0, 0));
        fixture.write_fst(superblock, 1, &fst_record(b"shared2", 0x16, 2, 0xFFFF, 0, 0, 0));
        fixture.write_fst(superblock, 2, &fst_record(b"hello.txt", 0x35, 0x0042, 0xFFFF, 1, 0x1000, 1));
        fixture.write_chain(superblock, &[0x0042]);
        fixture.write_cluster(&TEST_KEY, 0x0042, b"Z and then a lot of data past the end of the file");

        let session = Session::open(fixture.path()).unwrap().with_key(TEST_KEY);
        let out = TempDir::new().unwrap();
        let stats = Extractor::extract_all(&session, out.path()).unwrap();
        assert_eq!(stats, ExtractStats { directories: 1, files: 1, bytes: 1, failed: 0, failed_directories: 0 });
        assert!(out.path().join("shared2").is_dir());
        assert_eq!(fs::read(out.path().join("shared2").join("hello.txt")).unwrap(), b"Z");
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_extract_skips_broken_file() {
        let fixture = NandFixture::new(DumpType::NoEcc);
        let superblock = fixture.write_all_superblocks(ConsoleType::Wii);
        fixture.write_fst(superblock, 0, &fst_record(b"/", 0, 1, 0xFFFF, 0, 0, 0));
        fixture.write_fst(superblock, 1, &fst_record(b"tmp:1", 1, 0x0010, 2, 0x4001, 0, 0));
        fixture.write_fst(superblock, 2, &fst_record(b"loop.bin", 1, 0x0020, 0xFFFF, 0x10, 0, 0));
        fixture.write_chain(superblock, &[0x0010, 0x0011]);
        fixture.write_cluster(&TEST_KEY, 0x0010, &[0x11; 0x4000]);
        fixture.write_cluster(&TEST_KEY, 0x0011, &[0x22; 0x10]);
        fixture.write_fat(superblock, 0x0020, 0x0020);

        let session = Session::open(fixture.path()).unwrap().with_key(TEST_KEY);
        let out = TempDir::new().unwrap();
        let stats = Extractor::extract_all(&session, out.path()).unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.failed, 1);
        let data = fs::read(out.path().join("tmp-1")).unwrap();
        assert_eq!(data.len(), 0x4001);
        assert!(data[..0x4000].iter().all(|&b| b == 0x11));
        assert_eq!(data[0x4000], 0x22);
        assert!(!out.path().join("loop.bin").exists());
    }

    #[test]
    fn test_extract_unwritable_file() {
        let fixture = NandFixture::new(DumpType::Ecc);
        let superblock = fixture.write_all_superblocks(ConsoleType::Wii);
        fixture.write_fst(superblock, 0, &fst_record(b"/", 0, 1, 0xFFFF, 0, 0, 0));
        fixture.write_fst(superblock, 1, &fst_record(b"a.bin", 1, 0x0010, 2, 4, 0, 0));
        fixture.write_fst(superblock, 2, &fst_record(b"b.bin", 1, 0x0011, 0xFFFF, 3, 0, 0));
        fixture.write_chain(superblock, &[0x0010]);
        fixture.write_chain(superblock, &[0x0011]);
        fixture.write_cluster(&TEST_KEY, 0x0010, b"aaaa");
        fixture.write_cluster(&TEST_KEY, 0x0011, b"bbb");

        let session = Session::open(fixture.path()).unwrap().with_key(TEST_KEY);
        let out = TempDir::new().unwrap();
        // A directory already sits where a.bin should go.
        fs::create_dir(out.path().join("a.bin")).unwrap();
        let stats = Extractor::extract_all(&session, out.path()).unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.bytes, 3);
        assert!(out.path().join("a.bin").is_dir());
        assert_eq!(fs::read(out.path().join("b.bin")).unwrap(), b"bbb");
    }

    #[test]
    fn test_extract_uncreatable_directory() {
        // The directory x-y clashes with the file x:y once names are made safe for the host. The
        // file comes first in the walk, so the directory and the file inside it both fail.
        let fixture = NandFixture::new(DumpType::NoEcc);
        let superblock = fixture.write_all_superblocks(ConsoleType::Wii);
        fixture.write_fst(superblock, 0, &fst_record(b"/", 0, 1, 0xFFFF, 0, 0, 0));
        fixture.write_fst(superblock, 1, &fst_record(b"x-y", 0, 4, 2, 0, 0, 0));
        fixture.write_fst(superblock, 2, &fst_record(b"x:y", 1, 0x0010, 3, 1, 0, 0));
        fixture.write_fst(superblock, 3, &fst_record(b"ok.bin", 1, 0x0011, 0xFFFF, 2, 0, 0));
        fixture.write_fst(superblock, 4, &fst_record(b"inner", 1, 0x0012, 0xFFFF, 1, 0, 0));
        for (cluster, data) in [(0x0010, b"1"), (0x0011, b"2"), (0x0012, b"3")] {
            fixture.write_chain(superblock, &[cluster]);
            fixture.write_cluster(&TEST_KEY, cluster, data);
        }

        let session = Session::open(fixture.path()).unwrap().with_key(TEST_KEY);
        let out = TempDir::new().unwrap();
        let stats = Extractor::extract_all(&session, out.path()).unwrap();
        assert_eq!(stats, ExtractStats { directories: 0, files: 2, bytes: 3, failed: 1, failed_directories: 1 });
        assert_eq!(fs::read(out.path().join("x-y")).unwrap(), b"1");
        assert_eq!(fs::read(out.path().join("ok.bin")).unwrap().len(), 2);
    }

    #[test]
    fn test_extract_needs_key() {
        let fixture = NandFixture::new(DumpType::NoEcc);
        let superblock = fixture.write_all_superblocks(ConsoleType::Wii);
        fixture.write_fst(superblock, 0, &fst_record(b"/", 0, 1, 0xFFFF, 0, 0, 0));
        fixture.write_fst(superblock, 1, &fst_record(b"a", 1, 0x0010, 0xFFFF, 1, 0, 0));
        fixture.write_chain(superblock, &[0x0010]);
        let session = Session::open(fixture.path()).unwrap();
        let out = TempDir::new().unwrap();
        assert!(matches!(Extractor::extract_all(&session, out.path()), Err(NANDError::KeyUnavailable)));
    }
}
