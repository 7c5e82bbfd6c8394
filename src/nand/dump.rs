// nand/dump.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Implements random access reads into a raw NAND dump, without interpreting any of it.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use byteorder::{BigEndian, ReadBytesExt};

/// A raw NAND dump. Reads go through a shared reference so that everything built on top of
/// the dump can stay immutable.
#[derive(Debug)]
pub struct NandDump<R: Read + Seek> {
    reader: RefCell<R>,
    len: u64,
}

impl NandDump<File> {
    /// Opens a NAND dump from a file on disk.
    pub fn open(path: &Path) -> io::Result<Self> {
        NandDump::new(File::open(path)?)
    }
}

impl<R: Read + Seek> NandDump<R> {
    /// Creates a new NandDump from any seekable reader. The length is taken from the end of the
    /// stream.
    pub fn new(mut reader: R) -> io::Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        Ok(NandDump {
            reader: RefCell::new(reader),
            len,
        })
    }

    /// Gets the total length of the dump in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fills `buf` with the bytes starting at `offset`. Reading past the end of the dump is an
    /// error rather than a short read.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        if offset.checked_add(buf.len() as u64).is_none_or(|end| end > self.len) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("read of {} bytes at {:#X} is past the end of the dump", buf.len(), offset),
            ));
        }
        let mut reader = self.reader.borrow_mut();
        reader.seek(SeekFrom::Start(offset))?;
        reader.read_exact(buf)
    }

    pub fn read_u16_at(&self, offset: u64) -> io::Result<u16> {
        let mut buf = [0u8; 2];
        self.read_at(offset, &mut buf)?;
        buf.as_slice().read_u16::<BigEndian>()
    }

    pub fn read_u32_at(&self, offset: u64) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.read_at(offset, &mut buf)?;
        buf.as_slice().read_u32::<BigEndian>()
    }
}
