// nand/keys.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Implements finding the NAND key, either inside a BootMii dump or in separately dumped key
// files.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, info};
use crate::nand::crypto::NandKey;
use crate::nand::dump::NandDump;
use crate::nand::layout::{ConsoleType, Layout};
use crate::nand::NANDError;

/// Offset of the NAND key in a BootMii keys.bin, which is also what gets appended to BootMii
/// NAND dumps.
pub const KEYS_BIN_KEY_OFFSET: u64 = 0x158;
pub const WII_OTP_KEY_OFFSET: u64 = 0x058;
pub const WII_U_OTP_KEY_OFFSET: u64 = 0x170;

/// Where the NAND key was found.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeySource {
    DumpTrailer,
    Otp,
    KeysBin,
}

// Reads a key from a file, returning None if the file doesn't exist so that the next source can
// be tried. Any other failure, including a file too short to hold the key, is an error.
fn read_key_file(path: &Path, offset: u64) -> Result<Option<NandKey>, NANDError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("key file \"{}\" does not exist", path.display());
            return Ok(None);
        },
        Err(e) => return Err(e.into()),
    };
    file.seek(SeekFrom::Start(offset))?;
    let mut key = [0u8; 16];
    file.read_exact(&mut key)?;
    Ok(Some(key))
}

/// Finds the NAND key. BootMii dumps carry their own key, and that's always used for them.
/// Otherwise the key is read from the OTP dump, and Wii NANDs can also fall back on a BootMii
/// keys.bin.
pub fn resolve_key<R: Read + Seek>(dump: &NandDump<R>, layout: &Layout, console: ConsoleType, otp_path: &Path,
                                   keys_path: &Path) -> Result<(NandKey, KeySource), NANDError> {
    if layout.has_trailer() {
        let mut key = [0u8; 16];
        dump.read_at(layout.data_len() + KEYS_BIN_KEY_OFFSET, &mut key)?;
        info!("using NAND key from BootMii dump");
        return Ok((key, KeySource::DumpTrailer));
    }
    let otp_offset = match console {
        ConsoleType::Wii => WII_OTP_KEY_OFFSET,
        ConsoleType::WiiU => WII_U_OTP_KEY_OFFSET,
    };
    if let Some(key) = read_key_file(otp_path, otp_offset)? {
        info!("using NAND key from \"{}\"", otp_path.display());
        return Ok((key, KeySource::Otp));
    }
    if console == ConsoleType::Wii {
        if let Some(key) = read_key_file(keys_path, KEYS_BIN_KEY_OFFSET)? {
            info!("using NAND key from \"{}\"", keys_path.display());
            return Ok((key, KeySource::KeysBin));
        }
    }
    Err(NANDError::KeyUnavailable)
}
