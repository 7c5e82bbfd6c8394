// nand/mod.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Root for all NAND-related modules and the error type shared between them.

pub mod crypto;
pub mod dump;
pub mod extract;
pub mod fat;
pub mod fst;
pub mod keys;
pub mod layout;
pub mod query;
pub mod session;
pub mod superblock;
pub mod walker;

#[cfg(test)]
pub(crate) mod fixture;

use thiserror::Error;

/// Number of clusters on both the Wii and Wii U NAND.
pub const CLUSTER_COUNT: u32 = 0x8000;
/// Size of the decrypted data held by a single cluster.
pub const CLUSTER_DATA_SIZE: usize = 0x4000;
/// Any FAT link at or above this value ends a cluster chain.
pub const FAT_CHAIN_END: u16 = 0xFFF0;
/// Sentinel used by FST `sub`/`sib` links to mean "no entry".
pub const FST_NONE: u16 = 0xFFFF;

#[derive(Debug, Error)]
pub enum NANDError {
    #[error("dump size {0:#X} does not match any known NAND dump format")]
    UnrecognizedSize(u64),
    #[error("unknown filesystem magic {0:#010X}, this does not appear to be a Wii or Wii U NAND")]
    UnknownMagic(u32),
    #[error("BootMii dumps with key data are not valid for the Wii U")]
    InvalidCombination,
    #[error("no valid superblock could be found")]
    SuperblockNotFound,
    #[error("no NAND key could be found in the dump, otp.bin, or keys.bin")]
    KeyUnavailable,
    #[error("cluster {0:#06X} is outside of the NAND")]
    ClusterOutOfRange(u16),
    #[error("the FAT chain loops back to cluster {0:#06X}")]
    FatCycle(u16),
    #[error("file size {0:#X} is larger than the NAND")]
    FileTooLarge(u32),
    #[error("cannot run AES-CBC over a buffer of {0} bytes, it must be a multiple of 16")]
    UnalignedCipherBuffer(usize),
    #[error("NAND data could not be read")]
    IO(#[from] std::io::Error),
}
