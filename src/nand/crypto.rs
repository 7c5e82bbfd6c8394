// nand/crypto.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Implements the AES-128-CBC cluster encryption used by the Wii and Wii U NAND filesystem.

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::cipher::block_padding::NoPadding;
use crate::nand::NANDError;

/// The 16-byte AES key protecting the NAND filesystem.
pub type NandKey = [u8; 16];

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

// Clusters always start from a zeroed IV, nothing is chained between them.
const CLUSTER_IV: [u8; 16] = [0; 16];

/// Decrypts a cluster in place using the NAND key. There's no authentication here, so a wrong
/// key just produces garbage.
pub fn decrypt_cluster(key: &NandKey, data: &mut [u8]) -> Result<(), NANDError> {
    let len = data.len();
    if !len.is_multiple_of(16) {
        return Err(NANDError::UnalignedCipherBuffer(len));
    }
    let decryptor = Aes128CbcDec::new(&(*key).into(), &CLUSTER_IV.into());
    decryptor.decrypt_padded_mut::<NoPadding>(data)
        .map_err(|_| NANDError::UnalignedCipherBuffer(len))?;
    Ok(())
}

/// Encrypts a cluster in place using the NAND key.
pub fn encrypt_cluster(key: &NandKey, data: &mut [u8]) -> Result<(), NANDError> {
    let len = data.len();
    if !len.is_multiple_of(16) {
        return Err(NANDError::UnalignedCipherBuffer(len));
    }
    let encryptor = Aes128CbcEnc::new(&(*key).into(), &CLUSTER_IV.into());
    encryptor.encrypt_padded_mut::<NoPadding>(data, len)
        .map_err(|_| NANDError::UnalignedCipherBuffer(len))?;
    Ok(())
}
