//! Cryptographic primitives of the MEGA upload protocol.
//!
//! These follow the wire requirements of the remote service and are NOT
//! general purpose constructions. In particular the IV of a file is derived from
//! its key instead of being random, and the login key derivation is a bespoke
//! AES mixing scheme rather than a standard KDF.

use aes::cipher::{BlockEncrypt, BlockEncryptMut, KeyInit, KeyIvInit, StreamCipher};
use aes::Aes128;
use cbc::cipher::block_padding::NoPadding;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;

const BLOCK_SIZE: usize = 16;

/// Public starting key of the passphrase derivation.
const DERIVATION_SEED: [u8; 16] = [
    0x93, 0xC4, 0x67, 0xE3, 0x7D, 0xB0, 0xC7, 0xA4, 0xD1, 0xBE, 0x3F, 0x81, 0x01, 0x52, 0xCB, 0x56,
];

/// Number of passes over the passphrase chunks.
pub const DERIVATION_ROUNDS: usize = 65536;

/// Length of the (placeholder) integrity tag appended to the file key.
pub const MAC_LEN: usize = 8;

/// Derives the 16-byte login key from a passphrase.
///
/// The UTF-8 passphrase is split into 16-byte chunks, the last one zero padded.
/// Each pass encrypts every chunk in order with AES-128-ECB under the current
/// key, and the ciphertext becomes the key for the next chunk. The key left
/// after [`DERIVATION_ROUNDS`] passes is returned.
///
/// An empty passphrase has no chunks and yields the seed unchanged.
pub fn derive_key(passphrase: &str) -> [u8; 16] {
    let chunks: Vec<[u8; BLOCK_SIZE]> = passphrase
        .as_bytes()
        .chunks(BLOCK_SIZE)
        .map(|chunk| {
            let mut block = [0u8; BLOCK_SIZE];
            block[..chunk.len()].copy_from_slice(chunk);
            block
        })
        .collect();

    let mut key = DERIVATION_SEED;
    for _ in 0..DERIVATION_ROUNDS {
        for chunk in &chunks {
            let cipher = Aes128::new(&key.into());
            let mut block = aes::Block::from(*chunk);
            cipher.encrypt_block(&mut block);
            key.copy_from_slice(&block);
        }
    }

    key
}

/// Per-upload symmetric key.
///
/// A key is bound to exactly one upload; it is neither `Clone` nor persisted
/// and is wiped from memory when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct FileKey([u8; 16]);

impl FileKey {
    /// Draws a fresh key from the OS random source.
    pub fn generate() -> Self {
        let mut key = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Wraps existing key bytes, mostly useful for reproducible tests.
    pub fn from_bytes(key: [u8; 16]) -> Self {
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// IV demanded by the protocol: the first 8 key bytes followed by 8 zeros.
    pub fn iv(&self) -> [u8; 16] {
        let mut iv = [0u8; 16];
        iv[..8].copy_from_slice(&self.0[..8]);
        iv
    }

    /// Encrypts the file payload with AES-128-CTR.
    ///
    /// The 128-bit big-endian counter starts at [`iv`](Self::iv).
    pub fn encrypt_payload(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut buf = plaintext.to_vec();
        let mut cipher = Aes128Ctr::new(&self.0.into(), &self.iv().into());
        cipher.apply_keystream(&mut buf);
        buf
    }

    /// Encrypts serialized node attributes with AES-128-CBC.
    ///
    /// The input is zero padded to the block size, no other padding is applied.
    pub fn encrypt_attributes(&self, attributes: &[u8]) -> Vec<u8> {
        let mut buf = attributes.to_vec();
        let rem = buf.len() % BLOCK_SIZE;
        if rem != 0 {
            buf.resize(buf.len() + BLOCK_SIZE - rem, 0);
        }

        Aes128CbcEnc::new(&self.0.into(), &self.iv().into())
            .encrypt_padded_vec_mut::<NoPadding>(&buf)
    }

    /// Key material registered with the node: the key followed by the MAC.
    ///
    /// The MAC is an all-zero placeholder, so the service cannot verify the
    /// integrity of the uploaded ciphertext.
    pub fn key_material(&self) -> [u8; 16 + MAC_LEN] {
        let mut material = [0u8; 16 + MAC_LEN];
        material[..16].copy_from_slice(&self.0);
        material
    }
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FileKey(..)")
    }
}
