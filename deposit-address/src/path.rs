//! Passphrase to BIP32 derivation path.
//!
//! SHA-256 of the passphrase is split into ten 24-bit big-endian chunks
//! (bytes 0..30, the last two digest bytes are unused). Every chunk is below
//! 2^31, so each one is a valid non-hardened child index and the whole path
//! can be walked from an xpub alone.
//!
//! The chunking is a wire contract shared with the signer nodes and any other
//! client library: changing the depth or the chunk width changes every
//! deposit address.

use bitcoin::bip32::{ChildNumber, DerivationPath};
use bitcoin::hashes::{sha256, Hash};

use crate::errors::Result;

/// Number of path levels derived from one passphrase.
pub const PATH_DEPTH: usize = 10;

/// Digest bytes consumed per path level.
pub const SEGMENT_BYTES: usize = 3;

/// Split SHA-256(passphrase) into the ten child indices of the derivation path.
pub fn path_indices(passphrase: &str) -> [u32; PATH_DEPTH] {
    let hash = sha256::Hash::hash(passphrase.as_bytes());
    let bytes = hash.as_byte_array();

    let mut indices = [0u32; PATH_DEPTH];
    for (index, chunk) in indices
        .iter_mut()
        .zip(bytes.chunks_exact(SEGMENT_BYTES))
    {
        *index = u32::from_be_bytes([0, chunk[0], chunk[1], chunk[2]]);
    }
    indices
}

/// Convert passphrase to the 10-level non-hardened derivation path.
///
/// Same passphrase, same path. No entropy check is done here: the caller must
/// supply a random, non-enumerable passphrase (UUIDv4, random hex), never a
/// sequential user id.
pub fn derive_path(passphrase: &str) -> DerivationPath {
    path_indices(passphrase)
        .into_iter()
        .map(|index| ChildNumber::Normal { index })
        .collect::<Vec<_>>()
        .into()
}

/// Same as [`derive_path`] for raw bytes, which must be UTF-8.
pub fn derive_path_from_bytes(passphrase: &[u8]) -> Result<DerivationPath> {
    let passphrase = std::str::from_utf8(passphrase)?;
    Ok(derive_path(passphrase))
}

/// Render indices as `m/i0/i1/.../i9`.
pub fn format_path(indices: &[u32]) -> String {
    let mut path = String::from("m");
    for index in indices {
        path.push('/');
        path.push_str(&index.to_string());
    }
    path
}
