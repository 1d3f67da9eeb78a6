use rand::rngs::OsRng;
use rand::RngCore;

/// Random bytes behind a generated passphrase.
pub const PASSPHRASE_BYTES: usize = 32;

/// Generate a fresh deposit passphrase: 32 bytes from the OS RNG, hex encoded.
///
/// The passphrase is the only secret that separates one deposit address from
/// another, so it must never be a sequential or guessable id.
pub fn generate_passphrase() -> String {
    let mut bytes = [0u8; PASSPHRASE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
