//! Offline derivation of 2-of-3 multisig deposit addresses.
//!
//! A passphrase is hashed into a 10-level non-hardened BIP32 path; each
//! signer node's account xpub is walked along that path, the three child keys
//! are sorted byte-wise and put into a `wsh(sortedmulti(2,...))` script. The
//! result is the same address the signer nodes compute for that passphrase,
//! without an API call and without any private key.

pub mod batch;
pub mod errors;
pub mod multisig;
pub mod network;
pub mod passphrase;
pub mod path;

// Re-export commonly used items
pub use batch::{derive_batch, BatchEntry};
pub use errors::{Error, ErrorKind, InputError, Result};
pub use multisig::{
    compare_key_bytes, derive_address, derive_address_str, derive_cosigner_pubkeys,
    derive_multisig, parse_xpubs, path_string, sorted_multisig_script, DerivedMultisig,
    COSIGNER_COUNT, REQUIRED_SIGNATURES, SCRIPT_TYPE,
};
pub use network::AddressNetwork;
pub use passphrase::generate_passphrase;
pub use path::{derive_path, derive_path_from_bytes, format_path, path_indices, PATH_DEPTH};
