//! 2-of-3 sortedmulti P2WSH address from three account xpubs and a passphrase.

use std::cmp::Ordering;
use std::str::FromStr;

use bitcoin::bip32::{DerivationPath, Xpub};
use bitcoin::secp256k1::{Secp256k1, Verification};
use bitcoin::{Address, PublicKey, ScriptBuf};

use crate::errors::{Error, InputError, Result};
use crate::network::AddressNetwork;
use crate::path::{derive_path, format_path};

/// Signatures needed to spend.
pub const REQUIRED_SIGNATURES: i64 = 2;

/// Number of cosigner xpubs.
pub const COSIGNER_COUNT: usize = 3;

/// Script type label reported alongside derived addresses.
pub const SCRIPT_TYPE: &str = "wsh_sortedmulti(2,3)";

/// Everything produced while deriving one deposit address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedMultisig {
    pub path: DerivationPath,
    /// Child pubkeys in script order (byte-wise ascending).
    pub pubkeys: [PublicKey; COSIGNER_COUNT],
    pub witness_script: ScriptBuf,
    pub address: Address,
    pub network: AddressNetwork,
}

impl DerivedMultisig {
    /// Output descriptor for the derived keys, importable into a descriptor wallet.
    pub fn descriptor(&self) -> String {
        format!(
            "wsh(sortedmulti({},{},{},{}))",
            REQUIRED_SIGNATURES, self.pubkeys[0], self.pubkeys[1], self.pubkeys[2]
        )
    }

    pub fn witness_script_hex(&self) -> String {
        hex::encode(self.witness_script.as_bytes())
    }
}

/// Parse cosigner xpub strings.
///
/// The count is checked before parsing; a string that fails to decode
/// (bad base58, bad checksum, wrong length) is reported with its position.
pub fn parse_xpubs<S: AsRef<str>>(xpubs: &[S]) -> Result<Vec<Xpub>> {
    if xpubs.len() != COSIGNER_COUNT {
        return Err(InputError::XpubCount(xpubs.len()).into());
    }

    xpubs
        .iter()
        .enumerate()
        .map(|(index, xpub)| {
            Xpub::from_str(xpub.as_ref()).map_err(|source| Error::KeyDerivation { index, source })
        })
        .collect()
}

fn as_cosigners(xpubs: &[Xpub]) -> Result<&[Xpub; COSIGNER_COUNT]> {
    xpubs
        .try_into()
        .map_err(|_| InputError::XpubCount(xpubs.len()).into())
}

fn derive_child_pubkey<C: Verification>(
    secp: &Secp256k1<C>,
    index: usize,
    xpub: &Xpub,
    path: &DerivationPath,
) -> Result<PublicKey> {
    // Non-hardened path only, so this never needs a private key.
    let child_xpub = xpub
        .derive_pub(secp, path)
        .map_err(|source| Error::KeyDerivation { index, source })?;

    Ok(PublicKey::new(child_xpub.public_key))
}

/// Derive each cosigner's child pubkey for `passphrase`, in input order.
pub fn derive_cosigner_pubkeys(
    xpubs: &[Xpub],
    passphrase: &str,
) -> Result<[PublicKey; COSIGNER_COUNT]> {
    cosigner_pubkeys(xpubs, &derive_path(passphrase))
}

fn cosigner_pubkeys(
    xpubs: &[Xpub],
    path: &DerivationPath,
) -> Result<[PublicKey; COSIGNER_COUNT]> {
    let [xpub0, xpub1, xpub2] = as_cosigners(xpubs)?;
    let secp = Secp256k1::verification_only();

    Ok([
        derive_child_pubkey(&secp, 0, xpub0, path)?,
        derive_child_pubkey(&secp, 1, xpub1, path)?,
        derive_child_pubkey(&secp, 2, xpub2, path)?,
    ])
}

/// Unsigned lexicographic comparison of compressed key encodings (BIP67 order).
pub fn compare_key_bytes(a: &[u8; 33], b: &[u8; 33]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Sort keys byte-wise and build `OP_2 <pk0> <pk1> <pk2> OP_3 OP_CHECKMULTISIG`.
pub fn sorted_multisig_script(mut pubkeys: [PublicKey; COSIGNER_COUNT]) -> ScriptBuf {
    sort_pubkeys(&mut pubkeys);
    multisig_script(&pubkeys)
}

fn sort_pubkeys(pubkeys: &mut [PublicKey]) {
    pubkeys.sort_by(|a, b| compare_key_bytes(&a.inner.serialize(), &b.inner.serialize()));
}

fn multisig_script(sorted: &[PublicKey; COSIGNER_COUNT]) -> ScriptBuf {
    bitcoin::blockdata::script::Builder::new()
        .push_int(REQUIRED_SIGNATURES)
        .push_key(&sorted[0])
        .push_key(&sorted[1])
        .push_key(&sorted[2])
        .push_int(COSIGNER_COUNT as i64)
        .push_opcode(bitcoin::blockdata::opcodes::all::OP_CHECKMULTISIG)
        .into_script()
}

/// Derive the full 2-of-3 multisig record for `passphrase`.
///
/// Uses standard BIP32 public derivation, so any BIP32 library reproduces it.
///
/// # Arguments
/// * `xpubs` - 3 account xpubs from signer nodes (at m/48'/0'/0'/2'), any order
/// * `passphrase` - Random UUID or hex string (NOT sequential ID!)
/// * `network` - Address network
pub fn derive_multisig(
    xpubs: &[Xpub],
    passphrase: &str,
    network: AddressNetwork,
) -> Result<DerivedMultisig> {
    let path = derive_path(passphrase);
    let mut pubkeys = cosigner_pubkeys(xpubs, &path)?;
    // Canonical order, so every party builds the same script
    sort_pubkeys(&mut pubkeys);

    let witness_script = multisig_script(&pubkeys);
    let address = Address::p2wsh(&witness_script, network.bitcoin_network());

    // The path links passphrase and address; keep it out of the logs.
    tracing::debug!(%address, %network, "Derived multisig address");

    Ok(DerivedMultisig {
        path,
        pubkeys,
        witness_script,
        address,
        network,
    })
}

/// Derive the 2-of-3 multisig deposit address for `passphrase`.
///
/// Lets a backend derive addresses locally, with the same result the signer
/// nodes return for that passphrase. Input order of `xpubs` does not matter.
///
/// # Example
/// See `examples/derive_address.rs` for complete usage example.
pub fn derive_address(xpubs: &[Xpub], passphrase: &str, network: AddressNetwork) -> Result<Address> {
    Ok(derive_multisig(xpubs, passphrase, network)?.address)
}

/// String-level entry point: xpub strings and a `main`/`test` selector in,
/// address string out.
pub fn derive_address_str<S: AsRef<str>>(
    xpubs: &[S],
    passphrase: &str,
    network: &str,
) -> Result<String> {
    if xpubs.len() != COSIGNER_COUNT {
        return Err(InputError::XpubCount(xpubs.len()).into());
    }
    let network = AddressNetwork::from_str(network)?;
    let xpubs = parse_xpubs(xpubs)?;

    Ok(derive_address(&xpubs, passphrase, network)?.to_string())
}

/// `m/...` rendering of a path made of normal child numbers.
pub fn path_string(path: &DerivationPath) -> String {
    let indices: Vec<u32> = path.into_iter().map(|child| u32::from(*child)).collect();
    format_path(&indices)
}
