use anyhow::{Context, Result};
use deposit_address::{
    derive_batch, derive_cosigner_pubkeys, derive_multisig, format_path, generate_passphrase,
    path_indices, path_string, DerivedMultisig, SCRIPT_TYPE,
};
use serde::Serialize;
use std::path::Path;

use crate::config::DeriverConfig;

#[derive(Debug, Serialize)]
pub struct AddressOutput {
    pub passphrase: String,
    pub path: String,
    pub address: String,
    pub script_type: String,
    pub witness_script: String,
    pub descriptor: String,
    pub network: String,
}

impl AddressOutput {
    fn new(passphrase: &str, derived: &DerivedMultisig) -> Self {
        Self {
            passphrase: passphrase.to_string(),
            path: path_string(&derived.path),
            address: derived.address.to_string(),
            script_type: SCRIPT_TYPE.to_string(),
            witness_script: derived.witness_script_hex(),
            descriptor: derived.descriptor(),
            network: derived.network.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchLine {
    pub passphrase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn print_path(passphrase: &str) {
    println!("{}", format_path(&path_indices(passphrase)));
}

pub fn print_address(config: &DeriverConfig, passphrase: &str, json: bool) -> Result<()> {
    let derived = derive_multisig(&config.xpubs, passphrase, config.network)
        .context("Failed to derive address")?;

    if json {
        let output = AddressOutput::new(passphrase, &derived);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", derived.address);
    }
    Ok(())
}

pub fn print_pubkeys(config: &DeriverConfig, passphrase: &str) -> Result<()> {
    let pubkeys = derive_cosigner_pubkeys(&config.xpubs, passphrase)
        .context("Failed to derive pubkeys")?;

    for (index, pubkey) in pubkeys.iter().enumerate() {
        println!("{} {}", index, pubkey);
    }
    Ok(())
}

pub fn print_new(config: &DeriverConfig, json: bool) -> Result<()> {
    let passphrase = generate_passphrase();
    let derived = derive_multisig(&config.xpubs, &passphrase, config.network)
        .context("Failed to derive address")?;

    if json {
        let output = AddressOutput::new(&passphrase, &derived);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} {}", passphrase, derived.address);
    }
    Ok(())
}

/// One passphrase per line; `\r\n` endings and blank lines are tolerated.
pub fn split_passphrases(content: &[u8]) -> Vec<Vec<u8>> {
    content
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(<[u8]>::to_vec)
        .collect()
}

pub async fn run_batch(
    config: &DeriverConfig,
    file: &Path,
    concurrency: Option<usize>,
) -> Result<()> {
    let content =
        std::fs::read(file).context(format!("Failed to read passphrase file: {}", file.display()))?;
    let passphrases = split_passphrases(&content);
    let concurrency = concurrency.unwrap_or(config.concurrency);

    tracing::info!(
        "Deriving {} addresses with concurrency {}",
        passphrases.len(),
        concurrency
    );

    let entries = derive_batch(
        config.xpubs.clone(),
        passphrases,
        config.network,
        concurrency,
    )
    .await
    .context("Batch derivation failed")?;

    let mut failed = 0;
    for entry in entries {
        let line = match entry.result {
            Ok(address) => BatchLine {
                passphrase: entry.passphrase,
                address: Some(address.to_string()),
                error: None,
            },
            Err(e) => {
                failed += 1;
                BatchLine {
                    passphrase: entry.passphrase,
                    address: None,
                    error: Some(e.to_string()),
                }
            }
        };
        println!("{}", serde_json::to_string(&line)?);
    }

    if failed > 0 {
        tracing::warn!("{} passphrases failed", failed);
    }
    Ok(())
}
