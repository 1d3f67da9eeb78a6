//! Parallel derivation of many deposit addresses against one cosigner set.

use std::sync::Arc;

use bitcoin::bip32::Xpub;
use bitcoin::Address;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::errors::{Error, InputError, Result};
use crate::multisig::{derive_address, COSIGNER_COUNT};
use crate::network::AddressNetwork;

/// Outcome for one passphrase of a batch.
#[derive(Debug)]
pub struct BatchEntry {
    /// Passphrase as given, lossily decoded if it was not UTF-8.
    pub passphrase: String,
    pub result: Result<Address>,
}

/// Derive an address for every passphrase, at most `concurrency` at a time.
///
/// Entries come back in input order. A failure for one passphrase is stored in
/// its entry and does not stop the others; only a wrong xpub count or a dead
/// worker fails the whole call.
pub async fn derive_batch(
    xpubs: Vec<Xpub>,
    passphrases: Vec<Vec<u8>>,
    network: AddressNetwork,
    concurrency: usize,
) -> Result<Vec<BatchEntry>> {
    if xpubs.len() != COSIGNER_COUNT {
        return Err(InputError::XpubCount(xpubs.len()).into());
    }

    let total = passphrases.len();
    let xpubs: Arc<[Xpub]> = xpubs.into();
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    tracing::debug!(total, concurrency, %network, "Starting batch derivation");

    for (position, passphrase) in passphrases.into_iter().enumerate() {
        let permit = permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::Worker(e.to_string()))?;
        let xpubs = xpubs.clone();

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let result = std::str::from_utf8(&passphrase)
                .map_err(Error::from)
                .and_then(|text| derive_address(&xpubs, text, network));

            let entry = BatchEntry {
                passphrase: String::from_utf8_lossy(&passphrase).into_owned(),
                result,
            };
            (position, entry)
        });
    }

    let mut slots: Vec<Option<BatchEntry>> = (0..total).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (position, entry) = joined.map_err(|e| Error::Worker(e.to_string()))?;
        if let Err(e) = &entry.result {
            tracing::warn!(position, error = %e, "Batch derivation failed for entry");
        }
        slots[position] = Some(entry);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(position, slot)| {
            slot.ok_or_else(|| Error::Worker(format!("no result for entry {position}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::multisig::tests::{signer_xpubs, SAMPLE_PASSPHRASE};

    fn passphrases(count: usize) -> Vec<Vec<u8>> {
        (0..count)
            .map(|i| format!("batch-passphrase-{i}").into_bytes())
            .collect()
    }

    #[tokio::test]
    async fn test_batch_matches_sequential_in_order() {
        let xpubs = signer_xpubs();
        let inputs = passphrases(40);

        let entries = derive_batch(xpubs.clone(), inputs.clone(), AddressNetwork::Main, 4)
            .await
            .unwrap();

        assert_eq!(entries.len(), inputs.len());
        for (entry, input) in entries.iter().zip(&inputs) {
            let passphrase = std::str::from_utf8(input).unwrap();
            assert_eq!(entry.passphrase, passphrase);
            assert_eq!(
                entry.result.as_ref().unwrap(),
                &derive_address(&xpubs, passphrase, AddressNetwork::Main).unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_batch_entry_failure_is_isolated() {
        let inputs = vec![
            SAMPLE_PASSPHRASE.as_bytes().to_vec(),
            vec![0xc3, 0x28],
            b"after-the-bad-one".to_vec(),
        ];

        let entries = derive_batch(signer_xpubs(), inputs, AddressNetwork::Test, 2)
            .await
            .unwrap();

        assert_eq!(
            entries[0].result.as_ref().unwrap().to_string(),
            "tb1qdl0wf2cf6strxxt3um8t05zt55qmkzk6yt88m07w0z4fczgw05eskvnwv3"
        );
        assert_eq!(
            entries[1].result.as_ref().unwrap_err().kind(),
            ErrorKind::InputValidation
        );
        assert!(entries[2].result.is_ok());
    }

    #[tokio::test]
    async fn test_batch_zero_concurrency_still_runs() {
        let entries = derive_batch(signer_xpubs(), passphrases(3), AddressNetwork::Main, 0)
            .await
            .unwrap();

        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|entry| entry.result.is_ok()));
    }

    #[tokio::test]
    async fn test_batch_empty() {
        let entries = derive_batch(signer_xpubs(), Vec::new(), AddressNetwork::Main, 8)
            .await
            .unwrap();

        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_batch_rejects_xpub_count() {
        let mut xpubs = signer_xpubs();
        xpubs.pop();

        let err = derive_batch(xpubs, passphrases(2), AddressNetwork::Main, 2)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputValidation);
    }
}
