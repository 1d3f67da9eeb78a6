//! Error types for passphrase-based address derivation.

use std::str::Utf8Error;

use bitcoin::bip32;
use thiserror::Error;

/// Caller input that is rejected before any key material is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// A 2-of-3 multisig needs exactly three cosigner xpubs.
    #[error("must provide exactly 3 xpubs, got {0}")]
    XpubCount(usize),

    /// The passphrase bytes are not valid UTF-8.
    #[error("passphrase is not valid UTF-8: {0}")]
    PassphraseEncoding(#[from] Utf8Error),
}

/// Errors returned by the derivation functions.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrong xpub count or malformed passphrase encoding.
    #[error("invalid input: {0}")]
    InputValidation(#[from] InputError),

    /// An xpub failed to parse, or the public derivation walk failed for it.
    ///
    /// `index` is the position of the xpub in the caller's input.
    #[error("failed to derive child pubkey from xpub #{index}: {source}")]
    KeyDerivation {
        index: usize,
        #[source]
        source: bip32::Error,
    },

    /// Network selector other than `main` or `test`.
    #[error("unsupported network: {0:?} (expected \"main\" or \"test\")")]
    UnsupportedNetwork(String),

    /// A batch worker did not complete.
    #[error("batch worker failed: {0}")]
    Worker(String),
}

/// Coarse classification of [`Error`], for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InputValidation,
    KeyDerivation,
    UnsupportedNetwork,
    Worker,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InputValidation(_) => ErrorKind::InputValidation,
            Error::KeyDerivation { .. } => ErrorKind::KeyDerivation,
            Error::UnsupportedNetwork(_) => ErrorKind::UnsupportedNetwork,
            Error::Worker(_) => ErrorKind::Worker,
        }
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Self {
        Error::InputValidation(InputError::PassphraseEncoding(err))
    }
}

/// Wrapper type for results that can fail with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
