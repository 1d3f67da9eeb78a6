use std::fmt;
use std::str::FromStr;

use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Address network selector.
///
/// Only the encoding prefix differs between the two; script and hash are the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressNetwork {
    Main,
    Test,
}

impl AddressNetwork {
    pub fn bitcoin_network(self) -> Network {
        match self {
            AddressNetwork::Main => Network::Bitcoin,
            AddressNetwork::Test => Network::Testnet,
        }
    }

    /// Bech32 human-readable part.
    pub fn hrp(self) -> &'static str {
        match self {
            AddressNetwork::Main => "bc",
            AddressNetwork::Test => "tb",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AddressNetwork::Main => "main",
            AddressNetwork::Test => "test",
        }
    }
}

impl FromStr for AddressNetwork {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(AddressNetwork::Main),
            "test" => Ok(AddressNetwork::Test),
            other => Err(Error::UnsupportedNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for AddressNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
