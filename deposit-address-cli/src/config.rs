use anyhow::{Context, Result};
use bitcoin::bip32::Xpub;
use deposit_address::{parse_xpubs, AddressNetwork};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Batch concurrency when neither the file nor the command line sets one.
pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub network: Option<NetworkConfig>,
    #[serde(default)]
    pub signer: Option<SignerConfig>,
    #[serde(default)]
    pub batch: Option<BatchConfig>,
}

#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    #[serde(rename = "type")]
    pub network_type: String, // "main" or "test"
}

#[derive(Debug, Deserialize)]
pub struct SignerConfig {
    pub xpubs: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchConfig {
    pub concurrency: Option<usize>,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub network: Option<String>,
    pub xpubs: Vec<String>,
}

/// Validated settings for address derivation.
#[derive(Debug)]
pub struct DeriverConfig {
    pub network: AddressNetwork,
    pub xpubs: Vec<Xpub>,
    pub concurrency: usize,
}

impl DeriverConfig {
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Result<Self> {
        let network_type = overrides
            .network
            .or_else(|| file.network.map(|network| network.network_type))
            .unwrap_or_else(|| AddressNetwork::Main.to_string());
        let network = network_type.parse::<AddressNetwork>().context("Invalid network")?;

        let xpubs = if overrides.xpubs.is_empty() {
            file.signer.map(|signer| signer.xpubs).unwrap_or_default()
        } else {
            overrides.xpubs
        };
        let xpubs = parse_xpubs(&xpubs[..])
            .context("Invalid cosigner xpubs (config [signer].xpubs or --xpub)")?;

        let concurrency = file
            .batch
            .and_then(|batch| batch.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY);

        tracing::info!("Loaded {} cosigner xpubs for network {}", xpubs.len(), network);

        Ok(Self {
            network,
            xpubs,
            concurrency,
        })
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    toml::from_str(content).context("Failed to parse config file")
}

pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .context(format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Load the explicit config path, else `config.toml` when present, else nothing.
pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<DeriverConfig> {
    let file = match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config_file(path)?
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                tracing::info!("Loading configuration from: {}", default_path.display());
                load_config_file(&default_path)?
            } else {
                ConfigFile::default()
            }
        }
    };

    DeriverConfig::resolve(file, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    const XPUBS: [&str; 3] = [
        "xpub6EkTGi8Kh6bqYpZzFeoANKQh7nH1GiChpb1StmTSoUG3QA1u6yf6dYprGjWiMBKcTEQ1KFDBNDL4sxDh45AiD7EkFC3yeD23Vkf3yzYSwEb",
        "xpub6EV2WhLpxRVKo6NPRCXniPmFapNhfeUwzuTZDpsvdiGGa8cPaqzLPqmPmtYy53wXG4NcGZErkPVuFaKQnP3DYCHyTvg1mLyf4vttBdqErFG",
        "xpub6DyBA7T961cEFdmrvapjPHJGS8abivTPJ9ERFkAZKrz7r9p8Vb33BaenC4JnMia3CuX4byLfS79nJh7qHPGHFHTXR5gjvp8J1r76bXBU7Fx",
    ];

    fn config_toml(network: &str) -> String {
        format!(
            r#"
[network]
type = "{network}"

[signer]
xpubs = ["{}", "{}", "{}"]

[batch]
concurrency = 3
"#,
            XPUBS[0], XPUBS[1], XPUBS[2]
        )
    }

    #[test]
    fn test_resolve_from_file() {
        let file = parse_config(&config_toml("test")).unwrap();
        let config = DeriverConfig::resolve(file, Overrides::default()).unwrap();

        assert_eq!(config.network, AddressNetwork::Test);
        assert_eq!(config.xpubs.len(), 3);
        assert_eq!(config.xpubs[0].to_string(), XPUBS[0]);
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn test_overrides_win() {
        let file = parse_config(&config_toml("test")).unwrap();
        let overrides = Overrides {
            network: Some("main".to_string()),
            xpubs: vec![
                XPUBS[2].to_string(),
                XPUBS[1].to_string(),
                XPUBS[0].to_string(),
            ],
        };

        let config = DeriverConfig::resolve(file, overrides).unwrap();
        assert_eq!(config.network, AddressNetwork::Main);
        assert_eq!(config.xpubs[0].to_string(), XPUBS[2]);
    }

    #[test]
    fn test_defaults_without_file() {
        let overrides = Overrides {
            network: None,
            xpubs: XPUBS.iter().map(|s| s.to_string()).collect(),
        };

        let config = DeriverConfig::resolve(ConfigFile::default(), overrides).unwrap();
        assert_eq!(config.network, AddressNetwork::Main);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_rejects_unknown_network() {
        let file = parse_config(&config_toml("signet")).unwrap();
        assert!(DeriverConfig::resolve(file, Overrides::default()).is_err());
    }

    #[test]
    fn test_rejects_wrong_xpub_count() {
        let overrides = Overrides {
            network: None,
            xpubs: vec![XPUBS[0].to_string(), XPUBS[1].to_string()],
        };
        let err = DeriverConfig::resolve(ConfigFile::default(), overrides).unwrap_err();
        let cause = err.downcast_ref::<deposit_address::Error>().unwrap();
        assert!(matches!(
            cause,
            deposit_address::Error::InputValidation(deposit_address::InputError::XpubCount(2))
        ));

        let err = DeriverConfig::resolve(ConfigFile::default(), Overrides::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<deposit_address::Error>().unwrap().kind(),
            deposit_address::ErrorKind::InputValidation
        );
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(parse_config("[network\ntype = 1").is_err());
    }
}
