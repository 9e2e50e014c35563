//! Environment-driven configuration.
//!
//! Global settings live under the `INCLUSION_PROVER` prefix; each configured
//! domain has its own `INCLUSION_PROVER_DOMAINS_{id}_*` section. The domain
//! prefixes are dynamic, so those sections are read through [EnvSection]
//! rather than clap.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::Address;
use clap::Parser;
use thiserror::Error;

use girder_beacon::ChainSpec;
use girder_relay::DEFAULT_SLOT_SEARCH_LIMIT;

/// The environment prefix of every configuration variable.
pub const ENV_PREFIX: &str = "INCLUSION_PROVER";

/// A configuration failure. Always fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required variable is absent.
    #[error("Missing required environment variable {_0}")]
    Missing(String),
    /// A variable holds an unparseable value.
    #[error("Invalid value for {key}: {message}")]
    Invalid {
        /// The offending variable.
        key: String,
        /// Why parsing failed.
        message: String,
    },
}

/// Global process configuration.
#[derive(Parser, Debug)]
#[command(name = "girder", about = "Cross-chain inclusion prover", version)]
pub struct GlobalArgs {
    /// Participating domains as `id:type` pairs, e.g. `1:evm,2:evm`.
    #[arg(long, env = "INCLUSION_PROVER_DOMAINS")]
    pub domains: String,
    /// EVM chain IDs as `domainId:chainId` pairs.
    #[arg(long, env = "INCLUSION_PROVER_CHAINIDS")]
    pub chainids: String,
    /// Log filter, e.g. `debug` or `girder=debug,hyper=warn`.
    #[arg(long, env = "INCLUSION_PROVER_OBSERVABILITY_LOG_LEVEL", default_value = "debug")]
    pub log_level: String,
    /// Log file path.
    #[arg(long, env = "INCLUSION_PROVER_OBSERVABILITY_LOG_FILE", default_value = "out.log")]
    pub log_file: String,
    /// Health endpoint port.
    #[arg(long, env = "INCLUSION_PROVER_OBSERVABILITY_HEALTH_PORT", default_value_t = 9001)]
    pub health_port: u16,
    /// Block store directory.
    #[arg(long, env = "INCLUSION_PROVER_STORE_PATH", default_value = "./lvldbdata")]
    pub store_path: String,
}

/// Supported domain implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainType {
    /// An EVM execution chain anchored to a beacon chain.
    Evm,
}

impl FromStr for DomainType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "evm" => Ok(Self::Evm),
            other => Err(format!("unknown domain type `{other}`")),
        }
    }
}

fn parse_pairs<V: FromStr>(raw: &str, key: &str) -> Result<BTreeMap<u8, V>, ConfigError>
where
    V::Err: std::fmt::Display,
{
    let invalid = |message: String| ConfigError::Invalid { key: key.to_string(), message };
    let mut pairs = BTreeMap::new();
    for entry in raw.split(',').filter(|e| !e.is_empty()) {
        let (id, value) = entry
            .split_once(':')
            .ok_or_else(|| invalid(format!("`{entry}` is not an `id:value` pair")))?;
        let id = id.trim().parse::<u8>().map_err(|e| invalid(format!("domain `{id}`: {e}")))?;
        let value =
            value.trim().parse::<V>().map_err(|e| invalid(format!("value `{value}`: {e}")))?;
        pairs.insert(id, value);
    }
    if pairs.is_empty() {
        return Err(ConfigError::Missing(format!("{ENV_PREFIX}_{key}")));
    }
    Ok(pairs)
}

impl GlobalArgs {
    /// The configured domains in id order.
    pub fn domain_map(&self) -> Result<BTreeMap<u8, DomainType>, ConfigError> {
        parse_pairs(&self.domains, "DOMAINS")
    }

    /// The configured chain IDs per domain.
    pub fn chain_id_map(&self) -> Result<HashMap<u8, u64>, ConfigError> {
        Ok(parse_pairs::<u64>(&self.chainids, "CHAINIDS")?.into_iter().collect())
    }
}

/// One domain's `INCLUSION_PROVER_DOMAINS_{id}_*` environment section.
#[derive(Debug)]
struct EnvSection {
    prefix: String,
}

impl EnvSection {
    fn new(prefix: String) -> Self {
        Self { prefix }
    }

    fn var(&self, key: &str) -> String {
        format!("{}_{}", self.prefix, key)
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(self.var(key)).ok().filter(|value| !value.is_empty())
    }

    fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::Missing(self.var(key)))
    }

    fn require_parsed<T: FromStr>(&self, key: &str) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        self.parse(key, self.require(key)?)
    }

    fn parsed_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(value) => self.parse(key, value),
            None => Ok(default),
        }
    }

    fn csv_parsed<T: FromStr>(&self, key: &str, required: bool) -> Result<Vec<T>, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        let Some(raw) = self.get(key) else {
            if required {
                return Err(ConfigError::Missing(self.var(key)));
            }
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| self.parse(key, entry.to_string()))
            .collect()
    }

    fn parse<T: FromStr>(&self, key: &str, value: String) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        value.parse::<T>().map_err(|e| ConfigError::Invalid {
            key: self.var(key),
            message: format!("{e}"),
        })
    }
}

/// Configuration of one EVM domain.
#[derive(Debug, Clone)]
pub struct EvmConfig {
    /// Execution JSON-RPC endpoint.
    pub endpoint: String,
    /// Hex-encoded secp256k1 signing key.
    pub key: String,
    /// Beacon REST endpoint.
    pub beacon_endpoint: String,
    /// Router contract address.
    pub router: Address,
    /// Executor contract address.
    pub executor: Address,
    /// Hashi adapter contract address.
    pub hashi: Address,
    /// Yaho contract address.
    pub yaho: Address,
    /// State-root storage contracts watched on this domain.
    pub state_root_addresses: Vec<Address>,
    /// Top-level slot index of the executor's deposit mapping.
    pub slot_index: u8,
    /// First block proven for routes with no stored cursor.
    pub start_block: u64,
    /// Start listening from the current head.
    pub latest: bool,
    /// Ignore the stored listener cursor.
    pub fresh_start: bool,
    /// Confirmations subtracted from the head before processing.
    pub block_confirmations: u64,
    /// Blocks processed per listener iteration.
    pub block_interval: u64,
    /// Delay between listener iterations.
    pub block_retry_interval: Duration,
    /// Gas price ceiling in wei.
    pub max_gas_price: u128,
    /// Multiplier over the suggested gas price.
    pub gas_multiplier: f64,
    /// Fee bump percentage for stuck transactions.
    pub gas_increase_percentage: u64,
    /// Hex-encoded resource IDs executed as generic calls.
    pub generic_resources: Vec<String>,
    /// Consensus-layer schema of the anchoring beacon chain.
    pub spec: ChainSpec,
    /// Skipped-slot search bound.
    pub slot_search_limit: u64,
}

impl EvmConfig {
    /// Loads the section for `domain_id` from the environment.
    pub fn load(domain_id: u8) -> Result<Self, ConfigError> {
        let section = EnvSection::new(format!("{ENV_PREFIX}_DOMAINS_{domain_id}"));
        Ok(Self {
            endpoint: section.require("ENDPOINT")?,
            key: section.require("KEY")?,
            beacon_endpoint: section.require("BEACON_ENDPOINT")?,
            router: section.require_parsed("ROUTER")?,
            executor: section.require_parsed("EXECUTOR")?,
            hashi: section.require_parsed("HASHI")?,
            yaho: section.require_parsed("YAHO")?,
            state_root_addresses: section.csv_parsed("STATE_ROOT_ADDRESSES", true)?,
            slot_index: section.require_parsed("SLOT_INDEX")?,
            start_block: section.parsed_or("START_BLOCK", 0)?,
            latest: section.parsed_or("LATEST", false)?,
            fresh_start: section.parsed_or("FRESH_START", false)?,
            block_confirmations: section.parsed_or("BLOCK_CONFIRMATIONS", 10)?,
            block_interval: section.parsed_or("BLOCK_INTERVAL", 5)?,
            block_retry_interval: Duration::from_secs(
                section.parsed_or("BLOCK_RETRY_INTERVAL", 5)?,
            ),
            max_gas_price: section.parsed_or("MAX_GAS_PRICE", 500_000_000_000)?,
            gas_multiplier: section.parsed_or("GAS_MULTIPLIER", 1.0)?,
            gas_increase_percentage: section.parsed_or("GAS_INCREASE_PERCENTAGE", 15)?,
            generic_resources: section.csv_parsed("GENERIC_RESOURCES", false)?,
            spec: section.parsed_or("SPEC", ChainSpec::Mainnet)?,
            slot_search_limit: section.parsed_or("SLOT_SEARCH_LIMIT", DEFAULT_SLOT_SEARCH_LIMIT)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(key: &str, value: &str) {
        // SAFETY: tests touching the environment use disjoint domain sections.
        unsafe { std::env::set_var(key, value) };
    }

    #[test]
    fn test_parse_domain_and_chain_maps() {
        let args = GlobalArgs {
            domains: "1:evm,2:evm".into(),
            chainids: "1:1,2:10200".into(),
            log_level: "debug".into(),
            log_file: "out.log".into(),
            health_port: 9001,
            store_path: "./lvldbdata".into(),
        };
        let domains = args.domain_map().unwrap();
        assert_eq!(domains.len(), 2);
        assert_eq!(domains[&1], DomainType::Evm);
        assert_eq!(args.chain_id_map().unwrap()[&2], 10_200);
    }

    #[test]
    fn test_unknown_domain_type_fails() {
        let args = GlobalArgs {
            domains: "1:substrate".into(),
            chainids: "1:1".into(),
            log_level: "debug".into(),
            log_file: "out.log".into(),
            health_port: 9001,
            store_path: "./lvldbdata".into(),
        };
        assert!(args.domain_map().is_err());
    }

    #[test]
    fn test_evm_config_defaults_and_required() {
        set("INCLUSION_PROVER_DOMAINS_91_ENDPOINT", "http://localhost:8545");
        set("INCLUSION_PROVER_DOMAINS_91_KEY", "aa".repeat(32).as_str());
        set("INCLUSION_PROVER_DOMAINS_91_BEACON_ENDPOINT", "http://localhost:5052");
        set("INCLUSION_PROVER_DOMAINS_91_ROUTER", "0xa83114A443dA1CecEFC50368531cACE9F37fCCcb");
        set("INCLUSION_PROVER_DOMAINS_91_EXECUTOR", "0xa83114A443dA1CecEFC50368531cACE9F37fCCcb");
        set("INCLUSION_PROVER_DOMAINS_91_HASHI", "0xa83114A443dA1CecEFC50368531cACE9F37fCCcb");
        set("INCLUSION_PROVER_DOMAINS_91_YAHO", "0xa83114A443dA1CecEFC50368531cACE9F37fCCcb");
        set(
            "INCLUSION_PROVER_DOMAINS_91_STATE_ROOT_ADDRESSES",
            "0xa83114A443dA1CecEFC50368531cACE9F37fCCcb,0xd68eb9b5E135b96c1Af165e1D8c4e2eB0E1CE4CD",
        );
        set("INCLUSION_PROVER_DOMAINS_91_SLOT_INDEX", "2");

        let config = EvmConfig::load(91).unwrap();
        assert_eq!(config.state_root_addresses.len(), 2);
        assert_eq!(config.slot_index, 2);
        assert_eq!(config.block_confirmations, 10);
        assert_eq!(config.block_interval, 5);
        assert_eq!(config.block_retry_interval, Duration::from_secs(5));
        assert_eq!(config.max_gas_price, 500_000_000_000);
        assert_eq!(config.gas_increase_percentage, 15);
        assert_eq!(config.spec, ChainSpec::Mainnet);
        assert_eq!(config.slot_search_limit, DEFAULT_SLOT_SEARCH_LIMIT);
        assert!(config.generic_resources.is_empty());
    }

    #[test]
    fn test_evm_config_missing_required_fails() {
        assert!(matches!(EvmConfig::load(92), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_evm_config_gnosis_spec() {
        set("INCLUSION_PROVER_DOMAINS_93_ENDPOINT", "http://localhost:8545");
        set("INCLUSION_PROVER_DOMAINS_93_KEY", "aa".repeat(32).as_str());
        set("INCLUSION_PROVER_DOMAINS_93_BEACON_ENDPOINT", "http://localhost:5052");
        set("INCLUSION_PROVER_DOMAINS_93_ROUTER", "0xa83114A443dA1CecEFC50368531cACE9F37fCCcb");
        set("INCLUSION_PROVER_DOMAINS_93_EXECUTOR", "0xa83114A443dA1CecEFC50368531cACE9F37fCCcb");
        set("INCLUSION_PROVER_DOMAINS_93_HASHI", "0xa83114A443dA1CecEFC50368531cACE9F37fCCcb");
        set("INCLUSION_PROVER_DOMAINS_93_YAHO", "0xa83114A443dA1CecEFC50368531cACE9F37fCCcb");
        set(
            "INCLUSION_PROVER_DOMAINS_93_STATE_ROOT_ADDRESSES",
            "0xa83114A443dA1CecEFC50368531cACE9F37fCCcb",
        );
        set("INCLUSION_PROVER_DOMAINS_93_SLOT_INDEX", "5");
        set("INCLUSION_PROVER_DOMAINS_93_SPEC", "gnosis");
        set("INCLUSION_PROVER_DOMAINS_93_SLOT_SEARCH_LIMIT", "32");

        let config = EvmConfig::load(93).unwrap();
        assert_eq!(config.spec, ChainSpec::Gnosis);
        assert_eq!(config.slot_search_limit, 32);
    }
}
