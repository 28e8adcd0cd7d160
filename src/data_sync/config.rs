//! Inventory configuration: the raw `[inventory]` section as written by operators and the
//! validated [`InventoryConfig`] the engine runs on.
//!
//! Percentages are written in percent units (`"7"` is 7%) and stored as fixed-point
//! fractions of 1.0. Every (token, chain) band must satisfy `threshold_pct <= target_pct`;
//! a config that violates it never produces an [`InventoryConfig`].

use crate::utils::config_loader::{
    FluxConfigLoader, FluxConfigLoaderSync, LoadConfigError, load_from_file, load_from_file_sync,
};
use crate::utils::{ChainId, FIXED_POINT_SCALE, HOME_CHAIN_ID, parse_pct};
use alloy_primitives::utils::parse_ether;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use dotenvy::dotenv;
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub const INVENTORY_CONFIG_ENV: &str = "RELAYER_INVENTORY_CONFIG";

#[derive(Debug, Error)]
pub enum InventoryConfigError {
    #[error(transparent)]
    Load(#[from] LoadConfigError),
    #[error("Bad config. Must specify targetPct, thresholdPct for {token} on {chain}")]
    MissingBandField { token: Address, chain: String },
    #[error("Bad config. thresholdPct<=targetPct for {token} on {chain_id}")]
    ThresholdAboveTarget { token: Address, chain_id: ChainId, threshold_pct: U256, target_pct: U256 },
    #[error("Invalid percentage {value:?} for {token} on {chain}: {reason}")]
    InvalidPercentage { token: Address, chain: String, value: String, reason: String },
    #[error("Invalid amount {value:?} for {field}: {reason}")]
    InvalidAmount { field: String, value: String, reason: String },
    #[error("Invalid chain id {key:?} configured for {token}")]
    InvalidChainId { token: Address, key: String },
    #[error("{token} configures an allocation band for the home chain {chain_id}")]
    HomeChainBand { token: Address, chain_id: ChainId },
    #[error("{token} configures an allocation band for chain {chain_id} which is not enabled")]
    ChainNotEnabled { token: Address, chain_id: ChainId },
    #[error("Home chain {0} is not in the enabled chain list")]
    HomeChainNotEnabled(ChainId),
    #[error("Token {0} is configured more than once")]
    DuplicateToken(Address),
}

/// A numeric config value that may be written as a string or as a bare number.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DecimalValue {
    Text(String),
    Integer(u64),
    Float(f64),
}

impl Display for DecimalValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DecimalValue::Text(value) => write!(f, "{}", value.trim()),
            DecimalValue::Integer(value) => write!(f, "{value}"),
            DecimalValue::Float(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Clone, Deserialize, Debug)]
pub struct InventoryConfigRoot {
    pub inventory: InventoryConfigSection,
}

#[derive(Clone, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct InventoryConfigSection {
    #[serde(default = "default_home_chain_id", alias = "homeChainId")]
    pub home_chain_id: ChainId,
    #[serde(default = "default_enabled_chains", alias = "enabledChains")]
    pub enabled_chains: Vec<ChainId>,
    #[serde(default, alias = "wrapEtherThreshold")]
    pub wrap_ether_threshold: Option<DecimalValue>,
    /// Either a list of `{ address, chains }` tables or the relayer's map of
    /// `{ "<l1 token>": { "<chain id>": band } }`. Written order is kept in both forms.
    #[serde(default, alias = "tokenConfig", deserialize_with = "deserialize_token_sections")]
    pub tokens: Vec<TokenSection>,
}

#[derive(Clone, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct TokenSection {
    pub address: Address,
    #[serde(default)]
    pub chains: BTreeMap<String, RawAllocationBand>,
}

#[derive(Clone, Default, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct RawAllocationBand {
    #[serde(default, alias = "targetPct")]
    pub target_pct: Option<DecimalValue>,
    #[serde(default, alias = "thresholdPct")]
    pub threshold_pct: Option<DecimalValue>,
    #[serde(default, alias = "unwrapWethThreshold")]
    pub unwrap_weth_threshold: Option<DecimalValue>,
    #[serde(default, alias = "unwrapWethTarget")]
    pub unwrap_weth_target: Option<DecimalValue>,
}

fn deserialize_token_sections<'de, D>(deserializer: D) -> Result<Vec<TokenSection>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TokenSectionsVisitor;

    impl<'de> Visitor<'de> for TokenSectionsVisitor {
        type Value = Vec<TokenSection>;

        fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str("a list of token tables or a map keyed by L1 token address")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut tokens = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(token) = seq.next_element::<TokenSection>()? {
                tokens.push(token);
            }
            Ok(tokens)
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut tokens = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((address, chains)) = map.next_entry::<Address, BTreeMap<String, RawAllocationBand>>()? {
                tokens.push(TokenSection { address, chains });
            }
            Ok(tokens)
        }
    }

    deserializer.deserialize_any(TokenSectionsVisitor)
}

fn default_home_chain_id() -> ChainId {
    HOME_CHAIN_ID
}

fn default_enabled_chains() -> Vec<ChainId> {
    vec![1, 10, 137, 288, 42161]
}

/// Target and threshold share of one token on one remote chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocationBand {
    target_pct: U256,
    threshold_pct: U256,
    unwrap_weth_threshold: Option<U256>,
    unwrap_weth_target: U256,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum InvalidBandError {
    #[error("threshold {threshold_pct} is above target {target_pct}")]
    ThresholdAboveTarget { threshold_pct: U256, target_pct: U256 },
    #[error("share {0} is above 100%")]
    AboveOneHundredPercent(U256),
}

impl AllocationBand {
    pub fn new(target_pct: U256, threshold_pct: U256) -> Result<Self, InvalidBandError> {
        for pct in [target_pct, threshold_pct] {
            if pct > FIXED_POINT_SCALE {
                return Err(InvalidBandError::AboveOneHundredPercent(pct));
            }
        }
        if threshold_pct > target_pct {
            return Err(InvalidBandError::ThresholdAboveTarget { threshold_pct, target_pct });
        }

        Ok(Self { target_pct, threshold_pct, unwrap_weth_threshold: None, unwrap_weth_target: default_unwrap_weth_target() })
    }

    pub fn with_unwrap_weth(mut self, threshold: Option<U256>, target: Option<U256>) -> Self {
        self.unwrap_weth_threshold = threshold;
        self.unwrap_weth_target = target.unwrap_or_else(default_unwrap_weth_target);
        self
    }

    pub fn target_pct(&self) -> U256 {
        self.target_pct
    }

    pub fn threshold_pct(&self) -> U256 {
        self.threshold_pct
    }

    pub fn unwrap_weth_threshold(&self) -> Option<U256> {
        self.unwrap_weth_threshold
    }

    pub fn unwrap_weth_target(&self) -> U256 {
        self.unwrap_weth_target
    }
}

fn default_unwrap_weth_target() -> U256 {
    U256::from(2) * FIXED_POINT_SCALE
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenAllocation {
    pub l1_token: Address,
    /// Remote chain -> band, iterated in ascending chain id order.
    pub bands: BTreeMap<ChainId, AllocationBand>,
}

/// Validated inventory configuration. Immutable for the life of the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventoryConfig {
    home_chain_id: ChainId,
    enabled_chains: Vec<ChainId>,
    wrap_ether_threshold: U256,
    tokens: Vec<TokenAllocation>,
}

impl InventoryConfig {
    pub fn new(
        home_chain_id: ChainId,
        enabled_chains: Vec<ChainId>,
        wrap_ether_threshold: U256,
        tokens: Vec<TokenAllocation>,
    ) -> Result<Self, InventoryConfigError> {
        if !enabled_chains.contains(&home_chain_id) {
            return Err(InventoryConfigError::HomeChainNotEnabled(home_chain_id));
        }

        let mut seen = HashSet::new();
        for allocation in &tokens {
            if !seen.insert(allocation.l1_token) {
                return Err(InventoryConfigError::DuplicateToken(allocation.l1_token));
            }
            for chain_id in allocation.bands.keys().copied() {
                if chain_id == home_chain_id {
                    return Err(InventoryConfigError::HomeChainBand { token: allocation.l1_token, chain_id });
                }
                if !enabled_chains.contains(&chain_id) {
                    return Err(InventoryConfigError::ChainNotEnabled { token: allocation.l1_token, chain_id });
                }
            }
        }

        Ok(Self { home_chain_id, enabled_chains, wrap_ether_threshold, tokens })
    }

    pub fn home_chain_id(&self) -> ChainId {
        self.home_chain_id
    }

    pub fn enabled_chains(&self) -> &[ChainId] {
        &self.enabled_chains
    }

    /// Enabled chains other than the home chain, in configured order.
    pub fn enabled_l2_chains(&self) -> Vec<ChainId> {
        self.enabled_chains.iter().copied().filter(|chain_id| *chain_id != self.home_chain_id).collect()
    }

    /// L1 tokens in configured order. This is the order rebalances are evaluated in.
    pub fn l1_tokens(&self) -> Vec<Address> {
        self.tokens.iter().map(|allocation| allocation.l1_token).collect()
    }

    pub fn token_allocations(&self) -> &[TokenAllocation] {
        &self.tokens
    }

    pub fn band(&self, l1_token: Address, chain_id: ChainId) -> Option<&AllocationBand> {
        self.tokens.iter().find(|allocation| allocation.l1_token == l1_token).and_then(|allocation| allocation.bands.get(&chain_id))
    }

    pub fn wrap_ether_threshold(&self) -> U256 {
        self.wrap_ether_threshold
    }
}

impl InventoryConfigSection {
    /// Parse the JSON form of the section from `RELAYER_INVENTORY_CONFIG`, if set.
    pub fn from_env() -> Result<Option<Self>, LoadConfigError> {
        dotenv().ok();
        match std::env::var(INVENTORY_CONFIG_ENV) {
            Ok(raw) if !raw.trim().is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    pub fn validate(&self) -> Result<InventoryConfig, InventoryConfigError> {
        let wrap_ether_threshold = match &self.wrap_ether_threshold {
            Some(value) => parse_amount("wrap_ether_threshold", value)?,
            None => FIXED_POINT_SCALE,
        };

        let mut tokens = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            let mut bands = BTreeMap::new();
            for (key, raw) in &token.chains {
                let chain_id: ChainId = key
                    .trim()
                    .parse()
                    .map_err(|_| InventoryConfigError::InvalidChainId { token: token.address, key: key.clone() })?;
                bands.insert(chain_id, validate_band(token.address, chain_id, raw)?);
            }
            tokens.push(TokenAllocation { l1_token: token.address, bands });
        }

        InventoryConfig::new(self.home_chain_id, self.enabled_chains.clone(), wrap_ether_threshold, tokens)
    }
}

fn validate_band(token: Address, chain_id: ChainId, raw: &RawAllocationBand) -> Result<AllocationBand, InventoryConfigError> {
    let (Some(target), Some(threshold)) = (&raw.target_pct, &raw.threshold_pct) else {
        return Err(InventoryConfigError::MissingBandField { token, chain: chain_id.to_string() });
    };

    let target_pct = parse_band_pct(token, chain_id, target)?;
    let threshold_pct = parse_band_pct(token, chain_id, threshold)?;

    let band = AllocationBand::new(target_pct, threshold_pct).map_err(|err| match err {
        InvalidBandError::ThresholdAboveTarget { threshold_pct, target_pct } => {
            InventoryConfigError::ThresholdAboveTarget { token, chain_id, threshold_pct, target_pct }
        }
        InvalidBandError::AboveOneHundredPercent(_) => InventoryConfigError::InvalidPercentage {
            token,
            chain: chain_id.to_string(),
            value: target.to_string(),
            reason: err.to_string(),
        },
    })?;

    let unwrap_threshold = raw.unwrap_weth_threshold.as_ref().map(|value| parse_amount("unwrap_weth_threshold", value)).transpose()?;
    let unwrap_target = raw.unwrap_weth_target.as_ref().map(|value| parse_amount("unwrap_weth_target", value)).transpose()?;

    Ok(band.with_unwrap_weth(unwrap_threshold, unwrap_target))
}

fn parse_band_pct(token: Address, chain_id: ChainId, value: &DecimalValue) -> Result<U256, InventoryConfigError> {
    let text = value.to_string();
    let invalid = |reason: String| InventoryConfigError::InvalidPercentage { token, chain: chain_id.to_string(), value: text.clone(), reason };

    if text.starts_with('-') {
        return Err(invalid("percentages cannot be negative".to_string()));
    }
    parse_pct(&text).map_err(|err| invalid(err.to_string()))
}

fn parse_amount(field: &str, value: &DecimalValue) -> Result<U256, InventoryConfigError> {
    let text = value.to_string();
    let invalid = |reason: String| InventoryConfigError::InvalidAmount { field: field.to_string(), value: text.clone(), reason };

    if text.starts_with('-') {
        return Err(invalid("amounts cannot be negative".to_string()));
    }
    parse_ether(&text).map_err(|err| invalid(err.to_string()))
}

#[async_trait]
impl FluxConfigLoader for InventoryConfigSection {
    type SectionType = InventoryConfigSection;

    async fn load_section_from_file(file_name: String) -> Result<Self::SectionType, LoadConfigError> {
        let root: InventoryConfigRoot = load_from_file(file_name).await?;
        Ok(root.inventory)
    }
}

impl FluxConfigLoaderSync for InventoryConfigSection {
    type SectionType = InventoryConfigSection;

    fn load_section_from_file_sync(file_name: String) -> Result<Self::SectionType, LoadConfigError> {
        let root: InventoryConfigRoot = load_from_file_sync(file_name)?;
        Ok(root.inventory)
    }
}

impl InventoryConfig {
    /// Load and validate the `[inventory]` section of a TOML file.
    pub async fn load(file_name: String) -> Result<Self, InventoryConfigError> {
        let section = InventoryConfigSection::load_section_from_file(file_name).await?;
        section.validate()
    }

    pub fn load_sync(file_name: String) -> Result<Self, InventoryConfigError> {
        let section = InventoryConfigSection::load_section_from_file_sync(file_name)?;
        section.validate()
    }
}
