use strum_macros::{Display, EnumIter, FromRepr};

pub type ChainId = u64;

/// Networks the relayer knows by name. Anything else is rendered by id.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, EnumIter, FromRepr)]
#[repr(u64)]
pub enum KnownChain {
    #[strum(serialize = "Mainnet")]
    Mainnet = 1,
    #[strum(serialize = "Optimism")]
    Optimism = 10,
    #[strum(serialize = "Boba")]
    Boba = 288,
    #[strum(serialize = "Polygon-matic")]
    Polygon = 137,
    #[strum(serialize = "Arbitrum")]
    Arbitrum = 42161,
}

impl KnownChain {
    pub fn chain_id(self) -> ChainId {
        self as ChainId
    }
}

/// Human readable network name used in rebalance logs.
pub fn chain_name(chain_id: ChainId) -> String {
    match KnownChain::from_repr(chain_id) {
        Some(chain) => chain.to_string(),
        None => format!("Chain {chain_id}"),
    }
}
