use crate::data_sync::PairKey;
use crate::utils::ChainId;
use ahash::HashMap;
use alloy_primitives::{Address, U256};
use tracing::debug;

/// Funds believed to be in flight toward each (chain, L1 token) pair, in native L1 token units.
///
/// Two write paths: [`TransferLedger::record_sent`] adds to an entry once a bridge submission is
/// accepted, and [`TransferLedger::reconcile`] replaces every entry with the adapter's polled
/// view at the start of the next cycle. The polled view always wins.
#[derive(Debug, Clone, Default)]
pub struct TransferLedger {
    outstanding: HashMap<PairKey, U256>,
}

impl TransferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outstanding(&self, chain_id: ChainId, l1_token: Address) -> U256 {
        self.outstanding.get(&(chain_id, l1_token)).copied().unwrap_or_default()
    }

    pub fn record_sent(&mut self, chain_id: ChainId, l1_token: Address, amount: U256) {
        let entry = self.outstanding.entry((chain_id, l1_token)).or_default();
        *entry = entry.saturating_add(amount);
    }

    /// Replace the ledger with freshly polled amounts.
    ///
    /// Pairs listed in `unpolled` could not be queried this cycle and keep their previous value.
    pub fn reconcile(&mut self, polled: HashMap<PairKey, U256>, unpolled: &[PairKey]) {
        let mut next = polled;
        for key in unpolled {
            if let Some(previous) = self.outstanding.get(key) {
                next.insert(*key, *previous);
            }
        }

        for (key, amount) in &next {
            let previous = self.outstanding.get(key).copied().unwrap_or_default();
            if previous != *amount {
                debug!(chain_id = key.0, l1_token = %key.1, %previous, current = %amount, "Outstanding transfer amount changed");
            }
        }
        self.outstanding = next;
    }
}
