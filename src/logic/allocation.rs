use super::ledger::TransferLedger;
use super::types::{ChainDistribution, DistributionSummary};
use crate::data_sync::{InventoryConfig, InventorySnapshot};
use crate::utils::{ChainId, FIXED_POINT_SCALE, format_amount, format_pct, share_of};
use alloy_primitives::{Address, I256, U256};
use std::collections::BTreeMap;

/// Share arithmetic over one snapshot and the current ledger.
///
/// Balances, outstanding transfers and shortfalls are scaled to 18 decimals before any ratio is
/// taken. Shares are fixed-point fractions where [`FIXED_POINT_SCALE`] is 1.0.
pub struct AllocationCalculator<'a> {
    config: &'a InventoryConfig,
    snapshot: &'a InventorySnapshot,
    ledger: &'a TransferLedger,
}

impl<'a> AllocationCalculator<'a> {
    pub fn new(config: &'a InventoryConfig, snapshot: &'a InventorySnapshot, ledger: &'a TransferLedger) -> Self {
        Self { config, snapshot, ledger }
    }

    pub fn snapshot(&self) -> &InventorySnapshot {
        self.snapshot
    }

    fn normalize(&self, l1_token: Address, raw: U256) -> U256 {
        match self.snapshot.token(l1_token) {
            Some(token) => token.to_normalized(raw),
            None => raw,
        }
    }

    /// Sum of the token's balances over every chain in the snapshot, in native units.
    pub fn cumulative_balance_raw(&self, l1_token: Address) -> U256 {
        self.snapshot.balances_of(l1_token).fold(U256::ZERO, |total, (_, amount)| total.saturating_add(amount))
    }

    /// [`Self::cumulative_balance_raw`] scaled to 18 decimals. Outstanding transfers are not included.
    pub fn cumulative_balance(&self, l1_token: Address) -> U256 {
        self.normalize(l1_token, self.cumulative_balance_raw(l1_token))
    }

    pub fn share_on_chain(&self, chain_id: ChainId, l1_token: Address) -> U256 {
        let total = self.cumulative_balance(l1_token);
        if total.is_zero() {
            return U256::ZERO;
        }
        self.normalize(l1_token, self.snapshot.balance(chain_id, l1_token)) * FIXED_POINT_SCALE / total
    }

    /// balance + outstanding - shortfall, normalized. Negative when the shortfall dominates.
    pub fn virtual_balance(&self, chain_id: ChainId, l1_token: Address, pending: U256) -> I256 {
        let balance = self.snapshot.balance(chain_id, l1_token);
        let in_flight = self.ledger.outstanding(chain_id, l1_token).saturating_add(pending);
        let credit = self.normalize(l1_token, balance.saturating_add(in_flight));
        let debit = self.normalize(l1_token, self.snapshot.shortfall(chain_id, l1_token));

        if credit >= debit { to_signed(credit - debit) } else { -to_signed(debit - credit) }
    }

    /// Share of the chain after counting in-flight funds and subtracting its shortfall.
    pub fn shortfall_adjusted_share(&self, chain_id: ChainId, l1_token: Address) -> I256 {
        self.shortfall_adjusted_share_with_pending(chain_id, l1_token, U256::ZERO)
    }

    /// Same as [`Self::shortfall_adjusted_share`] with `pending` extra native units treated as in flight.
    pub fn shortfall_adjusted_share_with_pending(&self, chain_id: ChainId, l1_token: Address, pending: U256) -> I256 {
        share_of(self.virtual_balance(chain_id, l1_token, pending), self.cumulative_balance(l1_token))
    }

    /// L1 token -> chain id -> plain share, for every configured token on every enabled chain.
    pub fn distribution_table(&self) -> BTreeMap<Address, BTreeMap<ChainId, U256>> {
        self.config
            .l1_tokens()
            .into_iter()
            .map(|l1_token| {
                let per_chain: BTreeMap<ChainId, U256> = self
                    .config
                    .enabled_chains()
                    .iter()
                    .map(|chain_id| (*chain_id, self.share_on_chain(*chain_id, l1_token)))
                    .collect();
                (l1_token, per_chain)
            })
            .collect()
    }

    /// Human readable distribution logged before each pass, keyed by token symbol.
    pub fn distribution_summary(&self) -> DistributionSummary {
        let mut summary = DistributionSummary::new();
        for l1_token in self.config.l1_tokens() {
            let Some(token) = self.snapshot.token(l1_token) else {
                continue;
            };
            let decimals = token.get_decimals();

            let mut per_chain = BTreeMap::new();
            for chain_id in self.config.enabled_chains().iter().copied() {
                if !self.snapshot.is_available(chain_id, l1_token) {
                    continue;
                }
                let actual = self.snapshot.balance(chain_id, l1_token);
                let outstanding = self.ledger.outstanding(chain_id, l1_token);
                let shortfall = self.snapshot.shortfall(chain_id, l1_token);

                per_chain.insert(
                    chain_id,
                    ChainDistribution {
                        actual_balance_on_chain: format_amount(actual, decimals),
                        virtual_balance_on_chain: format_amount(actual.saturating_add(outstanding), decimals),
                        outstanding_transfers: format_amount(outstanding, decimals),
                        token_short_falls: format_amount(shortfall, decimals),
                        pro_rata_share: format_pct(to_signed(self.share_on_chain(chain_id, l1_token))),
                        shortfall_adjusted_share: format_pct(self.shortfall_adjusted_share(chain_id, l1_token)),
                    },
                );
            }
            summary.insert(token.get_symbol(), per_chain);
        }
        summary
    }
}

pub(crate) fn to_signed(value: U256) -> I256 {
    I256::try_from(value).unwrap_or(I256::MAX)
}
