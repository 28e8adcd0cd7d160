//! Decision pass: walks every configured (token, remote chain) pair in a fixed order and emits
//! the transfers that bring under-threshold chains back to their target share.
//!
//! Order: tokens as configured, then remote chains by ascending chain id. Each emitted
//! instruction draws down a running home-chain budget, so earlier pairs are funded first.

use super::allocation::{AllocationCalculator, to_signed};
use super::types::{BudgetDeficiency, RebalanceInstruction, RebalancePlan};
use crate::data_sync::{InventoryConfig, PairKey};
use crate::utils::{apply_share, format_amount};
use ahash::HashMap;
use alloy_primitives::{Address, U256};
use tracing::{debug, warn};

/// Home-chain funds still uncommitted in the current pass, plus the transfers already decided.
#[derive(Debug, Default)]
struct PassState {
    home_budget: HashMap<Address, U256>,
    pending: HashMap<PairKey, U256>,
}

impl PassState {
    fn available(&self, l1_token: Address) -> U256 {
        self.home_budget.get(&l1_token).copied().unwrap_or_default()
    }

    fn pending(&self, key: PairKey) -> U256 {
        self.pending.get(&key).copied().unwrap_or_default()
    }

    fn commit(&mut self, key: PairKey, amount: U256) {
        let (_, l1_token) = key;
        let budget = self.home_budget.entry(l1_token).or_default();
        *budget = budget.saturating_sub(amount);
        *self.pending.entry(key).or_default() += amount;
    }
}

pub struct RebalancePlanner<'a> {
    config: &'a InventoryConfig,
    calculator: &'a AllocationCalculator<'a>,
}

impl<'a> RebalancePlanner<'a> {
    pub fn new(config: &'a InventoryConfig, calculator: &'a AllocationCalculator<'a>) -> Self {
        Self { config, calculator }
    }

    pub fn plan(&self) -> RebalancePlan {
        let snapshot = self.calculator.snapshot();
        let home_chain_id = self.config.home_chain_id();
        let mut state = PassState::default();
        let mut plan = RebalancePlan::default();

        for allocation in self.config.token_allocations() {
            let l1_token = allocation.l1_token;
            let Some(token) = snapshot.token(l1_token) else {
                plan.skipped.extend(allocation.bands.keys().map(|chain_id| (*chain_id, l1_token)));
                continue;
            };
            if !snapshot.is_available(home_chain_id, l1_token) {
                warn!(l1_token = %l1_token, "Home chain balance unavailable, not rebalancing token this cycle");
                plan.skipped.extend(allocation.bands.keys().map(|chain_id| (*chain_id, l1_token)));
                continue;
            }
            state.home_budget.insert(l1_token, snapshot.balance(home_chain_id, l1_token));

            let cumulative = self.calculator.cumulative_balance(l1_token);

            for (chain_id, band) in &allocation.bands {
                let chain_id = *chain_id;
                let key = (chain_id, l1_token);
                let (true, Some(l2_token)) = (snapshot.is_available(chain_id, l1_token), snapshot.l2_token(chain_id, l1_token))
                else {
                    plan.skipped.push(key);
                    continue;
                };

                let current_pct =
                    self.calculator.shortfall_adjusted_share_with_pending(chain_id, l1_token, state.pending(key));
                let threshold_pct = to_signed(band.threshold_pct());
                if current_pct >= threshold_pct {
                    continue;
                }

                let deficit_share = to_signed(band.target_pct()) - current_pct;
                let requested = token.from_normalized(apply_share(deficit_share, cumulative).unsigned_abs());
                if requested.is_zero() {
                    continue;
                }

                let available = state.available(l1_token);
                let amount = requested.min(available);
                if amount < requested {
                    warn!(
                        symbol = %token.get_symbol(),
                        chain_id,
                        requested = %format_amount(requested, token.get_decimals()),
                        available = %format_amount(available, token.get_decimals()),
                        "Insufficient home chain balance to fully rebalance"
                    );
                    plan.deficiencies.push(BudgetDeficiency {
                        l1_token,
                        chain_id,
                        symbol: token.get_symbol(),
                        decimals: token.get_decimals(),
                        requested,
                        available,
                    });
                }
                if amount.is_zero() {
                    continue;
                }

                debug!(
                    symbol = %token.get_symbol(),
                    chain_id,
                    %current_pct,
                    amount = %format_amount(amount, token.get_decimals()),
                    "Chain below allocation threshold"
                );
                state.commit(key, amount);
                plan.instructions.push(RebalanceInstruction {
                    l1_token,
                    l2_token,
                    chain_id,
                    amount,
                    requested_amount: requested,
                    symbol: token.get_symbol(),
                    decimals: token.get_decimals(),
                    current_pct,
                    target_pct: band.target_pct(),
                    threshold_pct: band.threshold_pct(),
                });
            }
        }

        plan
    }
}
