use crate::utils::{ChainId, chain_name, format_amount, format_pct};
use alloy_primitives::{Address, I256, TxHash, U256};
use serde::Serialize;
use std::collections::BTreeMap;

/// A transfer from the home chain to one remote chain, decided during a rebalance pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebalanceInstruction {
    pub l1_token: Address,
    /// Token address on the destination chain
    pub l2_token: Address,
    pub chain_id: ChainId,
    /// Amount to send, in native units of the L1 token
    pub amount: U256,
    /// Amount needed to restore the target share. Larger than `amount` when the home budget ran short
    pub requested_amount: U256,
    pub symbol: String,
    pub decimals: u8,
    /// Shortfall adjusted share of the chain when the pass evaluated it
    pub current_pct: I256,
    pub target_pct: U256,
    pub threshold_pct: U256,
}

impl RebalanceInstruction {
    pub fn is_clamped(&self) -> bool {
        self.amount < self.requested_amount
    }

    pub fn formatted_amount(&self) -> String {
        format_amount(self.amount, self.decimals)
    }
}

/// The home chain could not fund a full rebalance for a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetDeficiency {
    pub l1_token: Address,
    pub chain_id: ChainId,
    pub symbol: String,
    pub decimals: u8,
    pub requested: U256,
    pub available: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedRebalance {
    pub instruction: RebalanceInstruction,
    pub tx_hash: TxHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRebalance {
    pub instruction: RebalanceInstruction,
    pub reason: String,
}

/// Output of the decision pass: instructions in evaluation order plus every under-funded pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebalancePlan {
    pub instructions: Vec<RebalanceInstruction>,
    pub deficiencies: Vec<BudgetDeficiency>,
    /// Configured pairs left out of the pass because their data was unavailable
    pub skipped: Vec<(ChainId, Address)>,
}

impl RebalancePlan {
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Outcome of one `rebalance_inventory_if_needed` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebalanceReport {
    pub executed: Vec<ExecutedRebalance>,
    pub failed: Vec<FailedRebalance>,
    pub deficiencies: Vec<BudgetDeficiency>,
    pub skipped: Vec<(ChainId, Address)>,
}

impl RebalanceReport {
    pub fn from_plan(plan: &RebalancePlan) -> Self {
        Self { deficiencies: plan.deficiencies.clone(), skipped: plan.skipped.clone(), ..Self::default() }
    }

    pub fn rebalances_required(&self) -> bool {
        !self.executed.is_empty() || !self.failed.is_empty()
    }

    pub fn total_sent(&self, l1_token: Address) -> U256 {
        self.executed
            .iter()
            .filter(|executed| executed.instruction.l1_token == l1_token)
            .fold(U256::ZERO, |total, executed| total + executed.instruction.amount)
    }

    /// The operator facing summary: a headline followed by one line per executed instruction.
    pub fn log_lines(&self) -> Vec<String> {
        if !self.rebalances_required() {
            return vec!["No rebalances required".to_string()];
        }
        if self.executed.is_empty() {
            let mut lines = vec!["Inventory rebalances failed".to_string()];
            lines.extend(self.failed.iter().map(|failed| failed_line(&failed.instruction, &failed.reason)));
            return lines;
        }

        let mut sent: Vec<&RebalanceInstruction> = self.executed.iter().map(|executed| &executed.instruction).collect();
        sent.sort_by_key(|instruction| instruction.chain_id);

        let mut lines = vec!["Executed Inventory rebalances".to_string()];
        lines.extend(sent.into_iter().map(|instruction| {
            format!(
                "Rebalances sent to {}: {} {} rebalanced. This meets target allocation of {}",
                chain_name(instruction.chain_id),
                instruction.formatted_amount(),
                instruction.symbol,
                format_pct(I256::from_raw(instruction.target_pct))
            )
        }));
        lines.extend(self.failed.iter().map(|failed| failed_line(&failed.instruction, &failed.reason)));
        lines
    }
}

fn failed_line(instruction: &RebalanceInstruction, reason: &str) -> String {
    format!(
        "Failed to send {} {} to {}: {reason}",
        instruction.formatted_amount(),
        instruction.symbol,
        chain_name(instruction.chain_id)
    )
}

/// Per-chain entry of the distribution summary logged before every pass. Values are two decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDistribution {
    pub actual_balance_on_chain: String,
    pub virtual_balance_on_chain: String,
    pub outstanding_transfers: String,
    pub token_short_falls: String,
    pub pro_rata_share: String,
    pub shortfall_adjusted_share: String,
}

/// Token symbol -> chain id -> distribution
pub type DistributionSummary = BTreeMap<String, BTreeMap<ChainId, ChainDistribution>>;
