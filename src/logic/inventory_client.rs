//! Entry points of the rebalancing cycle.
//!
//! A scheduler calls [`InventoryClient::update`] and then
//! [`InventoryClient::rebalance_inventory_if_needed`] on a fixed interval. Both take `&mut self`,
//! so one pass can never run against state another pass is mutating.

use super::allocation::AllocationCalculator;
use super::decision::RebalancePlanner;
use super::ledger::TransferLedger;
use super::types::{DistributionSummary, ExecutedRebalance, FailedRebalance, RebalanceReport};
use crate::data_sync::{BalanceProvider, InventoryConfig, InventorySnapshot, PairKey, ShortfallProvider, TokenRegistry};
use crate::execution::{BridgeAdapter, RebalanceExecutor, TransferOutcome};
use crate::utils::ChainId;
use ahash::HashMap;
use alloy_primitives::{Address, I256, U256};
use eyre::{Result, eyre};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct InventoryClient {
    config: InventoryConfig,
    registry: Arc<dyn TokenRegistry>,
    balance_provider: Arc<dyn BalanceProvider>,
    shortfall_provider: Arc<dyn ShortfallProvider>,
    adapter: Arc<dyn BridgeAdapter>,
    executor: RebalanceExecutor,
    snapshot: InventorySnapshot,
    ledger: TransferLedger,
}

impl InventoryClient {
    /// Refresh balances, shortfalls and in-flight transfers for every configured pair.
    pub async fn update(&mut self) -> Result<()> {
        self.snapshot = InventorySnapshot::refresh(
            &self.config,
            self.registry.as_ref(),
            self.balance_provider.as_ref(),
            self.shortfall_provider.as_ref(),
        )
        .await;

        let mut polled = HashMap::default();
        let mut unpolled: Vec<PairKey> = Vec::new();
        for l1_token in self.config.l1_tokens() {
            for chain_id in self.config.enabled_l2_chains() {
                match self.adapter.outstanding_cross_chain_transfer_amount(chain_id, l1_token).await {
                    Ok(amount) => {
                        polled.insert((chain_id, l1_token), amount);
                    }
                    Err(e) => {
                        warn!(chain_id, %l1_token, error = %e, "Could not poll outstanding transfers, keeping previous value");
                        unpolled.push((chain_id, l1_token));
                    }
                }
            }
        }
        self.ledger.reconcile(polled, &unpolled);

        debug!(timestamp = self.snapshot.timestamp, "Inventory client updated");
        Ok(())
    }

    /// Decide and submit the transfers needed to bring every chain back within its band.
    pub async fn rebalance_inventory_if_needed(&mut self) -> Result<RebalanceReport> {
        let calculator = AllocationCalculator::new(&self.config, &self.snapshot, &self.ledger);
        let summary = serde_json::to_string(&calculator.distribution_summary())?;
        debug!(distribution = %summary, "Considering inventory rebalances");

        let plan = RebalancePlanner::new(&self.config, &calculator).plan();
        let mut report = RebalanceReport::from_plan(&plan);

        if plan.is_empty() {
            info!("No rebalances required");
            return Ok(report);
        }

        let outcomes = self.executor.execute(plan.instructions).await;
        let home_chain_id = self.config.home_chain_id();
        for outcome in outcomes {
            match outcome {
                TransferOutcome::Sent { instruction, tx_hash } => {
                    self.ledger.record_sent(instruction.chain_id, instruction.l1_token, instruction.amount);
                    self.snapshot.decrement_balance(home_chain_id, instruction.l1_token, instruction.amount);
                    report.executed.push(ExecutedRebalance { instruction, tx_hash });
                }
                TransferOutcome::Failed { instruction, error } => {
                    report.failed.push(FailedRebalance { instruction, reason: error.to_string() });
                }
            }
        }

        let mut lines = report.log_lines().into_iter();
        let headline = lines.next().unwrap_or_default();
        let details: Vec<String> = lines.collect();
        if report.executed.is_empty() {
            warn!(rebalances = %details.join("\n"), "{headline}");
        } else {
            info!(rebalances = %details.join("\n"), "{headline}");
        }
        Ok(report)
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    pub fn enabled_chains(&self) -> &[ChainId] {
        self.config.enabled_chains()
    }

    pub fn enabled_l2_chains(&self) -> Vec<ChainId> {
        self.config.enabled_l2_chains()
    }

    pub fn l1_tokens(&self) -> Vec<Address> {
        self.config.l1_tokens()
    }

    /// Native units, summed over every chain of the last snapshot.
    pub fn cumulative_balance(&self, l1_token: Address) -> U256 {
        self.calculator().cumulative_balance_raw(l1_token)
    }

    pub fn balance_on_chain(&self, chain_id: ChainId, l1_token: Address) -> U256 {
        self.snapshot.balance(chain_id, l1_token)
    }

    pub fn shortfall_on_chain(&self, chain_id: ChainId, l1_token: Address) -> U256 {
        self.snapshot.shortfall(chain_id, l1_token)
    }

    pub fn outstanding_cross_chain_transfer_amount(&self, chain_id: ChainId, l1_token: Address) -> U256 {
        self.ledger.outstanding(chain_id, l1_token)
    }

    pub fn current_allocation_pct(&self, l1_token: Address, chain_id: ChainId) -> U256 {
        self.calculator().share_on_chain(chain_id, l1_token)
    }

    pub fn current_allocation_pct_considering_shortfall(&self, l1_token: Address, chain_id: ChainId) -> I256 {
        self.calculator().shortfall_adjusted_share(chain_id, l1_token)
    }

    pub fn token_distribution_per_l1_token(&self) -> BTreeMap<Address, BTreeMap<ChainId, U256>> {
        self.calculator().distribution_table()
    }

    pub fn distribution_summary(&self) -> DistributionSummary {
        self.calculator().distribution_summary()
    }

    pub fn snapshot(&self) -> &InventorySnapshot {
        &self.snapshot
    }

    fn calculator(&self) -> AllocationCalculator<'_> {
        AllocationCalculator::new(&self.config, &self.snapshot, &self.ledger)
    }
}

/// Builder pattern for wiring an InventoryClient to its collaborators
#[derive(Default)]
pub struct InventoryClientBuilder {
    config: Option<InventoryConfig>,
    registry: Option<Arc<dyn TokenRegistry>>,
    balance_provider: Option<Arc<dyn BalanceProvider>>,
    shortfall_provider: Option<Arc<dyn ShortfallProvider>>,
    adapter: Option<Arc<dyn BridgeAdapter>>,
}

impl InventoryClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: InventoryConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_token_registry(mut self, registry: Arc<dyn TokenRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_balance_provider(mut self, provider: Arc<dyn BalanceProvider>) -> Self {
        self.balance_provider = Some(provider);
        self
    }

    pub fn with_shortfall_provider(mut self, provider: Arc<dyn ShortfallProvider>) -> Self {
        self.shortfall_provider = Some(provider);
        self
    }

    pub fn with_bridge_adapter(mut self, adapter: Arc<dyn BridgeAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn build(self) -> Result<InventoryClient> {
        let config = self.config.ok_or_else(|| eyre!("inventory config is required"))?;
        let registry = self.registry.ok_or_else(|| eyre!("token registry is required"))?;
        let balance_provider = self.balance_provider.ok_or_else(|| eyre!("balance provider is required"))?;
        let shortfall_provider = self.shortfall_provider.ok_or_else(|| eyre!("shortfall provider is required"))?;
        let adapter = self.adapter.ok_or_else(|| eyre!("bridge adapter is required"))?;

        info!(
            home_chain_id = config.home_chain_id(),
            enabled_chains = ?config.enabled_chains(),
            tokens = config.l1_tokens().len(),
            "Inventory client configured"
        );

        Ok(InventoryClient {
            executor: RebalanceExecutor::new(adapter.clone()),
            config,
            registry,
            balance_provider,
            shortfall_provider,
            adapter,
            snapshot: InventorySnapshot::default(),
            ledger: TransferLedger::new(),
        })
    }
}
