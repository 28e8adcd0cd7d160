/// Inventory rebalancing loop against in-memory chains
///
/// Seeds WETH and USDC over four chains, then on every tick:
/// - relays consume funds on one remote chain
/// - bridge deposits from the previous tick land on their destination
/// - the client refreshes and rebalances
///
/// Config comes from `RELAYER_INVENTORY_CONFIG` (JSON) when set, otherwise from the TOML file
/// given as the first argument (default `demos/inventory.toml`).
use alloy_primitives::{Address, U256, keccak256};
use eyre::Result;
use inventory_rebalancer::data_sync::InventoryConfigSection;
use inventory_rebalancer::utils::{USDC, WETH, chain_name, format_amount};
use inventory_rebalancer::{
    ChainId, InventoryClientBuilder, InventoryConfig, MockAdapterManager, MockTokenClient, MockTokenRegistry, Token,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const CYCLES: usize = 6;

fn l2_token(chain_id: ChainId, l1_token: Address) -> Address {
    if chain_id == 1 { l1_token } else { Address::from_word(keccak256(format!("{chain_id}:{l1_token}"))) }
}

fn units(value: u64, decimals: u8) -> U256 {
    U256::from(value) * U256::from(10).pow(U256::from(decimals))
}

async fn load_config() -> Result<InventoryConfig> {
    if let Some(section) = InventoryConfigSection::from_env()? {
        info!("Loaded inventory config from the environment");
        return Ok(section.validate()?);
    }
    let path = std::env::args().nth(1).unwrap_or_else(|| "demos/inventory.toml".to_string());
    info!(%path, "Loading inventory config");
    Ok(InventoryConfig::load(path).await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,inventory_rebalancer=debug")),
        )
        .init();

    let config = load_config().await?;

    let tokens = [
        Token::new_with_data(WETH, Some("WETH".to_string()), Some("Wrapped Ether".to_string()), Some(18)),
        Token::new_with_data(USDC, Some("USDC".to_string()), Some("USD Coin".to_string()), Some(6)),
    ];
    let registry = Arc::new(MockTokenRegistry::new());
    let token_client = Arc::new(MockTokenClient::new());
    let adapter = Arc::new(MockAdapterManager::new());

    for token in &tokens {
        registry.add_l1_token(token.clone());
        for chain_id in config.enabled_chains().iter().copied() {
            let l2 = l2_token(chain_id, token.get_address());
            registry.set_destination_token(token.get_address(), chain_id, l2);
            let seed = match chain_id {
                1 => 100,
                10 => 20,
                _ => 10,
            };
            let scale = if token.get_address() == USDC { 100 } else { 1 };
            token_client.set_token_data(chain_id, l2, units(seed * scale, token.get_decimals()));
        }
    }

    let mut client = InventoryClientBuilder::new()
        .with_config(config.clone())
        .with_token_registry(registry.clone())
        .with_balance_provider(token_client.clone())
        .with_shortfall_provider(token_client.clone())
        .with_bridge_adapter(adapter.clone())
        .build()?;

    let remote_chains = config.enabled_l2_chains();
    let mut delivered = 0;
    let mut interval = tokio::time::interval(Duration::from_millis(500));

    for cycle in 0..CYCLES {
        interval.tick().await;

        // Land every deposit submitted on the previous tick
        let sent = adapter.sent_transfers();
        for transfer in &sent[delivered..] {
            token_client.set_token_data(
                transfer.chain_id,
                transfer.l2_token,
                token_client.get_balance(transfer.chain_id, transfer.l2_token) + transfer.amount,
            );
            adapter.set_mocked_outstanding_cross_chain_transfers(transfer.chain_id, transfer.l1_token, U256::ZERO);
            info!(chain = %chain_name(transfer.chain_id), tx_hash = %transfer.tx_hash, "Bridge deposit delivered");
        }
        delivered = sent.len();

        // Relays fill on one remote chain per tick
        if let Some(chain_id) = remote_chains.get(cycle % remote_chains.len().max(1)).copied() {
            for token in &tokens {
                let l2 = l2_token(chain_id, token.get_address());
                let used = token_client.get_balance(chain_id, l2) / U256::from(2);
                token_client.decrement_local_balance(chain_id, l2, used);
                info!(
                    chain = %chain_name(chain_id),
                    symbol = %token.get_symbol(),
                    used = %format_amount(used, token.get_decimals()),
                    "Relays consumed inventory"
                );
            }
        }

        client.update().await?;
        let report = client.rebalance_inventory_if_needed().await?;

        // Submitted deposits leave mainnet and sit in the bridge until the next tick
        for executed in &report.executed {
            let instruction = &executed.instruction;
            token_client.decrement_local_balance(1, instruction.l1_token, instruction.amount);
            adapter.set_mocked_outstanding_cross_chain_transfers(instruction.chain_id, instruction.l1_token, instruction.amount);
        }

        info!(cycle, executed = report.executed.len(), deficiencies = report.deficiencies.len(), "Cycle finished");
    }

    for line in serde_json::to_string_pretty(&client.distribution_summary())?.lines() {
        info!("{line}");
    }
    Ok(())
}
