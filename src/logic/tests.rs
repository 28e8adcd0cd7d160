//! End to end rebalancing cycles driven through the inventory client
//!
//! Seed state: 140 WETH and 14000 USDC spread over mainnet, optimism, polygon and arbitrum with
//! targets of 12% on optimism and 7% elsewhere. Every cycle is `update` then
//! `rebalance_inventory_if_needed`, exactly as the scheduler runs them.

#[cfg(test)]
mod scenario_tests {
    use crate::data_sync::{InventoryConfigRoot, MockTokenClient, MockTokenRegistry};
    use crate::execution::MockAdapterManager;
    use crate::logic::{InventoryClient, InventoryClientBuilder, RebalanceReport};
    use crate::utils::{FIXED_POINT_SCALE, Token, USDC, WETH, load_from_str};
    use alloy_primitives::{Address, I256, U256, keccak256};
    use std::sync::Arc;

    const ENABLED_CHAINS: [u64; 4] = [1, 10, 137, 42161];

    const INVENTORY_TOML: &str = r#"
        [inventory]
        enabled_chains = [1, 10, 137, 42161]
        wrap_ether_threshold = "1"

        [[inventory.tokens]]
        address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
        [inventory.tokens.chains.10]
        target_pct = "12"
        threshold_pct = "10"
        [inventory.tokens.chains.137]
        target_pct = "7"
        threshold_pct = "5"
        [inventory.tokens.chains.42161]
        target_pct = "7"
        threshold_pct = "5"

        [[inventory.tokens]]
        address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
        [inventory.tokens.chains.10]
        target_pct = "12"
        threshold_pct = "10"
        [inventory.tokens.chains.137]
        target_pct = "7"
        threshold_pct = "5"
        [inventory.tokens.chains.42161]
        target_pct = "7"
        threshold_pct = "5"
    "#;

    struct Harness {
        client: InventoryClient,
        token_client: Arc<MockTokenClient>,
        registry: Arc<MockTokenRegistry>,
        adapter: Arc<MockAdapterManager>,
    }

    impl Harness {
        async fn cycle(&mut self) -> RebalanceReport {
            self.client.update().await.unwrap();
            self.client.rebalance_inventory_if_needed().await.unwrap()
        }
    }

    fn wei(value: u128) -> U256 {
        U256::from(value) * FIXED_POINT_SCALE
    }

    fn mwei(value: u64) -> U256 {
        U256::from(value) * U256::from(1_000_000u64)
    }

    /// Address of `l1_token` on `chain_id`. The home chain uses the L1 address itself.
    fn l2_token(chain_id: u64, l1_token: Address) -> Address {
        if chain_id == 1 { l1_token } else { Address::from_word(keccak256(format!("{chain_id}:{l1_token}"))) }
    }

    fn seed_balance(chain_id: u64, l1_token: Address) -> U256 {
        match (chain_id, l1_token == WETH) {
            (1, true) => wei(100),
            (10, true) => wei(20),
            (_, true) => wei(10),
            (1, false) => mwei(10_000),
            (10, false) => mwei(2_000),
            (_, false) => mwei(1_000),
        }
    }

    fn harness() -> Harness {
        let config = load_from_str::<InventoryConfigRoot>(INVENTORY_TOML).unwrap().inventory.validate().unwrap();

        let registry = Arc::new(MockTokenRegistry::new());
        registry.add_l1_token(Token::new_with_data(WETH, Some("WETH".to_string()), None, Some(18)));
        registry.add_l1_token(Token::new_with_data(USDC, Some("USDC".to_string()), None, Some(6)));

        let token_client = Arc::new(MockTokenClient::new());
        let adapter = Arc::new(MockAdapterManager::new());
        for chain_id in ENABLED_CHAINS {
            for l1_token in [WETH, USDC] {
                registry.set_destination_token(l1_token, chain_id, l2_token(chain_id, l1_token));
                token_client.set_token_data(chain_id, l2_token(chain_id, l1_token), seed_balance(chain_id, l1_token));
                adapter.set_mocked_outstanding_cross_chain_transfers(chain_id, l1_token, U256::ZERO);
            }
        }

        let client = InventoryClientBuilder::new()
            .with_config(config)
            .with_token_registry(registry.clone())
            .with_balance_provider(token_client.clone())
            .with_shortfall_provider(token_client.clone())
            .with_bridge_adapter(adapter.clone())
            .build()
            .unwrap();

        Harness { client, token_client, registry, adapter }
    }

    #[tokio::test]
    async fn test_accessors() {
        let mut harness = harness();
        harness.client.update().await.unwrap();
        let client = &harness.client;

        assert_eq!(client.enabled_chains(), &ENABLED_CHAINS);
        assert_eq!(client.l1_tokens(), vec![WETH, USDC]);
        assert_eq!(client.enabled_l2_chains(), vec![10, 137, 42161]);
        assert_eq!(client.cumulative_balance(WETH), wei(140));
        assert_eq!(client.cumulative_balance(USDC), mwei(14_000));

        let distribution = client.token_distribution_per_l1_token();
        for chain_id in ENABLED_CHAINS {
            for l1_token in client.l1_tokens() {
                let seeded = seed_balance(chain_id, l1_token);
                assert_eq!(client.balance_on_chain(chain_id, l1_token), seeded);
                assert_eq!(client.outstanding_cross_chain_transfer_amount(chain_id, l1_token), U256::ZERO);
                assert_eq!(client.shortfall_on_chain(chain_id, l1_token), U256::ZERO);

                let expected_share = seeded * FIXED_POINT_SCALE / client.cumulative_balance(l1_token);
                assert_eq!(distribution[&l1_token][&chain_id], expected_share);
                assert_eq!(client.current_allocation_pct(l1_token, chain_id), expected_share);
            }
        }
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn test_rebalance_when_allocation_too_low() {
        let mut harness = harness();
        let arbitrum_usdc = l2_token(42161, USDC);

        let report = harness.cycle().await;
        assert!(!report.rebalances_required());
        assert_eq!(report.log_lines(), vec!["No rebalances required".to_string()]);

        // Half of the arbitrum USDC gets used up: 500 / 13500 is below the 5% threshold
        assert_eq!(harness.token_client.get_balance(42161, arbitrum_usdc), mwei(1_000));
        harness.token_client.decrement_local_balance(42161, arbitrum_usdc, mwei(500));
        assert_eq!(harness.token_client.get_balance(42161, arbitrum_usdc), mwei(500));

        harness.client.update().await.unwrap();
        let expected_alloc = mwei(500) * FIXED_POINT_SCALE / mwei(13_500);
        assert_eq!(
            harness.client.current_allocation_pct_considering_shortfall(USDC, 42161),
            I256::try_from(expected_alloc).unwrap()
        );

        // (0.07 - 500 / 13500) * 13500 = 445
        let report = harness.client.rebalance_inventory_if_needed().await.unwrap();
        let lines = report.log_lines();
        assert_eq!(lines[0], "Executed Inventory rebalances");
        assert_eq!(lines[1], "Rebalances sent to Arbitrum: 445.00 USDC rebalanced. This meets target allocation of 7.00%");
        assert!(logs_contain("Executed Inventory rebalances"));
        assert!(logs_contain("Rebalances sent to Arbitrum: 445.00 USDC rebalanced"));

        assert_eq!(harness.adapter.last_sent(42161, USDC).unwrap().amount, mwei(445));
        assert_eq!(harness.adapter.last_sent(42161, USDC).unwrap().l2_token, arbitrum_usdc);
        assert_eq!(harness.client.outstanding_cross_chain_transfer_amount(42161, USDC), mwei(445));
        assert_eq!(harness.client.balance_on_chain(1, USDC), mwei(10_000 - 445));

        // Re-running before the next refresh must not send the same deficit again
        let report = harness.client.rebalance_inventory_if_needed().await.unwrap();
        assert!(!report.rebalances_required());
        assert_eq!(harness.adapter.sent_transfers().len(), 1);

        // The deposit left mainnet and is now in the canonical bridge
        harness.token_client.decrement_local_balance(1, USDC, mwei(445));
        harness.adapter.set_mocked_outstanding_cross_chain_transfers(42161, USDC, mwei(445));

        let report = harness.cycle().await;
        assert!(!report.rebalances_required());
        assert_eq!(harness.client.distribution_summary()["USDC"][&42161].outstanding_transfers, "445.00");
        assert!(logs_contain(r#""outstandingTransfers":"445.00""#));

        // The bridge delivers: 1000 - 500 + 445 = 945 on arbitrum, 945 / 13500 = 7%
        harness.adapter.set_mocked_outstanding_cross_chain_transfers(42161, USDC, U256::ZERO);
        harness.token_client.set_token_data(42161, arbitrum_usdc, mwei(945));

        let report = harness.cycle().await;
        assert!(!report.rebalances_required());
        let summary = harness.client.distribution_summary();
        let arbitrum = &summary["USDC"][&42161];
        assert_eq!(arbitrum.actual_balance_on_chain, "945.00");
        assert_eq!(arbitrum.pro_rata_share, "7.00%");
        assert!(logs_contain(r#""42161":{"actualBalanceOnChain":"945.00""#));
        assert!(logs_contain(r#""proRataShare":"7.00%""#));
        assert_eq!(harness.adapter.sent_transfers().len(), 1);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn test_rebalance_on_token_shortfall() {
        let mut harness = harness();
        let polygon_weth = l2_token(137, WETH);

        harness.cycle().await;
        assert_eq!(harness.token_client.get_balance(137, polygon_weth), wei(10));

        // A relay needs 18 WETH on polygon, which only holds 10
        let shortfall = wei(18);
        harness.token_client.set_token_shortfall_data(137, polygon_weth, vec![6969], shortfall);
        harness.client.update().await.unwrap();

        // (10 - 18) / 140
        assert_eq!(
            harness.client.current_allocation_pct_considering_shortfall(WETH, 137),
            I256::from_dec_str("-57142857142857142").unwrap()
        );
        assert_eq!(harness.client.shortfall_on_chain(137, WETH), shortfall);

        // (0.07 + 0.057142857142857142) * 140
        let expected_bridged = U256::from(17_799_999_999_999_999_880u128);
        let report = harness.client.rebalance_inventory_if_needed().await.unwrap();
        let lines = report.log_lines();
        assert_eq!(lines[0], "Executed Inventory rebalances");
        assert_eq!(lines[1], "Rebalances sent to Polygon-matic: 17.79 WETH rebalanced. This meets target allocation of 7.00%");
        assert!(logs_contain("Rebalances sent to Polygon-matic: 17.79 WETH rebalanced"));

        assert_eq!(harness.client.balance_on_chain(1, WETH), wei(100) - expected_bridged);
        assert_eq!(harness.client.outstanding_cross_chain_transfer_amount(137, WETH), expected_bridged);
        assert_eq!(harness.adapter.last_sent(137, WETH).unwrap().amount, expected_bridged);

        harness.token_client.decrement_local_balance(1, WETH, expected_bridged);
        harness.adapter.set_mocked_outstanding_cross_chain_transfers(137, WETH, expected_bridged);

        // Funds in the bridge count toward polygon, so nothing more is sent
        let report = harness.cycle().await;
        assert!(!report.rebalances_required());
        let summary = harness.client.distribution_summary();
        let polygon = &summary["WETH"][&137];
        assert_eq!(polygon.outstanding_transfers, "17.79");
        assert_eq!(polygon.actual_balance_on_chain, "10.00");
        assert_eq!(polygon.virtual_balance_on_chain, "27.79");
        assert!(logs_contain(r#""virtualBalanceOnChain":"27.79""#));

        // The bridge delivers and the relay is filled with 18 of the 27.79
        harness.adapter.set_mocked_outstanding_cross_chain_transfers(137, WETH, U256::ZERO);
        harness.token_client.set_token_data(137, polygon_weth, wei(10) + expected_bridged);
        harness.token_client.set_token_shortfall_data(137, polygon_weth, vec![6969], U256::ZERO);
        harness.token_client.decrement_local_balance(137, polygon_weth, shortfall);

        let report = harness.cycle().await;
        assert!(!report.rebalances_required());
        assert_eq!(harness.adapter.sent_transfers().len(), 1);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn test_failed_bridge_send_is_retried_next_pass() {
        let mut harness = harness();
        harness.token_client.decrement_local_balance(42161, l2_token(42161, USDC), mwei(500));
        harness.adapter.fail_sends_to(42161);

        let report = harness.cycle().await;
        assert_eq!(report.failed.len(), 1);
        assert!(report.executed.is_empty());
        assert_eq!(report.log_lines()[0], "Inventory rebalances failed");
        assert_eq!(harness.client.outstanding_cross_chain_transfer_amount(42161, USDC), U256::ZERO);
        assert_eq!(harness.client.balance_on_chain(1, USDC), mwei(10_000));
        assert!(logs_contain("Bridge transfer failed"));

        harness.adapter.clear_failures();
        let report = harness.client.rebalance_inventory_if_needed().await.unwrap();
        assert_eq!(report.executed.len(), 1);
        assert_eq!(report.total_sent(USDC), mwei(445));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn test_unresolvable_pair_does_not_block_others() {
        let mut harness = harness();
        harness.registry.remove_destination_token(USDC, 42161);
        harness.token_client.set_token_shortfall(137, l2_token(137, WETH), wei(18));

        let report = harness.cycle().await;

        assert!(logs_contain("Inventory data unavailable"));
        assert!(report.skipped.contains(&(42161, USDC)));
        assert!(!harness.client.snapshot().is_available(42161, USDC));
        // arbitrum USDC is left out of the cumulative balance for this cycle
        assert_eq!(harness.client.cumulative_balance(USDC), mwei(13_000));

        assert_eq!(report.executed.len(), 1);
        assert_eq!(report.executed[0].instruction.chain_id, 137);
        assert_eq!(report.executed[0].instruction.l1_token, WETH);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn test_failed_balance_lookup_skips_pair() {
        let mut harness = harness();
        harness.token_client.fail_lookups_for(137, l2_token(137, WETH));

        let report = harness.cycle().await;

        assert!(!report.rebalances_required());
        assert_eq!(report.skipped, vec![(137, WETH)]);
        assert_eq!(harness.client.balance_on_chain(137, WETH), U256::ZERO);
        assert!(logs_contain("Inventory data unavailable"));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn test_outstanding_poll_failure_keeps_previous_amount() {
        let mut harness = harness();
        harness.token_client.decrement_local_balance(42161, l2_token(42161, USDC), mwei(500));
        harness.cycle().await;
        assert_eq!(harness.client.outstanding_cross_chain_transfer_amount(42161, USDC), mwei(445));

        harness.token_client.decrement_local_balance(1, USDC, mwei(445));
        harness.adapter.fail_queries_on(42161);
        let report = harness.cycle().await;

        assert!(logs_contain("Could not poll outstanding transfers"));
        assert_eq!(harness.client.outstanding_cross_chain_transfer_amount(42161, USDC), mwei(445));
        assert!(!report.rebalances_required());
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn test_underfunded_rebalance_sends_what_is_available() {
        let mut harness = harness();
        harness.token_client.set_token_data(1, USDC, mwei(100));
        harness.token_client.set_token_data(42161, l2_token(42161, USDC), U256::ZERO);

        // cumulative 3100, arbitrum wants 7% of it = 217 but mainnet only holds 100
        let report = harness.cycle().await;

        assert_eq!(report.executed.len(), 1);
        let instruction = &report.executed[0].instruction;
        assert_eq!(instruction.amount, mwei(100));
        assert_eq!(instruction.requested_amount, mwei(217));
        assert_eq!(report.deficiencies.len(), 1);
        assert_eq!(report.deficiencies[0].available, mwei(100));
        assert_eq!(harness.client.balance_on_chain(1, USDC), U256::ZERO);
        assert!(logs_contain("Insufficient home chain balance"));
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let config = load_from_str::<InventoryConfigRoot>(INVENTORY_TOML).unwrap().inventory.validate().unwrap();
        let result = InventoryClientBuilder::new().with_config(config).build();
        assert!(result.is_err());
    }
}
