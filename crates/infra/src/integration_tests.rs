//! Integration tests for the full reallocation pipeline.
//!
//! Tests: RunRequest → OrderSource → StockLedger → Planner → PlanExecutor → OrderSink
//!
//! Verifies:
//! - Short-circuits make no mutation
//! - Both strategies produce the expected orders, lines, shipping and notes
//! - Stock consumed by one order is not offered to the next
//! - Failures abort the run without undoing earlier writes

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use stockroute_allocation::AllocationPolicy;
    use stockroute_core::{DomainError, ItemId, LocationId, OrderId, PostalServiceId, RowId};
    use stockroute_inventory::{LocationStockLevel, StockLevelSnapshot};
    use stockroute_sales::{BinRack, CustomerInfo, GeneralInfo, LinePricing, Order, OrderItem, OrderStatus, ShippingInfo};

    use crate::config::{ReallocationConfig, ReallocationMode, RunRequest};
    use crate::gateway::{CallKind, GatewayCall, GatewayError, InMemoryGateway};
    use crate::planner::PlanState;
    use crate::run::{ReallocationRun, RunError, RunOutcome, ShortCircuit};

    type SharedGateway = Arc<InMemoryGateway>;

    struct Locations {
        primary: LocationId,
        north: LocationId,
        south: LocationId,
    }

    fn test_locations() -> Locations {
        Locations {
            primary: LocationId::new(),
            north: LocationId::new(),
            south: LocationId::new(),
        }
    }

    fn base_gateway(locs: &Locations) -> InMemoryGateway {
        InMemoryGateway::new()
            .with_location(locs.primary, "Main")
            .with_location(locs.north, "North")
            .with_location(locs.south, "South")
    }

    fn test_item(sku: &str, quantity: i64, location: LocationId) -> OrderItem {
        OrderItem {
            row_id: RowId::new(),
            item_id: ItemId::new(),
            sku: sku.to_string(),
            channel_sku: format!("CH-{sku}"),
            quantity,
            pricing: LinePricing {
                unit_price: dec!(4.99),
                discount: dec!(0),
                tax_rate: dec!(20),
                tax_inclusive: true,
            },
            bin_racks: vec![BinRack::new(location, quantity)],
        }
    }

    fn test_order(num: i64, location: LocationId, items: Vec<OrderItem>) -> Order {
        Order {
            order_id: OrderId::new(),
            num_order_id: num,
            fulfilment_location_id: location,
            general_info: GeneralInfo {
                status: OrderStatus::Paid,
                source: "AMAZON".to_string(),
                sub_source: "AMAZON UK".to_string(),
            },
            customer_info: CustomerInfo {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                ..CustomerInfo::default()
            },
            shipping_info: ShippingInfo {
                postal_service_id: Some(PostalServiceId::new()),
                postage_cost: Some(dec!(10.00)),
            },
            items,
        }
    }

    fn stock(item_id: ItemId, levels: &[(LocationId, i64, i64)]) -> StockLevelSnapshot {
        StockLevelSnapshot {
            item_id,
            levels: levels
                .iter()
                .map(|(location_id, available, in_order)| LocationStockLevel {
                    location_id: *location_id,
                    available: *available,
                    in_order: *in_order,
                })
                .collect(),
        }
    }

    fn runner(gateway: &SharedGateway, config: ReallocationConfig) -> ReallocationRun<SharedGateway, SharedGateway> {
        ReallocationRun::new(gateway.clone(), gateway.clone(), config)
    }

    fn request(orders: &[&Order], locs: &Locations) -> RunRequest {
        RunRequest::new(orders.iter().map(|o| o.order_id), locs.primary, [locs.north, locs.south]).unwrap()
    }

    fn item_total(gateway: &InMemoryGateway, item_id: ItemId) -> i64 {
        gateway
            .orders()
            .iter()
            .flat_map(|o| o.items.iter())
            .filter(|i| i.item_id == item_id)
            .map(|i| i.quantity)
            .sum()
    }

    #[test]
    fn empty_order_list_makes_no_calls() {
        let locs = test_locations();
        let gateway: SharedGateway = Arc::new(base_gateway(&locs));

        let request = RunRequest::new([], locs.primary, [locs.north]).unwrap();
        let report = runner(&gateway, ReallocationConfig::default()).execute(&request);

        assert_eq!(
            report.outcome,
            RunOutcome::ShortCircuited {
                reason: ShortCircuit::NoOrderIds
            }
        );
        assert!(gateway.calls().is_empty());
        assert_eq!(report.total_allocated(), 0);
    }

    #[test]
    fn zero_alternates_stops_after_location_fetch() {
        let locs = test_locations();
        let order = test_order(1, locs.primary, vec![test_item("A", 10, locs.primary)]);
        let gateway: SharedGateway = Arc::new(base_gateway(&locs).with_order(order.clone()));

        let request = RunRequest::new([order.order_id], locs.primary, []).unwrap();
        let report = runner(&gateway, ReallocationConfig::default()).execute(&request);

        assert_eq!(
            report.outcome,
            RunOutcome::ShortCircuited {
                reason: ShortCircuit::NoAlternateLocations
            }
        );
        assert_eq!(gateway.calls(), vec![GatewayCall::FetchLocations]);
    }

    #[test]
    fn unknown_alternates_are_dropped_before_anything_else() {
        let locs = test_locations();
        let order = test_order(1, locs.primary, vec![test_item("A", 10, locs.primary)]);
        let gateway: SharedGateway = Arc::new(base_gateway(&locs).with_order(order.clone()));

        let request = RunRequest::new([order.order_id], locs.primary, [LocationId::new()]).unwrap();
        let report = runner(&gateway, ReallocationConfig::default()).execute(&request);

        assert!(report.alternate_location_ids.is_empty());
        assert_eq!(gateway.calls(), vec![GatewayCall::FetchLocations]);
    }

    #[test]
    fn orders_outside_the_candidates_are_not_touched() {
        let locs = test_locations();
        let elsewhere = LocationId::new();
        let order = test_order(1, elsewhere, vec![test_item("A", 10, elsewhere)]);
        let gateway: SharedGateway = Arc::new(
            base_gateway(&locs)
                .with_location(elsewhere, "Elsewhere")
                .with_order(order.clone()),
        );

        let report = runner(&gateway, ReallocationConfig::default()).execute(&request(&[&order], &locs));

        assert_eq!(
            report.outcome,
            RunOutcome::ShortCircuited {
                reason: ShortCircuit::NoEligibleOrders
            }
        );
        assert_eq!(gateway.mutation_count(), 0);
        assert!(!gateway.calls().iter().any(|c| c.kind() == CallKind::FetchStockLevels));
    }

    #[test]
    fn missing_stock_levels_stop_the_run() {
        let locs = test_locations();
        let order = test_order(1, locs.primary, vec![test_item("A", 10, locs.primary)]);
        let gateway: SharedGateway = Arc::new(base_gateway(&locs).with_order(order.clone()));

        let report = runner(&gateway, ReallocationConfig::default()).execute(&request(&[&order], &locs));

        assert_eq!(
            report.outcome,
            RunOutcome::ShortCircuited {
                reason: ShortCircuit::NoStockLevels
            }
        );
        assert_eq!(gateway.mutation_count(), 0);
    }

    #[test]
    fn rewrite_moves_the_shortfall_into_orders_at_each_alternate() {
        let locs = test_locations();
        let item = test_item("A", 10, locs.primary);
        let order = test_order(1001, locs.primary, vec![item.clone()]);
        let gateway: SharedGateway = Arc::new(
            base_gateway(&locs).with_order(order.clone()).with_stock_levels(stock(
                item.item_id,
                &[(locs.primary, -3, 10), (locs.north, 2, 0), (locs.south, 5, 0)],
            )),
        );

        let report = runner(&gateway, ReallocationConfig::default()).execute(&request(&[&order], &locs));

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.orders.len(), 1);
        assert_eq!(report.orders[0].state, PlanState::PlanningSplits);
        assert_eq!(report.orders[0].backordered, 0);

        let created = gateway.created_orders();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].fulfilment_location_id, locs.north);
        assert_eq!(created[0].items[0].quantity, 2);
        assert_eq!(created[0].items[0].channel_sku, "CH-A");
        assert_eq!(created[0].shipping_info.postage_cost, Some(dec!(2.00)));
        assert_eq!(created[0].shipping_info.postal_service_id, order.shipping_info.postal_service_id);
        assert_eq!(created[0].general_info, order.general_info);
        assert_eq!(created[0].customer_info, order.customer_info);
        assert_eq!(created[1].fulfilment_location_id, locs.south);
        assert_eq!(created[1].items[0].quantity, 1);
        assert_eq!(created[1].shipping_info.postage_cost, Some(dec!(1.00)));

        let original = gateway.order(order.order_id).unwrap();
        assert_eq!(original.items[0].quantity, 7);
        assert_eq!(original.items[0].bin_racks, vec![BinRack::new(locs.primary, 7)]);
        assert_eq!(original.shipping_info.postage_cost, Some(dec!(7.00)));

        let notes = gateway.notes_for(order.order_id);
        assert_eq!(notes.len(), 2);
        assert!(notes[0].text.ends_with("to reallocate backorders to North"));
        assert!(notes[1].text.ends_with("to reallocate backorders to South"));
        for new_order in &created {
            let notes = gateway.notes_for(new_order.order_id);
            assert_eq!(notes.len(), 1);
            assert_eq!(
                notes[0].text,
                format!("This order is reallocated based on order {} from Main", order.label())
            );
        }
        assert_eq!(item_total(&gateway, item.item_id), 10);
    }

    #[test]
    fn in_place_only_keeps_every_bin_rack_on_the_original() {
        let locs = test_locations();
        let item = test_item("A", 10, locs.primary);
        let order = test_order(1001, locs.primary, vec![item.clone()]);
        let gateway: SharedGateway = Arc::new(
            base_gateway(&locs).with_order(order.clone()).with_stock_levels(stock(
                item.item_id,
                &[(locs.primary, -3, 10), (locs.north, 2, 0), (locs.south, 5, 0)],
            )),
        );

        let config = ReallocationConfig::default().with_mode(ReallocationMode::InPlaceOnly);
        let report = runner(&gateway, config).execute(&request(&[&order], &locs));

        assert_eq!(report.orders[0].state, PlanState::RewritingInPlace);
        assert!(gateway.created_orders().is_empty());

        let original = gateway.order(order.order_id).unwrap();
        assert_eq!(original.items[0].quantity, 10);
        assert_eq!(
            original.items[0].bin_racks,
            vec![
                BinRack::new(locs.primary, 7),
                BinRack::new(locs.north, 2),
                BinRack::new(locs.south, 1),
            ]
        );
        assert_eq!(original.shipping_info.postage_cost, Some(dec!(10.00)));
        assert!(gateway.notes_for(order.order_id).is_empty());
    }

    #[test]
    fn covered_orders_are_skipped_without_mutation() {
        let locs = test_locations();
        let item = test_item("A", 10, locs.primary);
        let order = test_order(1001, locs.primary, vec![item.clone()]);
        let gateway: SharedGateway = Arc::new(
            base_gateway(&locs).with_order(order.clone()).with_stock_levels(stock(
                item.item_id,
                &[(locs.primary, 20, 10), (locs.north, 5, 0)],
            )),
        );

        let report = runner(&gateway, ReallocationConfig::default()).execute(&request(&[&order], &locs));

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.orders[0].state, PlanState::Skipped);
        assert_eq!(gateway.mutation_count(), 0);
    }

    #[test]
    fn self_included_walk_drops_what_no_location_can_hold() {
        let locs = test_locations();
        let item = test_item("A", 10, locs.primary);
        let order = test_order(1001, locs.primary, vec![item.clone()]);
        let gateway: SharedGateway = Arc::new(
            base_gateway(&locs).with_order(order.clone()).with_stock_levels(stock(
                item.item_id,
                &[(locs.primary, -6, 10), (locs.north, 1, 0)],
            )),
        );

        let report = runner(&gateway, ReallocationConfig::default()).execute(&request(&[&order], &locs));

        assert_eq!(report.orders[0].backordered, 5);
        assert_eq!(gateway.order(order.order_id).unwrap().items[0].quantity, 4);
        assert_eq!(gateway.created_orders()[0].items[0].quantity, 1);
    }

    #[test]
    fn skip_exhausted_keeps_the_remainder_and_shares_the_ledger_across_orders() {
        let locs = test_locations();
        let first_item = test_item("A", 5, locs.primary);
        let mut second_item = test_item("A", 5, locs.primary);
        second_item.item_id = first_item.item_id;
        let first = test_order(1001, locs.primary, vec![first_item.clone()]);
        let second = test_order(1002, locs.primary, vec![second_item]);
        let gateway: SharedGateway = Arc::new(
            base_gateway(&locs)
                .with_order(first.clone())
                .with_order(second.clone())
                .with_stock_levels(stock(
                    first_item.item_id,
                    &[(locs.primary, -5, 10), (locs.north, 3, 0), (locs.south, 0, 0)],
                )),
        );

        let config = ReallocationConfig::default().with_policy(AllocationPolicy::skip_exhausted());
        let report = runner(&gateway, config).execute(&request(&[&first, &second], &locs));

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.orders[0].state, PlanState::PlanningSplits);
        assert_eq!(report.orders[0].backordered, 2);
        // North was used up by the first order.
        assert_eq!(report.orders[1].state, PlanState::Skipped);

        let created = gateway.created_orders();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].fulfilment_location_id, locs.north);
        assert_eq!(created[0].items[0].quantity, 3);
        assert_eq!(created[0].shipping_info.postage_cost, Some(dec!(6.00)));

        let original = gateway.order(first.order_id).unwrap();
        assert_eq!(original.items[0].quantity, 2);
        assert_eq!(original.shipping_info.postage_cost, Some(dec!(4.00)));
        assert_eq!(gateway.order(second.order_id).unwrap(), second);
        assert_eq!(item_total(&gateway, first_item.item_id), 10);
    }

    #[test]
    fn split_orders_moves_only_the_primary_shortfall() {
        let locs = test_locations();
        let short = test_item("A", 10, locs.primary);
        let covered = test_item("B", 4, locs.primary);
        let order = test_order(1001, locs.primary, vec![short.clone(), covered.clone()]);
        let gateway: SharedGateway = Arc::new(
            base_gateway(&locs)
                .with_order(order.clone())
                .with_stock_levels(stock(
                    short.item_id,
                    &[(locs.primary, -6, 10), (locs.north, 4, 0), (locs.south, 5, 0)],
                ))
                .with_stock_levels(stock(covered.item_id, &[(locs.primary, 3, 4)])),
        );

        let report = runner(&gateway, ReallocationConfig::split_orders()).execute(&request(&[&order], &locs));

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.orders[0].state, PlanState::PlanningSplits);
        assert_eq!(report.total_allocated(), 6);

        let created = gateway.created_orders();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].fulfilment_location_id, locs.north);
        assert_eq!(created[0].items.len(), 1);
        assert_eq!(created[0].items[0].item_id, short.item_id);
        assert_eq!(created[0].items[0].quantity, 4);
        assert_eq!(created[0].items[0].pricing, short.pricing);
        assert_eq!(created[0].shipping_info.postage_cost, None);
        assert_eq!(created[0].shipping_info.postal_service_id, order.shipping_info.postal_service_id);
        assert_eq!(created[1].fulfilment_location_id, locs.south);
        assert_eq!(created[1].items[0].quantity, 2);

        let original = gateway.order(order.order_id).unwrap();
        assert_eq!(original.items[0].quantity, 4);
        assert_eq!(original.items[0].bin_racks, vec![BinRack::new(locs.primary, 4)]);
        assert_eq!(original.items[1], covered);
        assert_eq!(original.shipping_info, order.shipping_info);

        assert_eq!(gateway.notes_for(order.order_id).len(), 2);
        assert!(
            gateway
                .calls()
                .iter()
                .all(|c| c.kind() != CallKind::RemoveOrderItem)
        );
    }

    #[test]
    fn split_orders_reduce_the_fulfilment_bin_rack_of_a_mixed_line() {
        let locs = test_locations();
        let mut item = test_item("A", 10, locs.primary);
        item.bin_racks = vec![BinRack::new(locs.primary, 6), BinRack::new(locs.north, 4)];
        let order = test_order(1001, locs.primary, vec![item.clone()]);
        let gateway: SharedGateway = Arc::new(
            base_gateway(&locs).with_order(order.clone()).with_stock_levels(stock(
                item.item_id,
                &[(locs.primary, -3, 6), (locs.north, 0, 4), (locs.south, 10, 0)],
            )),
        );

        let report = runner(&gateway, ReallocationConfig::split_orders()).execute(&request(&[&order], &locs));

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.total_allocated(), 3);

        let created = gateway.created_orders();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].fulfilment_location_id, locs.south);
        assert_eq!(created[0].items[0].quantity, 3);

        // Stock was released at the primary, so the primary bin-rack shrinks.
        let original = gateway.order(order.order_id).unwrap();
        assert_eq!(original.items[0].quantity, 7);
        assert_eq!(
            original.items[0].bin_racks,
            vec![BinRack::new(locs.primary, 3), BinRack::new(locs.north, 4)]
        );
        assert_eq!(item_total(&gateway, item.item_id), 10);
    }

    #[test]
    fn split_orders_can_recompute_shipping_and_backorders_the_rest() {
        let locs = test_locations();
        let short = test_item("A", 10, locs.primary);
        let order = test_order(1001, locs.primary, vec![short.clone()]);
        let gateway: SharedGateway = Arc::new(
            base_gateway(&locs).with_order(order.clone()).with_stock_levels(stock(
                short.item_id,
                &[(locs.primary, -6, 10), (locs.north, 1, 0), (locs.south, 0, 0)],
            )),
        );

        let config = ReallocationConfig::split_orders().with_recompute_shipping_cost_on_split(true);
        let report = runner(&gateway, config).execute(&request(&[&order], &locs));

        assert_eq!(report.orders[0].backordered, 5);
        let created = gateway.created_orders();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].items[0].quantity, 1);
        assert_eq!(created[0].shipping_info.postage_cost, Some(dec!(1.00)));

        let original = gateway.order(order.order_id).unwrap();
        assert_eq!(original.items[0].quantity, 9);
        assert_eq!(original.shipping_info.postage_cost, Some(dec!(9.00)));
    }

    #[test]
    fn split_orders_ignores_orders_away_from_the_primary() {
        let locs = test_locations();
        let item = test_item("A", 10, locs.north);
        let order = test_order(1001, locs.north, vec![item.clone()]);
        let gateway: SharedGateway = Arc::new(base_gateway(&locs).with_order(order.clone()));

        let report = runner(&gateway, ReallocationConfig::split_orders()).execute(&request(&[&order], &locs));

        assert_eq!(
            report.outcome,
            RunOutcome::ShortCircuited {
                reason: ShortCircuit::NoEligibleOrders
            }
        );
    }

    #[test]
    fn gateway_failure_aborts_without_rolling_back() {
        let locs = test_locations();
        let item = test_item("A", 10, locs.primary);
        let order = test_order(1001, locs.primary, vec![item.clone()]);
        let gateway: SharedGateway = Arc::new(
            base_gateway(&locs)
                .with_order(order.clone())
                .with_stock_levels(stock(
                    item.item_id,
                    &[(locs.primary, -3, 10), (locs.north, 5, 0)],
                ))
                .fail_on(CallKind::AddOrderNote, GatewayError::Unavailable("timeout".to_string())),
        );

        let report = runner(&gateway, ReallocationConfig::default()).execute(&request(&[&order], &locs));

        assert!(report.is_aborted());
        assert!(report.finished_at.is_some());
        assert!(report.orders.is_empty());
        // Writes that went out before the failure stay applied.
        assert_eq!(gateway.created_orders().len(), 1);
        assert_eq!(gateway.order(order.order_id).unwrap().items[0].quantity, 7);
    }

    #[test]
    fn try_execute_surfaces_gateway_errors() {
        let locs = test_locations();
        let order = test_order(1001, locs.primary, vec![test_item("A", 10, locs.primary)]);
        let gateway: SharedGateway = Arc::new(
            base_gateway(&locs)
                .with_order(order.clone())
                .fail_on(CallKind::FetchOrders, GatewayError::Unavailable("down".to_string())),
        );

        let err = runner(&gateway, ReallocationConfig::default())
            .try_execute(&request(&[&order], &locs))
            .unwrap_err();

        assert!(matches!(err, RunError::Gateway(GatewayError::Unavailable(msg)) if msg == "down"));
    }

    #[test]
    fn inconsistent_stock_snapshot_aborts_before_any_mutation() {
        let locs = test_locations();
        let item = test_item("A", 10, locs.primary);
        let order = test_order(1001, locs.primary, vec![item.clone()]);
        // Primary reports a shortfall but nothing in order to release.
        let gateway: SharedGateway = Arc::new(
            base_gateway(&locs).with_order(order.clone()).with_stock_levels(stock(
                item.item_id,
                &[(locs.primary, -3, 0), (locs.north, 5, 0)],
            )),
        );

        let err = runner(&gateway, ReallocationConfig::default())
            .try_execute(&request(&[&order], &locs))
            .unwrap_err();

        assert!(matches!(err, RunError::Domain(DomainError::InsufficientStock(_))));
        assert_eq!(gateway.mutation_count(), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: splitting orders moves quantity between orders, never
        /// creating or dropping any.
        #[test]
        fn split_orders_conserves_ordered_quantity(
            quantity in 1i64..15,
            primary_available in -20i64..5,
            north_available in 0i64..10,
            south_available in 0i64..10,
        ) {
            let locs = test_locations();
            let item = test_item("A", quantity, locs.primary);
            let order = test_order(1001, locs.primary, vec![item.clone()]);
            let gateway: SharedGateway = Arc::new(
                base_gateway(&locs).with_order(order.clone()).with_stock_levels(stock(
                    item.item_id,
                    &[
                        (locs.primary, primary_available, 20),
                        (locs.north, north_available, 0),
                        (locs.south, south_available, 0),
                    ],
                )),
            );

            let report = runner(&gateway, ReallocationConfig::split_orders()).execute(&request(&[&order], &locs));

            prop_assert!(!report.is_aborted());
            prop_assert_eq!(item_total(&gateway, item.item_id), quantity);
            let moved: i64 = gateway.created_orders().iter().map(|o| o.total_quantity()).sum();
            prop_assert!(moved <= (-primary_available).max(0));
            prop_assert!(moved <= north_available + south_available);
        }
    }
}
