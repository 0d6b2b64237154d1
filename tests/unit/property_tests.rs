#[cfg(test)]
mod tests_properties {
    use crate::fixtures::{book, maker, taker};
    use hybrid_orderbook::orderbook::order::MAX_ENCODED_PRICE_INDEX;
    use hybrid_orderbook::{
        BookConfig, BucketManager, LinearBucketCurve, OrderId, OrderIdParts, QuantizationConfig,
    };
    use pricelevel::Side;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Place { price: u128, quantity: u64, side: Side },
        Cancel { pick: usize },
        Match { side: Side, quantity: u64, limit: Option<u128> },
    }

    fn side() -> impl Strategy<Value = Side> {
        any::<bool>().prop_map(|buy| if buy { Side::Buy } else { Side::Sell })
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0u128..2_000, 1u64..50, side())
                .prop_map(|(price, quantity, side)| Op::Place { price, quantity, side }),
            1 => any::<usize>().prop_map(|pick| Op::Cancel { pick }),
            2 => (side(), 1u64..120, proptest::option::of(0u128..2_000))
                .prop_map(|(side, quantity, limit)| Op::Match { side, quantity, limit }),
        ]
    }

    fn assert_consistent(manager: &mut BucketManager) -> Result<(), TestCaseError> {
        for side in [Side::Buy, Side::Sell] {
            prop_assert_eq!(
                manager.open_quantity(side),
                manager.scanned_open_quantity(side)
            );
            for bucket in manager.buckets_sorted() {
                prop_assert_eq!(
                    manager.is_active(bucket.key(), side),
                    !bucket.side(side).is_empty()
                );
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn quantization_round_trips(
            lower in 0u128..1_000_000_000_000,
            width in 1u128..1_000_000_000,
            target in 1u32..=4_096,
            pick in any::<u32>(),
            offset in any::<u128>(),
        ) {
            let config = QuantizationConfig::from_bucket_bounds(lower, lower + width, target).unwrap();
            prop_assert!(config.points <= target);

            let index = pick % config.points;
            let price = config.index_to_price(index, lower);
            prop_assert!(price < lower + width);
            prop_assert_eq!(config.price_to_index(price, lower, lower + width).unwrap(), index);

            let price = lower + offset % width;
            let grid = config.quantize(price, lower);
            prop_assert!(grid <= price && price - grid < config.increment);
            let index = config.price_to_index(price, lower, lower + width).unwrap();
            prop_assert_eq!(config.index_to_price(index, lower), grid);
        }

        #[test]
        fn order_id_codec_is_a_bijection(
            venue in any::<u32>(),
            bucket in any::<i32>(),
            price_index in 0..=MAX_ENCODED_PRICE_INDEX,
            sequence in any::<u32>(),
            side in side(),
        ) {
            let parts = OrderIdParts { venue, bucket, price_index, sequence, side };
            let order_id = OrderId::new(parts);
            prop_assert_eq!(order_id.decode().unwrap(), parts);
            prop_assert_eq!(OrderId::from_raw(order_id.as_u128()), order_id);
        }

        #[test]
        fn aggregates_follow_every_operation(ops in proptest::collection::vec(op(), 1..80)) {
            let curve = LinearBucketCurve::new(0, 100, 20).unwrap();
            let config = BookConfig::default()
                .with_max_buckets_per_match(4)
                .with_max_fills_per_match(16);
            let mut manager = BucketManager::new(&config);
            let mut placed = Vec::new();

            for op in ops {
                match op {
                    Op::Place { price, quantity, side } => {
                        placed.push(manager.place_order(&curve, price, quantity, side, maker()).unwrap());
                    }
                    Op::Cancel { pick } => {
                        if !placed.is_empty() {
                            let _ = manager.cancel_order(placed[pick % placed.len()], maker());
                        }
                    }
                    Op::Match { side, quantity, limit } => {
                        let result = manager.match_across_buckets(side, quantity, None, limit).unwrap();
                        prop_assert!(result.filled <= quantity);
                        prop_assert!(result.orders_touched <= 16);
                        prop_assert!(result.buckets_scanned <= 4);
                    }
                }
                assert_consistent(&mut manager)?;
            }
        }

        #[test]
        fn routing_never_does_worse_than_the_venue(
            asks in proptest::collection::vec((900u128..1_100, 1u64..50), 0..12),
            bids in proptest::collection::vec((900u128..1_100, 1u64..50), 0..12),
            side in side(),
            quantity in 1u64..500,
        ) {
            let mut book = book();
            for (price, size) in asks {
                book.place_order(maker(), price, size, Side::Sell).unwrap();
            }
            for (price, size) in bids {
                book.place_order(maker(), price, size, Side::Buy).unwrap();
            }

            let outcome = book.route_trade(taker(), side, quantity).unwrap();
            prop_assert_eq!(outcome.filled, quantity);
            match side {
                Side::Buy => {
                    prop_assert!(outcome.quote_amount <= outcome.counterfactual_quote);
                    prop_assert_eq!(outcome.surplus, outcome.counterfactual_quote - outcome.quote_amount);
                }
                Side::Sell => {
                    prop_assert!(outcome.quote_amount >= outcome.counterfactual_quote);
                    prop_assert_eq!(outcome.surplus, outcome.quote_amount - outcome.counterfactual_quote);
                }
            }
        }
    }
}
