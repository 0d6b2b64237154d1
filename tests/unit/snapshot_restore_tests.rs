#[cfg(test)]
mod tests_snapshot_restore {
    use crate::fixtures::{book, book_with, funded_custody, maker, pool, taker};
    use hybrid_orderbook::orderbook::SNAPSHOT_FORMAT_VERSION;
    use hybrid_orderbook::{
        BookConfig, ConstantProductPool, DefaultHybridBook, HybridBook, HybridBookError,
        LinearBucketCurve, OrderId, VenueSnapshotPackage,
    };
    use pricelevel::Side;

    fn populate_book(book: &mut DefaultHybridBook) -> Vec<OrderId> {
        let ids = vec![
            book.place_order(maker(), 990, 5, Side::Sell).expect("add ask"),
            book.place_order(maker(), 990, 7, Side::Sell).expect("add ask"),
            book.place_order(maker(), 1_150, 4, Side::Sell).expect("add ask"),
            book.place_order(maker(), 980, 6, Side::Buy).expect("add bid"),
            book.place_order(maker(), 870, 3, Side::Buy).expect("add bid"),
        ];
        book.cancel_order(maker(), ids[4]).expect("cancel bid");
        book.route_trade(taker(), Side::Buy, 8).expect("route");
        ids
    }

    #[test]
    fn snapshot_package_round_trip_restores_orders() {
        let mut original = book();
        let order_ids = populate_book(&mut original);

        let package = original
            .create_snapshot_package()
            .expect("snapshot package");

        let mut restored = book();
        restored
            .restore_from_snapshot_package(package)
            .expect("restore from package");

        assert_eq!(restored.best_bid(), original.best_bid());
        assert_eq!(restored.best_ask(), Some(990));
        for order_id in order_ids {
            assert_eq!(restored.order(order_id), original.order(order_id));
        }
        for side in [Side::Buy, Side::Sell] {
            assert_eq!(restored.open_quantity(side), original.open_quantity(side));
        }
        assert_eq!(restored.depth_at(990, Side::Sell), Ok((4, 1)));
        assert_eq!(
            restored.manager().quantization(),
            original.manager().quantization()
        );
    }

    #[test]
    fn snapshot_json_round_trip_restores_book_state() {
        let mut original = book();
        populate_book(&mut original);

        let json_payload = original
            .snapshot_to_json()
            .expect("serialize snapshot to json");

        let mut restored = book();
        restored
            .restore_from_snapshot_json(&json_payload)
            .expect("restore from json");

        assert_eq!(restored.best_bid(), Some(980));
        assert_eq!(restored.best_ask(), Some(990));
        assert_eq!(restored.spread(), Some(10));
        assert_eq!(restored.version(), 1);
    }

    #[test]
    fn snapshot_summaries_skip_closed_orders() {
        let mut original = book();
        populate_book(&mut original);
        let snapshot = original.create_snapshot();

        assert_eq!(snapshot.best_bid(), Some(980));
        assert_eq!(snapshot.best_ask(), Some(990));
        assert_eq!(snapshot.open_quantity(Side::Sell), 4 + 4);
        assert_eq!(snapshot.open_quantity(Side::Buy), 6);
        let keys: Vec<_> = snapshot.buckets.iter().map(|bucket| bucket.key).collect();
        assert_eq!(keys, vec![8, 9, 11]);
    }

    #[test]
    fn restored_levels_keep_sequence_numbers() {
        let mut original = book();
        let order_ids = populate_book(&mut original);
        let mut restored = book();
        restored
            .restore_from_snapshot(original.create_snapshot())
            .expect("restore");

        let next = restored
            .place_order(maker(), 990, 1, Side::Sell)
            .expect("place after restore");
        assert_eq!(next.decode().unwrap().sequence, 2);

        let cancelled = restored
            .cancel_order(maker(), order_ids[1])
            .expect("cancel restored order");
        assert_eq!(cancelled.released, 4);
        assert!(matches!(
            restored.cancel_order(maker(), order_ids[0]),
            Err(HybridBookError::AlreadyClosed { .. })
        ));
    }

    #[test]
    fn restore_rejects_checksum_mismatch() {
        let mut original = book();
        populate_book(&mut original);
        let mut package = original.create_snapshot_package().expect("package");
        package.snapshot.buckets[0].bids.clear();

        let mut restored = book();
        let err = restored
            .restore_from_snapshot_package(package)
            .expect_err("checksum mismatch");
        assert!(matches!(err, HybridBookError::ChecksumMismatch { .. }));
        assert_eq!(restored.version(), 0);
    }

    #[test]
    fn restore_rejects_unknown_version() {
        let mut original = book();
        populate_book(&mut original);
        let mut package = original.create_snapshot_package().expect("package");
        package.version = SNAPSHOT_FORMAT_VERSION + 1;

        let err = book()
            .restore_from_snapshot_package(package)
            .expect_err("version mismatch");
        assert!(matches!(err, HybridBookError::InvalidOperation { .. }));
    }

    #[test]
    fn restore_rejects_other_venue() {
        let mut original = book();
        populate_book(&mut original);
        let snapshot = original.create_snapshot();

        let mut other = book_with(BookConfig::default().with_venue_id(9));
        assert_eq!(
            other.restore_from_snapshot(snapshot),
            Err(HybridBookError::VenueMismatch {
                expected: 9,
                found: 0
            })
        );
    }

    #[test]
    fn failed_restore_keeps_existing_orders() {
        let mut original = book();
        populate_book(&mut original);
        let snapshot = original.create_snapshot();

        let curve = LinearBucketCurve::new(0, 200, 32).expect("curve");
        let wide_pool: ConstantProductPool =
            ConstantProductPool::new(1_000_000, 1_000_000_000, 30, curve).expect("pool");
        let mut wide = HybridBook::new(BookConfig::default(), wide_pool, funded_custody())
            .expect("book");
        wide.place_order(maker(), 1_500, 3, Side::Sell).expect("ask");

        assert!(matches!(
            wide.restore_from_snapshot(snapshot),
            Err(HybridBookError::InvalidOperation { .. })
        ));
        assert_eq!(wide.best_ask(), Some(1_500));
        assert_eq!(wide.version(), 1);
    }

    #[test]
    fn restore_rejects_corrupt_json() {
        let mut restored = HybridBook::new(BookConfig::default(), pool(), funded_custody())
            .expect("book");
        assert!(matches!(
            restored.restore_from_snapshot_json("{not json"),
            Err(HybridBookError::DeserializationError { .. })
        ));
    }

    #[test]
    fn restore_rejects_zero_increment_even_with_valid_checksum() {
        let mut original = book();
        populate_book(&mut original);
        let mut snapshot = original.create_snapshot();
        if let Some(quantization) = snapshot.quantization.as_mut() {
            quantization.increment = 0;
        }
        let package = VenueSnapshotPackage::new(snapshot).expect("repackage");

        let mut restored = book();
        assert!(matches!(
            restored.restore_from_snapshot_package(package),
            Err(HybridBookError::InvalidConfiguration { .. })
        ));
        assert_eq!(restored.version(), 0);
        restored
            .place_order(maker(), 995, 1, Side::Sell)
            .expect("book still accepts orders");
        assert_eq!(restored.best_ask(), Some(995));
    }

    #[test]
    fn restore_rejects_inconsistent_point_count() {
        let mut original = book();
        populate_book(&mut original);
        let mut snapshot = original.create_snapshot();
        if let Some(quantization) = snapshot.quantization.as_mut() {
            quantization.points += 1;
        }

        assert!(matches!(
            book().restore_from_snapshot(snapshot),
            Err(HybridBookError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn restore_rejects_duplicate_bucket_keys() {
        let mut original = book();
        populate_book(&mut original);
        let mut snapshot = original.create_snapshot();
        let duplicate = snapshot.buckets[0].clone();
        snapshot.buckets.push(duplicate);

        let mut restored = book();
        assert!(matches!(
            restored.restore_from_snapshot(snapshot),
            Err(HybridBookError::InvalidOperation { .. })
        ));
        assert_eq!(restored.best_ask(), None);
    }

    #[test]
    fn restore_rejects_duplicate_levels() {
        let mut original = book();
        populate_book(&mut original);
        let mut snapshot = original.create_snapshot();
        let bucket = snapshot
            .buckets
            .iter_mut()
            .find(|bucket| !bucket.asks.is_empty())
            .expect("bucket with asks");
        let duplicate = bucket.asks[0].clone();
        bucket.asks.push(duplicate);

        assert!(matches!(
            book().restore_from_snapshot(snapshot),
            Err(HybridBookError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn restore_rejects_orders_whose_notional_overflows() {
        let curve = LinearBucketCurve::new(1u128 << 100, 100, 4).expect("curve");
        let high_pool = || {
            ConstantProductPool::new(1_000, 1_000_000, 30, curve).expect("pool")
        };
        let mut original =
            HybridBook::new(BookConfig::default(), high_pool(), funded_custody()).expect("book");
        original
            .place_order(maker(), 1u128 << 100, 1, Side::Sell)
            .expect("ask");
        let mut snapshot = original.create_snapshot();
        snapshot.buckets[0].asks[0].orders[0].total = u64::MAX;

        let mut restored =
            HybridBook::new(BookConfig::default(), high_pool(), funded_custody()).expect("book");
        assert_eq!(
            restored.restore_from_snapshot(snapshot),
            Err(HybridBookError::InvalidQuantity { quantity: u64::MAX })
        );
    }
}
