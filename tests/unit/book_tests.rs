#[cfg(test)]
mod tests_hybrid_book {
    use crate::fixtures::{book, book_with, funded_custody, maker, pool, taker};
    use hybrid_orderbook::{Asset, BookConfig, HybridBook, HybridBookError, OrderRequest};
    use pricelevel::{Hash32, Side};

    #[test]
    fn placement_locks_maker_funds() {
        let mut book = book();
        book.place_order(maker(), 1_050, 10, Side::Sell).unwrap();
        book.place_order(maker(), 950, 4, Side::Buy).unwrap();

        let custody = book.custody();
        assert_eq!(custody.locked(maker(), Asset::Base), 10);
        assert_eq!(custody.locked(maker(), Asset::Quote), 950 * 4);
        assert_eq!(book.version(), 2);
    }

    #[test]
    fn cancel_releases_the_open_remainder() {
        let mut book = book();
        let order_id = book.place_order(maker(), 1_050, 10, Side::Sell).unwrap();
        book.route_trade(taker(), Side::Buy, 3).unwrap();
        // the ask is above the pool price, so the route never touches it
        assert_eq!(book.order(order_id).map(|order| order.filled), Some(0));

        let bid = book.place_order(maker(), 1_200, 5, Side::Buy).unwrap();
        book.route_trade(taker(), Side::Sell, 2).unwrap();
        assert_eq!(book.order(bid).map(|order| order.filled), Some(2));

        let cancelled = book.cancel_order(maker(), bid).unwrap();
        assert_eq!(cancelled.released, 3);
        assert_eq!(cancelled.price, 1_200);
        assert_eq!(book.custody().locked(maker(), Asset::Quote), 0);

        book.cancel_order(maker(), order_id).unwrap();
        assert_eq!(book.custody().locked(maker(), Asset::Base), 0);
        assert_eq!(book.best_ask(), None);
        assert_eq!(book.best_bid(), None);
    }

    #[test]
    fn cancel_by_another_account_is_rejected() {
        let mut book = book();
        let order_id = book.place_order(maker(), 1_050, 10, Side::Sell).unwrap();
        let intruder = Hash32::new([7; 32]);

        assert!(matches!(
            book.cancel_order(intruder, order_id),
            Err(HybridBookError::NotMaker { .. })
        ));
        assert_eq!(book.custody().locked(maker(), Asset::Base), 10);
        assert_eq!(book.depth_at(1_050, Side::Sell), Ok((10, 1)));
    }

    #[test]
    fn placement_without_funds_is_rejected() {
        let mut book = book();
        let poor = Hash32::new([8; 32]);
        assert_eq!(
            book.place_order(poor, 1_050, 10, Side::Sell),
            Err(HybridBookError::InsufficientBalance {
                account: poor,
                asset: Asset::Base,
                required: 10
            })
        );
        assert_eq!(book.version(), 0);
        assert!(book.manager().quantization().is_none());
    }

    #[test]
    fn spread_and_depth_queries() {
        let mut book = book();
        book.place_order(maker(), 1_030, 2, Side::Sell).unwrap();
        book.place_order(maker(), 1_030, 3, Side::Sell).unwrap();
        book.place_order(maker(), 970, 6, Side::Buy).unwrap();

        assert_eq!(book.best_ask(), Some(1_030));
        assert_eq!(book.best_bid(), Some(970));
        assert_eq!(book.spread(), Some(60));
        assert_eq!(book.depth_at(1_030, Side::Sell), Ok((5, 2)));
        assert_eq!(book.depth_at(1_031, Side::Sell), Ok((0, 0)));
        assert_eq!(book.depth_at(5_000, Side::Buy), Ok((0, 0)));
        assert!(matches!(
            book.depth_at(10_000, Side::Buy),
            Err(HybridBookError::PriceOutOfRange { .. })
        ));
        assert_eq!(book.open_quantity(Side::Sell), 5);
    }

    #[test]
    fn batch_places_all_orders_with_one_lock_per_asset() {
        let mut book = book();
        let requests = [
            OrderRequest::new(1_010, 4, Side::Sell),
            OrderRequest::new(1_120, 6, Side::Sell),
            OrderRequest::new(980, 2, Side::Buy),
        ];
        let ids = book.place_orders_batch(maker(), &requests).unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(book.version(), 1);
        assert_eq!(book.custody().locked(maker(), Asset::Base), 10);
        assert_eq!(book.custody().locked(maker(), Asset::Quote), 1_960);
        assert_eq!(book.manager().bucket_count(), 3);
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let mut book = book();
        let requests = [
            OrderRequest::new(1_010, 4, Side::Sell),
            OrderRequest::new(99_999, 6, Side::Sell),
        ];
        assert!(matches!(
            book.place_orders_batch(maker(), &requests),
            Err(HybridBookError::PriceOutOfRange { price: 99_999 })
        ));
        assert_eq!(book.open_quantity(Side::Sell), 0);
        assert_eq!(book.custody().locked(maker(), Asset::Base), 0);

        let requests = [
            OrderRequest::new(1_010, 4, Side::Sell),
            OrderRequest::new(900, 20_000, Side::Buy),
        ];
        assert!(matches!(
            book.place_orders_batch(maker(), &requests),
            Err(HybridBookError::InsufficientBalance {
                asset: Asset::Quote,
                ..
            })
        ));
        assert_eq!(book.custody().locked(maker(), Asset::Base), 0);
        assert_eq!(book.version(), 0);
    }

    #[test]
    fn batch_size_is_capped() {
        let mut book = book_with(BookConfig::default().with_max_orders_per_batch(2));
        let requests = [OrderRequest::new(1_010, 1, Side::Sell); 3];
        assert!(matches!(
            book.place_orders_batch(maker(), &requests),
            Err(HybridBookError::InvalidOperation { .. })
        ));
        assert!(matches!(
            book.place_orders_batch(maker(), &[]),
            Err(HybridBookError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = BookConfig::default().with_max_fills_per_match(0);
        assert!(matches!(
            HybridBook::new(config, pool(), funded_custody()),
            Err(HybridBookError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn order_ids_encode_their_location() {
        let mut book = book_with(BookConfig::default().with_venue_id(11));
        let first = book.place_order(maker(), 1_234, 1, Side::Sell).unwrap();
        let second = book.place_order(maker(), 1_234, 1, Side::Sell).unwrap();

        let parts = second.decode().unwrap();
        assert_eq!(parts.venue, 11);
        assert_eq!(parts.bucket, 12);
        assert_eq!(parts.price_index, 34);
        assert_eq!(parts.sequence, 1);
        assert_eq!(parts.side, Side::Sell);
        assert_eq!(first.decode().unwrap().sequence, 0);
        assert!(first < second);
    }
}
