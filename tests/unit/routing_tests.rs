#[cfg(test)]
mod tests_routing {
    use crate::fixtures::{book, maker, taker};
    use hybrid_orderbook::{
        Asset, DefaultHybridBook, HybridBookError, InMemoryCustody, LiquidityVenue,
        ScreenDecision, StopReason,
    };
    use pricelevel::{Hash32, Side};

    fn totals(book: &DefaultHybridBook) -> (u128, u128) {
        let custody: &InMemoryCustody = book.custody();
        (
            custody.total(Asset::Base) + book.venue().base_reserve(),
            custody.total(Asset::Quote) + book.venue().quote_reserve(),
        )
    }

    #[test]
    fn buy_takes_cheaper_asks_after_the_venue_leg() {
        let mut book = book();
        book.place_order(maker(), 990, 10, Side::Sell).unwrap();
        book.place_order(maker(), 995, 10, Side::Sell).unwrap();

        let plan = book.prepare_route(Side::Buy, 30).unwrap();
        assert_eq!(plan.reference_price, 1_000);
        assert_eq!(plan.screen, ScreenDecision::Walked);
        assert_eq!(plan.book_quantity, 20);
        assert_eq!(plan.venue_quantity, 10);
        assert_eq!(plan.expected_book_cost, Some(19_850));

        let outcome = book.settle_route(taker(), &plan).unwrap();
        assert_eq!(outcome.filled, 30);
        assert_eq!(outcome.book.filled, 20);
        assert_eq!(outcome.book.total_cost, 19_850);
        assert!(outcome.venue_fill.is_some());
        assert!(outcome.top_up.is_none());
        assert!(outcome.quote_amount < outcome.counterfactual_quote);
        assert_eq!(
            outcome.surplus,
            outcome.counterfactual_quote - outcome.quote_amount
        );
    }

    #[test]
    fn buy_settles_maker_and_initiator_balances() {
        let mut book = book();
        book.place_order(maker(), 990, 10, Side::Sell).unwrap();
        book.place_order(maker(), 995, 10, Side::Sell).unwrap();

        let outcome = book.route_trade(taker(), Side::Buy, 30).unwrap();
        let custody = book.custody();

        assert_eq!(custody.locked(maker(), Asset::Base), 0);
        assert_eq!(custody.available(maker(), Asset::Base), 100_000 - 20);
        assert_eq!(
            custody.available(maker(), Asset::Quote),
            10_000_000 + 19_850
        );

        assert_eq!(custody.locked(taker(), Asset::Quote), 0);
        assert_eq!(custody.available(taker(), Asset::Base), 100_000 + 30);
        assert_eq!(
            custody.available(taker(), Asset::Quote),
            10_000_000 - outcome.quote_amount
        );
    }

    #[test]
    fn sell_hits_richer_bids() {
        let mut book = book();
        book.place_order(maker(), 1_010, 10, Side::Buy).unwrap();
        book.place_order(maker(), 1_005, 5, Side::Buy).unwrap();

        let outcome = book.route_trade(taker(), Side::Sell, 20).unwrap();
        assert_eq!(outcome.filled, 20);
        assert_eq!(outcome.book.filled, 15);
        assert_eq!(outcome.book.total_cost, 10_100 + 5_025);
        assert!(outcome.quote_amount > outcome.counterfactual_quote);
        assert_eq!(
            outcome.surplus,
            outcome.quote_amount - outcome.counterfactual_quote
        );

        let custody = book.custody();
        assert_eq!(custody.locked(maker(), Asset::Quote), 0);
        assert_eq!(custody.available(maker(), Asset::Base), 100_000 + 15);
        assert_eq!(custody.available(taker(), Asset::Base), 100_000 - 20);
        assert_eq!(
            custody.available(taker(), Asset::Quote),
            10_000_000 + outcome.quote_amount
        );
    }

    #[test]
    fn worse_book_prices_route_everything_to_the_venue() {
        let mut book = book();
        let order_id = book.place_order(maker(), 1_500, 10, Side::Sell).unwrap();

        let outcome = book.route_trade(taker(), Side::Buy, 10).unwrap();
        assert_eq!(outcome.book.filled, 0);
        assert_eq!(outcome.filled, 10);
        assert_eq!(outcome.quote_amount, outcome.counterfactual_quote);
        assert_eq!(outcome.surplus, 0);
        assert_eq!(book.order(order_id).map(|order| order.filled), Some(0));
    }

    #[test]
    fn best_bucket_covering_the_trade_skips_the_venue() {
        let mut book = book();
        book.place_order(maker(), 990, 50, Side::Sell).unwrap();

        let plan = book.prepare_route(Side::Buy, 30).unwrap();
        assert_eq!(plan.screen, ScreenDecision::BestBucket);
        assert_eq!(plan.venue_quantity, 0);

        let reserves = (book.venue().base_reserve(), book.venue().quote_reserve());
        let outcome = book.settle_route(taker(), &plan).unwrap();
        assert!(outcome.venue_fill.is_none());
        assert_eq!(outcome.quote_amount, 990 * 30);
        assert_eq!(
            (book.venue().base_reserve(), book.venue().quote_reserve()),
            reserves
        );
        assert_eq!(book.best_ask(), Some(990));
        assert_eq!(book.depth_at(990, Side::Sell), Ok((20, 1)));
    }

    #[test]
    fn empty_book_routes_to_the_venue() {
        let mut book = book();
        let plan = book.prepare_route(Side::Sell, 10).unwrap();
        assert_eq!(plan.screen, ScreenDecision::NoImprovement);
        assert_eq!(plan.book_quantity, 0);

        let outcome = book.settle_route(taker(), &plan).unwrap();
        assert_eq!(outcome.filled, 10);
        assert_eq!(outcome.surplus, 0);
        assert_eq!(outcome.book.stop_reason, StopReason::Filled);
    }

    #[test]
    fn routing_conserves_every_asset() {
        let mut book = book();
        book.place_order(maker(), 985, 7, Side::Sell).unwrap();
        book.place_order(maker(), 999, 9, Side::Sell).unwrap();
        book.place_order(maker(), 1_020, 4, Side::Buy).unwrap();
        let before = totals(&book);

        book.route_trade(taker(), Side::Buy, 12).unwrap();
        book.route_trade(taker(), Side::Sell, 25).unwrap();
        book.route_trade(taker(), Side::Buy, 40).unwrap();

        assert_eq!(totals(&book), before);
    }

    #[test]
    fn insufficient_balance_changes_nothing() {
        let mut book = book();
        book.place_order(maker(), 990, 10, Side::Sell).unwrap();
        let broke = Hash32::new([9; 32]);
        let version = book.version();
        let reserves = (book.venue().base_reserve(), book.venue().quote_reserve());

        let err = book.route_trade(broke, Side::Buy, 30).unwrap_err();
        assert!(matches!(
            err,
            HybridBookError::InsufficientBalance {
                asset: Asset::Quote,
                ..
            }
        ));
        assert_eq!(book.version(), version);
        assert_eq!(
            (book.venue().base_reserve(), book.venue().quote_reserve()),
            reserves
        );
        assert_eq!(book.open_quantity(Side::Sell), 10);
        assert_eq!(book.custody().locked(maker(), Asset::Base), 10);
    }

    #[test]
    fn stale_plan_is_rejected() {
        let mut book = book();
        book.place_order(maker(), 990, 10, Side::Sell).unwrap();
        let plan = book.prepare_route(Side::Buy, 5).unwrap();

        book.place_order(maker(), 980, 10, Side::Sell).unwrap();
        assert_eq!(
            book.settle_route(taker(), &plan),
            Err(HybridBookError::StalePlan {
                planned: plan.version,
                current: plan.version + 1
            })
        );
        assert_eq!(book.custody().locked(taker(), Asset::Quote), 0);
    }

    #[test]
    fn prepare_does_not_mutate() {
        let mut book = book();
        book.place_order(maker(), 990, 10, Side::Sell).unwrap();
        let version = book.version();

        book.prepare_route(Side::Buy, 25).unwrap();
        assert_eq!(book.version(), version);
        assert_eq!(book.open_quantity(Side::Sell), 10);
        assert_eq!(book.venue().current_reference_price(), 1_000);
    }

    #[test]
    fn invalid_requests_are_rejected() {
        let mut book = book();
        assert_eq!(
            book.route_trade(taker(), Side::Buy, 0),
            Err(HybridBookError::InvalidQuantity { quantity: 0 })
        );
        assert!(matches!(
            book.route_trade(taker(), Side::Buy, 1_000_000),
            Err(HybridBookError::InsufficientLiquidity { .. })
        ));
    }
}
