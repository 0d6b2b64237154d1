// demos/src/bin/hybrid_routing.rs
//
// Routes taker trades across a constant-product pool and the limit orders
// resting in its buckets, then prints how each trade was split and the
// surplus the taker kept compared with trading on the pool alone.
//
// Run this demo with:
//   cargo run --bin hybrid_routing
//   (from the demos directory)

use hybrid_orderbook::{
    Asset, BookConfig, ConstantProductPool, DefaultHybridBook, HybridBook, HybridBookError,
    InMemoryCustody, LinearBucketCurve, OrderRequest,
};
use pricelevel::{Hash32, Side, setup_logger};
use tracing::info;

fn main() -> Result<(), HybridBookError> {
    setup_logger();
    info!("Hybrid Routing Demo");

    let maker = Hash32::new([1; 32]);
    let taker = Hash32::new([2; 32]);
    let mut book = create_book(maker, taker)?;

    populate_book(&mut book, maker)?;
    display_book_state(&mut book);

    for (side, quantity) in [(Side::Buy, 25), (Side::Buy, 120), (Side::Sell, 60)] {
        route(&mut book, taker, side, quantity)?;
    }

    display_book_state(&mut book);
    let custody = book.custody();
    info!(
        "Taker balances: base {} quote {}",
        custody.available(taker, Asset::Base),
        custody.available(taker, Asset::Quote)
    );
    Ok(())
}

fn create_book(maker: Hash32, taker: Hash32) -> Result<DefaultHybridBook, HybridBookError> {
    // 64 buckets of width 100 starting at 0; the pool quotes 1 base at 1_000
    let curve = LinearBucketCurve::new(0, 100, 64)?;
    let pool = ConstantProductPool::new(100_000, 100_000_000, 30, curve)?;

    let mut custody = InMemoryCustody::new();
    custody.deposit(maker, Asset::Base, 10_000);
    custody.deposit(maker, Asset::Quote, 10_000_000);
    custody.deposit(taker, Asset::Base, 10_000);
    custody.deposit(taker, Asset::Quote, 10_000_000);

    let config = BookConfig::default()
        .with_venue_id(7)
        .with_target_price_points(100);
    HybridBook::new(config, pool, custody)
}

fn populate_book(book: &mut DefaultHybridBook, maker: Hash32) -> Result<(), HybridBookError> {
    let asks = [
        OrderRequest::new(985, 10, Side::Sell),
        OrderRequest::new(992, 15, Side::Sell),
        OrderRequest::new(998, 20, Side::Sell),
        OrderRequest::new(1_040, 50, Side::Sell),
    ];
    let bids = [
        OrderRequest::new(1_012, 20, Side::Buy),
        OrderRequest::new(1_006, 30, Side::Buy),
        OrderRequest::new(960, 40, Side::Buy),
    ];
    let ask_ids = book.place_orders_batch(maker, &asks)?;
    let bid_ids = book.place_orders_batch(maker, &bids)?;
    info!("Placed {} asks and {} bids", ask_ids.len(), bid_ids.len());
    for order_id in ask_ids.iter().chain(bid_ids.iter()) {
        info!("  {}", order_id);
    }
    Ok(())
}

fn route(
    book: &mut DefaultHybridBook,
    taker: Hash32,
    side: Side,
    quantity: u64,
) -> Result<(), HybridBookError> {
    let plan = book.prepare_route(side, quantity)?;
    info!(
        "\n{} {}: reference {}, screen {:?}, book {} / venue {}",
        side,
        quantity,
        plan.reference_price,
        plan.screen,
        plan.book_quantity,
        plan.venue_quantity
    );

    let outcome = book.settle_route(taker, &plan)?;
    info!(
        "  filled {} at {:.2} (book {} over {} orders), paid/received {} vs venue-only {}, surplus {}",
        outcome.filled,
        outcome.average_price(),
        outcome.book.filled,
        outcome.book.orders_touched,
        outcome.quote_amount,
        outcome.counterfactual_quote,
        outcome.surplus
    );
    Ok(())
}

fn display_book_state(book: &mut DefaultHybridBook) {
    info!("\nBook state:");
    info!("  Best bid: {:?}", book.best_bid());
    info!("  Best ask: {:?}", book.best_ask());
    info!("  Spread:   {:?}", book.spread());
    info!(
        "  Open bids {} / asks {}, pool reference {}",
        book.open_quantity(Side::Buy),
        book.open_quantity(Side::Sell),
        hybrid_orderbook::LiquidityVenue::current_reference_price(book.venue())
    );
}
