// demos/src/bin/snapshot_replay.rs
//
// Drives a hybrid book through the sequencer, snapshots it to JSON,
// restores the snapshot into a fresh book and replays the recorded
// events against a second book to show both paths agree.
//
// Run this demo with:
//   cargo run --bin snapshot_replay
//   (from the demos directory)

use hybrid_orderbook::{
    Asset, BookConfig, ConstantProductPool, DefaultHybridBook, HybridBook, HybridBookError,
    InMemoryCustody, LinearBucketCurve, Sequencer, SequencerCommand, SequencerEvent,
};
use pricelevel::{Hash32, Side};
use tracing::{Level, info};

fn maker() -> Hash32 {
    Hash32::new([1; 32])
}

fn taker() -> Hash32 {
    Hash32::new([2; 32])
}

fn main() -> Result<(), HybridBookError> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
    info!("Snapshot and Replay Demo");

    let mut sequencer = Sequencer::new(fresh_book()?);
    let events: Vec<SequencerEvent> = commands()
        .into_iter()
        .map(|command| sequencer.submit(command))
        .collect();
    for event in &events {
        info!("#{} {:?}", event.sequence_num, event.result);
    }

    let json = sequencer.book().snapshot_to_json()?;
    info!("Snapshot: {} bytes of JSON", json.len());

    let mut restored = fresh_book()?;
    restored.restore_from_snapshot_json(&json)?;

    let mut replica = Sequencer::new(fresh_book()?);
    replica.replay(&events)?;

    let original = sequencer.book_mut();
    info!(
        "Original  best bid {:?} best ask {:?}",
        original.best_bid(),
        original.best_ask()
    );
    info!(
        "Restored  best bid {:?} best ask {:?}",
        restored.best_bid(),
        restored.best_ask()
    );
    let replayed = replica.book_mut();
    info!(
        "Replayed  best bid {:?} best ask {:?}",
        replayed.best_bid(),
        replayed.best_ask()
    );

    let event_log = serde_json::to_string_pretty(&events[0]).map_err(|error| {
        HybridBookError::SerializationError {
            message: error.to_string(),
        }
    })?;
    info!("First event as JSON:\n{}", event_log);
    Ok(())
}

fn fresh_book() -> Result<DefaultHybridBook, HybridBookError> {
    let curve = LinearBucketCurve::new(0, 256, 32)?;
    let pool = ConstantProductPool::new(50_000, 100_000_000, 25, curve)?;
    let mut custody = InMemoryCustody::new();
    custody.deposit(maker(), Asset::Base, 1_000);
    custody.deposit(maker(), Asset::Quote, 1_000_000);
    custody.deposit(taker(), Asset::Quote, 1_000_000);
    HybridBook::new(BookConfig::default(), pool, custody)
}

fn commands() -> Vec<SequencerCommand> {
    let mut commands: Vec<SequencerCommand> = [(1_990, 30), (1_996, 20), (2_050, 40)]
        .into_iter()
        .map(|(price, quantity)| SequencerCommand::PlaceOrder {
            maker: maker(),
            price,
            quantity,
            side: Side::Sell,
        })
        .collect();
    commands.push(SequencerCommand::PlaceOrder {
        maker: maker(),
        price: 1_950,
        quantity: 25,
        side: Side::Buy,
    });
    commands.push(SequencerCommand::RouteTrade {
        initiator: taker(),
        side: Side::Buy,
        quantity: 45,
    });
    commands
}
