mod book_tests;
mod fixtures;
mod property_tests;
mod routing_tests;
mod snapshot_restore_tests;
