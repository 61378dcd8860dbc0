pub mod classify;
pub mod crawl;
pub mod serve;
pub mod tally;

// Re-export command functions for convenience
pub use classify::classify;
pub use crawl::crawl;
pub use serve::serve;
pub use tally::tally;
