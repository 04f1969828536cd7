pub mod chain;
pub mod record;

pub use chain::OptionChain;
pub use record::{ExpiryRow, OptionRecord, StrikeRow};
