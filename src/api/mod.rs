pub mod nse;
pub mod parse;

pub use nse::NseClient;
pub use parse::parse_chain;
