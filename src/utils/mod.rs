pub mod plotting;

pub use plotting::{plot_open_interest, plot_term_structure, plot_volatility_skew};
