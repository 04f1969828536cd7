//! Command-line entry point for optionchain-rs
//!
//! Fetches the option chain for one NSE index symbol, prints summary
//! statistics, and writes the volatility skew, term structure, and
//! open-interest charts next to the working directory.

use optionchain_rs::analyzer::ChainAnalyzer;
use optionchain_rs::config::Config;
use optionchain_rs::error::Result;
use std::io::Write;
use tracing::{error, info};

fn read_symbol() -> Result<String> {
    // argv first, interactive prompt as fallback
    if let Some(arg) = std::env::args().nth(1) {
        return Ok(arg.trim().to_uppercase());
    }

    print!("For what security do you want an option chain? ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_uppercase())
}

fn read_cutoff(default: u64) -> u64 {
    std::env::args()
        .nth(2)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    config.init_logging()?;

    let symbol = read_symbol()?;
    if symbol.is_empty() {
        eprintln!("Please provide a valid security symbol.");
        std::process::exit(1);
    }
    let oi_cutoff = read_cutoff(config.oi_cutoff);

    let mut analyzer = ChainAnalyzer::new(&config)?;

    let chain = match analyzer.analyze(&symbol, oi_cutoff).await {
        Ok(chain) => chain,
        Err(e) => {
            error!("no analysis produced for {}: {}", symbol, e);
            std::process::exit(1);
        }
    };

    let summary = analyzer.summary()?;
    println!("\n{}", "=".repeat(50));
    println!("OPTION CHAIN SUMMARY");
    println!("{}", "=".repeat(50));
    println!("Symbol: {}", summary.symbol);
    println!("Underlying Price: {:.2}", summary.underlying_price);
    println!("ATM Strike: {:.2}", summary.atm_strike);
    println!("Total Records: {}", summary.total_records);
    println!("Expiries Count: {}", summary.expiries_count);
    println!("Strikes Count: {}", summary.strikes_count);
    println!("Total Call OI: {}", summary.total_call_oi);
    println!("Total Put OI: {}", summary.total_put_oi);
    println!("Max Call OI Strike: {:.2}", summary.max_call_oi_strike);
    println!("Max Put OI Strike: {:.2}", summary.max_put_oi_strike);
    println!("{}", "=".repeat(50));

    info!("generating charts");
    let skew_path = format!("{}_volatility_skew.png", symbol);
    let term_path = format!("{}_term_structure.png", symbol);
    let oi_path = format!("{}_open_interest.png", symbol);

    for (name, result) in [
        ("volatility skew", analyzer.plot_volatility_skew(0, &skew_path)),
        ("term structure", analyzer.plot_term_structure(None, &term_path)),
        ("open interest", analyzer.plot_open_interest(0, &oi_path)),
    ] {
        match result {
            Ok(()) => info!("wrote {} chart", name),
            Err(e) => error!("skipping {} chart: {}", name, e),
        }
    }

    println!("\nFirst 10 rows of option chain data:");
    for record in chain.records.iter().take(10) {
        println!(
            "{} strike {:>9.2} | call oi {:>9} coi {:>8} iv {:>6.2} ltp {:>9.2} | put oi {:>9} coi {:>8} iv {:>6.2} ltp {:>9.2}",
            record.expiry,
            record.strike,
            record.call_oi,
            record.call_coi,
            record.call_iv,
            record.call_ltp,
            record.put_oi,
            record.put_coi,
            record.put_iv,
            record.put_ltp,
        );
    }

    Ok(())
}
