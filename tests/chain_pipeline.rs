//! End-to-end tests for the parse -> filter -> group pipeline on a raw
//! NSE-shaped document.

use chrono::NaiveDate;
use optionchain_rs::{parse_chain, summarize, ChainError, OptionRecord};
use serde_json::json;

fn leg(oi: u64, coi: i64, iv: f64, ltp: f64, underlying: f64) -> serde_json::Value {
    json!({
        "openInterest": oi,
        "changeinOpenInterest": coi,
        "impliedVolatility": iv,
        "lastPrice": ltp,
        "underlyingValue": underlying
    })
}

/// Three records, two expiries, two strikes, underlying 21250.
fn document() -> serde_json::Value {
    json!({
        "records": {
            "data": [
                {
                    "strikePrice": 21000.0,
                    "expiryDate": "25-Jan-2024",
                    "CE": leg(1000, 120, 14.2, 310.0, 21250.0),
                    "PE": leg(2000, -40, 15.1, 95.0, 21250.0)
                },
                {
                    "strikePrice": 21500.0,
                    "expiryDate": "25-Jan-2024",
                    "CE": leg(1500, 90, 13.8, 80.0, 21250.0),
                    "PE": leg(1800, 15, 14.9, 330.0, 21250.0)
                },
                {
                    "strikePrice": 21000.0,
                    "expiryDate": "29-Feb-2024",
                    "CE": leg(800, 30, 15.6, 410.0, 21250.0),
                    "PE": leg(1200, -10, 16.3, 150.0, 21250.0)
                }
            ]
        }
    })
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn parse_produces_expected_chain() {
    let chain = parse_chain("NIFTY", &document()).unwrap();

    assert_eq!(chain.symbol, "NIFTY");
    assert_eq!(chain.underlying_price, 21250.0);
    assert_eq!(chain.records.len(), 3);
    assert_eq!(chain.expiries, vec![date(2024, 1, 25), date(2024, 2, 29)]);
    assert_eq!(chain.strikes, vec![21000.0, 21500.0]);
}

#[test]
fn low_cutoff_keeps_everything_high_cutoff_filters() {
    let chain = parse_chain("NIFTY", &document()).unwrap();

    assert_eq!(chain.filter_by_oi(50).records.len(), 3);

    // only legs strictly above 1500 survive: record 1 (put 2000) and
    // record 2 (put 1800); record 3 tops out at 1200
    let filtered = chain.filter_by_oi(1500);
    assert_eq!(filtered.records.len(), 2);
    assert_eq!(filtered.records[0].strike, 21000.0);
    assert_eq!(filtered.records[1].strike, 21500.0);
    assert!(filtered.records.iter().all(|r| r.expiry == date(2024, 1, 25)));
}

#[test]
fn atm_tie_resolves_to_lower_strike() {
    let chain = parse_chain("NIFTY", &document()).unwrap();
    // 21250 is exactly between the two strikes
    assert_eq!(chain.get_atm_strike().unwrap(), 21000.0);
}

#[test]
fn expiry_groups_cover_every_index() {
    let chain = parse_chain("NIFTY", &document()).unwrap();

    let groups = chain.group_by_expiry(50);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[&0].len(), 2);
    assert_eq!(groups[&1].len(), 1);

    // cutoff that wipes out the later expiry still leaves its slot
    let sparse = chain.group_by_expiry(1500);
    assert_eq!(sparse.len(), 2);
    assert_eq!(sparse[&0].len(), 2);
    assert!(sparse[&1].is_empty());
}

#[test]
fn strike_groups_only_contain_traded_strikes() {
    let chain = parse_chain("NIFTY", &document()).unwrap();

    let groups = chain.group_by_strike(50);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].0, 21000.0);
    assert_eq!(groups[0].1.len(), 2);
    assert_eq!(groups[1].0, 21500.0);
    assert_eq!(groups[1].1.len(), 1);

    // at cutoff 1900 only the first record survives the OI filter, so the
    // 21500 key disappears once its subset is empty
    let sparse = chain.group_by_strike(1900);
    assert_eq!(sparse.len(), 1);
    assert_eq!(sparse[0].0, 21000.0);
}

#[test]
fn regrouping_matches_direct_filter() {
    let chain = parse_chain("NIFTY", &document()).unwrap();

    let mut direct = chain.filter_by_oi(0).records;

    let mut regrouped: Vec<OptionRecord> = Vec::new();
    for (i, rows) in chain.group_by_expiry(0) {
        let expiry = chain.expiries[i];
        regrouped.extend(rows.iter().map(|row| row.with_expiry(expiry)));
    }

    let sort = |v: &mut Vec<OptionRecord>| {
        v.sort_by(|a, b| a.expiry.cmp(&b.expiry).then(a.strike.total_cmp(&b.strike)))
    };
    sort(&mut direct);
    sort(&mut regrouped);
    assert_eq!(direct, regrouped);
}

#[test]
fn summary_reports_expected_statistics() {
    let chain = parse_chain("NIFTY", &document()).unwrap();
    let summary = summarize(&chain).unwrap();

    assert_eq!(summary.symbol, "NIFTY");
    assert_eq!(summary.underlying_price, 21250.0);
    assert_eq!(summary.atm_strike, 21000.0);
    assert_eq!(summary.total_records, 3);
    assert_eq!(summary.expiries_count, 2);
    assert_eq!(summary.strikes_count, 2);
    assert_eq!(summary.total_call_oi, 3300);
    assert_eq!(summary.total_put_oi, 5000);
    assert_eq!(summary.max_call_oi_strike, 21500.0);
    assert_eq!(summary.max_put_oi_strike, 21000.0);
}

#[test]
fn malformed_document_is_rejected() {
    let err = parse_chain("NIFTY", &json!({"records": {}})).unwrap_err();
    assert!(matches!(err, ChainError::MalformedResponse(_)));

    let err = parse_chain("NIFTY", &json!({"records": {"data": []}})).unwrap_err();
    assert!(matches!(err, ChainError::EmptyChain));
}
