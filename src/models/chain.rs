use crate::error::{ChainError, Result};
use crate::models::record::{ExpiryRow, OptionRecord, StrikeRow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full option chain for one underlying at one fetch instant.
///
/// Immutable after construction: every filter or group operation returns a
/// new chain or fresh containers, never a view into this chain's storage.
/// `expiries` and `strikes` hold the distinct values present in `records`,
/// ascending. A chain produced by [`OptionChain::filter_by_oi`] keeps the
/// pre-filter universe in those two lists so callers can still index every
/// original expiry and strike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChain {
    pub symbol: String,
    pub underlying_price: f64,
    pub records: Vec<OptionRecord>,
    pub expiries: Vec<NaiveDate>,
    pub strikes: Vec<f64>,
}

impl OptionChain {
    /// Build a chain from parsed records, recomputing the distinct sorted
    /// expiry and strike lists. Fails with [`ChainError::EmptyChain`] when
    /// `records` is empty.
    pub fn new(symbol: String, underlying_price: f64, records: Vec<OptionRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(ChainError::EmptyChain);
        }

        let mut expiries: Vec<NaiveDate> = records.iter().map(|r| r.expiry).collect();
        expiries.sort();
        expiries.dedup();

        let mut strikes: Vec<f64> = records.iter().map(|r| r.strike).collect();
        strikes.sort_by(|a, b| a.total_cmp(b));
        strikes.dedup();

        Ok(Self {
            symbol,
            underlying_price,
            records,
            expiries,
            strikes,
        })
    }

    /// Strike closest to the underlying price. On an exact tie the lower
    /// strike wins, since the ascending scan only replaces the candidate on
    /// a strict improvement.
    pub fn get_atm_strike(&self) -> Result<f64> {
        let mut best: Option<f64> = None;
        let mut best_diff = f64::INFINITY;
        for &strike in &self.strikes {
            let diff = (self.underlying_price - strike).abs();
            if diff < best_diff {
                best_diff = diff;
                best = Some(strike);
            }
        }
        best.ok_or(ChainError::NoStrikes)
    }

    /// Keep records with open interest above `cutoff` on either leg.
    ///
    /// The filtered chain carries the original `expiries`/`strikes` universe
    /// unchanged; grouping iterates those lists even when the filtered data
    /// no longer touches every slot. Idempotent at a fixed cutoff.
    pub fn filter_by_oi(&self, cutoff: u64) -> OptionChain {
        let records: Vec<OptionRecord> = self
            .records
            .iter()
            .filter(|r| r.call_oi > cutoff || r.put_oi > cutoff)
            .cloned()
            .collect();

        OptionChain {
            symbol: self.symbol.clone(),
            underlying_price: self.underlying_price,
            records,
            expiries: self.expiries.clone(),
            strikes: self.strikes.clone(),
        }
    }

    /// Group the OI-filtered records by expiry, keyed by the zero-based
    /// position of the expiry in ascending order (0 = nearest expiry).
    ///
    /// Every index in `0..expiries.len()` is present, with an empty vector
    /// when the filter left nothing at that expiry, so positional access
    /// stays valid after aggressive filtering.
    pub fn group_by_expiry(&self, cutoff: u64) -> BTreeMap<usize, Vec<ExpiryRow>> {
        let filtered = self.filter_by_oi(cutoff);
        let mut groups = BTreeMap::new();
        for (i, &expiry) in self.expiries.iter().enumerate() {
            let rows: Vec<ExpiryRow> = filtered
                .records
                .iter()
                .filter(|r| r.expiry == expiry)
                .map(ExpiryRow::from)
                .collect();
            groups.insert(i, rows);
        }
        groups
    }

    /// Group the OI-filtered records by strike, ascending, additionally
    /// dropping rows where either leg never traded (last price exactly 0).
    ///
    /// Strikes whose subset ends up empty are omitted entirely; callers
    /// check membership before plotting a term structure.
    pub fn group_by_strike(&self, cutoff: u64) -> Vec<(f64, Vec<StrikeRow>)> {
        let filtered = self.filter_by_oi(cutoff);
        let mut groups = Vec::new();
        for &strike in &self.strikes {
            let rows: Vec<StrikeRow> = filtered
                .records
                .iter()
                .filter(|r| r.strike == strike && r.call_ltp > 0.0 && r.put_ltp > 0.0)
                .map(StrikeRow::from)
                .collect();
            if !rows.is_empty() {
                groups.push((strike, rows));
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(
        expiry: NaiveDate,
        strike: f64,
        call_oi: u64,
        put_oi: u64,
        call_ltp: f64,
        put_ltp: f64,
    ) -> OptionRecord {
        OptionRecord {
            expiry,
            strike,
            call_oi,
            call_coi: 10,
            call_iv: 15.5,
            call_ltp,
            put_oi,
            put_coi: -5,
            put_iv: 16.0,
            put_ltp,
        }
    }

    fn sample_chain() -> OptionChain {
        let a = date(2024, 1, 25);
        let b = date(2024, 2, 29);
        OptionChain::new(
            "NIFTY".to_string(),
            21250.0,
            vec![
                record(a, 21000.0, 1000, 2000, 250.0, 180.0),
                record(a, 21500.0, 1500, 1800, 120.0, 310.0),
                record(b, 21000.0, 800, 1200, 420.0, 0.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_construction_derives_sorted_universe() {
        let chain = sample_chain();
        assert_eq!(chain.expiries, vec![date(2024, 1, 25), date(2024, 2, 29)]);
        assert_eq!(chain.strikes, vec![21000.0, 21500.0]);
    }

    #[test]
    fn test_empty_records_rejected() {
        let err = OptionChain::new("NIFTY".to_string(), 21250.0, vec![]).unwrap_err();
        assert!(matches!(err, ChainError::EmptyChain));
    }

    #[test]
    fn test_atm_strike_tie_takes_lower() {
        // 21250 is equidistant from 21000 and 21500
        let chain = sample_chain();
        assert_eq!(chain.get_atm_strike().unwrap(), 21000.0);
    }

    #[test]
    fn test_atm_strike_nearest() {
        let mut chain = sample_chain();
        chain.underlying_price = 21400.0;
        assert_eq!(chain.get_atm_strike().unwrap(), 21500.0);
    }

    #[test]
    fn test_atm_strike_empty_universe() {
        let mut chain = sample_chain();
        chain.strikes.clear();
        assert!(matches!(chain.get_atm_strike(), Err(ChainError::NoStrikes)));
    }

    #[test]
    fn test_filter_by_oi_strictly_greater() {
        let chain = sample_chain();
        assert_eq!(chain.filter_by_oi(50).records.len(), 3);

        // call=1500 is not > 1500; record 2 survives on its put leg only
        let high = chain.filter_by_oi(1500);
        assert_eq!(high.records.len(), 2);
        assert!(high.records.iter().all(|r| r.put_oi > 1500));
    }

    #[test]
    fn test_filter_keeps_original_universe() {
        let chain = sample_chain();
        let filtered = chain.filter_by_oi(1500);
        assert_eq!(filtered.symbol, chain.symbol);
        assert_eq!(filtered.underlying_price, chain.underlying_price);
        assert_eq!(filtered.expiries, chain.expiries);
        assert_eq!(filtered.strikes, chain.strikes);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let chain = sample_chain();
        let once = chain.filter_by_oi(1500);
        let twice = once.filter_by_oi(1500);
        assert_eq!(once.records, twice.records);
        assert_eq!(once.expiries, twice.expiries);
        assert_eq!(once.strikes, twice.strikes);
    }

    #[test]
    fn test_group_by_expiry_has_all_indices() {
        let chain = sample_chain();
        // cutoff high enough to empty the later expiry (max OI there is 1200)
        let groups = chain.group_by_expiry(1700);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&0].len(), 2);
        assert!(groups[&1].is_empty());
    }

    #[test]
    fn test_group_by_expiry_drops_expiry_field() {
        let chain = sample_chain();
        let groups = chain.group_by_expiry(0);
        assert_eq!(groups[&0].len(), 2);
        assert_eq!(groups[&0][0].strike, 21000.0);
        assert_eq!(groups[&1].len(), 1);
    }

    #[test]
    fn test_group_by_strike_drops_untraded_rows() {
        let chain = sample_chain();
        let groups = chain.group_by_strike(0);
        // the expiry-B record at 21000 has put_ltp == 0 and is dropped
        let at_21000 = groups.iter().find(|(s, _)| *s == 21000.0).unwrap();
        assert_eq!(at_21000.1.len(), 1);
        assert_eq!(at_21000.1[0].expiry, date(2024, 1, 25));
    }

    #[test]
    fn test_group_by_strike_omits_empty_strikes() {
        let mut chain = sample_chain();
        for r in &mut chain.records {
            if r.strike == 21500.0 {
                r.call_ltp = 0.0;
            }
        }
        let groups = chain.group_by_strike(0);
        assert!(groups.iter().all(|(s, _)| *s != 21500.0));
    }

    #[test]
    fn test_group_by_strike_ascending_keys() {
        let chain = sample_chain();
        let groups = chain.group_by_strike(0);
        let keys: Vec<f64> = groups.iter().map(|(s, _)| *s).collect();
        let mut sorted = keys.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_regroup_round_trip_matches_filter() {
        let chain = sample_chain();
        let mut direct = chain.filter_by_oi(0).records;

        let mut regrouped: Vec<OptionRecord> = Vec::new();
        for (i, rows) in chain.group_by_expiry(0) {
            let expiry = chain.expiries[i];
            regrouped.extend(rows.iter().map(|row| row.with_expiry(expiry)));
        }

        let key = |r: &OptionRecord| (r.expiry, r.strike);
        direct.sort_by(|a, b| key(a).0.cmp(&key(b).0).then(a.strike.total_cmp(&b.strike)));
        regrouped.sort_by(|a, b| key(a).0.cmp(&key(b).0).then(a.strike.total_cmp(&b.strike)));
        assert_eq!(direct, regrouped);
    }
}
