use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One strike/expiry pair's two-sided market snapshot.
///
/// A leg (call or put) that was absent from the source payload is carried as
/// all-zero fields, never as a missing record, so consumers can treat every
/// record as fully populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRecord {
    pub expiry: NaiveDate,
    pub strike: f64,
    pub call_oi: u64,
    pub call_coi: i64,
    pub call_iv: f64,
    pub call_ltp: f64,
    pub put_oi: u64,
    pub put_coi: i64,
    pub put_iv: f64,
    pub put_ltp: f64,
}

/// Projection of an [`OptionRecord`] inside an expiry group: the expiry is
/// constant within the group and is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiryRow {
    pub strike: f64,
    pub call_oi: u64,
    pub call_coi: i64,
    pub call_iv: f64,
    pub call_ltp: f64,
    pub put_oi: u64,
    pub put_coi: i64,
    pub put_iv: f64,
    pub put_ltp: f64,
}

impl ExpiryRow {
    /// Re-attach the expiry dropped by the grouping projection.
    pub fn with_expiry(&self, expiry: NaiveDate) -> OptionRecord {
        OptionRecord {
            expiry,
            strike: self.strike,
            call_oi: self.call_oi,
            call_coi: self.call_coi,
            call_iv: self.call_iv,
            call_ltp: self.call_ltp,
            put_oi: self.put_oi,
            put_coi: self.put_coi,
            put_iv: self.put_iv,
            put_ltp: self.put_ltp,
        }
    }
}

impl From<&OptionRecord> for ExpiryRow {
    fn from(r: &OptionRecord) -> Self {
        Self {
            strike: r.strike,
            call_oi: r.call_oi,
            call_coi: r.call_coi,
            call_iv: r.call_iv,
            call_ltp: r.call_ltp,
            put_oi: r.put_oi,
            put_coi: r.put_coi,
            put_iv: r.put_iv,
            put_ltp: r.put_ltp,
        }
    }
}

/// Projection of an [`OptionRecord`] inside a strike group: the strike is
/// constant within the group and is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeRow {
    pub expiry: NaiveDate,
    pub call_oi: u64,
    pub call_coi: i64,
    pub call_iv: f64,
    pub call_ltp: f64,
    pub put_oi: u64,
    pub put_coi: i64,
    pub put_iv: f64,
    pub put_ltp: f64,
}

impl StrikeRow {
    /// Re-attach the strike dropped by the grouping projection.
    pub fn with_strike(&self, strike: f64) -> OptionRecord {
        OptionRecord {
            expiry: self.expiry,
            strike,
            call_oi: self.call_oi,
            call_coi: self.call_coi,
            call_iv: self.call_iv,
            call_ltp: self.call_ltp,
            put_oi: self.put_oi,
            put_coi: self.put_coi,
            put_iv: self.put_iv,
            put_ltp: self.put_ltp,
        }
    }
}

impl From<&OptionRecord> for StrikeRow {
    fn from(r: &OptionRecord) -> Self {
        Self {
            expiry: r.expiry,
            call_oi: r.call_oi,
            call_coi: r.call_coi,
            call_iv: r.call_iv,
            call_ltp: r.call_ltp,
            put_oi: r.put_oi,
            put_coi: r.put_coi,
            put_iv: r.put_iv,
            put_ltp: r.put_ltp,
        }
    }
}
