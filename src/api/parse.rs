use crate::error::{ChainError, Result};
use crate::models::{OptionChain, OptionRecord};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

/// NSE serves expiries as `29-Aug-2026`; ISO dates are accepted as a
/// fallback for archived payloads.
const EXPIRY_FORMATS: [&str; 2] = ["%d-%b-%Y", "%Y-%m-%d"];

/// One side of a strike/expiry row after zero-defaulting.
struct Leg {
    oi: u64,
    coi: i64,
    iv: f64,
    ltp: f64,
    underlying: Option<f64>,
}

impl Leg {
    fn zero() -> Self {
        Self {
            oi: 0,
            coi: 0,
            iv: 0.0,
            ltp: 0.0,
            underlying: None,
        }
    }
}

/// An absent, null, or non-object leg becomes a zero leg. A leg object with
/// missing sub-fields is still a valid leg; each numeric field defaults to 0
/// on its own.
fn parse_leg(value: Option<&Value>) -> Leg {
    let obj = match value.and_then(Value::as_object) {
        Some(obj) => obj,
        None => return Leg::zero(),
    };

    Leg {
        oi: obj.get("openInterest").and_then(Value::as_u64).unwrap_or(0),
        coi: obj
            .get("changeinOpenInterest")
            .and_then(Value::as_i64)
            .unwrap_or(0),
        iv: obj
            .get("impliedVolatility")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        ltp: obj.get("lastPrice").and_then(Value::as_f64).unwrap_or(0.0),
        underlying: obj.get("underlyingValue").and_then(Value::as_f64),
    }
}

fn parse_expiry(raw: &str) -> Result<NaiveDate> {
    for fmt in EXPIRY_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(date);
        }
    }
    Err(ChainError::MalformedResponse(format!(
        "unparsable expiry date: {}",
        raw
    )))
}

/// Flatten one raw NSE option-chain document into an [`OptionChain`].
///
/// Records keep the input order and the output count equals the input row
/// count exactly. The underlying price is taken from the first row carrying
/// an `underlyingValue`, put leg checked before call leg; later sightings
/// are ignored.
pub fn parse_chain(symbol: &str, document: &Value) -> Result<OptionChain> {
    let rows = document
        .pointer("/records/data")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ChainError::MalformedResponse("missing records.data container".to_string())
        })?;

    let mut records = Vec::with_capacity(rows.len());
    let mut underlying_price = 0.0_f64;

    for row in rows {
        let strike = row
            .get("strikePrice")
            .and_then(Value::as_f64)
            .ok_or_else(|| ChainError::MalformedResponse("row missing strikePrice".to_string()))?;
        let expiry_raw = row
            .get("expiryDate")
            .and_then(Value::as_str)
            .ok_or_else(|| ChainError::MalformedResponse("row missing expiryDate".to_string()))?;
        let expiry = parse_expiry(expiry_raw)?;

        let put = parse_leg(row.get("PE"));
        let call = parse_leg(row.get("CE"));

        if underlying_price == 0.0 {
            if let Some(value) = put.underlying.or(call.underlying) {
                underlying_price = value;
            }
        }

        records.push(OptionRecord {
            expiry,
            strike,
            call_oi: call.oi,
            call_coi: call.coi,
            call_iv: call.iv,
            call_ltp: call.ltp,
            put_oi: put.oi,
            put_coi: put.coi,
            put_iv: put.iv,
            put_ltp: put.ltp,
        });
    }

    debug!("parsed {} option records for {}", records.len(), symbol);
    OptionChain::new(symbol.to_string(), underlying_price, records)
}
