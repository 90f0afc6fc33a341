//! Reshapes the upstream response envelope into [`Outcome`].
//!
//! Upstream shapes that vary (a single object or an array, a string or a
//! list of error objects) are captured by untagged enums right here and
//! turned into lists before anything else looks at them.

use crate::types::{Money, Outcome, RateEntry, TransitTime};
use log::warn;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub response: ResponseBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(default)]
    pub errors: Option<OneOrMany<ErrorItem>>,
    #[serde(default)]
    pub estimated_freight_rates: Option<EstimatedFreightRates>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorItem {
    Text(String),
    Object { error: String },
}

impl ErrorItem {
    fn into_message(self) -> String {
        match self {
            ErrorItem::Text(s) | ErrorItem::Object { error: s } => s,
        }
    }
}

// numQuotes has been seen both as a number and as a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Count {
    Num(u32),
    Text(String),
}

impl Count {
    fn value(&self) -> Option<u32> {
        match self {
            Count::Num(n) => Some(*n),
            Count::Text(s) => s.trim().parse().ok(),
        }
    }
}

// Amounts and transit days arrive as numbers or as numeric strings ("950.00").
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Num(f64),
    Text(String),
}

impl Number {
    fn value(&self) -> Option<f64> {
        let n = match self {
            Number::Num(n) => Some(*n),
            Number::Text(s) => s.trim().parse::<f64>().ok(),
        };
        n.filter(|n| n.is_finite())
    }
}

fn number(n: Option<Number>) -> Option<f64> {
    n.as_ref().and_then(Number::value)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedFreightRates {
    #[serde(default)]
    pub num_quotes: Option<Count>,
    #[serde(default)]
    pub mode: Option<OneOrMany<RawMode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub price: Option<RawPrice>,
    #[serde(default)]
    pub transit_times: Option<RawTransit>,
}

#[derive(Debug, Deserialize)]
pub struct RawPrice {
    #[serde(default)]
    pub min: Option<RawBound>,
    #[serde(default)]
    pub max: Option<RawBound>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBound {
    pub money_amount: Option<RawMoney>,
}

#[derive(Debug, Deserialize)]
pub struct RawMoney {
    #[serde(default)]
    pub amount: Option<Number>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawTransit {
    #[serde(default)]
    pub min: Option<Number>,
    #[serde(default)]
    pub max: Option<Number>,
    #[serde(default)]
    pub unit: Option<String>,
}

// A bound without a usable amount is dropped; the rest of the entry survives.
fn money(bound: Option<RawBound>) -> Option<Money> {
    let m = bound?.money_amount?;
    Some(Money {
        amount: number(m.amount)?,
        currency: m.currency.filter(|c| !c.trim().is_empty()),
    })
}

fn rate_entry(raw: RawMode) -> RateEntry {
    let (min_price, max_price) = match raw.price {
        Some(p) => (money(p.min), money(p.max)),
        None => (None, None),
    };
    let transit_time = match raw.transit_times {
        Some(t) => TransitTime {
            min: number(t.min),
            max: number(t.max),
            unit: t.unit,
        },
        None => TransitTime {
            min: None,
            max: None,
            unit: None,
        },
    };
    RateEntry {
        mode: raw.name.or(raw.mode).unwrap_or_default(),
        min_price,
        max_price,
        transit_time,
    }
}

pub fn normalize(envelope: Envelope) -> Outcome {
    let body = envelope.response;
    if let Some(errors) = body.errors {
        let errors: Vec<String> = errors
            .into_vec()
            .into_iter()
            .map(ErrorItem::into_message)
            .filter(|m| !m.trim().is_empty())
            .collect();
        if !errors.is_empty() {
            return Outcome::Error { errors };
        }
    }
    let Some(rates) = body.estimated_freight_rates else {
        warn!("upstream response carried neither errors nor estimatedFreightRates");
        return Outcome::no_rates();
    };
    let declared = rates.num_quotes.as_ref().and_then(Count::value);
    let modes = rates.mode.map(OneOrMany::into_vec).unwrap_or_default();
    if declared == Some(0) || modes.is_empty() {
        return Outcome::no_rates();
    }
    let rates: Vec<RateEntry> = modes.into_iter().map(rate_entry).collect();
    Outcome::Rates {
        num_quotes: declared.unwrap_or(rates.len() as u32),
        rates,
    }
}

/// Parse and normalize a raw response body.
pub fn normalize_json(body: &str) -> Result<Outcome, serde_json::Error> {
    let envelope: Envelope = serde_json::from_str(body)?;
    Ok(normalize(envelope))
}
