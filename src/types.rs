use serde::{Deserialize, Serialize};

/// Snapshot of the local rolling-window quota. Computed fresh on every query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    pub percent_used: u32,
    // RFC 3339; oldest call in the window plus the window length
    pub resets_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// A structured quote request. Units are passed through to the upstream API
/// as suffixes (e.g. `500lb`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuoteRequest {
    pub origin: String,
    pub destination: String,
    pub loadtype: String,
    pub weight: f64,
    pub weight_unit: Option<String>,
    pub width: Option<f64>,
    pub length: Option<f64>,
    pub height: Option<f64>,
    pub dimension_unit: Option<String>,
    pub volume: Option<f64>,
    pub volume_unit: Option<String>,
    pub quantity: Option<u32>,
    pub mode: Option<String>,
    pub haz_code: Option<String>,
}

impl QuoteRequest {
    pub fn new(origin: &str, destination: &str, loadtype: &str, weight: f64) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            loadtype: loadtype.to_string(),
            weight,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Money {
    pub amount: f64,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitTime {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub unit: Option<String>,
}

/// One normalized rate line for a transport mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateEntry {
    pub mode: String,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub transit_time: TransitTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Outcome {
    Error { errors: Vec<String> },
    Rates { num_quotes: u32, rates: Vec<RateEntry> },
}

impl Outcome {
    pub fn no_rates() -> Self {
        Outcome::Rates {
            num_quotes: 0,
            rates: Vec::new(),
        }
    }

    pub fn errors(&self) -> Option<&[String]> {
        match self {
            Outcome::Error { errors } => Some(errors),
            Outcome::Rates { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteResult {
    #[serde(flatten)]
    pub outcome: Outcome,
    pub rate_limit: RateLimitStatus,
}
