use crate::types::QuoteRequest;
use thiserror::Error;

pub const DEFAULT_WEIGHT_UNIT: &str = "kg";

/// Which upstream call the parameters are for. Only the builder varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteKind {
    Quote,
    Estimate,
    /// All modes: never sends `mode`.
    Compare,
}

#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: f64 },
}

impl QuoteRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        for (field, value) in [
            ("origin", &self.origin),
            ("destination", &self.destination),
            ("loadtype", &self.loadtype),
        ] {
            if value.trim().is_empty() {
                return Err(RequestError::Missing(field));
            }
        }
        positive("weight", Some(self.weight))?;
        positive("width", self.width)?;
        positive("length", self.length)?;
        positive("height", self.height)?;
        positive("volume", self.volume)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: Option<f64>) -> Result<(), RequestError> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => {
            Err(RequestError::NotPositive { field, value: v })
        }
        _ => Ok(()),
    }
}

// `500` + Some("lb") => "500lb"; the default unit is left implicit.
fn with_unit(value: f64, unit: Option<&str>, implicit: Option<&str>) -> String {
    match unit.map(str::trim).filter(|u| !u.is_empty()) {
        Some(u) if Some(u) != implicit => format!("{}{}", value, u),
        _ => value.to_string(),
    }
}

/// Ordered query parameters for the upstream shipping calculator.
pub fn build_params(req: &QuoteRequest, kind: QuoteKind) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = vec![
        ("origin".into(), req.origin.clone()),
        ("destination".into(), req.destination.clone()),
        ("loadtype".into(), req.loadtype.clone()),
        (
            "weight".into(),
            with_unit(
                req.weight,
                req.weight_unit.as_deref(),
                Some(DEFAULT_WEIGHT_UNIT),
            ),
        ),
    ];
    let dimension_unit = req.dimension_unit.as_deref();
    for (key, value) in [
        ("width", req.width),
        ("length", req.length),
        ("height", req.height),
    ] {
        if let Some(v) = value {
            params.push((key.into(), with_unit(v, dimension_unit, None)));
        }
    }
    if let Some(v) = req.volume {
        params.push((
            "volume".into(),
            with_unit(v, req.volume_unit.as_deref(), None),
        ));
    }
    if let Some(q) = req.quantity.filter(|q| *q > 1) {
        params.push(("quantity".into(), q.to_string()));
    }
    if kind != QuoteKind::Compare {
        if let Some(mode) = &req.mode {
            params.push(("mode".into(), mode.clone()));
        }
    }
    if let Some(code) = &req.haz_code {
        params.push(("hazCode".into(), code.clone()));
    }
    if kind == QuoteKind::Estimate {
        params.push(("estimate".into(), "true".into()));
    }
    params.push(("format".into(), "json".into()));
    params
}
