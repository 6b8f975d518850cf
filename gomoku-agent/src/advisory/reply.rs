use super::error::AdvisoryError;
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_CONFIDENCE: f64 = 0.7;
pub const DEFAULT_REASONING: &str = "remote decision";

/// A move proposed by a remote advisor. Coordinates are not yet checked against any board.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSuggestion {
    pub x: i64,
    pub y: i64,
    pub confidence: f64,
    pub reasoning: String,
    pub alternatives: Vec<(i64, i64)>,
}

#[derive(Deserialize)]
struct RawReply {
    #[serde(rename = "move")]
    mv: Option<Value>,
    confidence: Option<Value>,
    reasoning: Option<Value>,
    alternatives: Option<Value>,
}

#[derive(Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

impl RawPoint {
    fn integral(&self) -> Option<(i64, i64)> {
        let is_integral = |v: f64| v.is_finite() && v.fract() == 0.0;
        (is_integral(self.x) && is_integral(self.y)).then_some((self.x as i64, self.y as i64))
    }
}

fn point(value: Value) -> Option<(i64, i64)> {
    serde_json::from_value::<RawPoint>(value)
        .ok()
        .and_then(|point| point.integral())
}

/// Removes markdown code fences the model may wrap its JSON in.
fn strip_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parses the advisor's answer into a suggestion.
///
/// The answer is a JSON object `{"move":{"x":..,"y":..},"confidence":..,"reasoning":..}`,
/// optionally fenced or surrounded by prose. A missing or non-integral move is malformed.
pub fn parse_reply(text: &str) -> Result<RemoteSuggestion, AdvisoryError> {
    let stripped = strip_fences(text);
    let raw: RawReply = match serde_json::from_str(stripped) {
        Ok(raw) => raw,
        Err(err) => match (stripped.find('{'), stripped.rfind('}')) {
            (Some(begin), Some(end)) if begin < end => serde_json::from_str(&stripped[begin..=end])?,
            _ => return Err(err.into()),
        },
    };

    let (x, y) = raw
        .mv
        .and_then(point)
        .ok_or_else(|| AdvisoryError::Malformed("reply carries no numeric move".to_owned()))?;

    Ok(RemoteSuggestion {
        x,
        y,
        confidence: raw
            .confidence
            .and_then(|c| c.as_f64())
            .filter(|c| c.is_finite() && 0.0 < *c)
            .map_or(DEFAULT_CONFIDENCE, |c| c.min(1.0)),
        reasoning: raw
            .reasoning
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REASONING)
            .to_owned(),
        alternatives: match raw.alternatives {
            Some(Value::Array(items)) => items.into_iter().filter_map(point).collect(),
            _ => vec![],
        },
    })
}
