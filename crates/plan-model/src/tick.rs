//! Raw classification ticks.
//!
//! A tick is one observation per second of source video. Tick logs are
//! stored as append-only JSONL, one [`TickRecord`] per line, with `#`
//! comment lines allowed for headers.

use serde::{Deserialize, Serialize};

/// 1-based tick sequence number.
pub type TickNumber = u64;

/// The label produced by the external vision classifier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Classification {
    /// Whether this second of video looks shaky.
    pub shaky: bool,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f64,
}

impl Classification {
    /// Build a classification, clamping the confidence into range.
    pub fn new(shaky: bool, confidence: f64) -> Self {
        Self {
            shaky,
            confidence: sanitize_confidence(confidence),
        }
    }

    /// Substituted when the upstream payload cannot be used.
    pub fn safe_default() -> Self {
        Self {
            shaky: false,
            confidence: 0.0,
        }
    }
}

/// One ingested tick. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub tick: TickNumber,

    /// Seconds since stream start, as assigned by the caller.
    pub ts: f64,

    /// Time window the classification covers.
    pub window_start: f64,
    pub window_end: f64,

    pub raw: Classification,

    /// Set when the upstream payload failed to parse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

/// What the caller hands in for each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTickInput {
    /// Authoritative timestamp; any value echoed by the classifier is ignored.
    pub ts: f64,
    pub window_start: Option<f64>,
    pub window_end: Option<f64>,
    pub payload: TickPayload,
}

/// Classification as received from upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum TickPayload {
    /// Raw text returned by the vision API, parsed on ingestion.
    Json(String),
    /// Already-decoded values.
    Classified { shaky: bool, confidence: f64 },
    /// A payload that failed to parse when first ingested.
    Rejected(String),
}

/// One line of a tick log file.
///
/// Either `shaky`/`confidence` or a `payload` string holding the raw
/// classifier response must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub ts: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shaky: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Why the original payload was replaced by the safe default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClassifierPayload {
    shaky: bool,
    #[serde(default)]
    confidence: Option<serde_json::Value>,
}

impl RawTickInput {
    /// Input with already-decoded classification values.
    pub fn classified(ts: f64, shaky: bool, confidence: f64) -> Self {
        Self {
            ts,
            window_start: None,
            window_end: None,
            payload: TickPayload::Classified { shaky, confidence },
        }
    }

    /// Input carrying the classifier's raw response text.
    pub fn from_payload(ts: f64, payload: impl Into<String>) -> Self {
        Self {
            ts,
            window_start: None,
            window_end: None,
            payload: TickPayload::Json(payload.into()),
        }
    }
}

impl From<TickRecord> for RawTickInput {
    fn from(record: TickRecord) -> Self {
        let payload = match (record.payload, record.parse_error, record.shaky) {
            (Some(text), _, _) => TickPayload::Json(text),
            (None, Some(error), _) => TickPayload::Rejected(error),
            (None, None, Some(shaky)) => TickPayload::Classified {
                shaky,
                confidence: record.confidence.unwrap_or(0.0),
            },
            (None, None, None) => TickPayload::Json(String::new()),
        };
        Self {
            ts: record.ts,
            window_start: record.window_start,
            window_end: record.window_end,
            payload,
        }
    }
}

impl From<&Tick> for TickRecord {
    fn from(tick: &Tick) -> Self {
        Self {
            ts: tick.ts,
            window_start: Some(tick.window_start),
            window_end: Some(tick.window_end),
            shaky: Some(tick.raw.shaky),
            confidence: Some(tick.raw.confidence),
            payload: None,
            parse_error: tick.parse_error.clone(),
        }
    }
}

impl Tick {
    /// Turn caller input into an immutable tick.
    ///
    /// Never fails: a malformed payload yields the safe default
    /// classification with `parse_error` recorded.
    pub fn ingest(tick: TickNumber, input: &RawTickInput) -> Self {
        let (raw, parse_error) = match &input.payload {
            TickPayload::Classified { shaky, confidence } => {
                (Classification::new(*shaky, *confidence), None)
            }
            TickPayload::Json(text) => match parse_classification(text) {
                Ok(raw) => (raw, None),
                Err(e) => (Classification::safe_default(), Some(e)),
            },
            TickPayload::Rejected(error) => (Classification::safe_default(), Some(error.clone())),
        };

        let window_end = input.window_end.unwrap_or(input.ts);
        let window_start = input
            .window_start
            .unwrap_or_else(|| (input.ts - 1.0).max(0.0));

        Self {
            tick,
            ts: input.ts,
            window_start,
            window_end,
            raw,
            parse_error,
        }
    }
}

/// Clamp a confidence into `[0, 1]`; non-finite values become `0`.
pub fn sanitize_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Parse the classifier's response text.
///
/// Accepts a bare JSON object or one wrapped in a Markdown code fence.
/// `confidence` may be a number or a numeric string; when absent it is `0`.
pub fn parse_classification(text: &str) -> Result<Classification, String> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err("empty classification payload".to_string());
    }

    let payload: ClassifierPayload =
        serde_json::from_str(body).map_err(|e| format!("invalid classification payload: {e}"))?;

    let confidence = match payload.confidence {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };

    Ok(Classification::new(payload.shaky, confidence))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop a language tag such as `json`, on its own line or inline.
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let has_tag =
        tag_len > 0 && rest[tag_len..].starts_with(|c: char| c.is_whitespace() || c == '{');
    let rest = if has_tag { &rest[tag_len..] } else { rest };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Parse tick records from JSONL content (one JSON object per line).
pub fn parse_ticks(jsonl: &str) -> Result<Vec<TickRecord>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize ingested ticks to JSONL format.
pub fn serialize_ticks(ticks: &[Tick]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for tick in ticks {
        output.push_str(&serde_json::to_string(&TickRecord::from(tick))?);
        output.push('\n');
    }
    Ok(output)
}
