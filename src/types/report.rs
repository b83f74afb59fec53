use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// A structured field-condition observation extracted from unstructured
/// web text. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionReport {
    pub summary: String,
    /// Best-effort location name; "unknown" when nothing matched.
    pub location: String,
    pub report_date: Option<NaiveDate>,
    pub source_url: String,
    pub source_name: String,
    pub conditions: Vec<String>,
    pub sentiment: Sentiment,
    pub confidence: Confidence,
}
