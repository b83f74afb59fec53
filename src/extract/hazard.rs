//! Avalanche bulletin parsing with layered fallbacks.
//!
//! Tier 1 parses the JSON-like object embedded in the bulletin page's
//! script block. Tier 2 falls back to coarse regex extraction of a level
//! marker and a date. If both fail the result is "no report"; a danger
//! level is never fabricated.

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use crate::confidence::Confidence;
use crate::types::{AltitudeBand, Aspect, HazardReport, Trend};

/// Region families the bulletin source covers. Anything else must get
/// "no report" without a fetch being attempted.
const COVERED_REGIONS: [&str; 7] = [
    "allgäu",
    "allgaeu",
    "ammergau",
    "werdenfels",
    "voralpen",
    "chiemgau",
    "berchtesgaden",
];

/// Problem code vocabulary used by the bulletin. Unknown codes are dropped.
const PROBLEM_CODES: [(i64, &str); 5] = [
    (1, "new snow"),
    (2, "wind-drifted snow"),
    (3, "persistent weak layer"),
    (4, "wet snow"),
    (5, "gliding snow"),
];

pub fn covered_region(region: &str) -> bool {
    let lower = region.to_lowercase();
    COVERED_REGIONS.iter().any(|r| lower.contains(r))
}

/// Parse a bulletin page. Returns `None` when no report can be extracted.
pub fn parse_bulletin(html: &str, source: &str) -> Option<HazardReport> {
    if let Some(report) = parse_structured(html, source) {
        return Some(report);
    }
    parse_fallback(html, source)
}

/// Tier 1: locate and parse the embedded structured-data object.
fn parse_structured(html: &str, source: &str) -> Option<HazardReport> {
    let object = extract_embedded_object(html, "\"mst\"")?;
    let value: Value = serde_json::from_str(&object).ok()?;

    let mst = value.get("mst")?;
    let raw_level = mst.get("lev")?.as_i64()?;
    let danger_level = raw_level.clamp(1, 5) as u8;

    let trend = mst
        .get("tnd")
        .and_then(Value::as_i64)
        .map(trend_from_tendency)
        .or_else(|| trend_from_history(value.get("history")))
        .unwrap_or(Trend::Stable);

    let mut problem_aspects = Vec::new();
    let mut problems = Vec::new();
    let mut altitude_band = None;
    for period in ["am", "pm"] {
        let Some(block) = value.get(period) else {
            continue;
        };
        merge_aspects(&mut problem_aspects, block);
        merge_problems(&mut problems, block.get("prb"));
        if altitude_band.is_none() {
            altitude_band = band_from_period(block);
        }
    }

    let valid_date = mst
        .get("date")
        .and_then(Value::as_str)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

    Some(HazardReport {
        danger_level,
        trend,
        problem_aspects,
        altitude_band: altitude_band.unwrap_or_else(AltitudeBand::above_treeline),
        problems,
        valid_date,
        issued_at: None,
        source: source.to_string(),
        confidence: Confidence::scraped(source, bulletin_datetime(valid_date), None),
    })
}

/// Treat the bulletin's validity date as its publication moment for
/// ageing purposes.
fn bulletin_datetime(valid_date: Option<NaiveDate>) -> Option<chrono::DateTime<chrono::Utc>> {
    valid_date
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn trend_from_tendency(tendency: i64) -> Trend {
    match tendency {
        t if t > 0 => Trend::Increasing,
        t if t < 0 => Trend::Decreasing,
        _ => Trend::Stable,
    }
}

/// Derive the trend by comparing the last two entries of the historical
/// level series.
fn trend_from_history(history: Option<&Value>) -> Option<Trend> {
    let entries = history?.as_array()?;
    if entries.len() < 2 {
        return None;
    }
    let previous = entries[entries.len() - 2].get("lev")?.as_i64()?;
    let latest = entries[entries.len() - 1].get("lev")?.as_i64()?;

    Some(match latest.cmp(&previous) {
        std::cmp::Ordering::Greater => Trend::Increasing,
        std::cmp::Ordering::Less => Trend::Decreasing,
        std::cmp::Ordering::Equal => Trend::Stable,
    })
}

/// Map an 8-character exposure bitstring onto the compass octants, in
/// fixed N, NE, E, SE, S, SW, W, NW order.
fn aspects_from_exposure(exposure: &str) -> Vec<Aspect> {
    exposure
        .chars()
        .take(8)
        .zip(Aspect::ALL)
        .filter(|(bit, _)| *bit == '1')
        .map(|(_, aspect)| aspect)
        .collect()
}

fn merge_aspects(into: &mut Vec<Aspect>, period: &Value) {
    let Some(exposure) = period
        .pointer("/obj/upper/exp")
        .and_then(Value::as_str)
    else {
        return;
    };
    for aspect in aspects_from_exposure(exposure) {
        if !into.contains(&aspect) {
            into.push(aspect);
        }
    }
}

fn merge_problems(into: &mut Vec<String>, raw: Option<&Value>) {
    let codes: Vec<i64> = match raw {
        Some(Value::Number(n)) => n.as_i64().into_iter().collect(),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_i64).collect(),
        _ => Vec::new(),
    };

    for code in codes {
        if let Some((_, name)) = PROBLEM_CODES.iter().find(|(c, _)| *c == code) {
            if !into.iter().any(|p| p == name) {
                into.push((*name).to_string());
            }
        }
    }
}

/// Altitude band from the reported height field; the sentinel (zero or
/// negative) means "above treeline".
fn band_from_period(period: &Value) -> Option<AltitudeBand> {
    let altitude = period.pointer("/obj/upper/alt")?.as_i64()?;
    if altitude <= 0 {
        return Some(AltitudeBand::above_treeline());
    }
    Some(AltitudeBand {
        lower_m: altitude as u32,
        upper_m: 3000,
    })
}

/// Find a `= { ... }` object literal containing `marker` and return the
/// balanced-brace slice.
fn extract_embedded_object(html: &str, marker: &str) -> Option<String> {
    let marker_pos = html.find(marker)?;
    let assign = html[..marker_pos].rfind('=')?;
    let start = assign + html[assign..].find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in html[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(html[start..=start + offset].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Tier 2: coarse regex extraction of a `law0N` level marker and a date.
fn parse_fallback(html: &str, source: &str) -> Option<HazardReport> {
    let level_re = Regex::new(r"law0([1-5])").ok()?;
    let level: u8 = level_re.captures(html)?.get(1)?.as_str().parse().ok()?;

    let date_re = Regex::new(r"(\d{1,2})\.(\d{1,2})\.(\d{4})").ok()?;
    let valid_date = date_re.captures(html).and_then(|c| {
        NaiveDate::from_ymd_opt(
            c[3].parse().ok()?,
            c[2].parse().ok()?,
            c[1].parse().ok()?,
        )
    });

    Some(HazardReport {
        danger_level: level,
        trend: Trend::Stable,
        // Shaded northerly aspects are the conservative default when the
        // bulletin gives no exposure information.
        problem_aspects: vec![Aspect::N, Aspect::NE, Aspect::NW],
        altitude_band: AltitudeBand::above_treeline(),
        problems: Vec::new(),
        valid_date,
        issued_at: None,
        source: source.to_string(),
        confidence: Confidence::scraped(source, bulletin_datetime(valid_date), None)
            .with_notes("regex fallback extraction"),
    })
}
