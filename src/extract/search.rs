//! Web-text intel: query construction, tolerant search-result parsing,
//! filtering, relevance ranking, and per-result condition extraction.
//!
//! Extraction prefers the generative enhancement path when the LLM is
//! reachable and falls back to deterministic keyword/regex extraction
//! otherwise. A result that cannot be dated or located is kept with
//! "unknown" placeholders rather than dropped.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use futures::future::join_all;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

use crate::confidence::Confidence;
use crate::providers::llm::LlmProvider;
use crate::providers::search::SearchProvider;
use crate::types::{ConditionReport, Sentiment};

const TOURING_KEYWORDS: [&str; 9] = [
    "skitour",
    "ski tour",
    "skitouren",
    "tourenbericht",
    "splitboard",
    "skinning",
    "skin track",
    "aufstieg",
    "couloir",
];

const TRIP_REPORT_KEYWORDS: [&str; 6] = [
    "trip report",
    "conditions report",
    "bericht",
    "verhältnisse",
    "gipfel",
    "summit",
];

const SNOW_KEYWORDS: [&str; 7] = [
    "snow", "schnee", "powder", "pulver", "firn", "harsch", "crust",
];

const COMMERCIAL_KEYWORDS: [&str; 8] = [
    "ski pass",
    "skipass",
    "lift ticket",
    "liftticket",
    "ski school",
    "skischule",
    "hotel",
    "apartment",
];

const LODGING_KEYWORDS: [&str; 5] = ["hotel", "apartment", "booking", "unterkunft", "pension"];

const TRUSTED_DOMAINS: [&str; 6] = [
    "hikr.org",
    "gipfelbuch.ch",
    "alpenvereinaktiv.com",
    "camptocamp.org",
    "powderguide.com",
    "outdooractive.com",
];

const DENYLIST_DOMAINS: [&str; 6] = [
    "booking.com",
    "tripadvisor.",
    "airbnb.",
    "expedia.",
    "hotels.com",
    "amazon.",
];

const TOURING_WEIGHT: i32 = 10;
const TRIP_REPORT_WEIGHT: i32 = 5;
const SNOW_WEIGHT: i32 = 2;
const TRUSTED_DOMAIN_BONUS: i32 = 8;
const CURRENT_YEAR_BONUS: i32 = 3;
const LODGING_PENALTY: i32 = 6;
const MIN_RELEVANCE_SCORE: i32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct RawSearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl RawSearchResult {
    fn text(&self) -> String {
        format!("{} {}", self.title, self.snippet).to_lowercase()
    }
}

#[derive(Debug)]
pub struct IntelRequest {
    pub region: String,
    pub locations: Vec<String>,
    pub limit: usize,
}

/// Location-specific queries when one or two locations are targeted,
/// broader region and seasonal queries otherwise.
pub fn build_queries(region: &str, locations: &[String], today: NaiveDate) -> Vec<String> {
    if !locations.is_empty() && locations.len() <= 2 {
        return locations
            .iter()
            .flat_map(|location| {
                vec![
                    format!("{} skitour verhältnisse", location),
                    format!("{} ski tour conditions trip report", location),
                ]
            })
            .collect();
    }

    let month = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ][today.month0() as usize];

    vec![
        format!("skitour bedingungen {} {} {}", region, month, today.year()),
        format!("{} ski touring conditions report {}", region, today.year()),
        format!("{} tourenverhältnisse lawinenlage", region),
    ]
}

enum StrategyOutcome {
    Matched(Vec<RawSearchResult>),
    NoMatch,
}

/// Parse a search-results page. The markup is not guaranteed stable, so
/// an ordered list of strategies is tried until one matches.
pub fn parse_results(html: &str) -> Vec<RawSearchResult> {
    let strategies: [fn(&str) -> StrategyOutcome; 2] =
        [result_class_strategy, generic_anchor_strategy];

    for strategy in strategies {
        if let StrategyOutcome::Matched(results) = strategy(html) {
            return results;
        }
    }
    Vec::new()
}

/// Primary strategy: anchor/snippet pairs marked with `result__a` and
/// `result__snippet` classes.
fn result_class_strategy(html: &str) -> StrategyOutcome {
    let anchor_re = Regex::new(
        r#"(?s)<a[^>]*class="[^"]*result__a[^"]*"[^>]*href="([^"]+)"[^>]*>(.*?)</a>"#,
    )
    .unwrap();
    let snippet_re =
        Regex::new(r#"(?s)class="[^"]*result__snippet[^"]*"[^>]*>(.*?)</"#).unwrap();

    let snippets: Vec<String> = snippet_re
        .captures_iter(html)
        .map(|c| clean_fragment(&c[1]))
        .collect();

    let results: Vec<RawSearchResult> = anchor_re
        .captures_iter(html)
        .enumerate()
        .filter_map(|(index, c)| {
            let url = unwrap_redirect(&c[1]);
            let title = clean_fragment(&c[2]);
            let snippet = snippets.get(index).cloned().unwrap_or_default();
            if url.is_empty() && snippet.is_empty() {
                return None;
            }
            Some(RawSearchResult {
                title,
                url,
                snippet,
            })
        })
        .collect();

    if results.is_empty() {
        StrategyOutcome::NoMatch
    } else {
        StrategyOutcome::Matched(results)
    }
}

/// Last-resort strategy: any external anchor with a title-sized text.
fn generic_anchor_strategy(html: &str) -> StrategyOutcome {
    let anchor_re = Regex::new(r#"(?s)<a[^>]*href="(https?://[^"]+)"[^>]*>(.*?)</a>"#).unwrap();

    let results: Vec<RawSearchResult> = anchor_re
        .captures_iter(html)
        .filter_map(|c| {
            let title = clean_fragment(&c[2]);
            if title.len() < 15 {
                return None;
            }
            Some(RawSearchResult {
                title,
                url: c[1].to_string(),
                snippet: String::new(),
            })
        })
        .collect();

    if results.is_empty() {
        StrategyOutcome::NoMatch
    } else {
        StrategyOutcome::Matched(results)
    }
}

fn clean_fragment(fragment: &str) -> String {
    let stripped = Regex::new(r"<[^>]+>")
        .unwrap()
        .replace_all(fragment, " ")
        .to_string();
    let decoded = html_escape::decode_html_entities(&stripped).to_string();
    Regex::new(r"\s+")
        .unwrap()
        .replace_all(&decoded, " ")
        .trim()
        .to_string()
}

/// Unwrap tracking-redirect URLs of the form `…/l/?uddg=<encoded>`.
fn unwrap_redirect(url: &str) -> String {
    let Some(pos) = url.find("uddg=") else {
        return url.to_string();
    };
    let encoded = &url[pos + 5..];
    let encoded = encoded.split('&').next().unwrap_or(encoded);
    percent_decode(encoded)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Byte-wise percent decoding. Operates on raw bytes so a `%` followed
/// by multibyte UTF-8 passes through untouched instead of panicking on
/// a char boundary.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).to_string()
}

/// Exact-URL deduplication, order-preserving and idempotent.
pub fn dedup_by_url(results: Vec<RawSearchResult>) -> Vec<RawSearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.url.clone()))
        .collect()
}

/// Two-sided filter: denylisted domains are dropped outright; commercial
/// or lift-operation results are dropped unless the text is also
/// touring-specific.
pub fn passes_filters(result: &RawSearchResult) -> bool {
    let url = result.url.to_lowercase();
    if DENYLIST_DOMAINS.iter().any(|d| url.contains(d)) {
        return false;
    }

    let text = result.text();
    let commercial = COMMERCIAL_KEYWORDS.iter().any(|k| text.contains(k));
    let touring = TOURING_KEYWORDS.iter().any(|k| text.contains(k));
    !(commercial && !touring)
}

/// Weighted keyword relevance. Touring terms dominate, trip-report terms
/// come next, generic snow terms least; trusted domains and the current
/// year add fixed bonuses, lodging terms subtract.
pub fn relevance_score(result: &RawSearchResult, current_year: i32) -> i32 {
    let text = result.text();
    let url = result.url.to_lowercase();
    let mut score = 0;

    score += TOURING_KEYWORDS
        .iter()
        .filter(|k| text.contains(*k))
        .count() as i32
        * TOURING_WEIGHT;
    score += TRIP_REPORT_KEYWORDS
        .iter()
        .filter(|k| text.contains(*k))
        .count() as i32
        * TRIP_REPORT_WEIGHT;
    score += SNOW_KEYWORDS.iter().filter(|k| text.contains(*k)).count() as i32 * SNOW_WEIGHT;

    if TRUSTED_DOMAINS.iter().any(|d| url.contains(d)) {
        score += TRUSTED_DOMAIN_BONUS;
    }
    if text.contains(&current_year.to_string()) {
        score += CURRENT_YEAR_BONUS;
    }
    score -= LODGING_KEYWORDS.iter().filter(|k| text.contains(*k)).count() as i32
        * LODGING_PENALTY;

    score
}

/// Score, drop sub-threshold results, sort descending, truncate.
pub fn rank_results(
    results: Vec<RawSearchResult>,
    limit: usize,
    current_year: i32,
) -> Vec<RawSearchResult> {
    let mut scored: Vec<(i32, RawSearchResult)> = results
        .into_iter()
        .map(|r| (relevance_score(&r, current_year), r))
        .filter(|(score, _)| *score >= MIN_RELEVANCE_SCORE)
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, r)| r).collect()
}

const SNOW_TYPE_TABLE: [(&[&str], &str); 6] = [
    (&["powder", "pulver", "neuschnee"], "powder"),
    (&["firn", "corn snow"], "firn"),
    (&["bruchharsch"], "breakable crust"),
    (&["harsch", "crust"], "crust"),
    (&["sulz", "slush"], "slush"),
    (&["icy", "vereist", "eisig"], "ice"),
];

const HAZARD_TABLE: [(&[&str], &str); 4] = [
    (&["lawine", "avalanche"], "avalanche activity"),
    (&["triebschnee", "wind slab"], "wind slab"),
    (&["wumm", "whumpf", "settling"], "settlement noises"),
    (&["shooting crack", "cracking", "risse"], "shooting cracks"),
];

const POSITIVE_WORDS: [&str; 8] = [
    "great", "excellent", "perfect", "lohnend", "traum", "super", "genial", "good",
];

const NEGATIVE_WORDS: [&str; 8] = [
    "bad",
    "poor",
    "dangerous",
    "schlecht",
    "gefährlich",
    "abgeblasen",
    "avoid",
    "warning",
];

fn keyword_conditions(text: &str) -> Vec<String> {
    let mut conditions = Vec::new();
    for (needles, label) in SNOW_TYPE_TABLE {
        if needles.iter().any(|n| text.contains(n)) {
            conditions.push(label.to_string());
        }
    }
    for (needles, label) in HAZARD_TABLE {
        if needles.iter().any(|n| text.contains(n)) {
            conditions.push(label.to_string());
        }
    }
    conditions
}

fn sentiment_of(text: &str) -> Sentiment {
    let positive = POSITIVE_WORDS.iter().filter(|w| text.contains(*w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| text.contains(*w)).count();

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

/// Best-effort date extraction with relative-date handling.
pub fn parse_report_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if text.contains("today") || text.contains("heute") {
        return Some(today);
    }
    if text.contains("yesterday") || text.contains("gestern") {
        return Some(today - Duration::days(1));
    }

    let iso_re = Regex::new(r"(\d{4})-(\d{2})-(\d{2})").unwrap();
    if let Some(c) = iso_re.captures(text) {
        return NaiveDate::from_ymd_opt(
            c[1].parse().ok()?,
            c[2].parse().ok()?,
            c[3].parse().ok()?,
        );
    }

    let german_re = Regex::new(r"(\d{1,2})\.(\d{1,2})\.(\d{4})").unwrap();
    if let Some(c) = german_re.captures(text) {
        return NaiveDate::from_ymd_opt(
            c[3].parse().ok()?,
            c[2].parse().ok()?,
            c[1].parse().ok()?,
        );
    }
    None
}

fn match_location(text: &str, region: &str, locations: &[String]) -> String {
    for location in locations {
        if text.contains(&location.to_lowercase()) {
            return location.clone();
        }
    }
    if text.contains(&region.to_lowercase()) {
        return region.to_string();
    }
    "unknown".to_string()
}

fn domain_of(url: &str) -> String {
    url.trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .split('/')
        .next()
        .unwrap_or("unknown")
        .to_string()
}

/// Deterministic extraction path. Never fails; missing facts become
/// "unknown" placeholders.
pub fn extract_report_fallback(
    result: &RawSearchResult,
    request: &IntelRequest,
    today: NaiveDate,
) -> ConditionReport {
    let text = result.text();
    let report_date = parse_report_date(&text, today);

    ConditionReport {
        summary: if result.snippet.is_empty() {
            result.title.clone()
        } else {
            result.snippet.clone()
        },
        location: match_location(&text, &request.region, &request.locations),
        report_date,
        source_url: result.url.clone(),
        source_name: domain_of(&result.url),
        conditions: keyword_conditions(&text),
        sentiment: sentiment_of(&text),
        confidence: Confidence::search(
            &domain_of(&result.url),
            None,
            Some(result.url.clone()),
        ),
    }
}

fn extraction_prompt(result: &RawSearchResult) -> String {
    format!(
        "Extract backcountry ski conditions from this search result.\n\
         Title: {}\nSnippet: {}\n\n\
         Respond with only a JSON object with keys: summary (string), \
         location (string or \"unknown\"), date (YYYY-MM-DD or null), \
         conditions (array of short strings), sentiment (\"positive\", \
         \"neutral\" or \"negative\").",
        result.title, result.snippet
    )
}

/// Parse and validate the LLM payload. Any missing required field is a
/// validation failure and sends the caller to the deterministic path.
fn parse_llm_payload(response: &str) -> Option<(String, String, Option<NaiveDate>, Vec<String>, Sentiment)> {
    let trimmed = response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let value: Value = serde_json::from_str(trimmed).ok()?;

    let summary = value.get("summary")?.as_str()?.trim().to_string();
    if summary.is_empty() {
        return None;
    }
    let sentiment = match value.get("sentiment")?.as_str()? {
        "positive" => Sentiment::Positive,
        "negative" => Sentiment::Negative,
        "neutral" => Sentiment::Neutral,
        _ => return None,
    };

    let location = value
        .get("location")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let date = value
        .get("date")
        .and_then(Value::as_str)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
    let conditions = value
        .get("conditions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some((summary, location, date, conditions, sentiment))
}

async fn extract_report_llm(
    llm: &dyn LlmProvider,
    result: &RawSearchResult,
) -> Option<ConditionReport> {
    let response = match llm.complete(&extraction_prompt(result)).await {
        Ok(response) => response,
        Err(e) => {
            log::debug!("llm extraction failed for {}: {}", result.url, e);
            return None;
        }
    };

    let (summary, location, report_date, conditions, sentiment) =
        parse_llm_payload(&response)?;

    Some(ConditionReport {
        summary,
        location,
        report_date,
        source_url: result.url.clone(),
        source_name: domain_of(&result.url),
        conditions,
        sentiment,
        confidence: Confidence::ai_generated(
            &domain_of(&result.url),
            Some(result.url.clone()),
        ),
    })
}

/// Full intel pipeline: queries fan out concurrently and tolerate
/// individual failure; every surviving result is processed independently.
pub async fn gather_condition_reports(
    search: &dyn SearchProvider,
    llm: Option<&dyn LlmProvider>,
    request: &IntelRequest,
) -> Vec<ConditionReport> {
    let today = Utc::now().date_naive();
    let queries = build_queries(&request.region, &request.locations, today);

    let pages = join_all(queries.iter().map(|q| search.results_page(q))).await;

    let mut raw = Vec::new();
    for (query, page) in queries.iter().zip(pages) {
        match page {
            Ok(html) => raw.extend(parse_results(&html)),
            Err(e) => log::warn!("search query '{}' failed: {}", query, e),
        }
    }

    let deduped = dedup_by_url(raw);
    let filtered: Vec<RawSearchResult> =
        deduped.into_iter().filter(passes_filters).collect();
    let ranked = rank_results(filtered, request.limit, today.year());

    let llm_ready = match llm {
        Some(provider) => provider.is_available().await,
        None => false,
    };

    let extractions = ranked.iter().map(|result| async move {
        if llm_ready {
            if let Some(provider) = llm {
                if let Some(report) = extract_report_llm(provider, result).await {
                    return report;
                }
            }
        }
        extract_report_fallback(result, request, today)
    });

    join_all(extractions).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::ConfidenceLevel;
    use anyhow::Result;
    use async_trait::async_trait;

    fn result(title: &str, url: &str, snippet: &str) -> RawSearchResult {
        RawSearchResult {
            title: title.to_string(),
            url: url.to_string(),
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn test_location_specific_queries_for_few_targets() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let queries = build_queries(
            "allgäu",
            &["Nebelhorn".to_string(), "Rubihorn".to_string()],
            today,
        );
        assert_eq!(queries.len(), 4);
        assert!(queries[0].contains("Nebelhorn"));
        assert!(queries[2].contains("Rubihorn"));
    }

    #[test]
    fn test_regional_queries_for_many_targets() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let locations: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let queries = build_queries("allgäu", &locations, today);
        assert_eq!(queries.len(), 3);
        assert!(queries[0].contains("february"));
        assert!(queries[1].contains("2026"));
    }

    #[test]
    fn test_result_class_strategy_parses_pairs() {
        let html = r##"
            <div class="result">
              <a class="result__a" href="https://hikr.org/tour/1">Nebelhorn Skitour</a>
              <a class="result__snippet" href="#">Powder above 1800m, harsch below.</a>
            </div>
            <div class="result">
              <a class="result__a" href="https://example.com/2">Other tour</a>
              <a class="result__snippet" href="#">Firn in the morning.</a>
            </div>
        "##;
        let results = parse_results(html);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://hikr.org/tour/1");
        assert_eq!(results[0].snippet, "Powder above 1800m, harsch below.");
    }

    #[test]
    fn test_generic_strategy_as_fallback() {
        let html = r#"<p><a href="https://hikr.org/tour/9">A long descriptive tour title here</a></p>"#;
        let results = parse_results(html);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://hikr.org/tour/9");
        assert!(results[0].snippet.is_empty());
    }

    #[test]
    fn test_redirect_unwrapping() {
        assert_eq!(
            unwrap_redirect("//duckduckgo.com/l/?uddg=https%3A%2F%2Fhikr.org%2Ftour&rut=abc"),
            "https://hikr.org/tour"
        );
        assert_eq!(unwrap_redirect("https://plain.example/x"), "https://plain.example/x");
    }

    #[test]
    fn test_percent_decode_tolerates_multibyte_after_percent() {
        // A percent sign directly followed by multibyte UTF-8 must pass
        // through rather than crash the parse.
        assert_eq!(percent_decode("%€bad"), "%€bad");
        assert_eq!(percent_decode("a%2Fb%zz%"), "a/b%zz%");
        assert_eq!(
            unwrap_redirect("//duckduckgo.com/l/?uddg=%€&rut=abc"),
            "%€"
        );
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let results = vec![
            result("a", "https://x/1", "s"),
            result("b", "https://x/2", "s"),
            result("a dup", "https://x/1", "s"),
        ];
        let once = dedup_by_url(results);
        assert_eq!(once.len(), 2);
        let twice = dedup_by_url(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_denylist_filter() {
        let r = result("deal", "https://booking.com/hotel", "skitour special");
        assert!(!passes_filters(&r));
    }

    #[test]
    fn test_commercial_filter_is_two_sided() {
        let lift_only = result("Skipass offers", "https://resort.example", "skipass and hotel deals");
        assert!(!passes_filters(&lift_only));

        let touring_too = result(
            "Skipass and skitour info",
            "https://resort.example",
            "skitour from the valley, skipass optional",
        );
        assert!(passes_filters(&touring_too));
    }

    #[test]
    fn test_touring_term_ranks_strictly_higher() {
        let with = result("Nebelhorn skitour", "https://x/1", "fresh snow above 1800m");
        let without = result("Nebelhorn", "https://x/1", "fresh snow above 1800m");
        assert!(relevance_score(&with, 2026) > relevance_score(&without, 2026));
    }

    #[test]
    fn test_rank_drops_below_threshold_and_truncates() {
        let strong = result("skitour tourenbericht", "https://hikr.org/1", "powder schnee");
        let weak = result("weather page", "https://x/2", "no relevant terms");
        let ranked = rank_results(vec![weak, strong.clone()], 5, 2026);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0], strong);
    }

    #[test]
    fn test_relative_date_handling() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        assert_eq!(parse_report_date("skied it today", today), Some(today));
        assert_eq!(
            parse_report_date("war gestern oben", today),
            Some(today - Duration::days(1))
        );
        assert_eq!(
            parse_report_date("tour on 2026-02-08", today),
            NaiveDate::from_ymd_opt(2026, 2, 8)
        );
        assert_eq!(
            parse_report_date("am 08.02.2026 bestiegen", today),
            NaiveDate::from_ymd_opt(2026, 2, 8)
        );
        assert_eq!(parse_report_date("undated text", today), None);
    }

    #[test]
    fn test_fallback_extraction_unknown_placeholders() {
        let request = IntelRequest {
            region: "allgäu".to_string(),
            locations: vec!["Nebelhorn".to_string()],
            limit: 5,
        };
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let r = result("some tour", "https://x.example/t", "nothing datable here");
        let report = extract_report_fallback(&r, &request, today);
        assert_eq!(report.location, "unknown");
        assert!(report.report_date.is_none());
        assert_eq!(report.confidence.level, ConfidenceLevel::Unknown);
    }

    #[test]
    fn test_fallback_extraction_conditions_and_sentiment() {
        let request = IntelRequest {
            region: "allgäu".to_string(),
            locations: vec!["Nebelhorn".to_string()],
            limit: 5,
        };
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let r = result(
            "Nebelhorn Skitour heute",
            "https://hikr.org/t",
            "Excellent powder above 1800m, triebschnee near the ridge",
        );
        let report = extract_report_fallback(&r, &request, today);
        assert_eq!(report.location, "Nebelhorn");
        assert_eq!(report.report_date, Some(today));
        assert!(report.conditions.contains(&"powder".to_string()));
        assert!(report.conditions.contains(&"wind slab".to_string()));
        assert_eq!(report.sentiment, Sentiment::Positive);
    }

    #[test]
    fn test_llm_payload_validation() {
        let good = r#"{"summary":"Powder day","location":"Nebelhorn","date":"2026-02-09","conditions":["powder"],"sentiment":"positive"}"#;
        let parsed = parse_llm_payload(good).unwrap();
        assert_eq!(parsed.0, "Powder day");
        assert_eq!(parsed.4, Sentiment::Positive);

        // Missing summary and bad sentiment both fail validation.
        assert!(parse_llm_payload(r#"{"sentiment":"positive"}"#).is_none());
        assert!(parse_llm_payload(r#"{"summary":"x","sentiment":"meh"}"#).is_none());
        assert!(parse_llm_payload("not json at all").is_none());
    }

    /// Serves one canned page for queries containing "skitour" and fails
    /// every other query.
    struct CannedSearch {
        page: String,
    }

    #[async_trait]
    impl SearchProvider for CannedSearch {
        async fn results_page(&self, query: &str) -> Result<String> {
            if query.contains("skitour") {
                Ok(self.page.clone())
            } else {
                anyhow::bail!("upstream 503")
            }
        }

        fn source_name(&self) -> &str {
            "canned"
        }
    }

    struct CannedLlm {
        response: String,
    }

    #[async_trait]
    impl LlmProvider for CannedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.response.clone())
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    const RESULT_PAGE: &str = r##"
        <a class="result__a" href="https://hikr.org/tour/1">Nebelhorn skitour tourenbericht</a>
        <a class="result__snippet" href="#">Powder schnee above 1800m on 08.02.2026</a>
    "##;

    #[tokio::test]
    async fn test_gather_tolerates_failing_queries() {
        let search = CannedSearch {
            page: RESULT_PAGE.to_string(),
        };
        let request = IntelRequest {
            region: "allgäu".to_string(),
            locations: vec![],
            limit: 5,
        };

        let reports = gather_condition_reports(&search, None, &request).await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].confidence.level, ConfidenceLevel::Unknown);
    }

    #[tokio::test]
    async fn test_gather_uses_llm_when_available() {
        let search = CannedSearch {
            page: RESULT_PAGE.to_string(),
        };
        let llm = CannedLlm {
            response: r#"{"summary":"Great powder","location":"Nebelhorn","date":"2026-02-08","conditions":["powder"],"sentiment":"positive"}"#
                .to_string(),
        };
        let request = IntelRequest {
            region: "allgäu".to_string(),
            locations: vec![],
            limit: 5,
        };

        let reports = gather_condition_reports(&search, Some(&llm), &request).await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].summary, "Great powder");
        assert_eq!(reports[0].confidence.level, ConfidenceLevel::Low);
    }

    #[tokio::test]
    async fn test_gather_falls_back_on_invalid_llm_output() {
        let search = CannedSearch {
            page: RESULT_PAGE.to_string(),
        };
        let llm = CannedLlm {
            response: "I cannot help with that.".to_string(),
        };
        let request = IntelRequest {
            region: "allgäu".to_string(),
            locations: vec![],
            limit: 5,
        };

        let reports = gather_condition_reports(&search, Some(&llm), &request).await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].confidence.level, ConfidenceLevel::Unknown);
        assert!(reports[0].conditions.contains(&"powder".to_string()));
    }
}
