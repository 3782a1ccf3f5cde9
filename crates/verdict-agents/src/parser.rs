//! Recovery of structured data from free-text model replies.
//!
//! Rating replies go through an ordered chain of [`ExtractionStrategy`]s;
//! the first strategy whose candidate parses *and* validates wins, and when
//! none does the caller substitutes the parse fallback verdict.

use rust_decimal::Decimal;
use serde_json::Value;
use verdict_models::{ExtractionTier, RatingVerdict};

use crate::error::AgentError;

/// One way of locating a JSON payload inside a reply.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionStrategy {
    pub tier: ExtractionTier,
    locate: fn(&str) -> Option<&str>,
}

impl ExtractionStrategy {
    /// Run this strategy. `None` means "no match", never an error.
    pub fn attempt(&self, reply: &str) -> Option<RatingVerdict> {
        let candidate = (self.locate)(reply)?;
        let value: Value = serde_json::from_str(candidate).ok()?;
        validate_verdict(value).ok()
    }
}

/// The extraction chain, in the order it is tried.
pub const VERDICT_STRATEGIES: [ExtractionStrategy; 3] = [
    ExtractionStrategy {
        tier: ExtractionTier::WholeReply,
        locate: whole_reply,
    },
    ExtractionStrategy {
        tier: ExtractionTier::FencedBlock,
        locate: json_fenced_block,
    },
    ExtractionStrategy {
        tier: ExtractionTier::BalancedObject,
        locate: first_object,
    },
];

/// Extract a verdict from a rating reply, falling back to the parse
/// fallback verdict when no strategy matches.
pub fn extract_verdict(reply: &str) -> (RatingVerdict, ExtractionTier) {
    VERDICT_STRATEGIES
        .iter()
        .find_map(|strategy| strategy.attempt(reply).map(|v| (v, strategy.tier)))
        .unwrap_or_else(|| (RatingVerdict::parse_fallback(reply), ExtractionTier::Fallback))
}

/// Check that a parsed object carries every verdict field with a usable value.
pub fn validate_verdict(value: Value) -> Result<RatingVerdict, AgentError> {
    if !value.is_object() {
        return Err(AgentError::Parse("verdict is not a JSON object".to_string()));
    }

    let verdict: RatingVerdict = serde_json::from_value(value)
        .map_err(|e| AgentError::Parse(format!("invalid verdict: {e}")))?;

    if verdict.confidence < Decimal::ZERO || verdict.confidence > Decimal::ONE {
        return Err(AgentError::Parse(format!(
            "confidence {} outside [0, 1]",
            verdict.confidence
        )));
    }

    Ok(verdict)
}

/// Extract a list of strings (e.g. planned search queries) from a reply.
///
/// Accepts a bare JSON array, one inside a ```json block, or the first
/// balanced `[ ... ]` in surrounding prose.
pub fn extract_string_list(reply: &str) -> Result<Vec<String>, AgentError> {
    let candidates = [whole_reply(reply), json_fenced_block(reply), first_array(reply)];

    for candidate in candidates.into_iter().flatten() {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(candidate) {
            return Ok(list);
        }
    }

    Err(AgentError::Parse(format!(
        "No JSON string array found in response (length={})",
        reply.len()
    )))
}

fn whole_reply(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Contents of the first ```json fenced block.
fn json_fenced_block(text: &str) -> Option<&str> {
    const MARKER: &str = "```json";

    let lowered = text.to_ascii_lowercase();
    let start = lowered.find(MARKER)? + MARKER.len();
    // The language tag runs to the end of its line.
    let body_start = start + text[start..].find('\n')? + 1;
    let end = text[body_start..].find("```")?;
    Some(text[body_start..body_start + end].trim())
}

fn first_object(text: &str) -> Option<&str> {
    first_balanced(text, '{', '}')
}

fn first_array(text: &str) -> Option<&str> {
    first_balanced(text, '[', ']')
}

/// Find the first balanced `open ... close` span, ignoring delimiters that
/// appear inside JSON string literals.
fn first_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' if start.is_some() => {
                in_string = !in_string;
            }
            c if c == open && !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            c if c == close && !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(&text[s..i + c.len_utf8()]);
                    }
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use verdict_models::Rating;

    const VERDICT_JSON: &str = r#"{
    "rating": "BUY",
    "confidence": 0.85,
    "reasoning": "Strong earnings momentum",
    "key_factors": ["Revenue growth", "Margin expansion"],
    "risk_factors": ["Valuation stretched"],
    "recommendation_summary": "Buy on pullbacks"
}"#;

    fn assert_expected(verdict: &RatingVerdict) {
        assert_eq!(verdict.rating, Rating::Buy);
        assert_eq!(verdict.confidence, dec!(0.85));
        assert_eq!(verdict.reasoning, "Strong earnings momentum");
        assert_eq!(verdict.key_factors, vec!["Revenue growth", "Margin expansion"]);
        assert_eq!(verdict.risk_factors, vec!["Valuation stretched"]);
        assert_eq!(verdict.recommendation_summary, "Buy on pullbacks");
    }

    #[test]
    fn whole_reply_tier() {
        let (verdict, tier) = extract_verdict(VERDICT_JSON);
        assert_eq!(tier, ExtractionTier::WholeReply);
        assert_expected(&verdict);
    }

    #[test]
    fn fenced_block_tier() {
        let reply = format!("Here is my rating:\n```json\n{VERDICT_JSON}\n```\nLet me know.");
        let (verdict, tier) = extract_verdict(&reply);
        assert_eq!(tier, ExtractionTier::FencedBlock);
        assert_expected(&verdict);
    }

    #[test]
    fn fenced_block_tag_is_case_insensitive() {
        let reply = format!("```JSON\n{VERDICT_JSON}\n```");
        let (_, tier) = extract_verdict(&reply);
        assert_eq!(tier, ExtractionTier::FencedBlock);
    }

    #[test]
    fn unmarked_fence_falls_to_balanced_object() {
        let reply = format!("Result:\n```\n{VERDICT_JSON}\n```");
        let (verdict, tier) = extract_verdict(&reply);
        assert_eq!(tier, ExtractionTier::BalancedObject);
        assert_expected(&verdict);
    }

    #[test]
    fn balanced_object_in_prose() {
        let reply = format!("Based on the data, my verdict is {VERDICT_JSON}. Thanks.");
        let (verdict, tier) = extract_verdict(&reply);
        assert_eq!(tier, ExtractionTier::BalancedObject);
        assert_expected(&verdict);
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let reply = r#"Note: {"rating": "HOLD", "confidence": "0.4", "reasoning": "range {low} to {high}", "key_factors": [], "risk_factors": ["a \"quoted\" risk"], "recommendation_summary": "wait"} end"#;
        let (verdict, tier) = extract_verdict(reply);
        assert_eq!(tier, ExtractionTier::BalancedObject);
        assert_eq!(verdict.reasoning, "range {low} to {high}");
        assert_eq!(verdict.confidence, dec!(0.4));
    }

    #[test]
    fn pure_prose_yields_fallback() {
        let reply = "I think the stock looks reasonable but I cannot format my answer.";
        let (verdict, tier) = extract_verdict(reply);
        assert_eq!(tier, ExtractionTier::Fallback);
        assert_eq!(verdict.rating, Rating::Hold);
        assert_eq!(verdict.confidence, dec!(0.5));
        assert_eq!(
            verdict.key_factors,
            vec!["analysis incomplete due to parsing error"]
        );
        assert!(verdict.reasoning.contains("I think the stock"));
    }

    #[test]
    fn missing_field_yields_fallback() {
        let reply = r#"{"rating": "BUY", "confidence": 0.9, "reasoning": "x", "key_factors": [], "risk_factors": []}"#;
        let (verdict, tier) = extract_verdict(reply);
        assert_eq!(tier, ExtractionTier::Fallback);
        assert_eq!(verdict.rating, Rating::Hold);
    }

    #[test]
    fn unknown_rating_yields_fallback() {
        let reply = VERDICT_JSON.replace("\"BUY\"", "\"OUTPERFORM\"");
        let (verdict, tier) = extract_verdict(&reply);
        assert_eq!(tier, ExtractionTier::Fallback);
        assert_eq!(verdict.rating, Rating::Hold);
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let value = serde_json::from_str(&VERDICT_JSON.replace("0.85", "1.5")).unwrap();
        assert!(validate_verdict(value).is_err());
    }

    #[test]
    fn fenced_block_preferred_over_earlier_prose_object() {
        let reply = format!("Context {{\"note\": 1}}\n```json\n{VERDICT_JSON}\n```");
        let (verdict, tier) = extract_verdict(&reply);
        assert_eq!(tier, ExtractionTier::FencedBlock);
        assert_expected(&verdict);
    }

    #[test]
    fn string_list_from_bare_array() {
        let list = extract_string_list(r#"["AAPL stock news", "tech sector news"]"#).unwrap();
        assert_eq!(list, vec!["AAPL stock news", "tech sector news"]);
    }

    #[test]
    fn string_list_from_prose() {
        let list =
            extract_string_list("Sure! Output: [\"NVDA stock news\", \"semiconductor sector news\"]")
                .unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn string_list_missing() {
        assert!(extract_string_list("no queries here").is_err());
    }
}
