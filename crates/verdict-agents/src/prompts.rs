use verdict_models::SentimentMode;

/// Example object shown to the rating model.
fn verdict_schema() -> String {
    let example = serde_json::json!({
        "rating": "STRONG_BUY | BUY | HOLD | SELL | STRONG_SELL",
        "confidence": 0.75,
        "reasoning": "<concise analysis tying fundamentals and sentiment together>",
        "key_factors": ["<positive factor>", "<positive factor>"],
        "risk_factors": ["<risk>", "<risk>"],
        "recommendation_summary": "<one or two sentence recommendation>"
    });
    serde_json::to_string_pretty(&example).unwrap_or_default()
}

pub fn rating_system_prompt() -> String {
    format!(
        "You are an equity analyst producing an investment rating. You are given a \
         fundamentals snapshot, a company news sentiment assessment and a sector news \
         sentiment assessment for one company.\n\n\
         ## RATING SCALE\n\n\
         - STRONG_BUY: fundamentals and both sentiment readings clearly positive\n\
         - BUY: net positive with manageable risks\n\
         - HOLD: mixed or insufficient evidence\n\
         - SELL: net negative with identifiable headwinds\n\
         - STRONG_SELL: deteriorating fundamentals and clearly negative sentiment\n\n\
         ## CONFIDENCE\n\n\
         A number between 0.0 and 1.0. Lower it when data is thin, stale or contradictory.\n\n\
         You MUST respond with ONLY a JSON object matching this schema:\n\
         {}\n\n\
         Use exactly one of the five rating values.",
        verdict_schema()
    )
}

/// The user prompt embedding all four rating inputs.
pub fn rating_prompt(
    subject: &str,
    fundamentals: &str,
    company_sentiment: &str,
    sector_sentiment: &str,
) -> String {
    format!(
        "Company: {subject}\n\n\
         ## FUNDAMENTALS\n{fundamentals}\n\n\
         ## COMPANY SENTIMENT\n{company_sentiment}\n\n\
         ## SECTOR SENTIMENT\n{sector_sentiment}\n\n\
         Rate {subject}."
    )
}

pub fn query_planner_system_prompt(max_queries: usize) -> String {
    format!(
        "You are a financial news analyst. Given a company and some background context, \
         generate search queries for recent news about the company's stock and its sector.\n\n\
         - Return at most {max_queries} queries.\n\
         - Two queries should focus on the company, one on the company's sector.\n\
         - Prefer wording that surfaces reliable financial news sources.\n\n\
         Respond with ONLY a JSON array of strings, no other text.\n\n\
         Example for AAPL: [\"AAPL stock nasdaq news\", \"AAPL stock cnbc news\", \"tech sector news\"]"
    )
}

pub fn query_planner_prompt(subject: &str, context: &str) -> String {
    format!("Company: {subject}\n\nContext:\n{context}")
}

pub fn summary_system_prompt() -> String {
    "You summarize financial news articles for an equity analyst. Write 3-5 sentences \
     covering the facts that matter to the company's stock: results, guidance, deals, \
     regulation, management and market reaction. No preamble."
        .to_string()
}

pub fn summary_prompt(title: &str, body: &str) -> String {
    format!("Title: {title}\n\nArticle:\n{body}")
}

pub fn sentiment_system_prompt(mode: SentimentMode) -> String {
    let focus = match mode {
        SentimentMode::Company => {
            "the company itself: its results, products, management and stock outlook"
        }
        SentimentMode::Sector => {
            "the sector the company operates in: demand, competition, regulation and \
             macro conditions affecting the whole industry"
        }
    };

    format!(
        "You assess news sentiment for {focus}.\n\n\
         Read the article summaries and reply with:\n\
         - an overall sentiment label (very negative, negative, neutral, positive, very positive)\n\
         - a score between -1.0 and 1.0\n\
         - the three most important drivers behind the score\n\n\
         If the summaries contain nothing relevant, say so and score 0.0."
    )
}

pub fn sentiment_prompt(corpus: &str, mode: SentimentMode, target_name: &str) -> String {
    match mode {
        SentimentMode::Company => format!("Company Name: {target_name}\nSummary: {corpus}"),
        SentimentMode::Sector => format!("Sector: {target_name}\nSummaries list: {corpus}"),
    }
}
