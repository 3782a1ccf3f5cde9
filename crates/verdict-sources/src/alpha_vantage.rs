use std::fmt::Write;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info};
use verdict_agents::{AgentError, FundamentalsProvider};

use crate::error::SourceError;
use crate::read_json;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "alpha_vantage";
const QUARTERS: usize = 4;

/// Fundamentals from Alpha Vantage's company overview and quarterly statements.
pub struct AlphaVantageFundamentals {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageFundamentals {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Create from the `ALPHA_VANTAGE_API_KEY` environment variable.
    pub fn from_env(client: Client) -> Result<Self, SourceError> {
        Ok(Self::new(client, crate::api_key("ALPHA_VANTAGE_API_KEY")?))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn call(&self, function: &str, symbol: &str) -> Result<Value, SourceError> {
        debug!(function, symbol, "Alpha Vantage request");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", function),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let body: Value = read_json(PROVIDER, response).await?;
        check_response(&body)?;
        Ok(body)
    }

    pub async fn snapshot(&self, symbol: &str) -> Result<String, SourceError> {
        let overview = self.call("OVERVIEW", symbol).await?;
        let income = self.call("INCOME_STATEMENT", symbol).await?;
        let balance = self.call("BALANCE_SHEET", symbol).await?;
        let text = render_snapshot(symbol, &overview, &income, &balance)?;
        info!(symbol, chars = text.len(), "Fundamentals snapshot rendered");
        Ok(text)
    }
}

#[async_trait]
impl FundamentalsProvider for AlphaVantageFundamentals {
    async fn render(&self, subject: &str) -> Result<String, AgentError> {
        Ok(self.snapshot(subject).await?)
    }
}

/// Alpha Vantage reports errors and throttling in a 200 body.
pub fn check_response(body: &Value) -> Result<(), SourceError> {
    if let Some(message) = body.get("Error Message").and_then(Value::as_str) {
        return Err(SourceError::api(PROVIDER, message));
    }
    if body.get("Note").is_some() || body.get("Information").is_some() {
        return Err(SourceError::RateLimited(PROVIDER.to_string()));
    }
    Ok(())
}

/// One quarter's statements, matched on fiscal date.
struct Quarter<'a> {
    date: &'a str,
    income: &'a Value,
    balance: Option<&'a Value>,
}

impl Quarter<'_> {
    fn income(&self, key: &str) -> Option<Decimal> {
        number(self.income, key)
    }

    fn balance(&self, key: &str) -> Option<Decimal> {
        self.balance.and_then(|b| number(b, key))
    }
}

enum Unit {
    Millions,
    Ratio,
    Percent,
}

struct LineItem {
    label: &'static str,
    unit: Unit,
    value: fn(&Quarter) -> Option<Decimal>,
}

const LINE_ITEMS: &[LineItem] = &[
    LineItem {
        label: "Total revenue (USD M)",
        unit: Unit::Millions,
        value: |q| q.income("totalRevenue"),
    },
    LineItem {
        label: "Net income (USD M)",
        unit: Unit::Millions,
        value: |q| q.income("netIncome"),
    },
    LineItem {
        label: "Total assets (USD M)",
        unit: Unit::Millions,
        value: |q| q.balance("totalAssets"),
    },
    LineItem {
        label: "Total liabilities (USD M)",
        unit: Unit::Millions,
        value: |q| q.balance("totalLiabilities"),
    },
    LineItem {
        label: "Shareholder equity (USD M)",
        unit: Unit::Millions,
        value: |q| q.balance("totalShareholderEquity"),
    },
    LineItem {
        label: "Current ratio",
        unit: Unit::Ratio,
        value: |q| ratio(q.balance("totalCurrentAssets"), q.balance("totalCurrentLiabilities")),
    },
    LineItem {
        label: "Debt to equity",
        unit: Unit::Ratio,
        value: |q| ratio(q.balance("totalLiabilities"), q.balance("totalShareholderEquity")),
    },
    LineItem {
        label: "Return on equity (%)",
        unit: Unit::Percent,
        value: |q| ratio(q.income("netIncome"), q.balance("totalShareholderEquity")),
    },
];

const PROFILE_FIELDS: &[(&str, &str)] = &[
    ("Sector", "Sector"),
    ("Industry", "Industry"),
    ("Market cap", "MarketCapitalization"),
    ("P/E ratio", "PERatio"),
    ("EPS", "EPS"),
    ("Dividend yield", "DividendYield"),
    ("Profit margin", "ProfitMargin"),
];

/// Plain-text snapshot: profile lines, then the latest quarters as a table.
pub fn render_snapshot(
    symbol: &str,
    overview: &Value,
    income: &Value,
    balance: &Value,
) -> Result<String, SourceError> {
    let income_reports = reports(income, "INCOME_STATEMENT", symbol)?;
    let balance_reports = reports(balance, "BALANCE_SHEET", symbol)?;

    let mut quarters: Vec<Quarter> = income_reports
        .iter()
        .filter_map(|report| {
            let date = report.get("fiscalDateEnding")?.as_str()?;
            let balance = balance_reports
                .iter()
                .find(|b| b.get("fiscalDateEnding").and_then(Value::as_str) == Some(date));
            Some(Quarter {
                date,
                income: report,
                balance,
            })
        })
        .collect();
    // ISO dates sort lexically
    quarters.sort_by(|a, b| b.date.cmp(&a.date));
    quarters.truncate(QUARTERS);

    let mut out = String::new();
    let name = overview
        .get("Name")
        .and_then(Value::as_str)
        .unwrap_or(symbol);
    let _ = writeln!(out, "Company: {name} ({symbol})");
    for (label, key) in PROFILE_FIELDS {
        if let Some(value) = overview.get(*key).and_then(Value::as_str) {
            let _ = writeln!(out, "{label}: {value}");
        }
    }
    let _ = writeln!(out);

    let _ = write!(out, "{:<28}", "Quarter");
    for quarter in &quarters {
        let _ = write!(out, " | {:>12}", quarter.date);
    }
    let _ = writeln!(out);

    for item in LINE_ITEMS {
        let _ = write!(out, "{:<28}", item.label);
        for quarter in &quarters {
            let cell = (item.value)(quarter)
                .map(|v| format_value(v, &item.unit))
                .unwrap_or_else(|| "n/a".to_string());
            let _ = write!(out, " | {cell:>12}");
        }
        let _ = writeln!(out);
    }

    Ok(out)
}

fn reports<'a>(body: &'a Value, function: &str, symbol: &str) -> Result<&'a Vec<Value>, SourceError> {
    body.get("quarterlyReports")
        .and_then(Value::as_array)
        .filter(|reports| !reports.is_empty())
        .ok_or_else(|| {
            SourceError::MissingData(format!("no quarterly {function} reports for {symbol}"))
        })
}

/// Alpha Vantage encodes numbers as strings and gaps as "None".
fn number(report: &Value, key: &str) -> Option<Decimal> {
    report
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| Decimal::from_str(s).ok())
}

fn ratio(numerator: Option<Decimal>, denominator: Option<Decimal>) -> Option<Decimal> {
    numerator?.checked_div(denominator?)
}

fn format_value(value: Decimal, unit: &Unit) -> String {
    match unit {
        Unit::Millions => format!("{:.1}", (value / Decimal::from(1_000_000)).round_dp(1)),
        Unit::Ratio => format!("{:.2}", value.round_dp(2)),
        Unit::Percent => format!("{:.2}", (value * Decimal::ONE_HUNDRED).round_dp(2)),
    }
}
