//! Trade records: the loose journal input shape and the validated form.

use crate::domain::{Decimal, Direction, TagId, Ticker, TradeIssue, TradeIssueKind};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// A trade record as the journal hands it over.
///
/// Every field is optional and kept as a loose JSON value, so one odd
/// record never fails deserialization of its batch; [`Trade::from_raw`]
/// decides whether the record is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrade {
    pub id: Option<Value>,
    pub ticker: Option<Value>,
    pub direction: Option<Value>,
    #[serde(alias = "entryPrice")]
    pub entry_price: Option<Value>,
    #[serde(alias = "exitPrice")]
    pub exit_price: Option<Value>,
    pub quantity: Option<Value>,
    pub commissions: Option<Value>,
    #[serde(alias = "tradeDate")]
    pub trade_date: Option<Value>,
    #[serde(alias = "entryTime")]
    pub entry_time: Option<Value>,
    #[serde(alias = "exitTime")]
    pub exit_time: Option<Value>,
    #[serde(alias = "stopLoss")]
    pub stop_loss: Option<Value>,
    #[serde(alias = "takeProfit")]
    pub take_profit: Option<Value>,
    #[serde(alias = "highestPrice")]
    pub highest_price: Option<Value>,
    #[serde(alias = "lowestPrice")]
    pub lowest_price: Option<Value>,
    /// An array of tags, a single tag, or `null`.
    pub tags: Option<Value>,
}

/// A validated trade.
///
/// `quantity > 0` and `entry_price` is present. `exit_price == None` marks an
/// open trade, which never participates in realized statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: Option<i64>,
    pub ticker: Ticker,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub quantity: Decimal,
    pub commissions: Decimal,
    pub trade_date: DateTime<Utc>,
    pub tags: BTreeSet<TagId>,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub highest_price: Option<Decimal>,
    pub lowest_price: Option<Decimal>,
}

impl Trade {
    /// Create a closed or open trade with no commissions, tags or extras.
    pub fn new(
        ticker: &str,
        direction: Direction,
        entry_price: Decimal,
        exit_price: Option<Decimal>,
        quantity: Decimal,
        trade_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            ticker: Ticker::new(ticker),
            direction,
            entry_price,
            exit_price,
            quantity,
            commissions: Decimal::zero(),
            trade_date,
            tags: BTreeSet::new(),
            entry_time: None,
            exit_time: None,
            stop_loss: None,
            take_profit: None,
            highest_price: None,
            lowest_price: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_commissions(mut self, commissions: Decimal) -> Self {
        self.commissions = commissions;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(TagId::new(tag));
        self
    }

    pub fn with_times(mut self, entry: DateTime<Utc>, exit: DateTime<Utc>) -> Self {
        self.entry_time = Some(entry);
        self.exit_time = Some(exit);
        self
    }

    pub fn with_stop_loss(mut self, stop_loss: Decimal) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    pub fn with_excursion(mut self, highest: Decimal, lowest: Decimal) -> Self {
        self.highest_price = Some(highest);
        self.lowest_price = Some(lowest);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }

    pub fn has_tag(&self, tag: &TagId) -> bool {
        self.tags.contains(tag)
    }

    /// Timestamp used for time-of-day patterns: exit time, else trade date.
    pub fn closed_at(&self) -> DateTime<Utc> {
        self.exit_time.unwrap_or(self.trade_date)
    }

    /// Stable identifier for this trade.
    ///
    /// Priority: journal `id` (if present) > hash of the trade's content.
    pub fn trade_key(&self) -> String {
        if let Some(id) = self.id {
            return format!("id:{}", id);
        }

        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(self.ticker.as_str());
        hasher.update(if self.direction == Direction::Long { b"L" } else { b"S" });
        hasher.update(self.entry_price.to_canonical_string());
        match self.exit_price {
            Some(px) => hasher.update(px.to_canonical_string()),
            None => hasher.update(b"open"),
        }
        hasher.update(self.quantity.to_canonical_string());
        hasher.update(self.commissions.to_canonical_string());
        hasher.update(self.trade_date.timestamp_micros().to_le_bytes());
        for tag in &self.tags {
            hasher.update(tag.as_str());
            hasher.update(b"\x1f");
        }
        for time in [self.entry_time, self.exit_time].into_iter().flatten() {
            hasher.update(time.timestamp_micros().to_le_bytes());
        }
        let hash = hasher.finalize();
        format!("hash:{}", hex::encode(&hash[..16]))
    }

    /// Validate a raw journal record.
    ///
    /// `index` is the record's position in the caller's input and is echoed
    /// back in the issue so the caller can point at the offending row.
    pub fn from_raw(index: usize, raw: &RawTrade) -> Result<Trade, TradeIssue> {
        let id = raw.id.as_ref().and_then(parse_id);
        let fail = |kind: TradeIssueKind| TradeIssue::new(index, id, kind);

        if let Some(value) = raw.id.as_ref().filter(|v| !v.is_null()) {
            if id.is_none() {
                return Err(fail(TradeIssueKind::InvalidNumber {
                    field: "id",
                    value: display_value(value),
                }));
            }
        }

        if is_absent(raw.ticker.as_ref()) {
            return Err(fail(TradeIssueKind::MissingField("ticker")));
        }
        let ticker = match raw.ticker.as_ref() {
            Some(Value::String(s)) => s.trim(),
            other => {
                return Err(fail(TradeIssueKind::InvalidField {
                    field: "ticker",
                    value: other.map(display_value).unwrap_or_default(),
                }))
            }
        };

        if is_absent(raw.direction.as_ref()) {
            return Err(fail(TradeIssueKind::MissingField("direction")));
        }
        let direction = match raw.direction.as_ref() {
            Some(Value::String(s)) => s
                .parse::<Direction>()
                .map_err(|s| fail(TradeIssueKind::InvalidDirection(s)))?,
            other => {
                return Err(fail(TradeIssueKind::InvalidDirection(
                    other.map(display_value).unwrap_or_default(),
                )))
            }
        };

        let entry_price = required_decimal(raw.entry_price.as_ref(), "entry_price").map_err(fail)?;
        let exit_price = optional_decimal(raw.exit_price.as_ref(), "exit_price").map_err(fail)?;
        let quantity = required_decimal(raw.quantity.as_ref(), "quantity").map_err(fail)?;
        let commissions = optional_decimal(raw.commissions.as_ref(), "commissions")
            .map_err(fail)?
            .unwrap_or_default();

        if !quantity.is_positive() {
            return Err(fail(TradeIssueKind::NonPositiveQuantity(
                quantity.to_canonical_string(),
            )));
        }
        if entry_price.is_negative() {
            return Err(fail(TradeIssueKind::NegativePrice("entry_price")));
        }
        if exit_price.is_some_and(|px| px.is_negative()) {
            return Err(fail(TradeIssueKind::NegativePrice("exit_price")));
        }
        if commissions.is_negative() {
            return Err(fail(TradeIssueKind::NegativeCommissions(
                commissions.to_canonical_string(),
            )));
        }

        let entry_time = optional_datetime(raw.entry_time.as_ref(), "entry_time").map_err(fail)?;
        let exit_time = optional_datetime(raw.exit_time.as_ref(), "exit_time").map_err(fail)?;
        if let (Some(entry), Some(exit)) = (entry_time, exit_time) {
            if exit < entry {
                return Err(fail(TradeIssueKind::ExitBeforeEntry));
            }
        }

        // The journal sometimes only records entry/exit times.
        let trade_date = optional_datetime(raw.trade_date.as_ref(), "trade_date")
            .map_err(fail)?
            .or(exit_time)
            .or(entry_time)
            .ok_or_else(|| fail(TradeIssueKind::MissingField("trade_date")))?;

        let tags = match raw.tags.as_ref() {
            None | Some(Value::Null) => BTreeSet::new(),
            Some(Value::Array(items)) => items.iter().filter_map(tag_from_value).collect(),
            Some(single @ (Value::String(_) | Value::Number(_))) => {
                tag_from_value(single).into_iter().collect()
            }
            Some(other) => {
                return Err(fail(TradeIssueKind::InvalidField {
                    field: "tags",
                    value: display_value(other),
                }))
            }
        };

        Ok(Trade {
            id,
            ticker: Ticker::new(ticker),
            direction,
            entry_price,
            exit_price,
            quantity,
            commissions,
            trade_date,
            tags,
            entry_time,
            exit_time,
            stop_loss: optional_decimal(raw.stop_loss.as_ref(), "stop_loss").map_err(fail)?,
            take_profit: optional_decimal(raw.take_profit.as_ref(), "take_profit").map_err(fail)?,
            highest_price: optional_decimal(raw.highest_price.as_ref(), "highest_price")
                .map_err(fail)?,
            lowest_price: optional_decimal(raw.lowest_price.as_ref(), "lowest_price")
                .map_err(fail)?,
        })
    }
}

impl From<&Trade> for RawTrade {
    fn from(trade: &Trade) -> Self {
        let num = |d: Decimal| Value::String(d.to_canonical_string());
        let time = |t: DateTime<Utc>| Value::String(t.to_rfc3339());
        RawTrade {
            id: trade.id.map(Value::from),
            ticker: Some(Value::String(trade.ticker.to_string())),
            direction: Some(Value::String(trade.direction.to_string())),
            entry_price: Some(num(trade.entry_price)),
            exit_price: trade.exit_price.map(num),
            quantity: Some(num(trade.quantity)),
            commissions: Some(num(trade.commissions)),
            trade_date: Some(time(trade.trade_date)),
            entry_time: trade.entry_time.map(time),
            exit_time: trade.exit_time.map(time),
            stop_loss: trade.stop_loss.map(num),
            take_profit: trade.take_profit.map(num),
            highest_price: trade.highest_price.map(num),
            lowest_price: trade.lowest_price.map(num),
            tags: Some(Value::Array(
                trade
                    .tags
                    .iter()
                    .map(|t| Value::String(t.as_str().to_string()))
                    .collect(),
            )),
        }
    }
}

fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Blank tags are dropped; anything but a string or number is ignored.
fn tag_from_value(value: &Value) -> Option<TagId> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(TagId::new(s.trim())),
        Value::Number(n) => Some(TagId::new(n.to_string())),
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Empty strings count as absent; CSV exports leave open exits blank.
fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn optional_decimal(
    value: Option<&Value>,
    field: &'static str,
) -> Result<Option<Decimal>, TradeIssueKind> {
    if is_absent(value) {
        return Ok(None);
    }
    let value = value.unwrap_or(&Value::Null);
    Decimal::from_json(value)
        .map(Some)
        .ok_or_else(|| TradeIssueKind::InvalidNumber {
            field,
            value: display_value(value),
        })
}

fn required_decimal(value: Option<&Value>, field: &'static str) -> Result<Decimal, TradeIssueKind> {
    optional_decimal(value, field)?.ok_or(TradeIssueKind::MissingField(field))
}

fn optional_datetime(
    value: Option<&Value>,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, TradeIssueKind> {
    if is_absent(value) {
        return Ok(None);
    }
    let value = value.unwrap_or(&Value::Null);
    let parsed = match value {
        Value::String(s) => parse_datetime(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| TradeIssueKind::InvalidDate {
        field,
        value: display_value(value),
    })
}

/// Parse the date/time spellings the journal and broker exports produce.
///
/// Offsets are honored; naive values are taken as UTC.
pub fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    const DATETIME_FORMATS: [&str; 5] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %I:%M:%S %p",
        "%m/%d/%Y %H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}
