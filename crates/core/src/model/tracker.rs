use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::model::day::DayRecord;
use crate::time::CalendarDate;

/// Prefix of the per-day keys inside a month (`day1` .. `day31`).
pub const DAY_KEY_PREFIX: &str = "day";

/// Builds the stored key for a 1-based day of month.
#[must_use]
pub fn day_key(day: u32) -> String {
    format!("{DAY_KEY_PREFIX}{day}")
}

/// Parses `day{N}` with N in `1..=31`. Anything else is not a day key.
#[must_use]
pub fn parse_day_key(raw: &str) -> Option<u32> {
    let digits = raw.strip_prefix(DAY_KEY_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|day| (1..=31).contains(day))
}

fn parse_month_index(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok().filter(|month| *month <= 11)
}

fn parse_year(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok()
}

/// All recorded days of one month, keyed by 1-based day number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthRecord {
    days: BTreeMap<u32, DayRecord>,
}

impl MonthRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a stored month. Keys that are not `day{N}` are ignored.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let days = value
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|(key, day)| {
                        parse_day_key(key).map(|n| (n, DayRecord::from_value(day)))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { days }
    }

    #[must_use]
    pub fn from_snapshot(value: Option<&Value>) -> Self {
        value.map_or_else(Self::default, Self::from_value)
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .days
            .iter()
            .map(|(day, record)| (day_key(*day), record.to_value()))
            .collect();
        Value::Object(map)
    }

    #[must_use]
    pub fn day(&self, day: u32) -> Option<&DayRecord> {
        self.days.get(&day)
    }

    /// Recorded days in ascending day order.
    pub fn days(&self) -> impl Iterator<Item = (u32, &DayRecord)> {
        self.days.iter().map(|(day, record)| (*day, record))
    }

    pub fn insert_day(&mut self, day: u32, record: DayRecord) {
        self.days.insert(day, record);
    }

    #[must_use]
    pub fn recorded_days(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// The months of one year, keyed by 0-based month index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearRecord {
    months: BTreeMap<u32, MonthRecord>,
}

impl YearRecord {
    /// Decodes a stored year, accepting both an object keyed by month index
    /// and a dense array (what the store returns for small integer keys).
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let months = match value {
            Value::Object(fields) => fields
                .iter()
                .filter_map(|(key, month)| {
                    parse_month_index(key).map(|m| (m, MonthRecord::from_value(month)))
                })
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .filter(|(_, month)| !month.is_null())
                .filter_map(|(index, month)| {
                    u32::try_from(index)
                        .ok()
                        .filter(|m| *m <= 11)
                        .map(|m| (m, MonthRecord::from_value(month)))
                })
                .collect(),
            _ => BTreeMap::new(),
        };
        Self { months }
    }

    #[must_use]
    pub fn month(&self, month_index: u32) -> Option<&MonthRecord> {
        self.months.get(&month_index)
    }

    /// Months in ascending order.
    pub fn months(&self) -> impl Iterator<Item = (u32, &MonthRecord)> {
        self.months.iter().map(|(month, record)| (*month, record))
    }

    pub fn insert_month(&mut self, month_index: u32, record: MonthRecord) {
        self.months.insert(month_index, record);
    }
}

/// A user's full tracking history: year → month → day → flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserTracker {
    years: BTreeMap<i32, YearRecord>,
}

impl UserTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let years = value
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|(key, year)| {
                        parse_year(key).map(|y| (y, YearRecord::from_value(year)))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { years }
    }

    #[must_use]
    pub fn from_snapshot(value: Option<&Value>) -> Self {
        value.map_or_else(Self::default, Self::from_value)
    }

    #[must_use]
    pub fn year(&self, year: i32) -> Option<&YearRecord> {
        self.years.get(&year)
    }

    #[must_use]
    pub fn month(&self, year: i32, month_index: u32) -> Option<&MonthRecord> {
        self.years.get(&year).and_then(|y| y.month(month_index))
    }

    /// Years in ascending order.
    pub fn years(&self) -> impl Iterator<Item = (i32, &YearRecord)> {
        self.years.iter().map(|(year, record)| (*year, record))
    }

    /// Inserts a day, creating the enclosing year and month as needed.
    pub fn insert_day(&mut self, date: CalendarDate, record: DayRecord) {
        self.years
            .entry(date.year())
            .or_default()
            .months
            .entry(date.month_index())
            .or_default()
            .insert_day(date.day(), record);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years
            .values()
            .all(|year| year.months.values().all(MonthRecord::is_empty))
    }
}
