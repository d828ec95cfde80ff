//! Month grid projection.

use serde::Serialize;

use crate::model::MonthRecord;
use crate::progress::compute_day_progress;
use crate::time::{CalendarDate, days_in_month, first_weekday_offset};

/// Styling bucket for a day cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressClass {
    Complete,
    High,
    Medium,
    Low,
    None,
}

impl ProgressClass {
    #[must_use]
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            100.. => ProgressClass::Complete,
            70..=99 => ProgressClass::High,
            30..=69 => ProgressClass::Medium,
            1..=29 => ProgressClass::Low,
            0 => ProgressClass::None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressClass::Complete => "complete",
            ProgressClass::High => "high",
            ProgressClass::Medium => "medium",
            ProgressClass::Low => "low",
            ProgressClass::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub day_number: u32,
    pub percentage: u8,
    pub progress_class: ProgressClass,
    pub is_today: bool,
}

/// One slot of a Sunday-first month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CalendarCell {
    /// Leading blank before the 1st of the month.
    Padding,
    Day(DayCell),
}

impl CalendarCell {
    #[must_use]
    pub fn as_day(&self) -> Option<&DayCell> {
        match self {
            CalendarCell::Day(cell) => Some(cell),
            CalendarCell::Padding => None,
        }
    }
}

/// Lays out one month: padding cells up to the weekday of the 1st, then
/// every calendar day in order. An invalid month index yields no cells.
#[must_use]
pub fn project_month(
    year: i32,
    month_index: u32,
    month: &MonthRecord,
    today: CalendarDate,
) -> Vec<CalendarCell> {
    let Some(offset) = first_weekday_offset(year, month_index) else {
        return Vec::new();
    };
    let day_count = days_in_month(year, month_index);
    let is_current_month = today.year() == year && today.month_index() == month_index;

    let mut cells = Vec::with_capacity((offset + day_count) as usize);
    cells.extend((0..offset).map(|_| CalendarCell::Padding));
    for day_number in 1..=day_count {
        let percentage = month
            .day(day_number)
            .map(|day| compute_day_progress(day).percentage)
            .unwrap_or(0);
        cells.push(CalendarCell::Day(DayCell {
            day_number,
            percentage,
            progress_class: ProgressClass::from_percentage(percentage),
            is_today: is_current_month && today.day() == day_number,
        }));
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn march_15() -> CalendarDate {
        CalendarDate::new(2024, 2, 15).unwrap()
    }

    #[test]
    fn march_2024_starts_on_friday() {
        let cells = project_month(2024, 2, &MonthRecord::new(), march_15());
        assert_eq!(cells.len(), 36);
        assert!(cells[..5].iter().all(|cell| *cell == CalendarCell::Padding));

        let days: Vec<&DayCell> = cells.iter().filter_map(CalendarCell::as_day).collect();
        assert_eq!(days.len(), 31);
        assert!(days.iter().enumerate().all(|(i, d)| d.day_number == i as u32 + 1));
        let today: Vec<u32> = days.iter().filter(|d| d.is_today).map(|d| d.day_number).collect();
        assert_eq!(today, vec![15]);
    }

    #[test]
    fn today_in_another_month_marks_nothing() {
        let elsewhere = CalendarDate::new(2024, 3, 15).unwrap();
        let cells = project_month(2024, 2, &MonthRecord::new(), elsewhere);
        assert!(cells.iter().filter_map(CalendarCell::as_day).all(|d| !d.is_today));
    }

    #[test]
    fn cells_use_day_progress() {
        let month = MonthRecord::from_value(&json!({
            "day1": { "a": true },
            "day2": { "a": true, "b": true, "c": true, "d": false },
            "day3": { "a": true, "b": false },
            "day4": { "a": true, "b": false, "c": false, "d": false, "e": false },
            "day5": { "a": false }
        }));
        let cells = project_month(2024, 2, &month, march_15());
        let classes: Vec<ProgressClass> = cells
            .iter()
            .filter_map(CalendarCell::as_day)
            .take(6)
            .map(|d| d.progress_class)
            .collect();
        assert_eq!(
            classes,
            vec![
                ProgressClass::Complete,
                ProgressClass::High,
                ProgressClass::Medium,
                ProgressClass::Low,
                ProgressClass::None,
                ProgressClass::None,
            ]
        );
    }

    #[test]
    fn thresholds() {
        assert_eq!(ProgressClass::from_percentage(70), ProgressClass::High);
        assert_eq!(ProgressClass::from_percentage(69), ProgressClass::Medium);
        assert_eq!(ProgressClass::from_percentage(30), ProgressClass::Medium);
        assert_eq!(ProgressClass::from_percentage(29), ProgressClass::Low);
        assert_eq!(ProgressClass::from_percentage(1), ProgressClass::Low);
        assert_eq!(ProgressClass::None.as_str(), "none");
    }

    #[test]
    fn february_leap_year_and_invalid_month() {
        let today = march_15();
        let feb = project_month(2024, 1, &MonthRecord::new(), today);
        assert_eq!(feb.iter().filter_map(CalendarCell::as_day).count(), 29);
        assert!(project_month(2024, 12, &MonthRecord::new(), today).is_empty());
    }
}
