use std::fmt::Write as _;

use services::{DayView, MonthView};
use tracker_core::model::FixedCategory;
use tracker_core::{AdminOverview, CalendarCell, ProgressSummary, UserProgressRow};

const WEEKDAYS: &str = " Su  Mo  Tu  We  Th  Fr  Sa";

pub fn day(view: &DayView) -> String {
    let mut out = String::new();
    let progress = view.progress;
    let _ = writeln!(
        out,
        "{}: {}/{} tasks ({}%)",
        view.date, progress.completed_tasks, progress.total_tasks, progress.percentage
    );
    for (key, _) in view.record.flags() {
        let mark = if view.record.is_completed(key) { 'x' } else { ' ' };
        let _ = writeln!(out, "  [{mark}] {key}");
    }
    for category in view.record.categories() {
        let _ = writeln!(out, "  {} ({})", category.name(), category.id());
        for (id, task) in category.tasks() {
            let _ = writeln!(out, "    - {} ({id})", task.name());
        }
    }
    for category in FixedCategory::ALL {
        let mut tasks = view.fixed_tasks.tasks(category).peekable();
        if tasks.peek().is_none() {
            continue;
        }
        let _ = writeln!(out, "  {}", category.display_name());
        for (id, task) in tasks {
            let _ = writeln!(out, "    - {} ({})", task.name(), category.task_key(id));
        }
    }
    out
}

/// Sunday-first grid. Today is marked with `*`, complete days with `+`.
pub fn month(view: &MonthView) -> String {
    let mut out = String::new();
    let progress = view.progress;
    let _ = writeln!(
        out,
        "{}: {}/{} days complete ({}%)",
        view.month, progress.completed_days, progress.total_days, progress.completion_rate
    );
    let _ = writeln!(out, "{WEEKDAYS}");
    for week in view.cells.chunks(7) {
        let line: String = week
            .iter()
            .map(|cell| match cell {
                CalendarCell::Padding => "    ".to_owned(),
                CalendarCell::Day(day) => {
                    let mark = if day.is_today {
                        '*'
                    } else if day.percentage == 100 {
                        '+'
                    } else {
                        ' '
                    };
                    format!(" {:>2}{mark}", day.day_number)
                }
            })
            .collect();
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}

pub fn summary(summary: &ProgressSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "completed days:   {}", summary.completed_days);
    let _ = writeln!(out, "activities:       {}", summary.total_activities);
    let _ = writeln!(out, "this month:       {}%", summary.completion_rate);
    let _ = writeln!(out, "current streak:   {}", summary.current_streak);
    let _ = writeln!(out, "longest streak:   {}", summary.longest_streak);
    match summary.last_active_date {
        Some(date) => {
            let _ = writeln!(out, "last active:      {date}");
        }
        None => {
            let _ = writeln!(out, "last active:      never");
        }
    }
    for rate in &summary.monthly_progress {
        let _ = writeln!(out, "  {}: {}%", rate.month, rate.completion_rate);
    }
    out
}

pub fn admin(overview: &AdminOverview, rows: &[UserProgressRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "users: {}  active: {}  very active: {}  new: {}  activities: {}",
        overview.total_users,
        overview.active_users,
        overview.very_active_users,
        overview.new_users,
        overview.total_activities
    );
    for row in rows {
        let _ = writeln!(
            out,
            "  {:<20} {:<28} {:>4} days  streak {:>3}  {}",
            row.display_name,
            row.email,
            row.summary.completed_days,
            row.summary.current_streak,
            row.activity_level.as_str()
        );
    }
    out
}
