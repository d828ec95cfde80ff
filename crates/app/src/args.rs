use std::fmt;

use tracker_core::CalendarDate;
use tracker_core::model::FixedCategory;

pub const DEFAULT_DB_URL: &str = "sqlite://habits.sqlite3";

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { command: &'static str, what: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidDate { raw: String },
    InvalidMonth { raw: String },
    InvalidCategory { raw: String },
    MissingUser,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { command, what } => {
                write!(f, "{command} requires {what}")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDate { raw } => write!(f, "invalid --date value: {raw}"),
            ArgsError::InvalidMonth { raw } => write!(f, "invalid --month value: {raw}"),
            ArgsError::InvalidCategory { raw } => write!(f, "unknown fixed category: {raw}"),
            ArgsError::MissingUser => write!(f, "no user given; pass --user or set HABIT_USER"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app [options] register <username> <email>");
    eprintln!("  app [options] toggle <task-key>");
    eprintln!("  app [options] day");
    eprintln!("  app [options] calendar [--month YYYY-MM]");
    eprintln!("  app [options] summary");
    eprintln!("  app [options] add-category <name> [--icon <icon>]");
    eprintln!("  app [options] add-task <category-id> <name>");
    eprintln!("  app [options] fixed-task <daily|learning|mindfulness|extra> <name>");
    eprintln!("  app [options] grant-admin <user-id>");
    eprintln!("  app [options] admin");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   default {DEFAULT_DB_URL}");
    eprintln!("  --user <user-id>    acting user");
    eprintln!("  --date YYYY-MM-DD   pin today's date");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  HABIT_DB_URL, HABIT_USER, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Runs without an acting user.
    GrantAdmin { target: String },
    AsUser(UserCommand),
}

/// Commands that act on behalf of `--user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Register { username: String, email: String },
    Toggle { task: String },
    Day,
    Calendar { month: Option<(i32, u32)> },
    Summary,
    AddCategory { name: String, icon: Option<String> },
    AddTask { category: String, name: String },
    FixedTask { category: FixedCategory, name: String },
    Admin,
}

#[derive(Debug)]
pub struct Args {
    pub db_url: String,
    pub user: Option<String>,
    pub date: Option<CalendarDate>,
    pub command: Command,
}

#[derive(Default)]
struct Flags {
    icon: Option<String>,
    month: Option<(i32, u32)>,
}

impl Args {
    /// Parses everything after the binary name. Returns `Ok(None)` when help was requested.
    pub fn parse(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ArgsError> {
        let mut db_url = env("HABIT_DB_URL").map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut user = env("HABIT_USER").filter(|value| !value.trim().is_empty());
        let mut date = None;
        let mut flags = Flags::default();
        let mut positionals = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => user = Some(require_value(&mut args, "--user")?),
                "--date" => {
                    let value = require_value(&mut args, "--date")?;
                    let parsed = CalendarDate::parse_iso(&value)
                        .map_err(|_| ArgsError::InvalidDate { raw: value.clone() })?;
                    date = Some(parsed);
                }
                "--icon" => flags.icon = Some(require_value(&mut args, "--icon")?),
                "--month" => {
                    let value = require_value(&mut args, "--month")?;
                    flags.month = Some(parse_month(&value)?);
                }
                "--help" | "-h" => return Ok(None),
                other if other.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positionals.push(arg),
            }
        }

        let mut positionals = positionals.into_iter();
        let Some(name) = positionals.next() else {
            return Ok(None);
        };
        let command = build_command(&name, &mut positionals, flags)?;
        if let Some(extra) = positionals.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Some(Self {
            db_url,
            user,
            date,
            command,
        }))
    }
}

fn build_command(
    name: &str,
    rest: &mut impl Iterator<Item = String>,
    flags: Flags,
) -> Result<Command, ArgsError> {
    let mut take = |command: &'static str, what: &'static str| {
        rest.next()
            .ok_or(ArgsError::MissingArgument { command, what })
    };
    let command = match name {
        "register" => UserCommand::Register {
            username: take("register", "a username")?,
            email: take("register", "an email")?,
        },
        "toggle" => UserCommand::Toggle {
            task: take("toggle", "a task key")?,
        },
        "day" => UserCommand::Day,
        "calendar" => UserCommand::Calendar { month: flags.month },
        "summary" => UserCommand::Summary,
        "add-category" => UserCommand::AddCategory {
            name: take("add-category", "a name")?,
            icon: flags.icon,
        },
        "add-task" => UserCommand::AddTask {
            category: take("add-task", "a category id")?,
            name: take("add-task", "a task name")?,
        },
        "fixed-task" => {
            let raw = take("fixed-task", "a category")?;
            let category = raw
                .parse::<FixedCategory>()
                .map_err(|_| ArgsError::InvalidCategory { raw })?;
            UserCommand::FixedTask {
                category,
                name: take("fixed-task", "a task name")?,
            }
        }
        "grant-admin" => {
            return Ok(Command::GrantAdmin {
                target: take("grant-admin", "a user id")?,
            });
        }
        "admin" => UserCommand::Admin,
        other => return Err(ArgsError::UnknownCommand(other.to_owned())),
    };
    Ok(Command::AsUser(command))
}

/// `YYYY-MM` with a human month number, returned as (year, 0-based month).
fn parse_month(raw: &str) -> Result<(i32, u32), ArgsError> {
    let invalid = || ArgsError::InvalidMonth { raw: raw.to_owned() };
    let (year, month) = raw.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month - 1))
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}
