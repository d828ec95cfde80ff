mod args;
mod render;

use services::{AppServices, Clock};
use tracker_core::model::{CategoryId, TaskKey, UserId};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, ArgsError, Command, UserCommand, prepare_sqlite_file, print_usage};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = match Args::parse(std::env::args().skip(1), |key| std::env::var(key).ok()) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(err.into());
        }
    };

    let clock = parsed.date.map_or_else(Clock::default_clock, Clock::fixed_on);
    tracing::debug!(command = ?parsed.command, db = %parsed.db_url, fixed_clock = clock.is_fixed(), "starting");

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, clock).await?;

    match parsed.command {
        Command::GrantAdmin { target } => {
            services.profiles().grant_admin(&UserId::new(target.as_str())?).await?;
            println!("{target} is now an admin");
        }
        Command::AsUser(command) => {
            let user = parsed.user.ok_or(ArgsError::MissingUser)?;
            execute(&services, &UserId::new(user)?, command).await?;
        }
    }
    Ok(())
}

async fn execute(
    services: &AppServices,
    user: &UserId,
    command: UserCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = services.tracker();
    let today = tracker.today();

    match command {
        UserCommand::Register { username, email } => {
            let profile = services.profiles().register(user, &username, &email).await?;
            println!("registered {} <{}>", profile.username(), profile.email());
        }
        UserCommand::Toggle { task } => {
            let key = TaskKey::new(task)?;
            let outcome = tracker.toggle_task(user, today, &key).await?;
            let state = if outcome.completed { "done" } else { "not done" };
            println!(
                "{key}: {state} ({}/{} tasks, {}%)",
                outcome.progress.completed_tasks,
                outcome.progress.total_tasks,
                outcome.progress.percentage
            );
        }
        UserCommand::Day => {
            print!("{}", render::day(&tracker.day_view(user, today).await));
        }
        UserCommand::Calendar { month } => {
            let key = today.month_key();
            let (year, month_index) = month.unwrap_or((key.year, key.month_index));
            let view = tracker.calendar(user, year, month_index).await?;
            print!("{}", render::month(&view));
        }
        UserCommand::Summary => {
            let summary = services.profiles().progress_summary(user).await;
            print!("{}", render::summary(&summary));
        }
        UserCommand::AddCategory { name, icon } => {
            let id = tracker
                .create_category(user, today, &name, icon.as_deref())
                .await?;
            println!("{id}");
        }
        UserCommand::AddTask { category, name } => {
            let category = CategoryId::new(category)?;
            let task = tracker.add_category_task(user, today, &category, &name).await?;
            println!("{}", TaskKey::custom(&category, &task));
        }
        UserCommand::FixedTask { category, name } => {
            let task = tracker.add_fixed_task(user, category, &name).await?;
            println!("{}", category.task_key(&task));
        }
        UserCommand::Admin => {
            let admin = services.admin();
            let overview = admin.overview(user).await?;
            let rows = admin.user_rows(user).await?;
            print!("{}", render::admin(&overview, &rows));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
