use std::time::Duration;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{AppServices, CallPolicy, Clock, DriverOutcome, Viewer};
use tracing_subscriber::EnvFilter;
use trivia_core::session::SessionSettings;

mod cli;
mod db;
mod play;
mod seed;

use cli::{AdminCommand, Cli, Command};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    let db_url = db::normalize_sqlite_url(&cli.db_url)?;
    db::prepare_sqlite_file(&db_url)?;

    let settings = SessionSettings::new(
        cli.tuning.max_questions,
        cli.tuning.seconds_per_question,
        cli.tuning.feedback_delay_ms,
    )?;
    let policy = CallPolicy::new(Duration::from_secs(cli.tuning.call_timeout_secs));
    let app = AppServices::new_sqlite(&db_url, Clock::system(), settings, policy).await?;
    tracing::debug!(db = %db_url, "storage ready");

    match cli.command {
        Command::Seed { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let parsed = seed::SeedFile::from_json(&raw)?;
            let mut admin = app.admin();
            let report = seed::import(&mut admin, parsed).await?;
            println!(
                "Seeded {} categories and {} questions from {}.",
                report.categories,
                report.questions,
                file.display()
            );
        }
        Command::Categories { user } => {
            let viewer = Viewer::new(user, "");
            let categories = app.quiz().available_categories(&viewer).await?;
            if categories.is_empty() {
                println!("No categories left to play.");
            }
            for category in categories {
                println!("{:>4}  {}", category.id(), category.name());
            }
        }
        Command::Play {
            user,
            email,
            category,
        } => {
            let viewer = Viewer::new(user, email);
            let mut rng = StdRng::from_os_rng();
            let quiz = app.quiz().start(&viewer, category, &mut rng).await?;
            if let Some(found) = app.quiz().category(category).await? {
                println!("Category: {}", found.name());
            }
            match play::run_in_terminal(app.quiz_driver(), quiz).await? {
                DriverOutcome::Completed { record: None, .. } => {
                    tracing::warn!("quiz finished without a saved score");
                }
                DriverOutcome::Completed { .. } | DriverOutcome::Abandoned => {}
            }
        }
        Command::Leaderboard => {
            let standings = app.leaderboard().standings().await?;
            if standings.is_empty() {
                println!("No scores yet.");
            }
            for row in standings {
                let who = row
                    .entry
                    .user_email
                    .clone()
                    .unwrap_or_else(|| row.entry.user_id.to_string());
                println!("{:>3}. {who:<40} {:>6}", row.rank, row.entry.total_score);
            }
        }
        Command::Admin(cmd) => run_admin(&app, cmd).await?,
    }

    Ok(())
}

async fn run_admin(
    app: &AppServices,
    cmd: AdminCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut admin = app.admin();
    match cmd {
        AdminCommand::AddCategory { name } => {
            let category = admin.create_category(&name).await?;
            println!("Added category {} ({}).", category.id(), category.name());
        }
        AdminCommand::RenameCategory { id, name } => {
            let category = admin.rename_category(id, &name).await?;
            println!("Renamed category {} to {}.", category.id(), category.name());
        }
        AdminCommand::DeleteCategory { id } => {
            admin.delete_category(id).await?;
            println!("Deleted category {id}.");
        }
        AdminCommand::AddQuestion { fields } => {
            let category = fields.category;
            let added = admin.create_question(fields.into_draft()).await?;
            println!("Added question {} to category {}.", added.id(), category);
        }
        AdminCommand::EditQuestion { id, fields } => {
            let edited = admin.update_question(id, fields.into_draft()).await?;
            println!(
                "Updated question {} in category {}.",
                edited.id(),
                edited.category_id()
            );
        }
        AdminCommand::DeleteQuestion { id } => {
            admin.delete_question(id).await?;
            println!("Deleted question {id}.");
        }
        AdminCommand::List => {
            let catalog = admin.refresh().await?;
            for category in catalog.categories() {
                println!("[{}] {}", category.id(), category.name());
                for question in catalog.questions_in(category.id()) {
                    println!(
                        "    {:>4}  {}  (answer: {})",
                        question.id(),
                        question.text(),
                        question.correct_option()
                    );
                }
            }
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
