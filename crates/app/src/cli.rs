use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use trivia_core::model::{CategoryId, OptionTag, QuestionDraft, QuestionId, UserId};

#[derive(Parser, Debug)]
#[command(name = "trivia", version, about = "Category trivia with a shared leaderboard")]
pub struct Cli {
    /// SQLite database URL or file path.
    #[arg(
        long = "db",
        env = "TRIVIA_DB_URL",
        default_value = "sqlite:trivia.sqlite3",
        global = true
    )]
    pub db_url: String,

    #[command(flatten)]
    pub tuning: Tuning,

    #[command(subcommand)]
    pub command: Command,
}

/// Session and backend knobs.
#[derive(Args, Debug, Clone, Copy)]
pub struct Tuning {
    /// Questions sampled per quiz.
    #[arg(
        long,
        env = "TRIVIA_MAX_QUESTIONS",
        default_value_t = 5,
        global = true
    )]
    pub max_questions: u32,

    /// Countdown per question, in seconds.
    #[arg(
        long,
        env = "TRIVIA_SECONDS_PER_QUESTION",
        default_value_t = 30,
        global = true
    )]
    pub seconds_per_question: u32,

    /// Pause after each answer, in milliseconds (1000 to 1500).
    #[arg(
        long,
        env = "TRIVIA_FEEDBACK_DELAY_MS",
        default_value_t = 1500,
        global = true
    )]
    pub feedback_delay_ms: u64,

    /// Deadline for every storage call, in seconds.
    #[arg(
        long,
        env = "TRIVIA_CALL_TIMEOUT_SECS",
        default_value_t = 10,
        global = true
    )]
    pub call_timeout_secs: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load categories and questions from a JSON file.
    Seed {
        #[arg(long)]
        file: PathBuf,
    },
    /// List the categories a player can still play.
    Categories {
        #[arg(long)]
        user: UserId,
    },
    /// Play one category in the terminal.
    Play {
        #[arg(long)]
        user: UserId,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long)]
        category: CategoryId,
    },
    /// Show standings across all players.
    Leaderboard,
    /// Manage categories and questions.
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    AddCategory {
        #[arg(long)]
        name: String,
    },
    RenameCategory {
        #[arg(long)]
        id: CategoryId,
        #[arg(long)]
        name: String,
    },
    /// Delete a category with its questions and scores.
    DeleteCategory {
        #[arg(long)]
        id: CategoryId,
    },
    AddQuestion {
        #[command(flatten)]
        fields: QuestionFields,
    },
    /// Overwrite a question; `--category` may move it.
    EditQuestion {
        #[arg(long)]
        id: QuestionId,
        #[command(flatten)]
        fields: QuestionFields,
    },
    DeleteQuestion {
        #[arg(long)]
        id: QuestionId,
    },
    /// Print every category and its questions.
    List,
}

/// Question text, options and answer shared by add and edit.
#[derive(Args, Debug, Clone)]
pub struct QuestionFields {
    #[arg(long)]
    pub category: CategoryId,
    #[arg(long)]
    pub question: String,
    #[arg(long)]
    pub a: String,
    #[arg(long)]
    pub b: String,
    #[arg(long)]
    pub c: String,
    #[arg(long)]
    pub d: String,
    #[arg(long)]
    pub correct: OptionTag,
}

impl QuestionFields {
    #[must_use]
    pub fn into_draft(self) -> QuestionDraft {
        QuestionDraft {
            category_id: Some(self.category),
            text: self.question,
            option_a: self.a,
            option_b: self.b,
            option_c: self.c,
            option_d: self.d,
            correct_option: self.correct,
        }
    }
}
