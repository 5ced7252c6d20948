#![forbid(unsafe_code)]

pub mod admin;
pub mod app_services;
pub mod error;
pub mod identity;
pub mod leaderboard_service;
pub mod policy;
pub mod quiz;

pub use trivia_core::Clock;

pub use admin::{AdminCatalog, AdminService};
pub use app_services::AppServices;
pub use error::{AdminError, AppServicesError, LeaderboardError, QuizError};
pub use identity::Viewer;
pub use leaderboard_service::{LeaderboardService, RankedEntry};
pub use policy::CallPolicy;
pub use quiz::{ActiveQuiz, DriverOutcome, QuizDriver, QuizEvent, QuizService};
