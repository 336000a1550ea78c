// server/src/cli/mod.rs

pub mod cli;
pub mod commands;
pub mod handlers_category;
pub mod handlers_consultation;
pub mod handlers_history;
pub mod handlers_publication;
pub mod handlers_reading;
pub mod handlers_user;

pub use cli::{start_cli, CliArgs, CliContext};
pub use commands::{
    CategoryCommand, Commands, ConsultCommand, HistoryCommand, PublicationCommand,
    ReadingCommand, UserCommand,
};
