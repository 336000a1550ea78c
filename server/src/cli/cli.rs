// server/src/cli/cli.rs

use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use caching::ReadingsCache;
use models::errors::{ClinicError, ClinicResult};
use models::users::User;
use services::{
    ConsultationService, HistoryService, IdentityService, ImportService, PublicationService,
};
use storage::{load_clinic_config, open_storage, ClinicConfig, ClinicStorageEngine};

use crate::cli::commands::Commands;
use crate::cli::{
    handlers_category, handlers_consultation, handlers_history, handlers_publication,
    handlers_reading, handlers_user,
};

#[derive(Parser, Debug)]
#[clap(author, version, about = "ClinicDB Command Line Interface", long_about = None)]
#[clap(propagate_version = true)]
pub struct CliArgs {
    /// Path to the clinic configuration file
    #[clap(long, short = 'C', value_name = "PATH")]
    pub config: Option<String>,
    /// Key of the account running the command
    #[clap(long, value_name = "KEY")]
    pub caller: Option<String>,
    #[clap(subcommand)]
    pub command: Commands,
}

/// Everything a handler needs: the storage handle plus the services built
/// over it.
#[derive(Clone)]
pub struct CliContext {
    pub storage: Arc<dyn ClinicStorageEngine>,
    pub identity: IdentityService,
    pub consultations: ConsultationService,
    pub histories: HistoryService,
    pub imports: ImportService,
    pub publications: PublicationService,
}

impl CliContext {
    pub async fn build(config: &ClinicConfig) -> ClinicResult<Self> {
        let storage = open_storage(config).await?;
        let readings = ReadingsCache::new(
            config.readings_cache.capacity,
            Duration::from_secs(config.readings_cache.ttl_seconds),
        );
        Ok(CliContext {
            identity: IdentityService::new(storage.clone(), config.identity.clone()),
            consultations: ConsultationService::new(
                storage.clone(),
                readings,
                config.pagination.clone(),
            ),
            histories: HistoryService::new(storage.clone(), config.pagination.clone()),
            imports: ImportService::new(
                storage.clone(),
                config.identity.clone(),
                config.import.clone(),
            ),
            publications: PublicationService::new(storage.clone()),
            storage,
        })
    }

    /// Resolves `--caller` to an account. Commands that act on behalf of a
    /// user refuse to run without one.
    pub async fn resolve_caller(&self, caller: Option<&str>) -> ClinicResult<User> {
        let key = caller.ok_or_else(|| {
            ClinicError::PermissionDenied("this command needs --caller <KEY>".to_string())
        })?;
        self.identity
            .find_user(key)
            .await?
            .ok_or_else(|| ClinicError::NotFound(format!("User {}", key)))
    }
}

pub async fn start_cli() -> Result<()> {
    let args = CliArgs::parse();
    let config =
        load_clinic_config(args.config.as_deref()).context("failed to load configuration")?;
    let context = CliContext::build(&config)
        .await
        .context("failed to open storage")?;
    debug!("Dispatching {:?}", args.command);

    match dispatch(&context, args.caller.as_deref(), args.command).await {
        Ok(output) => {
            println!("{}", output);
            context
                .storage
                .flush()
                .await
                .context("failed to flush storage")?;
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn dispatch(
    context: &CliContext,
    caller: Option<&str>,
    command: Commands,
) -> ClinicResult<String> {
    match command {
        Commands::User(action) => {
            handlers_user::handle_user_command(context, caller, action).await
        }
        Commands::Consult(action) => {
            handlers_consultation::handle_consult_command(context, caller, action).await
        }
        Commands::History(action) => {
            handlers_history::handle_history_command(context, caller, action).await
        }
        Commands::Category(action) => {
            handlers_category::handle_category_command(context, caller, action).await
        }
        Commands::Publication(action) => {
            handlers_publication::handle_publication_command(context, caller, action).await
        }
        Commands::Reading(action) => {
            handlers_reading::handle_reading_command(context, action).await
        }
    }
}
