use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CachedLookup;
use crate::config::Config;
use crate::errors::AppError;
use crate::meta::FedMessage;
use crate::pkgdb::PkgdbClient;
use crate::rules::{MatchResult, RuleContext, user_filter, user_package_filter};
use crate::traits::{MessageMeta, PackageLookup};

/// fmn-rules - Evaluate notification rules against bus messages
#[derive(Parser)]
#[command(name = "fmn-rules")]
#[command(about = "Evaluate user notification rules against bus messages", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (overrides the configuration file)
    #[arg(short, long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Match messages associated with a user
    User(RuleArgs),

    /// Match messages about packages a user can commit to
    UserPackage(RuleArgs),

    /// List the packages a user can commit to
    Packages(PackagesArgs),

    /// Show the usernames and packages derived from a message
    Meta(MetaArgs),

    /// Print the effective configuration
    Config,
}

#[derive(Args, Clone)]
pub struct RuleArgs {
    /// JSON file holding the message
    #[arg(short, long, value_name = "FILE")]
    pub message: PathBuf,

    /// User identity to evaluate the rule for
    #[arg(short, long)]
    pub fasnick: Option<String>,

    /// Extra rule context as key=value (a `fasnick` entry overrides --fasnick)
    #[arg(long = "context", value_name = "KEY=VALUE")]
    pub context: Vec<String>,
}

#[derive(Args, Clone)]
pub struct PackagesArgs {
    /// User identity
    #[arg(value_name = "USERNAME")]
    pub username: String,
}

#[derive(Args, Clone)]
pub struct MetaArgs {
    /// JSON file holding the message
    #[arg(short, long, value_name = "FILE")]
    pub message: PathBuf,
}

pub async fn handle_command(command: Commands, config: &Config) -> Result<(), AppError> {
    match command {
        Commands::User(args) => handle_user_command(args, config)?,
        Commands::UserPackage(args) => handle_user_package_command(args, config).await?,
        Commands::Packages(args) => handle_packages_command(args, config).await?,
        Commands::Meta(args) => handle_meta_command(args)?,
        Commands::Config => handle_config_command(config)?,
    }

    Ok(())
}

fn parse_context(pairs: &[String]) -> Result<RuleContext, AppError> {
    RuleContext::from_pairs(pairs).map_err(|reason| AppError::Generic {
        message: format!("Invalid --context value: {}", reason),
    })
}

fn handle_user_command(args: RuleArgs, config: &Config) -> Result<(), AppError> {
    let message = FedMessage::from_path(&args.message)?;
    let context = parse_context(&args.context)?;

    let result = user_filter(config, &message, args.fasnick.as_deref(), &context);
    println!("{}", result);
    Ok(())
}

async fn handle_user_package_command(args: RuleArgs, config: &Config) -> Result<(), AppError> {
    let message = FedMessage::from_path(&args.message)?;
    let context = parse_context(&args.context)?;
    let client = PkgdbClient::new(config.pkgdb.clone())?;

    let result = if config.cache_enabled() {
        let lookup = CachedLookup::new(client, Duration::from_secs(config.cache.ttl_sec));
        evaluate_user_package(config, &message, &lookup, &args, &context).await?
    } else {
        evaluate_user_package(config, &message, &client, &args, &context).await?
    };

    println!("{}", result);
    Ok(())
}

async fn evaluate_user_package<L: PackageLookup>(
    config: &Config,
    message: &FedMessage,
    lookup: &L,
    args: &RuleArgs,
    context: &RuleContext,
) -> Result<MatchResult, AppError> {
    let result =
        user_package_filter(config, message, lookup, args.fasnick.as_deref(), context).await?;
    Ok(result)
}

async fn handle_packages_command(args: PackagesArgs, config: &Config) -> Result<(), AppError> {
    let client = PkgdbClient::new(config.pkgdb.clone())?;
    let mut packages: Vec<String> = client
        .get_packages_of_user(&args.username)
        .await?
        .into_iter()
        .collect();
    packages.sort();

    for package in packages {
        println!("{}", package);
    }
    Ok(())
}

fn handle_meta_command(args: MetaArgs) -> Result<(), AppError> {
    let message = FedMessage::from_path(&args.message)?;

    let mut usernames: Vec<String> = message.usernames().into_iter().collect();
    usernames.sort();
    let mut packages: Vec<String> = message.packages().into_iter().collect();
    packages.sort();

    println!("topic: {}", message.topic);
    println!("usernames: {}", usernames.join(", "));
    println!("packages: {}", packages.join(", "));
    Ok(())
}

fn handle_config_command(config: &Config) -> Result<(), AppError> {
    let contents = toml::to_string_pretty(config).map_err(crate::errors::ConfigError::from)?;
    print!("{}", contents);
    Ok(())
}
