mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use storage_policy_broker::request::{
    handle_request, parse_attribute, PolicyRequest, PolicyResponse, POLICY_RESOURCE,
};
use storage_policy_broker::{BrokerError, DecisionPointHandle, ResourceAttributes};
use storage_policy_common::PolicySettings;
use tracing::debug;
use tracing_subscriber::prelude::*;

const EXIT_CLIENT_ERROR: i32 = 2;
const EXIT_CONFLICT: i32 = 3;
const EXIT_NOT_FOUND: i32 = 4;
const EXIT_PERSISTENCE: i32 = 5;
const EXIT_INTERNAL: i32 = 1;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<BrokerError>() {
            Some(broker_err) => {
                eprintln!("storage-policy: {}", broker_err);
                std::process::exit(exit_code(broker_err));
            }
            None => Err(err),
        },
    }
}

fn exit_code(err: &BrokerError) -> i32 {
    match err {
        BrokerError::UnsupportedClassification(_) | BrokerError::InvalidArgument(_) => {
            EXIT_CLIENT_ERROR
        }
        BrokerError::DuplicatePolicy(_) => EXIT_CONFLICT,
        BrokerError::NotFound(_) | BrokerError::NoPolicyFound(_) => EXIT_NOT_FOUND,
        BrokerError::Persistence(_) => EXIT_PERSISTENCE,
        BrokerError::Internal(_) => EXIT_INTERNAL,
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings =
        PolicySettings::load(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(store) = &cli.store {
        settings.store_path = Some(store.clone());
    }
    debug!("Effective settings: {:?}", settings);

    let handle = DecisionPointHandle::from_settings(&settings)?;

    let (request, json) = match cli.command {
        Command::Add(args) => (
            PolicyRequest::Add {
                resource: POLICY_RESOURCE.to_string(),
                body: args.body(),
            },
            false,
        ),
        Command::Remove { classification } => (PolicyRequest::Remove { classification }, false),
        Command::Get { resource, json } => (PolicyRequest::Get { resource }, json),
        Command::List { json } => (PolicyRequest::List, json),
        Command::Evaluate { attributes } => {
            let attributes = attributes
                .iter()
                .map(|raw| parse_attribute(raw))
                .collect::<Result<ResourceAttributes, BrokerError>>()?;
            (PolicyRequest::Evaluate { attributes }, false)
        }
        Command::Clear => (PolicyRequest::Clear, false),
    };

    match handle_request(&handle, request)? {
        PolicyResponse::Created { classification } => {
            println!("Created storage policy for {}", classification)
        }
        PolicyResponse::Removed => println!("Removed"),
        PolicyResponse::Cleared => println!("Cleared all storage policies"),
        PolicyResponse::Listing(listing) if json => {
            println!("{}", serde_json::to_string_pretty(&listing)?)
        }
        PolicyResponse::Listing(listing) => println!("{}", listing),
        PolicyResponse::Property(value) | PolicyResponse::Hint(value) => println!("{}", value),
    }
    Ok(())
}
