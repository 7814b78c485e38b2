use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "storage-policy")]
#[command(version, about = "Manage and query storage policies", long_about = None)]
pub struct Cli {
    /// Config file (defaults to $STORAGE_POLICY_HOME/config.yaml)
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Policy store file (overrides config and STORAGE_POLICY_STORE)
    #[arg(long = "store", value_name = "PATH", global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a storage policy
    Add(AddArgs),
    /// Remove the storage policy for a classification
    Remove {
        #[arg(value_name = "CLASSIFICATION")]
        classification: String,
    },
    /// Show the stored value for a classification, or all policies for `policies`
    Get {
        #[arg(value_name = "RESOURCE")]
        resource: String,
        /// Render listings as JSON
        #[arg(long)]
        json: bool,
    },
    /// List every storage policy
    List {
        /// Render as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the storage hint for a resource's attributes
    Evaluate {
        /// Resource attribute, e.g. mix:mimeType=image/tiff
        #[arg(long = "attr", value_name = "KEY=VALUE", required = true)]
        attributes: Vec<String>,
    },
    /// Remove every storage policy
    Clear,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Whole request body: "<classification> <match value> <storage hint>"
    #[arg(long = "raw", value_name = "BODY", conflicts_with = "fields")]
    pub raw: Option<String>,

    /// Classification, match value and storage hint
    #[arg(value_name = "FIELD", num_args = 0..)]
    pub fields: Vec<String>,
}

impl AddArgs {
    pub fn body(&self) -> String {
        match &self.raw {
            Some(raw) => raw.clone(),
            None => self.fields.join(" "),
        }
    }
}
