//! CLI interface for the contacts API

pub mod commands;
mod output;

pub use output::*;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::auth::Role;

#[derive(Parser)]
#[command(name = "contacts-api")]
#[command(version)]
#[command(about = "Contacts REST service with JWT auth and a Redis session cache", long_about = None)]
pub struct Cli {
    /// Path to contacts.toml (searched upward from the current directory by default)
    #[arg(short, long, global = true, env = "CONTACTS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default contacts.toml into the current directory
    Init,

    /// Create the database schema
    Migrate,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides the config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides the config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep users, contacts and the session cache in memory
        #[arg(long)]
        memory: bool,
    },

    /// Change the role of an existing user
    Promote {
        /// Email of the user
        email: String,

        /// Role to grant
        #[arg(short, long, default_value = "admin")]
        role: Role,
    },

    /// Check database and cache connectivity
    Doctor,
}
