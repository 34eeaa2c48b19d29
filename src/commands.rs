//! CLI command definitions
//!
//! All CLI structs and subcommand enums are defined here.

use clap::{Parser, Subcommand};

/// Pomforge - edit linked XML build-manifest trees without disturbing
/// their formatting
#[derive(Parser, Debug)]
#[command(name = "pomforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Root directory of the manifest tree
    #[arg(short, long, default_value = ".", global = true)]
    pub dir: String,

    /// Manifest file name inside each module directory
    #[arg(long, default_value = "pom.xml", global = true)]
    pub manifest: String,

    /// Active profiles, comma separated; prefix with ! to deactivate
    /// (e.g. "release,!ci")
    #[arg(short = 'P', long, global = true)]
    pub profiles: Option<String>,

    /// Empty-element style: auto-prefer-space, auto-prefer-empty,
    /// always-space, always-empty
    #[arg(long, default_value = "auto-prefer-space", global = true)]
    pub self_closing: String,

    /// Emit results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every module in the tree with its resolved coordinates
    List,

    /// Compute the required-module closure of a seed set
    Closure {
        /// Seed coordinates, comma separated (group:artifact,...)
        seeds: String,
    },

    /// Modules NOT needed by the seed set (complement of its closure)
    Complement {
        /// Seed coordinates, comma separated (group:artifact,...)
        seeds: String,
    },

    /// Collect a module's resolved dependency declarations
    Deps {
        /// Module coordinates (group:artifact)
        ga: String,

        /// Also walk into each dependency's own in-tree module
        #[arg(short, long)]
        transitive: bool,
    },

    /// Coordinates referenced anywhere in the tree that match a
    /// wildcard set
    Filter {
        /// Patterns, comma separated; ! prefix excludes
        /// (e.g. "org.example:*,!org.example:legacy")
        patterns: String,
    },

    /// Set the version of every in-tree module and reference
    SetVersion {
        /// The new version
        version: String,
    },

    /// Prune module links outside the required closure of a seed set
    Restrict {
        /// Seed coordinates, comma separated (group:artifact,...)
        seeds: String,

        /// Comment links out with this tag instead of deleting them
        #[arg(long)]
        tag: Option<String>,
    },

    /// Bring back module links previously pruned with a tag
    Restore {
        /// The tag used when pruning
        #[arg(long)]
        tag: String,
    },

    /// Add a module link to the root manifest
    AddModule {
        /// The link text (a directory, or a manifest file path)
        link: String,
    },
}
