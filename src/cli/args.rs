//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::application::{ApplicationResult, Format};

/// Hierarchical configuration store: read and write subtrees by path
#[derive(Parser, Debug)]
#[command(name = "configdb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Settings file
    #[arg(short, long, global = true, env = "CONFIGDB_SETTINGS", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Node store file (overrides settings)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the subtree at PATH
    Get {
        /// Slash separated node path (default: root)
        path: Option<String>,
        #[command(flatten)]
        encoding: EncodingArgs,
    },

    /// Store a document at PATH, creating missing nodes
    Put(WriteArgs),

    /// Same as put
    Post(WriteArgs),

    /// Delete PATH and everything below it
    Delete {
        /// Slash separated node path (root: empties the tree)
        path: Option<String>,
    },

    /// Show the subtree at PATH as a tree
    Tree {
        /// Slash separated node path (default: root)
        path: Option<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct WriteArgs {
    /// Slash separated node path (default: root)
    pub path: Option<String>,

    #[command(flatten)]
    pub encoding: EncodingArgs,

    /// Read the document from a file instead of stdin
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EncodingArgs {
    /// Encoding: json, yaml, toml, prop, value
    #[arg(short, long, conflicts_with = "mime")]
    pub format: Option<Format>,

    /// Encoding given as a mime type, e.g. application/properties
    #[arg(long)]
    pub mime: Option<String>,
}

impl EncodingArgs {
    /// Explicit format, else mime type, else the configured default.
    pub fn resolve(&self, default: Format) -> ApplicationResult<Format> {
        match (&self.format, &self.mime) {
            (Some(format), _) => Ok(*format),
            (None, Some(mime)) => Format::from_mime(mime),
            (None, None) => Ok(default),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Print a settings template
    Template,
    /// Print the global settings file location
    Path,
}
