// Command-line definition. The flag set mirrors the classic `-create
// -file=data.json` style: single-dash long flags are rewritten to clap's
// `--flag` form before parsing, so both spellings work.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use thiserror::Error;

pub const DEFAULT_BIN_NAME: &str = "My Bin";
pub const DEFAULT_SAVE_FILE: &str = "saved-bins.txt";

const EXAMPLES: &str = r#"Examples:
  jsonbin -create -file data.json                   create a new bin
  jsonbin -create -file students.json -binName "Class 2025"
  jsonbin -get -id 67f1a2b3c4d5e6f7                 read a bin
  jsonbin -update -file new.json -id 67f1a2b3...    replace a bin's content
  jsonbin -delete -id 67f1a2b3c4d5e6f7 -prune       delete a bin and forget its id
  jsonbin -list                                     show saved bin ids
  jsonbin -new -file bins.json -binName "Draft"     add a bin record to a local file
  jsonbin -interactive                              menu-driven mode

Setup:
  export JSONBIN_KEY="your-master-key-here"   (or put it in a .env file)
  Get a free key at https://jsonbin.io"#;

/// JSONBin.io command-line client.
#[derive(Parser, Debug)]
#[command(name = "jsonbin", version, about = "JSONBin.io command-line client")]
#[command(after_help = EXAMPLES)]
#[command(group(
    ArgGroup::new("action")
        .args(["create", "get", "update", "delete", "list", "new", "interactive"])
        .multiple(false)
))]
pub struct Cli {
    /// Create a new bin from a JSON file
    #[arg(long)]
    pub create: bool,

    /// Read a bin by id
    #[arg(long)]
    pub get: bool,

    /// Replace the content of an existing bin
    #[arg(long)]
    pub update: bool,

    /// Delete a bin by id
    #[arg(long)]
    pub delete: bool,

    /// List the saved bin ids
    #[arg(long)]
    pub list: bool,

    /// Add a locally built bin record to a bin-list JSON file
    #[arg(long)]
    pub new: bool,

    /// Run the interactive menu
    #[arg(long)]
    pub interactive: bool,

    /// Path to a JSON file (-create, -update, -new)
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Bin id (-get, -update, -delete)
    #[arg(long, value_name = "ID", allow_negative_numbers = true)]
    pub id: Option<String>,

    /// Display name for the bin (-create, -new)
    #[arg(long = "binName", visible_alias = "bin-name", value_name = "NAME", default_value = DEFAULT_BIN_NAME)]
    pub bin_name: String,

    /// File holding saved bin ids; empty disables saving on -create
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SAVE_FILE)]
    pub save: String,

    /// With -delete, also remove the id from the save file
    #[arg(long)]
    pub prune: bool,

    /// With -new, mark the bin as private
    #[arg(long)]
    pub private: bool,

    /// Read configuration from this .env file
    #[arg(long, value_name = "PATH")]
    pub env: Option<PathBuf>,

    /// Debug logging
    #[arg(long)]
    pub verbose: bool,
}

/// What the user asked for, with its required inputs checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create {
        file: PathBuf,
        bin_name: String,
        save: Option<PathBuf>,
    },
    Get {
        id: String,
    },
    Update {
        file: PathBuf,
        id: String,
    },
    Delete {
        id: String,
        prune: Option<PathBuf>,
    },
    List {
        save: PathBuf,
    },
    New {
        file: PathBuf,
        bin_name: String,
        private: bool,
    },
    Interactive,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("-file is required with -{0}")]
    MissingFile(&'static str),

    #[error("-id is required with -{0}")]
    MissingId(&'static str),

    #[error("both -file and -id are required with -update")]
    MissingFileAndId,

    #[error("-save must not be empty with -{0}")]
    MissingSave(&'static str),
}

impl Cli {
    /// Parse the process arguments, accepting single-dash long flags.
    pub fn parse_args() -> Self {
        Cli::parse_from(normalize_args(std::env::args_os()))
    }

    /// The requested action, or `None` when no action flag was given.
    pub fn action(&self) -> Result<Option<Action>, UsageError> {
        let id = self.id.clone().filter(|id| !id.trim().is_empty());
        let save = Some(PathBuf::from(&self.save)).filter(|p| !p.as_os_str().is_empty());

        let action = if self.create {
            Action::Create {
                file: self.file.clone().ok_or(UsageError::MissingFile("create"))?,
                bin_name: self.bin_name.clone(),
                save,
            }
        } else if self.get {
            Action::Get {
                id: id.ok_or(UsageError::MissingId("get"))?,
            }
        } else if self.update {
            match (self.file.clone(), id) {
                (Some(file), Some(id)) => Action::Update { file, id },
                _ => return Err(UsageError::MissingFileAndId),
            }
        } else if self.delete {
            let id = id.ok_or(UsageError::MissingId("delete"))?;
            let prune = if self.prune {
                Some(save.ok_or(UsageError::MissingSave("delete -prune"))?)
            } else {
                None
            };
            Action::Delete { id, prune }
        } else if self.list {
            Action::List {
                save: save.ok_or(UsageError::MissingSave("list"))?,
            }
        } else if self.new {
            Action::New {
                file: self.file.clone().ok_or(UsageError::MissingFile("new"))?,
                bin_name: self.bin_name.clone(),
                private: self.private,
            }
        } else if self.interactive {
            Action::Interactive
        } else {
            return Ok(None);
        };
        Ok(Some(action))
    }
}

/// Rewrite `-flag` and `-flag=value` to `--flag`/`--flag=value`.
/// Single-letter flags (`-h`, `-V`), `--` forms, bare `-` and anything
/// after a lone `--` are passed through untouched.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    for (i, arg) in args.into_iter().enumerate() {
        if i == 0 || passthrough {
            out.push(arg);
            continue;
        }
        let Some(text) = arg.to_str() else {
            out.push(arg);
            continue;
        };
        if text == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }
        let name = text.split('=').next().unwrap_or(text);
        let is_single_dash_long = name.starts_with('-')
            && !name.starts_with("--")
            && name.len() > 2
            && name[1..].starts_with(|c: char| c.is_ascii_alphabetic());
        if is_single_dash_long {
            out.push(OsString::from(format!("-{text}")));
        } else {
            out.push(arg);
        }
    }
    out
}
