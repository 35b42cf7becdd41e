//! Line-oriented command language shared by the shell and batch workers.
//!
//! A line is whitespace-separated, except that one `"quoted"` payload may
//! carry spaces. With a quote present the line is read as
//! `<command> "<text>" [<trailing>]`.

use crate::error::{MemFsError, Result};
use crate::filesystem::record::OpenMode;
use crate::filesystem::FileSystem;

/// Status returned by `chDir` when the target is not a subdirectory.
pub const DIRECTORY_NOT_FOUND: &str = "Directory not found.";
/// Status returned for an unrecognized command name.
pub const INVALID_COMMAND: &str = "Invalid command";

/// One parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create { name: String },
    Delete { name: String },
    MkDir { name: String },
    ChDir { name: String },
    List,
    Move { source: String, destination: String },
    Open { name: String, mode: OpenMode },
    Close,
    Read { name: String, start: usize, size: Option<usize> },
    Write { text: String, offset: usize },
    Append { text: String },
    MoveFile { name: String, start: usize, length: usize, target: usize },
    Truncate { name: String, size: usize },
    Memory,
    Unknown(String),
}

/// Split a line into tokens.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let line = line.trim();
    let Some(open) = line.find('"') else {
        return Ok(line.split_whitespace().map(str::to_string).collect());
    };

    let close = line[open + 1..]
        .find('"')
        .map(|i| open + 1 + i)
        .ok_or_else(|| MemFsError::InvalidArgument("unterminated quote".to_string()))?;

    let mut tokens = Vec::with_capacity(3);
    if let Some(name) = line[..open].split_whitespace().next() {
        tokens.push(name.to_string());
    }
    tokens.push(line[open + 1..close].to_string());
    if let Some(trailing) = line[close + 1..].split_whitespace().last() {
        tokens.push(trailing.to_string());
    }
    Ok(tokens)
}

struct Args<'a> {
    command: &'a str,
    rest: std::slice::Iter<'a, String>,
}

impl<'a> Args<'a> {
    fn text(&mut self, what: &str) -> Result<String> {
        self.rest.next().cloned().ok_or_else(|| {
            MemFsError::InvalidArgument(format!("{}: missing argument <{what}>", self.command))
        })
    }

    fn number(&mut self, what: &str) -> Result<usize> {
        let raw = self.text(what)?;
        parse_number(&raw)
    }

    fn optional_number(&mut self) -> Result<Option<usize>> {
        self.rest.next().map(|raw| parse_number(raw)).transpose()
    }
}

fn parse_number(raw: &str) -> Result<usize> {
    raw.parse()
        .map_err(|_| MemFsError::InvalidArgument(format!("invalid number: {raw}")))
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let tokens = tokenize(line)?;
        Self::from_tokens(&tokens)
    }

    pub fn from_tokens(tokens: &[String]) -> Result<Self> {
        let (command, rest) = tokens
            .split_first()
            .ok_or_else(|| MemFsError::InvalidArgument("empty command".to_string()))?;
        let mut args = Args {
            command,
            rest: rest.iter(),
        };

        let cmd = match command.as_str() {
            "create" => Self::Create { name: args.text("name")? },
            "delete" => Self::Delete { name: args.text("name")? },
            "mkDir" => Self::MkDir { name: args.text("name")? },
            "chDir" => Self::ChDir { name: args.text("name")? },
            "list" => Self::List,
            "move" => Self::Move {
                source: args.text("source")?,
                destination: args.text("destination")?,
            },
            "open" => Self::Open {
                name: args.text("name")?,
                mode: args.text("mode")?.parse()?,
            },
            "close" => Self::Close,
            "read" => Self::Read {
                name: args.text("name")?,
                start: args.optional_number()?.unwrap_or(0),
                size: args.optional_number()?,
            },
            "write" => Self::Write {
                text: args.text("text")?,
                offset: args.number("offset")?,
            },
            "append" => Self::Append { text: args.text("text")? },
            "moveFile" => Self::MoveFile {
                name: args.text("name")?,
                start: args.number("start")?,
                length: args.number("length")?,
                target: args.number("target")?,
            },
            "truncate" => Self::Truncate {
                name: args.text("name")?,
                size: args.number("size")?,
            },
            "memory" => Self::Memory,
            other => Self::Unknown(other.to_string()),
        };
        Ok(cmd)
    }
}

impl FileSystem {
    /// Parse and run one command line, rendering the result as text.
    pub fn execute(&self, line: &str) -> Result<String> {
        let cmd = Command::parse(line)?;
        self.run(&cmd)
    }

    /// Run a parsed command. Each command takes the engine lock once.
    pub fn run(&self, cmd: &Command) -> Result<String> {
        match cmd {
            Command::Create { name } => {
                self.create(name)?;
                Ok(format!("File {name} created successfully"))
            }
            Command::Delete { name } => {
                self.delete(name)?;
                Ok(format!("File {name} deleted successfully"))
            }
            Command::MkDir { name } => {
                self.mk_dir(name)?;
                Ok(format!("Directory {name} created successfully"))
            }
            Command::ChDir { name } => Ok(if self.change_directory(name) {
                String::new()
            } else {
                DIRECTORY_NOT_FOUND.to_string()
            }),
            Command::List => {
                let mut out = String::from("Current Directory:");
                for entry in self.list_directory()? {
                    let line = match entry.size {
                        Some(size) => format!("\n- {} ({size} bytes)", entry.name),
                        None => format!("\n- {}/", entry.name),
                    };
                    out.push_str(&line);
                }
                Ok(out)
            }
            Command::Move { source, destination } => {
                self.move_entry(source, destination)?;
                Ok(format!("File {source} moved to {destination} successfully"))
            }
            Command::Open { name, mode } => {
                self.open_file(name, *mode)?;
                Ok(format!("File {name} opened in '{mode}' mode"))
            }
            Command::Close => {
                self.close_file()?;
                Ok("File closed".to_string())
            }
            Command::Read { name, start, size } => {
                let text = self.read_file(name, *start, *size)?;
                Ok(format!("Reading file:\n{text}"))
            }
            Command::Write { text, offset } => {
                self.write_file(text, *offset)?;
                Ok(format!(
                    "Wrote {} characters at offset {offset}",
                    text.chars().count()
                ))
            }
            Command::Append { text } => {
                self.append_file(text)?;
                Ok(format!("Appended {} characters", text.chars().count()))
            }
            Command::MoveFile { name, start, length, target } => {
                self.move_file(name, *start, *length, *target)?;
                Ok(format!(
                    "Moved {length} characters from {start} to {target} in {name}"
                ))
            }
            Command::Truncate { name, size } => {
                self.truncate_file(name, *size)?;
                Ok(format!("File {name} truncated to {size} characters"))
            }
            Command::Memory => {
                let mut out = String::from("Memory Map:");
                for entry in self.memory_map() {
                    let indent = "    ".repeat(entry.depth);
                    let line = match entry.size {
                        Some(size) => format!("\n{indent}- {} ({size} bytes)", entry.name),
                        None => format!("\n{indent}- {}/", entry.name),
                    };
                    out.push_str(&line);
                }
                Ok(out)
            }
            Command::Unknown(_) => Ok(INVALID_COMMAND.to_string()),
        }
    }
}
