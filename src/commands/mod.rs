pub mod append;
pub mod del;
pub mod executable;
pub mod get;
pub mod getset;
pub mod set;
pub mod setex;
pub mod setnx;
pub mod strlen;

use std::vec;

use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::store::Store;
use crate::value::{Value, ValueError, DEFAULT_ERROR_CODE};

use append::Append;
use del::Del;
use get::Get;
use getset::GetSet;
use set::Set;
use setex::SetEx;
use setnx::SetNx;
use strlen::Strlen;

#[derive(Debug, PartialEq)]
pub enum Command {
    Get(Get),
    Set(Set),
    GetSet(GetSet),
    SetNx(SetNx),
    SetEx(SetEx),
    Del(Del),
    Append(Append),
    Strlen(Strlen),
}

impl Executable for Command {
    fn exec(self, store: Store) -> Result<Value, CommandError> {
        match self {
            Command::Get(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
            Command::GetSet(cmd) => cmd.exec(store),
            Command::SetNx(cmd) => cmd.exec(store),
            Command::SetEx(cmd) => cmd.exec(store),
            Command::Del(cmd) => cmd.exec(store),
            Command::Append(cmd) => cmd.exec(store),
            Command::Strlen(cmd) => cmd.exec(store),
        }
    }
}

/// Runs one decoded request array against the store. Command faults become
/// error replies so the connection keeps serving the rest of the pipeline.
pub fn dispatch(request: Value, store: Store) -> Value {
    match Command::try_from(request).and_then(|cmd| cmd.exec(store)) {
        Ok(reply) => reply,
        Err(err) => err.to_reply(),
    }
}

impl TryFrom<Value> for Command {
    type Error = CommandError;

    fn try_from(request: Value) -> Result<Self, Self::Error> {
        let items = match request {
            Value::Array(items) => items,
            _ => return Err(CommandError::NotAnArray),
        };

        let parser = &mut CommandParser::new(items);
        let name = parser.command_name()?;

        // Command names match case-sensitively, uppercase only.
        match name.as_str() {
            "GET" => Get::try_from(parser).map(Command::Get),
            "SET" => Set::try_from(parser).map(Command::Set),
            "GETSET" => GetSet::try_from(parser).map(Command::GetSet),
            "SETNX" => SetNx::try_from(parser).map(Command::SetNx),
            "SETEX" => SetEx::try_from(parser).map(Command::SetEx),
            "DEL" => Del::try_from(parser).map(Command::Del),
            "APPEND" => Append::try_from(parser).map(Command::Append),
            "STRLEN" => Strlen::try_from(parser).map(Command::Strlen),
            _ => Err(CommandError::Unknown(name)),
        }
    }
}

/// Cursor over a request array's arguments. The command name has already
/// been consumed by the time a command's `TryFrom` sees the parser.
pub struct CommandParser {
    parts: vec::IntoIter<Value>,
}

impl CommandParser {
    fn new(items: Vec<Value>) -> CommandParser {
        CommandParser {
            parts: items.into_iter(),
        }
    }

    /// The dispatch key: the rendered text of the array's first item.
    fn command_name(&mut self) -> Result<String, CommandError> {
        self.parts
            .next()
            .map(|item| item.render())
            .ok_or(CommandError::Empty)
    }

    /// Number of arguments not yet consumed.
    pub fn remaining(&self) -> usize {
        self.parts.len()
    }

    /// Extracts the next argument as a key. Keys must arrive as simple
    /// strings or non-null bulk strings.
    pub fn next_key(&mut self, command: &'static str) -> Result<String, CommandError> {
        match self.parts.next() {
            Some(Value::Simple(s)) => Ok(s),
            Some(Value::Bulk(Some(data))) => Ok(String::from_utf8_lossy(&data).into_owned()),
            _ => Err(CommandError::InvalidKey(command)),
        }
    }

    /// Extracts the next argument rendered to its textual form. Stored
    /// values are text regardless of the variant they arrived in.
    pub fn next_rendered(&mut self, arity_label: &'static str) -> Result<String, CommandError> {
        self.parts
            .next()
            .map(|item| item.render())
            .ok_or(CommandError::WrongArity(arity_label))
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandError {
    #[error("No command found")]
    Empty,
    #[error("expected a command array")]
    NotAnArray,
    #[error("wrong number of arguments for ({0}) command")]
    WrongArity(&'static str),
    #[error("{0} expects a string key value")]
    InvalidKey(&'static str),
    #[error("Invalid TTL specified {0}")]
    InvalidTtl(String),
    #[error("Unknown or disabled command '{0}'")]
    Unknown(String),
    #[error(transparent)]
    Value(#[from] ValueError),
}

impl CommandError {
    pub fn to_reply(&self) -> Value {
        Value::Error {
            code: DEFAULT_ERROR_CODE.to_string(),
            message: self.to_string(),
        }
    }
}
