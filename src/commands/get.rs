use tracing::warn;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::store::Store;
use crate::value::Value;

/// Returns the value stored at a key, or the null bulk string when the key
/// does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/get/>
#[derive(Debug, PartialEq)]
pub struct Get {
    pub key: String,
}

impl Executable for Get {
    fn exec(self, store: Store) -> Result<Value, CommandError> {
        match store.load(&self.key) {
            Some(value) => Ok(Value::bulk(value)?),
            None => Ok(Value::null()),
        }
    }
}

impl TryFrom<&mut CommandParser> for Get {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() == 0 {
            return Err(CommandError::WrongArity("get"));
        }
        let key = parser.next_key("GET")?;
        if parser.remaining() > 0 {
            warn!(
                ignored = parser.remaining(),
                "GET accepts a single key, ignoring extra arguments"
            );
        }
        Ok(Get { key })
    }
}
