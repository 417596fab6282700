use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::store::Store;
use crate::value::Value;

/// Replies with the byte length of the value stored at a key, or `0` when
/// the key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/strlen/>
#[derive(Debug, PartialEq)]
pub struct Strlen {
    pub key: String,
}

impl Executable for Strlen {
    fn exec(self, store: Store) -> Result<Value, CommandError> {
        match store.load(&self.key) {
            Some(value) => Ok(Value::Integer(value.len() as i64)),
            None => Ok(Value::Integer(0)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Strlen {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() == 0 {
            return Err(CommandError::WrongArity("strlen"));
        }
        let key = parser.next_key("STRLEN")?;
        Ok(Strlen { key })
    }
}
