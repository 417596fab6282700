use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::store::Store;
use crate::value::Value;

/// Removes every named key and replies with the number of keys that were
/// actually removed.
///
/// Ref: <https://redis.io/docs/latest/commands/del/>
#[derive(Debug, PartialEq)]
pub struct Del {
    pub keys: Vec<String>,
}

impl Executable for Del {
    fn exec(self, store: Store) -> Result<Value, CommandError> {
        let mut removed = 0;
        for key in &self.keys {
            if store.delete(key) {
                removed += 1;
            }
        }
        Ok(Value::Integer(removed))
    }
}

impl TryFrom<&mut CommandParser> for Del {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() == 0 {
            return Err(CommandError::WrongArity("del"));
        }
        let mut keys = Vec::with_capacity(parser.remaining());
        while parser.remaining() > 0 {
            keys.push(parser.next_key("DEL")?);
        }
        Ok(Del { keys })
    }
}
