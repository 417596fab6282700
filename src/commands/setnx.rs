use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::store::Store;
use crate::value::Value;

/// Stores a value only when the key does not exist yet. Replies `1` when the
/// value was stored and `0` when the key was already present.
///
/// Ref: <https://redis.io/docs/latest/commands/setnx/>
#[derive(Debug, PartialEq)]
pub struct SetNx {
    pub key: String,
    pub value: String,
}

impl Executable for SetNx {
    fn exec(self, store: Store) -> Result<Value, CommandError> {
        if store.load(&self.key).is_some() {
            return Ok(Value::Integer(0));
        }
        store.store(&self.key, self.value);
        Ok(Value::Integer(1))
    }
}

impl TryFrom<&mut CommandParser> for SetNx {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        // SETNX shares SET's argument shape, arity label included.
        if parser.remaining() < 2 {
            return Err(CommandError::WrongArity("set"));
        }
        let key = parser.next_key("SETNX")?;
        let value = parser.next_rendered("set")?;
        Ok(SetNx { key, value })
    }
}
