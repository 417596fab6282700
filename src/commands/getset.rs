use tracing::warn;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::store::Store;
use crate::value::Value;

/// Stores a new value and replies with the value it replaced. When the key
/// held nothing, the reply is the newly supplied value.
#[derive(Debug, PartialEq)]
pub struct GetSet {
    pub key: String,
    pub value: String,
}

impl Executable for GetSet {
    fn exec(self, store: Store) -> Result<Value, CommandError> {
        let prior = store.load(&self.key);
        store.store(&self.key, self.value.clone());
        Ok(Value::bulk(prior.unwrap_or(self.value))?)
    }
}

impl TryFrom<&mut CommandParser> for GetSet {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        // GETSET shares SET's argument shape, arity label included.
        if parser.remaining() < 2 {
            return Err(CommandError::WrongArity("set"));
        }
        let key = parser.next_key("GETSET")?;
        let value = parser.next_rendered("set")?;
        if parser.remaining() > 0 {
            warn!(
                ignored = parser.remaining(),
                "GETSET accepts a key and a value, ignoring extra arguments"
            );
        }
        Ok(GetSet { key, value })
    }
}
