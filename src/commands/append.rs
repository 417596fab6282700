use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::store::Store;
use crate::value::Value;

/// Concatenates the argument with any existing value and replies with the
/// resulting length. The new value goes in front of the stored one, not
/// behind it; a missing key behaves like SET.
#[derive(Debug, PartialEq)]
pub struct Append {
    pub key: String,
    pub value: String,
}

impl Executable for Append {
    fn exec(self, store: Store) -> Result<Value, CommandError> {
        let combined = match store.load(&self.key) {
            Some(existing) => format!("{}{}", self.value, existing),
            None => self.value,
        };
        store.store(&self.key, combined.clone());
        Ok(Value::Integer(combined.len() as i64))
    }
}

impl TryFrom<&mut CommandParser> for Append {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() < 2 {
            return Err(CommandError::WrongArity("append"));
        }
        let key = parser.next_key("APPEND")?;
        let value = parser.next_rendered("append")?;
        Ok(Append { key, value })
    }
}
