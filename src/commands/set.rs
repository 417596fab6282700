use tracing::warn;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::store::Store;
use crate::value::Value;

/// Stores the rendered value at a key, overwriting any previous value and
/// dropping any pending expiry.
///
/// Ref: <https://redis.io/docs/latest/commands/set/>
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: String,
    pub value: String,
}

impl Executable for Set {
    fn exec(self, store: Store) -> Result<Value, CommandError> {
        store.store(&self.key, self.value);
        Ok(Value::ok())
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() < 2 {
            return Err(CommandError::WrongArity("set"));
        }
        let key = parser.next_key("SET")?;
        let value = parser.next_rendered("set")?;
        if parser.remaining() > 0 {
            warn!(
                ignored = parser.remaining(),
                "SET accepts a key and a value, ignoring extra arguments"
            );
        }
        Ok(Set { key, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[tokio::test]
    async fn stores_value_and_replies_ok() {
        let store = Store::new();

        let frame = Value::Array(vec![
            Value::bulk("SET").unwrap(),
            Value::bulk("foo").unwrap(),
            Value::bulk("baz").unwrap(),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Set(Set {
                key: "foo".to_string(),
                value: "baz".to_string()
            })
        );

        let reply = cmd.exec(store.clone()).unwrap();

        assert_eq!(reply, Value::ok());
        assert_eq!(store.load("foo"), Some("baz".to_string()));
    }

    #[tokio::test]
    async fn integer_value_is_stored_rendered() {
        let store = Store::new();

        let frame = Value::Array(vec![
            Value::bulk("SET").unwrap(),
            Value::bulk("n").unwrap(),
            Value::Integer(42),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        cmd.exec(store.clone()).unwrap();

        assert_eq!(store.load("n"), Some("42".to_string()));
    }

    #[test]
    fn missing_value_is_wrong_arity() {
        let frame = Value::Array(vec![
            Value::bulk("SET").unwrap(),
            Value::bulk("foo").unwrap(),
        ]);

        let err = Command::try_from(frame).unwrap_err();

        assert_eq!(err, CommandError::WrongArity("set"));
        assert_eq!(
            err.to_reply().render(),
            "ERR{wrong number of arguments for (set) command}"
        );
    }

    #[test]
    fn missing_key_and_value_is_wrong_arity() {
        let frame = Value::Array(vec![Value::bulk("SET").unwrap()]);

        let err = Command::try_from(frame).unwrap_err();

        assert_eq!(err, CommandError::WrongArity("set"));
    }

    #[test]
    fn extra_arguments_are_ignored() {
        let frame = Value::Array(vec![
            Value::bulk("SET").unwrap(),
            Value::bulk("foo").unwrap(),
            Value::bulk("bar").unwrap(),
            Value::bulk("extra").unwrap(),
        ]);

        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Set(Set {
                key: "foo".to_string(),
                value: "bar".to_string()
            })
        );
    }
}
