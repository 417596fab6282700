use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::store::Store;
use crate::value::Value;

/// Stores a value and schedules the key to expire after the given number of
/// seconds. The TTL literal is validated before anything is stored.
///
/// Ref: <https://redis.io/docs/latest/commands/setex/>
#[derive(Debug, PartialEq)]
pub struct SetEx {
    pub key: String,
    pub ttl_secs: i64,
    pub value: String,
}

impl Executable for SetEx {
    fn exec(self, store: Store) -> Result<Value, CommandError> {
        store.store_with_ttl(&self.key, self.value, self.ttl_secs);
        Ok(Value::ok())
    }
}

impl TryFrom<&mut CommandParser> for SetEx {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() < 3 {
            return Err(CommandError::WrongArity("SETEX"));
        }
        let key = parser.next_key("SETEX")?;
        let ttl_literal = parser.next_rendered("SETEX")?;
        let value = parser.next_rendered("SETEX")?;
        let ttl_secs = match ttl_literal.parse::<i64>() {
            Ok(secs) => secs,
            Err(_) => return Err(CommandError::InvalidTtl(ttl_literal)),
        };
        Ok(SetEx {
            key,
            ttl_secs,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use std::time::Duration;
    use tokio::time::sleep;

    fn setex_frame(key: &str, ttl: &str, value: &str) -> Value {
        Value::Array(vec![
            Value::bulk("SETEX").unwrap(),
            Value::bulk(key.to_string()).unwrap(),
            Value::bulk(ttl.to_string()).unwrap(),
            Value::bulk(value.to_string()).unwrap(),
        ])
    }

    #[tokio::test]
    async fn stores_value_and_replies_ok() {
        let store = Store::new();

        let cmd = Command::try_from(setex_frame("k", "100", "v")).unwrap();

        assert_eq!(
            cmd,
            Command::SetEx(SetEx {
                key: "k".to_string(),
                ttl_secs: 100,
                value: "v".to_string()
            })
        );

        let reply = cmd.exec(store.clone()).unwrap();

        assert_eq!(reply, Value::ok());
        assert_eq!(store.load("k"), Some("v".to_string()));
    }

    #[tokio::test]
    async fn key_is_gone_after_ttl_elapses() {
        let store = Store::new();

        let cmd = Command::try_from(setex_frame("ephemeral", "1", "v")).unwrap();
        cmd.exec(store.clone()).unwrap();

        sleep(Duration::from_secs(3)).await;

        assert_eq!(store.load("ephemeral"), None);
    }

    #[tokio::test]
    async fn invalid_ttl_stores_nothing() {
        let store = Store::new();

        let err = Command::try_from(setex_frame("k", "soon", "v")).unwrap_err();

        assert_eq!(err, CommandError::InvalidTtl("soon".to_string()));
        assert_eq!(err.to_reply().render(), "ERR{Invalid TTL specified soon}");
        assert_eq!(store.load("k"), None);
    }

    #[test]
    fn missing_value_is_wrong_arity() {
        let frame = Value::Array(vec![
            Value::bulk("SETEX").unwrap(),
            Value::bulk("k").unwrap(),
            Value::bulk("10").unwrap(),
        ]);

        let err = Command::try_from(frame).unwrap_err();

        assert_eq!(err, CommandError::WrongArity("SETEX"));
        assert_eq!(
            err.to_reply().render(),
            "ERR{wrong number of arguments for (SETEX) command}"
        );
    }
}
