use crate::commands::CommandError;
use crate::store::Store;
use crate::value::Value;

pub trait Executable {
    fn exec(self, store: Store) -> Result<Value, CommandError>;
}
