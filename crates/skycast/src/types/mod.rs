mod function;
mod kind;
mod value;

pub use function::{NativeFn, NativeFunction};
pub use kind::{Kind, Signature};
pub use value::Value;
