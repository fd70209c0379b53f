//! Bytecode runtime: values, compiled paths, and the story VM.

pub mod opcode;
pub mod path;
pub mod stream;
pub mod story;
pub mod value;

pub use opcode::Opcode;
pub use path::{ContentPath, DEFAULT_PATH, Program};
pub use story::{Choice, RuntimeError, Story};
pub use value::Value;
