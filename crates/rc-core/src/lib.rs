pub mod error;
pub mod options;
pub mod types;
pub mod value;

pub use error::{ErrorKind, RunCodeError};
pub use options::RunCodeOptions;
pub use types::*;
pub use value::*;
