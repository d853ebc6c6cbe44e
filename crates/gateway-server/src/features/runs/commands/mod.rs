pub mod submit;

pub use submit::{SubmitRunCommand, SubmitRunError};
