pub mod poll;

pub use poll::{PollRunError, PollRunQuery};
