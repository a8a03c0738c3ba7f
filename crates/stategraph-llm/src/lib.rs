//! # stategraph-llm - Chat-model boundary for workflow graphs
//!
//! Everything a graph node needs to talk to a language model, specified at
//! the boundary only:
//!
//! - [`Message`] / [`Prompt`] - plain text or role-tagged message sequences
//! - [`PromptTemplate`] - `{variable}` substitution
//! - [`ChatModel`] - the backend trait; [`FakeChatModel`] is the
//!   deterministic test double (scripted completions, failures on a
//!   schedule)
//! - [`EnumOutputParser`] - maps completion text onto a fixed label set,
//!   case/whitespace-insensitive
//!
//! No network client lives here; a real backend implements [`ChatModel`]
//! elsewhere.

pub mod message;
pub mod model;
pub mod parser;
pub mod prompt;

pub use message::{Message, Prompt, Role};
pub use model::{ChatModel, FakeChatModel, ModelError};
pub use parser::{EnumOutputParser, ParseError};
pub use prompt::{MissingVariable, PromptTemplate};
