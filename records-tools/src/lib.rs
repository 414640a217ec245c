//! Tool-call layer between the language model and the records store
//!
//! A transcript goes to a [`ToolSelector`] which answers with zero or more
//! raw tool calls. Each raw call is parsed into a typed [`ToolCall`], run by
//! the [`Dispatcher`] against [`RecordQueries`], and the resulting
//! [`ToolOutcome`] is rendered as text or JSON by the [`render`] module.
//!
//! The advertised tool schema is generated from [`Operation::ALL`], so every
//! advertised tool has a handler and every handler is advertised.

pub mod deadline;
pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod queries;
pub mod render;
pub mod selector;
pub mod tools;

pub use deadline::{run_with_deadline, Interrupted};
pub use dispatcher::{DispatchRecord, Dispatcher};
pub use error::{ToolError, ToolFailure, ToolResult};
pub use protocol::{Envelope, RawToolCall, ToolDefinition, ToolOutcome, ToolOutput};
pub use queries::RecordQueries;
pub use render::{render_json, render_outcome, render_text, ResponseFormat};
pub use selector::{OpenAiToolSelector, Selection, SelectorConfig, ToolSelector};
pub use tools::{Operation, ToolCall, ToolsRegistry};
