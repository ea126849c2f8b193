//! Tool registry: the adapters exposed under stable names with JSON-schema
//! parameter lists, for an LLM agent's function-calling dispatcher.

pub mod error;
pub mod registry;
pub mod spec;

pub use error::ToolError;
pub use registry::{current_date, declarations, ToolKind, ToolRegistry};
pub use spec::{FunctionDeclaration, ParamSpec, ParamType, ToolSpec};
