use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize result of {tool}: {source}")]
    Serialize {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
