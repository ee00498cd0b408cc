/// Utility enum that covers all possible errors while rendering workloads
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A binding was declared without the trait required to back it.
    #[error("the trait {trait_kind} is required to use binding {binding_kind}")]
    MissingTrait {
        trait_kind: String,
        binding_kind: String,
    },

    /// A trait of the requested kind is present but its payload has the wrong shape.
    #[error("trait {kind} could not be decoded: {source}")]
    TraitSchema {
        kind: String,
        source: serde_json::Error,
    },

    #[error("binding {binding} of kind {kind} could not be decoded: {source}")]
    BindingSchema {
        binding: String,
        kind: String,
        source: serde_json::Error,
    },

    #[error("properties of workload {workload} could not be decoded: {source}")]
    WorkloadSchema {
        workload: String,
        source: serde_json::Error,
    },

    #[error("Invalid Radius Logger Profile {0:?} set. Valid options are: development, production")]
    InvalidLoggerProfile(String),

    #[error("invalid resource name {0:?}")]
    InvalidResourceName(String),

    #[error("{tool} not installed, run \"{remediation}\" to install")]
    ToolNotInstalled { tool: String, remediation: String },

    #[error("failed executing {command:?}: {source}")]
    ToolExecution {
        command: String,
        source: std::io::Error,
    },

    #[error("failed executing {command:?}: {status}")]
    ToolExit { command: String, status: String },

    #[error("failed to parse output of {command:?}: {source}")]
    ToolOutput {
        command: String,
        source: serde_json::Error,
    },

    #[error("render was cancelled")]
    Cancelled,

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("Unable to initialize logger: {source}")]
    LoggerError {
        #[from]
        source: log::SetLoggerError,
    },
}
