use protinfer::ProtInferError;

#[derive(Debug)]
pub enum CliError {
    Config {
        source: String,
    },
    ParseError {
        msg: String,
    },
    Io {
        source: String,
        path: Option<String>,
    },
    Analysis(ProtInferError),
    Output {
        source: String,
    },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config { source } => write!(f, "Error interpreting the config: {}", source),
            CliError::ParseError { msg } => write!(f, "Error parsing config: {}", msg),
            CliError::Io { source, path } => {
                if let Some(path) = path {
                    write!(f, "Error reading file {}: {}", path, source)
                } else {
                    write!(f, "Error reading file: {}", source)
                }
            }
            CliError::Analysis(e) => write!(f, "Analysis failed: {}", e),
            CliError::Output { source } => write!(f, "Error writing results: {}", source),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ProtInferError> for CliError {
    fn from(e: ProtInferError) -> Self {
        CliError::Analysis(e)
    }
}

impl From<protinfer::errors::CompilerError> for CliError {
    fn from(e: protinfer::errors::CompilerError) -> Self {
        CliError::Analysis(e.into())
    }
}

impl From<csv::Error> for CliError {
    fn from(e: csv::Error) -> Self {
        CliError::Output {
            source: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output {
            source: e.to_string(),
        }
    }
}
