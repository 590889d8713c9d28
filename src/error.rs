use std::fmt::{Display, Formatter};

/// An error which can occur when building models or processing simulation results.
#[derive(Debug)]
pub enum MabossError {
    /// A node (or other named entity) does not exist, or a mutation state symbol
    /// is not recognized.
    InvalidIdentifier(String),
    /// An expression is not syntactically valid.
    InvalidExpression(String),
    /// A simulation parameter (or an initial state) has an unsupported name or value.
    InvalidParameter(String),
    /// A simulator export violates the expected table structure.
    MalformedExport(String),
    /// A filter predicate does not follow the `<column> <op> <number>` grammar, or it
    /// references an unknown column.
    InvalidPredicate(String),
    /// The result of one ensemble member could not be extracted.
    ExtractionFailure {
        model: usize,
        cause: Box<MabossError>,
    },
    /// A result file could not be read.
    Io(std::io::Error),
    /// The worker pool used for aggregation could not be created.
    WorkerPool(String),
}

impl MabossError {
    /// Wrap this error as a failure of the ensemble member with the given index.
    pub fn in_model(self, model: usize) -> MabossError {
        MabossError::ExtractionFailure {
            model,
            cause: Box::new(self),
        }
    }
}

impl Display for MabossError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MabossError::InvalidIdentifier(message) => write!(f, "Invalid identifier: {message}"),
            MabossError::InvalidExpression(message) => write!(f, "Invalid expression: {message}"),
            MabossError::InvalidParameter(message) => write!(f, "Invalid parameter: {message}"),
            MabossError::MalformedExport(message) => write!(f, "Malformed export: {message}"),
            MabossError::InvalidPredicate(message) => write!(f, "Invalid predicate: {message}"),
            MabossError::ExtractionFailure { model, cause } => {
                write!(f, "Cannot extract results of model {model}: {cause}")
            }
            MabossError::Io(error) => write!(f, "Cannot read result file: {error}"),
            MabossError::WorkerPool(message) => write!(f, "Cannot create worker pool: {message}"),
        }
    }
}

impl std::error::Error for MabossError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MabossError::ExtractionFailure { cause, .. } => Some(cause.as_ref()),
            MabossError::Io(error) => Some(error),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MabossError {
    fn from(value: std::io::Error) -> Self {
        MabossError::Io(value)
    }
}
