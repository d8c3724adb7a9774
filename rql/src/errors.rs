#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RqlError {
    /// A value of the wrong kind was passed to an operator.
    TypeKind {
        operator: String,
        kind: &'static str,
    },
    InvalidField(String),
    Parse {
        position: usize,
        message: String,
    },
}

impl std::fmt::Display for RqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RqlError::TypeKind { operator, kind } => {
                write!(f, "Operator {} does not accept {} values", operator, kind)
            }
            RqlError::InvalidField(path) => write!(f, "Invalid field path: {:?}", path),
            RqlError::Parse { position, message } => {
                write!(f, "Parse error at position {}: {}", position, message)
            }
        }
    }
}

impl std::error::Error for RqlError {}
