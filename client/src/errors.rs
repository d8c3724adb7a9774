use rql::RqlError;

#[derive(Debug)]
pub enum ClientError {
    /// Malformed builder argument, detected before any I/O.
    InvalidInput(String),
    Expression(RqlError),
    /// The server answered with a status >= 400.
    Remote {
        status: u16,
        body: String,
    },
    Transport(String),
    Decode(String),
}

impl ClientError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ClientError::InvalidInput(message.into())
    }

    /// True for failures raised by the remote side or the transport.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ClientError::Remote { .. } | ClientError::Transport(_) | ClientError::Decode(_)
        )
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::InvalidInput(message) => write!(f, "Invalid input: {}", message),
            ClientError::Expression(err) => write!(f, "Invalid expression: {}", err),
            ClientError::Remote { status, body } => {
                write!(f, "Remote API error ({}): {}", status, body)
            }
            ClientError::Transport(message) => write!(f, "Transport error: {}", message),
            ClientError::Decode(message) => write!(f, "Failed to decode response: {}", message),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Expression(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RqlError> for ClientError {
    fn from(error: RqlError) -> Self {
        ClientError::Expression(error)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ClientError::Decode(error.to_string())
        } else {
            ClientError::Transport(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::Decode(error.to_string())
    }
}
