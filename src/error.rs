use std::error::Error;
use std::fmt;

/// Coarse classification of an [`RpcError`], matching the four failure
/// families of the call lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised while building or serializing a call, before any network
    /// activity: invalid promise usage, unsupported node or literal kinds,
    /// stand-in requested for a non-conforming descriptor.
    Construction,
    /// A generated stub method was invoked outside `call`/`call_async`.
    DirectCall,
    /// The caller-supplied transport failed. Propagated unchanged.
    Transport,
    /// Malformed message or engine failure while materializing a result.
    Decode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Construction => write!(f, "construction"),
            ErrorKind::DirectCall => write!(f, "direct-call"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Decode => write!(f, "decode"),
        }
    }
}

/// Error raised by the remote-call core.
///
/// Every variant is raised at the point of occurrence; a failed call yields
/// no partial result. Transport failures are carried opaquely and never
/// wrapped, retried, or reinterpreted here.
#[derive(Debug)]
pub enum RpcError {
    /// An expression node cannot take part in a remote call, with the
    /// offending node rendered for context.
    InvalidExpression { message: String, expression: String },
    /// A constant has no literal encoding and is not a remote reference.
    InvalidConstant { type_name: String },
    /// A stand-in was requested for a descriptor that does not extend the
    /// remote root contract.
    InvalidStub { interface: String },
    /// A remote method was called directly on a stand-in.
    CannotCallRemoteMethod { method: String },
    /// The external transport failed.
    Transport { source: Box<dyn Error + Send + Sync> },
    /// The protocol text or a result message could not be decoded.
    Decode { message: String },
}

impl RpcError {
    pub fn invalid_expression(message: impl Into<String>, expression: impl fmt::Display) -> Self {
        RpcError::InvalidExpression {
            message: message.into(),
            expression: expression.to_string(),
        }
    }

    pub fn invalid_constant(type_name: impl Into<String>) -> Self {
        RpcError::InvalidConstant {
            type_name: type_name.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        RpcError::Decode {
            message: message.into(),
        }
    }

    pub fn transport(source: impl Error + Send + Sync + 'static) -> Self {
        RpcError::Transport {
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RpcError::InvalidExpression { .. }
            | RpcError::InvalidConstant { .. }
            | RpcError::InvalidStub { .. } => ErrorKind::Construction,
            RpcError::CannotCallRemoteMethod { .. } => ErrorKind::DirectCall,
            RpcError::Transport { .. } => ErrorKind::Transport,
            RpcError::Decode { .. } => ErrorKind::Decode,
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::InvalidExpression {
                message,
                expression,
            } => {
                write!(f, "{} in {}", message, expression)
            }
            RpcError::InvalidConstant { type_name } => {
                write!(
                    f,
                    "cannot convert type {} into a literal value, nor into a remote reference",
                    type_name
                )
            }
            RpcError::InvalidStub { interface } => {
                write!(
                    f,
                    "cannot build a stand-in for {}: not a remote-root capability interface",
                    interface
                )
            }
            RpcError::CannotCallRemoteMethod { method } => {
                write!(
                    f,
                    "remote method '{}' cannot be called directly; route it through call() or call_async()",
                    method
                )
            }
            RpcError::Transport { source } => write!(f, "transport error: {}", source),
            RpcError::Decode { message } => write!(f, "decode error: {}", message),
        }
    }
}

impl Error for RpcError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RpcError::Transport { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}
