//! Defines error types.

/// Fault raised by an injected platform service.
///
/// These are the platform's own failures, kept as the `source` of the
/// crate-level [`Error`] so callers can still see what the OS reported.
#[derive(Debug, Clone)]
pub enum PlatformFault {
    /// A permission was revoked or denied between check and use.
    Security(String),
    /// The backing system service is gone or refused the call.
    ServiceUnavailable(String),
}

impl std::error::Error for PlatformFault {}

impl std::fmt::Display for PlatformFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Security(msg) => write!(f, "security exception: {msg}"),
            Self::ServiceUnavailable(msg) => write!(f, "service unavailable: {msg}"),
        }
    }
}

/// The error type for bridge operations.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    source: Option<PlatformFault>,
    message: String,
}

impl Error {
    pub(crate) fn new<S: ToString>(
        kind: ErrorKind,
        source: Option<PlatformFault>,
        message: S,
    ) -> Self {
        Error {
            kind,
            source,
            message: message.to_string(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message for this error.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Stable code for this error as reported over the bridge.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// True for both [`ErrorKind::PermissionDenied`] and
    /// [`ErrorKind::SecurityFault`]: a permission revoked mid-flight is
    /// reported to callers the same way as an up-front denial.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::PermissionDenied | ErrorKind::SecurityFault
        )
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.message.is_empty(), &self.source) {
            (true, None) => write!(f, "{}", &self.kind),
            (false, None) => write!(f, "{}: {}", &self.kind, &self.message),
            (_, Some(fault)) => write!(f, "{}: {}", &self.kind, fault),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|x| {
            let x: &(dyn std::error::Error + 'static) = x;
            x
        })
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            source: None,
            message: String::new(),
        }
    }
}

impl From<PlatformFault> for Error {
    fn from(fault: PlatformFault) -> Self {
        let kind = match &fault {
            PlatformFault::Security(_) => ErrorKind::SecurityFault,
            PlatformFault::ServiceUnavailable(_) => ErrorKind::Internal,
        };
        let msg = fault.to_string();
        Error::new(kind, Some(fault), msg)
    }
}

/// A list of general categories of bridge error.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// location permission not granted at call time
    PermissionDenied,
    /// neither the GPS nor the network provider is enabled
    ProviderDisabled,
    /// the provider went away between the precondition check and the
    /// subscribe call
    NoProviderAvailable,
    /// no fix obtained within the configured bound
    Timeout,
    /// a permission was revoked while the request was in flight
    SecurityFault,
    /// the bridge received a method name it does not implement
    UnknownMethod,
    /// the response channel to the application closed
    ChannelClosed,
    /// an internal error has occurred
    Internal,
}

impl ErrorKind {
    /// Wire code used in bridge error payloads. Codes are part of the
    /// protocol with the application layer and must stay stable.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::ProviderDisabled => "GPS_DISABLED",
            ErrorKind::NoProviderAvailable => "NO_PROVIDER",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::SecurityFault => "SECURITY_EXCEPTION",
            ErrorKind::UnknownMethod => "NOT_IMPLEMENTED",
            ErrorKind::ChannelClosed => "CHANNEL_CLOSED",
            ErrorKind::Internal => "UNKNOWN_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::PermissionDenied => f.write_str("location permission not granted"),
            ErrorKind::ProviderDisabled => f.write_str("no location provider enabled"),
            ErrorKind::NoProviderAvailable => f.write_str("no location provider available"),
            ErrorKind::Timeout => f.write_str("timed out"),
            ErrorKind::SecurityFault => f.write_str("permission revoked while in use"),
            ErrorKind::UnknownMethod => f.write_str("method not implemented"),
            ErrorKind::ChannelClosed => f.write_str("response channel closed"),
            ErrorKind::Internal => f.write_str("an internal error has occurred"),
        }
    }
}
