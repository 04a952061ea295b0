use std::fmt;

/// Machine-readable error codes shared by the library, the CLI, and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    CatalogUnavailable,
    CatalogParseError,
    QuoteNotFound,
    StorageWriteFailed,
    StorageLockContention,
    RemoteUnavailable,
    RemoteRecordMissing,
    RemoteDecodeFailed,
    SignInFailed,
    SignOutFailed,
    NotSignedIn,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::CatalogUnavailable => "E2001",
            Self::CatalogParseError => "E2002",
            Self::QuoteNotFound => "E2003",
            Self::StorageWriteFailed => "E3001",
            Self::StorageLockContention => "E3002",
            Self::RemoteUnavailable => "E4001",
            Self::RemoteRecordMissing => "E4002",
            Self::RemoteDecodeFailed => "E4003",
            Self::SignInFailed => "E5001",
            Self::SignOutFailed => "E5002",
            Self::NotSignedIn => "E5003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::CatalogUnavailable => "Quote catalog unavailable",
            Self::CatalogParseError => "Quote catalog is malformed",
            Self::QuoteNotFound => "Quote not found",
            Self::StorageWriteFailed => "Local storage write failed",
            Self::StorageLockContention => "Local storage lock contention",
            Self::RemoteUnavailable => "Cloud store unavailable",
            Self::RemoteRecordMissing => "Cloud like record missing",
            Self::RemoteDecodeFailed => "Cloud like record is malformed",
            Self::SignInFailed => "Sign-in failed",
            Self::SignOutFailed => "Sign-out failed",
            Self::NotSignedIn => "Not signed in",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .haze/config.toml and retry."),
            Self::CatalogUnavailable => Some("Check that catalog.path points at a readable file."),
            Self::CatalogParseError => {
                Some("The catalog must be a JSON array of {id?, text, author?} objects.")
            }
            Self::QuoteNotFound => None,
            Self::StorageWriteFailed => Some("Check disk space and write permissions."),
            Self::StorageLockContention => {
                Some("Retry after the other `haze` process releases its lock.")
            }
            Self::RemoteUnavailable => Some("Likes are kept on this device until the next sync."),
            Self::RemoteRecordMissing => None,
            Self::RemoteDecodeFailed => Some("Run `haze sync --force` to rewrite the record."),
            Self::SignInFailed => Some("Retry `haze signin`."),
            Self::SignOutFailed => Some("Retry `haze signout`."),
            Self::NotSignedIn => Some("Run `haze signin --uid <uid>` first."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
