use std::fmt;

/// Machine-readable error codes for scripted pre-flight checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ManifestNotFound,
    ManifestParseError,
    UnsupportedManifestFormat,
    ConfigParseError,
    UnknownReferenceTarget,
    ReportableCycle,
    PollTimedOut,
    PollCheckFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ManifestNotFound => "E1001",
            Self::ManifestParseError => "E1002",
            Self::UnsupportedManifestFormat => "E1003",
            Self::ConfigParseError => "E1004",
            Self::UnknownReferenceTarget => "E2001",
            Self::ReportableCycle => "E2002",
            Self::PollTimedOut => "E3001",
            Self::PollCheckFailed => "E3002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ManifestNotFound => "Registry manifest not found",
            Self::ManifestParseError => "Registry manifest parse error",
            Self::UnsupportedManifestFormat => "Unsupported registry manifest format",
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownReferenceTarget => "Reference to unregistered resource type",
            Self::ReportableCycle => "Reference cycle without a safe creation order",
            Self::PollTimedOut => "Polling timed out",
            Self::PollCheckFailed => "Status check failed while polling",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ManifestNotFound => Some("Pass the path of an existing registry manifest."),
            Self::ManifestParseError => {
                Some("Fix the manifest syntax; every reference needs a `target`.")
            }
            Self::UnsupportedManifestFormat => Some("Use a .toml, .json, .yaml or .yml manifest."),
            Self::ConfigParseError => Some("Fix syntax in .refgraph/config.toml and retry."),
            Self::UnknownReferenceTarget => {
                Some("Register the target type or correct the attribute's target.")
            }
            Self::ReportableCycle => Some(
                "Break the cycle with a schema change or a membership resource, or allow-list it in the cycle policy.",
            ),
            Self::PollTimedOut => Some("Raise the poll timeout or check the remote job state."),
            Self::PollCheckFailed => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 9] = [
        ErrorCode::ManifestNotFound,
        ErrorCode::ManifestParseError,
        ErrorCode::UnsupportedManifestFormat,
        ErrorCode::ConfigParseError,
        ErrorCode::UnknownReferenceTarget,
        ErrorCode::ReportableCycle,
        ErrorCode::PollTimedOut,
        ErrorCode::PollCheckFailed,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let raw = code.code();
            assert_eq!(raw.len(), 5);
            assert!(raw.starts_with('E'));
            assert!(raw.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(ErrorCode::ReportableCycle.to_string(), "E2002");
    }
}
