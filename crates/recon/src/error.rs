use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty field name, duplicate column, etc.).
    ConfigValidation(String),
    /// A caller-supplied date could not be parsed.
    DateParse { value: String },
    /// Record store failure (connection, query, decode). Passed through untouched.
    Store(String),
    /// IO error (file read/write, CSV encoding).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::DateParse { value } => write!(f, "cannot parse date '{value}'"),
            Self::Store(msg) => write!(f, "record store error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<std::io::Error> for ReconError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
