//! Error types for Vitotrol client operations

use thiserror::Error;

/// Result type alias for Vitotrol client operations
pub type Result<T> = std::result::Result<T, VitotrolError>;

/// Errors that can occur during Vitotrol client operations
#[derive(Error, Debug)]
pub enum VitotrolError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Server answered with a non-200 HTTP status
    #[error("HTTP error: [status={status}] {body} ({headers:?})")]
    HttpStatus {
        status: u16,
        body: String,
        headers: Vec<(String, String)>,
    },

    /// Malformed XML response
    #[error("Malformed XML response: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// Failed to make sense of an otherwise well-formed response
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Application-level error carried by the result header of a response.
    /// Its string form is `<message> [#<code>]`.
    #[error("{message} [#{code}]")]
    Server { code: i32, message: String },

    /// Value cannot be converted by the attribute's codec
    #[error("Invalid value `{0}`")]
    FormatInvalid(String),

    /// Enum value out of domain (distinct from a generic parse failure)
    #[error("Invalid Enum value `{0}`")]
    EnumInvalidValue(String),

    /// Attribute name or ID not present in the registry
    #[error("Unknown attribute `{0}`")]
    UnknownAttribute(String),

    /// Attribute does not grant the required access
    #[error("Attribute `{name}` is not {required}")]
    AttributeAccess { name: String, required: String },

    /// Timesheet day token is not a recognized weekday
    #[error("Bad timesheet day `{0}`")]
    BadDay(String),

    /// Timesheet day range does not parse into two valid weekdays
    #[error("Bad timesheet range of days `{0}`")]
    BadDayRange(String),

    /// A day is covered by more than one timesheet input key
    #[error("Duplicate day `{0}`")]
    DuplicateDay(String),

    /// Asynchronous operation did not complete before the timeout ceiling
    #[error("Timeout")]
    Timeout,

    /// The background poll task went away without delivering a result
    #[error("Poll task cancelled")]
    Cancelled,
}

impl VitotrolError {
    /// Create a server error from a result header code and message
    pub fn server(code: i32, message: impl Into<String>) -> Self {
        Self::Server {
            code,
            message: message.into(),
        }
    }
}
