use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `PrepError` and maps to other errors to
/// convert to a `PrepError`
///
/// Only malformed input is represented here. Gaps in the data (no onset day,
/// a missing mitigation date, no population figure, an unusable prior fit)
/// are not errors; see [`crate::lookup::Lookup`].
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum PrepError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    /// A cutoff, epoch or table date did not match `MM/DD/YY`.
    InvalidDateFormat(String),
    /// A prior fit's sample table does not carry the expected parameters.
    SchemaMismatch(String),
    /// A prior's hyperparameters do not describe a valid distribution.
    InvalidPrior(String),
    PrepError(String),
}

impl From<io::Error> for PrepError {
    fn from(error: io::Error) -> Self {
        PrepError::IoError(error)
    }
}

impl From<serde_json::Error> for PrepError {
    fn from(error: serde_json::Error) -> Self {
        PrepError::JsonError(error)
    }
}

impl From<csv::Error> for PrepError {
    fn from(error: csv::Error) -> Self {
        PrepError::CsvError(error)
    }
}

impl From<String> for PrepError {
    fn from(error: String) -> Self {
        PrepError::PrepError(error)
    }
}

impl From<&str> for PrepError {
    fn from(error: &str) -> Self {
        PrepError::PrepError(error.to_string())
    }
}

impl std::error::Error for PrepError {}

impl Display for PrepError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrepError::InvalidDateFormat(value) => {
                write!(f, "Incorrect date format {value:?}, should be MM/DD/YY")
            }
            PrepError::SchemaMismatch(msg) => write!(f, "Sample schema mismatch: {msg}"),
            PrepError::InvalidPrior(msg) => write!(f, "Invalid prior: {msg}"),
            _ => write!(f, "Error: {self:?}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::PrepError;

    #[test]
    fn date_format_message_names_expected_pattern() {
        let error = PrepError::InvalidDateFormat("13/40/99".to_string());
        assert_eq!(
            error.to_string(),
            "Incorrect date format \"13/40/99\", should be MM/DD/YY"
        );
    }

    #[test]
    fn string_converts_to_generic_variant() {
        let error: PrepError = "boom".into();
        assert!(matches!(error, PrepError::PrepError(ref msg) if msg == "boom"));
    }
}
