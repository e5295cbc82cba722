use crate::value::Value;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured runtime error with a stable classification.
/// Every public operation returns this type; module-local errors convert
/// into it at the boundary.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl Error {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a configuration error for a specific origin.
    pub fn configuration(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Configuration, origin, message)
    }

    /// Construct a descriptor-build failure carrying the target type name.
    pub fn descriptor_build(entity: impl Into<String>, message: impl Into<String>) -> Self {
        let entity = entity.into();
        let message = message.into();

        Self {
            class: ErrorClass::DescriptorBuild,
            origin: ErrorOrigin::Descriptor,
            message: format!("cannot build descriptor for '{entity}': {message}"),
            detail: Some(ErrorDetail::Build { entity }),
        }
    }

    /// Construct a row-conversion failure with full field context.
    pub fn conversion(err: ConversionError) -> Self {
        Self {
            class: ErrorClass::Conversion,
            origin: ErrorOrigin::Mapper,
            message: err.to_string(),
            detail: Some(ErrorDetail::Conversion(err)),
        }
    }

    /// Collapse every per-row failure from a parallel run into one error.
    pub fn aggregate(entity: &str, failures: Vec<Self>) -> Self {
        Self {
            class: ErrorClass::Conversion,
            origin: ErrorOrigin::Mapper,
            message: format!("{} row(s) failed to map onto '{entity}'", failures.len()),
            detail: Some(ErrorDetail::Aggregate(failures)),
        }
    }

    /// Construct the distinct stopped-by-request signal.
    pub fn cancelled(origin: ErrorOrigin) -> Self {
        Self::new(
            ErrorClass::Cancelled,
            origin,
            format!("{origin} operation cancelled"),
        )
    }

    /// Construct a row-source failure.
    pub fn source(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Source, ErrorOrigin::Source, message)
    }

    /// Construct an internal invariant failure.
    pub(crate) fn internal(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, origin, message)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.class == ErrorClass::Cancelled
    }

    #[must_use]
    pub fn is_configuration(&self) -> bool {
        self.class == ErrorClass::Configuration
    }

    /// Field context when this is a single-field conversion failure.
    #[must_use]
    pub const fn conversion_detail(&self) -> Option<&ConversionError> {
        match &self.detail {
            Some(ErrorDetail::Conversion(err)) => Some(err),
            _ => None,
        }
    }

    /// Every collected failure when this is an aggregate; empty otherwise.
    #[must_use]
    pub fn failures(&self) -> &[Self] {
        match &self.detail {
            Some(ErrorDetail::Aggregate(failures)) => failures,
            _ => &[],
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, class-specific error detail carried by [`Error`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Conversion(ConversionError),

    #[error("{} failures", .0.len())]
    Aggregate(Vec<Error>),

    #[error("descriptor build failed for '{entity}'")]
    Build { entity: String },
}

///
/// ConversionError
///
/// A single field could not be converted or assigned.
/// Never returned directly; always wrapped in [`ErrorDetail::Conversion`].
///

#[derive(Clone, Debug, ThisError)]
#[error(
    "cannot map column '{column}' onto {entity}.{field}{}: value {value:?}: {reason}",
    .row.map(|row| format!(" (row {row})")).unwrap_or_default()
)]
pub struct ConversionError {
    pub entity: String,
    pub field: String,
    pub column: String,
    pub value: Value,
    pub row: Option<usize>,
    pub reason: String,
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Configuration,
    DescriptorBuild,
    Conversion,
    Cancelled,
    Source,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::DescriptorBuild => "descriptor_build",
            Self::Conversion => "conversion",
            Self::Cancelled => "cancelled",
            Self::Source => "source",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Config,
    Descriptor,
    Identity,
    Parameter,
    Mapper,
    Source,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Config => "config",
            Self::Descriptor => "descriptor",
            Self::Identity => "identity",
            Self::Parameter => "parameter",
            Self::Mapper => "mapper",
            Self::Source => "source",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_conversion(row: Option<usize>) -> ConversionError {
        ConversionError {
            entity: "app::User".to_string(),
            field: "age".to_string(),
            column: "Age".to_string(),
            value: Value::Text("old".to_string()),
            row,
            reason: "cannot convert into i32".to_string(),
        }
    }

    #[test]
    fn conversion_message_names_every_coordinate() {
        let err = Error::conversion(sample_conversion(Some(3)));
        let message = err.to_string();

        assert!(message.contains("'Age'"));
        assert!(message.contains("app::User.age"));
        assert!(message.contains("(row 3)"));
        assert!(message.contains("\"old\""));
        assert_eq!(err.conversion_detail().unwrap().field, "age");
    }

    #[test]
    fn aggregate_keeps_every_failure() {
        let err = Error::aggregate(
            "app::User",
            vec![
                Error::conversion(sample_conversion(Some(0))),
                Error::conversion(sample_conversion(Some(7))),
            ],
        );

        assert_eq!(err.class, ErrorClass::Conversion);
        assert_eq!(err.failures().len(), 2);
        assert!(err.to_string().starts_with("2 row(s)"));
    }

    #[test]
    fn cancellation_is_distinct_from_failure() {
        let err = Error::cancelled(ErrorOrigin::Mapper);

        assert!(err.is_cancelled());
        assert!(!err.is_configuration());
        assert_eq!(err.display_with_class(), "mapper:cancelled: mapper operation cancelled");
    }
}
