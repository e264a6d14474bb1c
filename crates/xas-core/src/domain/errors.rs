use std::error::Error;
use std::fmt::{Display, Formatter};

pub type XasResult<T> = Result<T, XasError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XasErrorCategory {
    Success,
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl XasErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

/// Error shared by every stage of a batch run.
///
/// `placeholder` is a stable dotted code (`INPUT.ASCII_ROW_WIDTH`,
/// `IO.DISCOVERY_READ_DIR`, ...) that tests and log readers can match on
/// without depending on message wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XasError {
    category: XasErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl XasError {
    pub fn new(
        category: XasErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XasErrorCategory::InputValidationError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XasErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XasErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XasErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> XasErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for XasError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for XasError {}

#[cfg(test)]
mod tests {
    use super::{XasError, XasErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (XasErrorCategory::Success, 0, "Success"),
            (
                XasErrorCategory::InputValidationError,
                2,
                "InputValidationError",
            ),
            (XasErrorCategory::IoSystemError, 3, "IoSystemError"),
            (XasErrorCategory::ComputationError, 4, "ComputationError"),
            (XasErrorCategory::InternalError, 5, "InternalError"),
        ];

        for (category, exit_code, name) in cases {
            assert_eq!(category.exit_code(), exit_code);
            assert_eq!(category.as_str(), name);
        }
    }

    #[test]
    fn fatal_error_renders_diagnostic_lines() {
        let error = XasError::input_validation(
            "INPUT.COLUMN_RANGE",
            "column 7 requested for 'it' but file has 5 columns",
        );

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [INPUT.COLUMN_RANGE] column 7 requested for 'it' but file has 5 columns"
        );
        assert_eq!(
            error.fatal_exit_line().as_deref(),
            Some("FATAL EXIT CODE: 2")
        );
    }

    #[test]
    fn display_includes_category_and_placeholder() {
        let error = XasError::computation("RUN.EDGE_STEP", "edge step is zero");
        assert_eq!(
            error.to_string(),
            "ComputationError [RUN.EDGE_STEP] edge step is zero"
        );
    }
}
