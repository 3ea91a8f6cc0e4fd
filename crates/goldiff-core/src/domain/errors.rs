use std::error::Error;
use std::fmt::{Display, Formatter};

pub type GoldiffResult<T> = Result<T, GoldiffError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoldiffErrorCategory {
    InputValidationError,
    IoSystemError,
    InternalError,
}

impl GoldiffErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::InternalError => "InternalError",
        }
    }
}

/// Failure that prevented a comparison from producing a verdict.
///
/// Differences between files are never reported through this type; they are
/// returned as comparison results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldiffError {
    category: GoldiffErrorCategory,
    code: &'static str,
    message: String,
}

impl GoldiffError {
    pub fn new(
        category: GoldiffErrorCategory,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn input_validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(GoldiffErrorCategory::InputValidationError, code, message)
    }

    pub fn io_system(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(GoldiffErrorCategory::IoSystemError, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(GoldiffErrorCategory::InternalError, code, message)
    }

    pub const fn category(&self) -> GoldiffErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.code, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for GoldiffError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.code,
            self.message
        )
    }
}

impl Error for GoldiffError {}
