use thiserror::Error;

/// Application-level error: a message plus the process exit code.
///
/// Exit codes:
/// - `2`: configuration or file IO problems
/// - `3`: invalid input data (grids, strikes, targets)
/// - `4`: numerical failure (mismatched dimensions, degenerate basis)
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Errors raised by the approximation core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Dimension mismatch for '{name}': expected {expected} grid values, found {found}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Grid mismatch at index {index}: target has {expected}, basis has {found}")]
    GridMismatch { index: usize, expected: f64, found: f64 },

    #[error(
        "Degenerate basis: rank {rank} < {columns} columns with zero penalty \
         (use a positive penalty or drop redundant options)"
    )]
    DegenerateBasis { rank: usize, columns: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FitError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let code = match err {
            FitError::InvalidInput(_) => 3,
            FitError::DimensionMismatch { .. }
            | FitError::GridMismatch { .. }
            | FitError::DegenerateBasis { .. } => 4,
        };
        AppError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_errors_map_to_exit_codes() {
        let degenerate: AppError = FitError::DegenerateBasis { rank: 1, columns: 2 }.into();
        assert_eq!(degenerate.exit_code(), 4);

        let invalid: AppError = FitError::invalid("negative penalty").into();
        assert_eq!(invalid.exit_code(), 3);
        assert!(invalid.to_string().contains("negative penalty"));
    }
}
