//! Exit code constants for the xtract CLI.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 4 | `INVALID_INPUT` | Request body is malformed |
//! | 5 | `UNKNOWN_TEMPLATE` | Requested template is not registered |
//! | 10 | `LLM_TIMEOUT` | A provider call timed out |
//! | 70 | `LLM_FAILURE` | A provider call failed |

/// Exit codes matching the documented exit code table.
///
/// Use the named constants, or [`as_i32()`](Self::as_i32) to get the numeric value
/// for `std::process::exit()`. Map errors with
/// [`XtractError::to_exit_code()`](crate::error::XtractError::to_exit_code).
///
/// ```rust
/// use xtract_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::LLM_FAILURE.as_i32(), 70);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Invalid input - request body missing required keys or wrongly shaped
    pub const INVALID_INPUT: ExitCode = ExitCode(4);

    /// Unknown template - template key not present in the registry
    pub const UNKNOWN_TEMPLATE: ExitCode = ExitCode(5);

    /// LLM timeout - a provider invocation exceeded its timeout
    pub const LLM_TIMEOUT: ExitCode = ExitCode(10);

    /// LLM failure - a provider invocation failed
    pub const LLM_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}
