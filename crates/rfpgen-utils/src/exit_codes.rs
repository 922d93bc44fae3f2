//! Exit code constants for the rfpgen CLI.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid arguments, configuration, or input |
//! | 3 | `STORAGE_FAILURE` | Requirement store could not be read or written |
//! | 10 | `DEADLINE_EXCEEDED` | Every provider call hit the generation deadline |
//! | 70 | `PROVIDER_FAILURE` | Every provider call failed |

/// Exit codes matching the documented exit code table.
///
/// Use the named constants for common exit codes, or [`as_i32()`](Self::as_i32)
/// to get the numeric value for `std::process::exit()`.
///
/// ```rust
/// use rfpgen_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::PROVIDER_FAILURE, ExitCode::from_i32(70));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments, configuration or input
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Storage failure - the requirement store rejected a read or write
    pub const STORAGE_FAILURE: ExitCode = ExitCode(3);

    /// Deadline exceeded - no provider answered before the caller's deadline
    pub const DEADLINE_EXCEEDED: ExitCode = ExitCode(10);

    /// Provider failure - every provider call failed
    pub const PROVIDER_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}
