//! Result type alias for sqlscout

use super::errors::ScoutError;

/// Result type alias for sqlscout operations
///
/// # Examples
///
/// ```
/// use sqlscout::domain::result::Result;
/// use sqlscout::domain::errors::ScoutError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ScoutError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ScoutError>;
