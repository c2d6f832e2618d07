//! Input validation utilities

use crate::constants;

/// Validate submitted source code
pub fn validate_source_code(source_code: &str) -> Result<(), &'static str> {
    if source_code.trim().is_empty() {
        return Err("Source code must not be empty");
    }
    if source_code.len() > constants::MAX_SOURCE_CODE_BYTES {
        return Err("Source code is too large");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_source_code() {
        assert!(validate_source_code("int main() {}").is_ok());
        assert!(validate_source_code("   \n").is_err());
        assert!(validate_source_code(&"x".repeat(constants::MAX_SOURCE_CODE_BYTES + 1)).is_err());
    }
}
