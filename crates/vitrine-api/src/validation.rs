/// Input validation for names and select specs
///
/// Resource names, column paths and select specs arrive as plain strings,
/// often straight from a request URL. These checks run before a plan is
/// built so oversized or malformed input fails fast with `BadRequest`.
use vitrine_core::error::{Error, Result};

/// Longest accepted identifier, in bytes
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Characters with meaning in select specs or filter paths
const RESERVED: &[char] = &['.', ',', ':', '(', ')', '"', '*', '&', '=', '?', '/', '\\'];

/// Validates a resource or column name
///
/// # Errors
///
/// Returns `Error::BadRequest` when the name is empty, longer than
/// [`MAX_IDENTIFIER_LENGTH`], or holds control or reserved characters
#[inline]
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::BadRequest("Identifier cannot be empty".to_string()));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(Error::BadRequest(format!(
            "Identifier length {} exceeds maximum {}",
            name.len(),
            MAX_IDENTIFIER_LENGTH
        )));
    }

    if let Some(ch) = name.chars().find(|c| c.is_control() || RESERVED.contains(c)) {
        return Err(Error::BadRequest(format!(
            "Identifier '{}' cannot contain {:?}",
            name.escape_debug(),
            ch
        )));
    }

    Ok(())
}

/// Validates a filter path: `column` or `relation.column`
#[inline]
pub fn validate_column_path(path: &str) -> Result<()> {
    for segment in path.split('.') {
        validate_identifier(segment)?;
    }
    Ok(())
}

/// Validates select spec text before parsing
///
/// # Errors
///
/// Returns `Error::BadRequest` for an empty spec or one longer than `max_length`
#[inline]
pub fn validate_select(spec: &str, max_length: usize) -> Result<()> {
    if spec.trim().is_empty() {
        return Err(Error::BadRequest("Select spec cannot be empty".to_string()));
    }

    if spec.len() > max_length {
        return Err(Error::BadRequest(format!(
            "Select spec length {} exceeds maximum {}",
            spec.len(),
            max_length
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("product_variants").is_ok());
        assert!(validate_identifier("unknownTable").is_ok());

        assert!(validate_identifier("").is_err());
        assert!(validate_identifier(&"a".repeat(64)).is_err());
        assert!(validate_identifier("products(").is_err());
        assert!(validate_identifier("a.b").is_err());
        assert!(validate_identifier("name\0").is_err());
    }

    #[test]
    fn test_validate_column_path() {
        assert!(validate_column_path("price").is_ok());
        assert!(validate_column_path("category.slug").is_ok());
        assert!(validate_column_path("category.").is_err());
        assert!(validate_column_path(".slug").is_err());
    }

    #[test]
    fn test_validate_select() {
        assert!(validate_select("*", 16).is_ok());
        assert!(validate_select("  ", 16).is_err());
        assert!(validate_select("id, name, price, slug", 16).is_err());
    }
}
