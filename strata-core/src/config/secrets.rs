use super::ConfigError;

/// Resolve a single `${...}` reference.
///
/// - `${VAR}` / `${env:VAR}` read an environment variable
/// - `${file:/path}` reads a file, trimmed
fn resolve_reference(reference: &str) -> Result<String, ConfigError> {
    let reference = reference.trim();
    if let Some(path) = reference.strip_prefix("file:") {
        let path = path.trim();
        std::fs::read_to_string(path)
            .map(|s| s.trim().to_string())
            .map_err(|e| ConfigError::Load(format!("Secret file '{path}': {e}")))
    } else {
        let var = reference.strip_prefix("env:").unwrap_or(reference).trim();
        std::env::var(var).map_err(|_| ConfigError::NotFound(format!("env:{var}")))
    }
}

/// Replace every `${...}` placeholder in `value`.
pub fn resolve_placeholders(value: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let end = rest[start..]
            .find('}')
            .ok_or_else(|| ConfigError::Load(format!("Unclosed placeholder in: {value}")))?;
        result.push_str(&rest[..start]);
        result.push_str(&resolve_reference(&rest[start + 2..start + end])?);
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_reference() {
        unsafe { std::env::set_var("TEST_STRATA_DB_FILE", "app.db") };
        let result = resolve_placeholders("sqlite://${TEST_STRATA_DB_FILE}").unwrap();
        assert_eq!(result, "sqlite://app.db");
        unsafe { std::env::remove_var("TEST_STRATA_DB_FILE") };
    }

    #[test]
    fn explicit_env_reference() {
        unsafe { std::env::set_var("TEST_STRATA_HOST", "db.local") };
        let result = resolve_placeholders("${env:TEST_STRATA_HOST}/x").unwrap();
        assert_eq!(result, "db.local/x");
        unsafe { std::env::remove_var("TEST_STRATA_HOST") };
    }

    #[test]
    fn file_reference() {
        let dir = tempfile::tempdir().unwrap();
        let secret = dir.path().join("url.txt");
        std::fs::write(&secret, "sqlite://secret.db\n").unwrap();

        let result = resolve_placeholders(&format!("${{file:{}}}", secret.display())).unwrap();
        assert_eq!(result, "sqlite://secret.db");
    }

    #[test]
    fn resolved_value_is_not_rescanned() {
        unsafe { std::env::set_var("TEST_STRATA_LITERAL", "${NOT_A_REF}") };
        let result = resolve_placeholders("${TEST_STRATA_LITERAL}").unwrap();
        assert_eq!(result, "${NOT_A_REF}");
        unsafe { std::env::remove_var("TEST_STRATA_LITERAL") };
    }

    #[test]
    fn unresolvable_and_unclosed() {
        assert!(resolve_placeholders("${TEST_STRATA_DEFINITELY_UNSET}").is_err());
        assert!(resolve_placeholders("${UNCLOSED").is_err());
        assert_eq!(resolve_placeholders("plain").unwrap(), "plain");
    }
}
