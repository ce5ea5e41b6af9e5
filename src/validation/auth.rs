/// Where a login lands when the caller gave no usable return path.
pub const DEFAULT_RETURN_PATH: &str = "/";

const MAX_RETURN_PATH_LEN: usize = 2048;

/// Validates a caller-supplied post-login return path.
///
/// The path is appended to the configured frontend origin, so it must be a
/// local absolute path: one leading `/`, no `//` or `/\` prefix that a
/// browser would read as another host, no backslashes and no control
/// characters. Anything else yields `None`.
pub fn validate_return_path(path: &str) -> Option<&str> {
    if path.len() > MAX_RETURN_PATH_LEN {
        return None;
    }

    if !path.starts_with('/') || path.starts_with("//") {
        return None;
    }

    if path.chars().any(|c| c.is_control() || c == '\\') {
        return None;
    }

    Some(path)
}

/// Resolves the return path, falling back to [`DEFAULT_RETURN_PATH`].
pub fn return_path_or_default(path: Option<&str>) -> &str {
    match path {
        None => DEFAULT_RETURN_PATH,
        Some(raw) => validate_return_path(raw).unwrap_or_else(|| {
            tracing::warn!(state = %raw, "❌ Rejected non-local return path");
            DEFAULT_RETURN_PATH
        }),
    }
}
