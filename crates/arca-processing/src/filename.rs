/// Sanitize a client-supplied filename before it becomes part of a storage
/// key. Strips any path component and replaces characters outside a safe set.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 255;
    let path = std::path::Path::new(filename);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "invalid_filename".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim().is_empty() || s.len() < 3 {
        "file".to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_path_components() {
        assert_eq!(sanitize_filename("/tmp/evil/cat.jpg"), "cat.jpg");
        assert_eq!(sanitize_filename("..\\..\\cat.jpg"), "invalid_filename");
    }

    #[test]
    fn test_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my_photo__1_.jpg");
    }

    #[test]
    fn test_short_or_empty_becomes_file() {
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename("a"), "file");
    }
}
