/// Mask an email address for log output (`ad***@example.com`).
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            if local.chars().count() <= 2 {
                format!("{}***@{}", visible.chars().next().unwrap_or('*'), domain)
            } else {
                format!("{}***@{}", visible, domain)
            }
        }
        None => "***".to_string(),
    }
}

/// Trim optional free text, turning blank input into `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `%search%` pattern for `ILIKE ... ESCAPE '!'` that treats `%`, `_` and `!`
/// in the input as literal characters.
pub fn contains_pattern(search: &str) -> String {
    let mut out = String::with_capacity(search.len() + 2);
    out.push('%');
    for c in search.chars() {
        if matches!(c, '!' | '%' | '_') {
            out.push('!');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("admin@example.com"), "ad***@example.com");
        assert_eq!(mask_email("ab@example.com"), "a***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }

    #[test]
    fn test_mask_email_multibyte() {
        assert_eq!(mask_email("管理员@example.com"), "管理***@example.com");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  hi ".into())), Some("hi".to_string()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("alice"), "%alice%");
        assert_eq!(contains_pattern("50%"), "%50!%%");
        assert_eq!(contains_pattern("_"), "%!_%");
        assert_eq!(contains_pattern("hi!"), "%hi!!%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\b%");
    }
}
