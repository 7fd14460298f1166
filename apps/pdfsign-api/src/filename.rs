//! Client file name sanitizing

use unicode_normalization::UnicodeNormalization;

/// Device names Windows refuses to use as file names
const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Reduce a client-supplied file name to a flat, ASCII-only name that is
/// safe to join onto a storage directory. Accented letters are decomposed
/// (NFKD) first so their base letter survives. Returns `None` when nothing
/// usable is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let ascii: String = raw
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        return None;
    }

    let stem = trimmed.split('.').next().unwrap_or_default();
    if WINDOWS_DEVICE_NAMES
        .iter()
        .any(|device| device.eq_ignore_ascii_case(stem))
    {
        return Some(format!("_{}", trimmed));
    }

    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_name_unchanged() {
        assert_eq!(sanitize_filename("contract.pdf").as_deref(), Some("contract.pdf"));
    }

    #[test]
    fn test_spaces_become_underscores() {
        assert_eq!(
            sanitize_filename("My  Signed Contract.pdf").as_deref(),
            Some("My_Signed_Contract.pdf")
        );
    }

    #[test]
    fn test_path_traversal_flattened() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("etc_passwd")
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\me\\sig.png").as_deref(),
            Some("C_Users_me_sig.png")
        );
    }

    #[test]
    fn test_non_ascii_dropped() {
        assert_eq!(sanitize_filename("contrat-été.pdf").as_deref(), Some("contrat-ete.pdf"));
        assert_eq!(sanitize_filename("Ωmega.pdf").as_deref(), Some("mega.pdf"));
    }

    #[test]
    fn test_compatibility_forms_decomposed() {
        assert_eq!(sanitize_filename("été.pdf").as_deref(), Some("ete.pdf"));
        assert_eq!(sanitize_filename("\u{fb01}le.pdf").as_deref(), Some("file.pdf"));
        assert_eq!(sanitize_filename("Ｓｉｇ.png").as_deref(), Some("Sig.png"));
    }

    #[test]
    fn test_nothing_left() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("../"), None);
        assert_eq!(sanitize_filename("日本語"), None);
        assert_eq!(sanitize_filename("._."), None);
    }

    #[test]
    fn test_windows_device_names_prefixed() {
        assert_eq!(sanitize_filename("con.pdf").as_deref(), Some("_con.pdf"));
        assert_eq!(sanitize_filename("LPT1").as_deref(), Some("_LPT1"));
        assert_eq!(sanitize_filename("console.pdf").as_deref(), Some("console.pdf"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn output_uses_safe_alphabet(raw in ".{0,80}") {
            if let Some(name) = sanitize_filename(&raw) {
                prop_assert!(name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')));
                prop_assert!(!name.starts_with('.'));
                prop_assert!(!name.ends_with('.') && !name.ends_with('_'));
            }
        }

        #[test]
        fn sanitizing_is_idempotent(raw in "[ -~]{0,60}") {
            if let Some(name) = sanitize_filename(&raw) {
                prop_assert_eq!(sanitize_filename(&name), Some(name.clone()));
            }
        }

        #[test]
        fn separators_never_survive(
            parts in prop::collection::vec("[a-z]{5,8}", 1..5),
            windows in any::<bool>(),
        ) {
            let sep = if windows { "\\" } else { "/" };
            let raw = format!("{}{}", sep, parts.join(sep));
            let name = sanitize_filename(&raw).unwrap();
            prop_assert_eq!(name, parts.join("_"));
        }
    }
}
