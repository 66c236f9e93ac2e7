/// Replace `${ENV_VAR}` placeholders in a raw config string.
///
/// Unresolvable or malformed placeholders are left as-is so validation can
/// flag them later instead of silently substituting an empty string.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => result.push_str(&value),
                    None => {
                        result.push_str("${");
                        result.push_str(name);
                        result.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            _ => {
                // No closing brace (or empty name): emit literally.
                result.push_str("${");
                rest = after;
            },
        }
    }

    result.push_str(rest);
    result
}

/// Returns `true` if the value still contains an unresolved placeholder.
#[must_use]
pub fn has_placeholder(value: &str) -> bool {
    value.contains("${")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_var() {
        let lookup = |name: &str| (name == "TGCORD_TEST_VAR").then(|| "hello".to_string());
        assert_eq!(
            substitute_env_with("token = \"${TGCORD_TEST_VAR}\"", lookup),
            "token = \"hello\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        let lookup = |_: &str| None;
        assert_eq!(
            substitute_env_with("${TGCORD_NONEXISTENT}", lookup),
            "${TGCORD_NONEXISTENT}"
        );
    }

    #[test]
    fn multiple_placeholders() {
        let lookup = |name: &str| match name {
            "A" => Some("1".to_string()),
            "B" => Some("2".to_string()),
            _ => None,
        };
        assert_eq!(substitute_env_with("${A}x${B}", lookup), "1x2");
    }

    #[test]
    fn malformed_placeholder_kept() {
        let lookup = |_: &str| Some("never".to_string());
        assert_eq!(substitute_env_with("oops ${NO_CLOSE", lookup), "oops ${NO_CLOSE");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }

    #[test]
    fn detects_placeholder() {
        assert!(has_placeholder("${DISCORD_BOT_TOKEN}"));
        assert!(!has_placeholder("abc123"));
    }
}
