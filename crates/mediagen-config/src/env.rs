use std::sync::OnceLock;

use regex::Regex;

/// Expand `{{ env.VAR }}` placeholders in raw TOML text
///
/// An optional default is supported via `{{ env.VAR | default("fallback") }}`;
/// when the variable is unset the default is substituted instead of failing.
/// Expansion happens before deserialization so config structs stay plain
/// `String`/`SecretString`. Comment lines are left untouched.
pub fn expand_env(raw: &str) -> Result<String, String> {
    fn placeholder() -> &'static Regex {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        // Group 1: dotted key (`env.VAR`), group 2: optional default value
        PLACEHOLDER.get_or_init(|| {
            Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
                .expect("must be valid regex")
        })
    }

    let mut expanded = String::with_capacity(raw.len());

    for (i, line) in raw.lines().enumerate() {
        if i > 0 {
            expanded.push('\n');
        }

        if line.trim_start().starts_with('#') {
            expanded.push_str(line);
            continue;
        }

        let mut cursor = 0;

        for captures in placeholder().captures_iter(line) {
            let whole = captures.get(0).expect("capture 0 always present");
            let key = captures.get(1).expect("key group is mandatory").as_str();
            let fallback = captures.get(2).map(|m| m.as_str());

            expanded.push_str(&line[cursor..whole.start()]);
            expanded.push_str(&resolve(key, fallback)?);
            cursor = whole.end();
        }

        expanded.push_str(&line[cursor..]);
    }

    if raw.ends_with('\n') {
        expanded.push('\n');
    }

    Ok(expanded)
}

/// Resolve a single dotted placeholder key against the process environment
fn resolve(key: &str, fallback: Option<&str>) -> Result<String, String> {
    let Some(var_name) = key.strip_prefix("env.") else {
        return Err(format!("only variables scoped with 'env.' are supported: `{key}`"));
    };
    if var_name.contains('.') {
        return Err(format!("only variables scoped with 'env.' are supported: `{key}`"));
    }

    match std::env::var(var_name) {
        Ok(value) => Ok(value),
        Err(_) => fallback.map_or_else(
            || Err(format!("environment variable not found: `{var_name}`")),
            |default| Ok(default.to_owned()),
        ),
    }
}
