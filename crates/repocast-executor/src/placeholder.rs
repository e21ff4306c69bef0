//! Template placeholders: `{param}` and `{env.NAME}`.

use std::collections::HashMap;

const ENV_PREFIX: &str = "{env.";

/// Replace every `{key}` with its value from `params`.
pub fn substitute_params(template: &str, params: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in params {
        result = result.replace(&format!("{{{}}}", key), value);
    }
    result
}

/// Replace every `{env.NAME}` with the value of the environment variable
/// `NAME`. Unset variables become the empty string.
pub fn substitute_env(template: &str) -> String {
    substitute_env_with(template, |name| std::env::var(name).ok())
}

/// [`substitute_env`] with an arbitrary variable lookup.
pub fn substitute_env_with<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(ENV_PREFIX) {
        let after = &rest[start + ENV_PREFIX.len()..];
        let Some(end) = after.find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        result.push_str(&lookup(&after[..end]).unwrap_or_default());
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}
