// floe-core/src/domain/governance/pattern.rs

use regex::Regex;

/// Compiles a model glob (`stg_*`, `dim_?ustomer`) into an anchored regex.
/// Everything except `*` and `?` is matched literally.
pub fn glob_to_regex(glob: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::with_capacity(glob.len() + 8);
    pattern.push('^');
    for ch in glob.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
}
