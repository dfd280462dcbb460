//! Small text helpers shared by the generator and the block converter.

/// Return the value after `prefix` if `line` starts with it (ASCII case-insensitive).
///
/// The value is trimmed and stripped of surrounding double quotes.
pub fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    Some(line[prefix.len()..].trim().trim_matches('"'))
}
