//! File path → URL pattern conversion.

use std::path::{Component, Path};

/// Convert a route file path, relative to the routes root, into a URL pattern.
///
/// `[name]` becomes `:name`, exactly one trailing `.<extension>` is stripped,
/// and every other character is kept verbatim.
///
/// ```
/// use std::path::Path;
/// use waypoint::routing::pattern::file_to_pattern;
///
/// assert_eq!(file_to_pattern(Path::new("users/[id].rs"), "rs"), "/users/:id");
/// ```
pub fn file_to_pattern(relative: &Path, extension: &str) -> String {
    let segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let suffix = format!(".{extension}");
    let last = segments.len().saturating_sub(1);

    let mut pattern = String::new();
    for (index, segment) in segments.iter().enumerate() {
        let segment = if index == last {
            segment.strip_suffix(&suffix).unwrap_or(segment)
        } else {
            segment.as_str()
        };
        pattern.push('/');
        pattern.push_str(&substitute_params(segment));
    }

    if pattern.is_empty() {
        pattern.push('/');
    }
    pattern
}

/// Replace every `[word]` with `:word`; malformed brackets stay literal.
pub fn substitute_params(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if name_len > 0 && after[name_len..].starts_with(']') {
            out.push(':');
            out.push_str(&after[..name_len]);
            rest = &after[name_len + 1..];
        } else {
            out.push('[');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}
