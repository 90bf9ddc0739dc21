//! Tool-name derivation for workflows exposed as skills.

/// Name used when a workflow name has no ASCII alphanumeric characters.
const FALLBACK_TOOL_NAME: &str = "unnamed-tool";

/// Converts a workflow name into an MCP-safe tool name.
///
/// The result is lowercase, uses `-` between runs of ASCII alphanumerics and
/// never starts or ends with `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for character in name.chars().flat_map(char::to_lowercase) {
        if character.is_ascii_lowercase() || character.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(character);
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        return FALLBACK_TOOL_NAME.to_owned();
    }
    slug
}
