/// Replaces `$VAR` and `${VAR}` references with values looked up through `lookup`.
///
/// Unknown variables expand to the empty string. A `$` that does not start a
/// variable reference is kept as is.
pub fn expand_vars(src: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                let name = &braced[..end];
                out.push_str(&lookup(name).unwrap_or_default());
                rest = &braced[end + 1..];
                continue;
            }
            // Unterminated `${`, nothing to expand.
            out.push('$');
            rest = after;
            continue;
        }

        let starts_name = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if !starts_name {
            out.push('$');
            rest = after;
            continue;
        }
        out.push_str(&lookup(&after[..len]).unwrap_or_default());
        rest = &after[len..];
    }
    out.push_str(rest);

    out
}

/// Expands variable references against the process environment.
pub fn expand_env(src: &str) -> String {
    expand_vars(src, |name| std::env::var(name).ok())
}
