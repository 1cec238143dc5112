//! Default node names and name validation.

/// Derives collision-free names for new nodes.
pub struct NodeNamer;

impl NodeNamer {
    /// Strip the type namespace (everything up to and including the first `.`).
    pub fn base_name(type_name: &str) -> &str {
        match type_name.split_once('.') {
            Some((_, rest)) => rest.trim(),
            None => type_name.trim(),
        }
    }

    /// First unused name of the form `<base><n>` with `n` counting from 1.
    ///
    /// An underscore separates base and counter when the type name ends in a
    /// digit, so `Resize2` yields `Resize2_1` instead of the ambiguous `Resize21`.
    pub fn new_node_name<F>(type_name: &str, is_used: F) -> String
    where
        F: Fn(&str) -> bool,
    {
        let base = Self::base_name(type_name);
        let sep = if type_name.ends_with(|c: char| c.is_ascii_digit()) {
            "_"
        } else {
            ""
        };
        let mut count = 1usize;
        loop {
            let candidate = format!("{}{}{}", base, sep, count);
            if !is_used(&candidate) {
                return candidate;
            }
            count += 1;
        }
    }

    /// Check a proposed name.
    ///
    /// `original` is the node's current name when renaming; keeping the same
    /// name is always allowed.
    pub fn is_valid_node_name<F>(candidate: &str, original: Option<&str>, is_used: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        if original == Some(candidate) {
            return true;
        }
        if candidate.is_empty() || candidate.chars().any(char::is_whitespace) {
            return false;
        }
        !is_used(candidate)
    }
}
