//! Whole-package matching inside arbitrary text
//!
//! Rule keys are found with plain substring search, so `javax/servlet` is also found inside
//! `javax/servlet2` and `myjavax/servlet`. The check here tells those apart from genuine uses of
//! the package. It is a heuristic: class names are assumed to start with an upper case letter and
//! package segments with a lower case one.

/// Characters which can continue a Java identifier
fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Check whether the `len` bytes of `text` starting at `start` are a whole package name
///
///   - the character before must not continue an identifier and must not be a `.`
///   - the character after must not continue an identifier
///   - if the character after is a `.`, the one after that must not be lower case or a digit
///     (that would make the match a prefix of a deeper package), unless sub-packages are allowed
///
/// The start and end of `text` are always boundaries. Offsets which are out of range or not on a
/// character boundary are never a match.
pub fn is_genuine_match(text: &str, start: usize, len: usize, allow_subpackages: bool) -> bool {
    let (before, after) = match (text.get(..start), text.get(start + len..)) {
        (Some(before), Some(after)) => (before, after),
        _ => return false,
    };

    if let Some(c) = before.chars().next_back() {
        if is_identifier_part(c) || c == '.' {
            return false;
        }
    }

    let mut after = after.chars();
    match after.next() {
        None => true,
        Some(c) if is_identifier_part(c) => false,
        Some('.') if !allow_subpackages => {
            !matches!(after.next(), Some(c) if c.is_lowercase() || c.is_numeric())
        }
        Some(_) => true,
    }
}
