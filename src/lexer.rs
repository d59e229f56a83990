//! Tokenization of a raw command line into an argument vector.
//!
//! There is deliberately no quoting, escaping, or substitution here: a token
//! containing a delimiter cannot be expressed, and a blank line tokenizes to
//! an empty vector.

/// Characters that separate tokens: space, tab, CR, LF, and BEL.
pub const DELIMITERS: &str = " \t\r\n\x07";

/// Split a line into whitespace-delimited tokens.
///
/// Consecutive delimiters collapse, so leading/trailing whitespace never
/// produces empty tokens. Element 0 of the result is the command name.
pub fn split_line(line: &str) -> Vec<String> {
    line.split(|c| DELIMITERS.contains(c))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
