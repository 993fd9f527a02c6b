//! Character classes used to guess token boundaries.
//!
//! This is not a tokenizer. A class change between two neighbouring
//! characters is only a cheap hint that a new token starts.

/// The class of a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// `\r` or `\n`.
    LineBreak,
    /// Any other whitespace.
    Whitespace,
    /// Letters, digits and `_`.
    Word,
    /// One of `, ; ( ) { } [ ]`, each its own class.
    Punctuation(char),
    /// Everything else.
    Other,
}

/// Classifies a character.
pub fn classify(ch: char) -> CharClass {
    match ch {
        '\r' | '\n' => CharClass::LineBreak,
        ',' | ';' | '(' | ')' | '{' | '}' | '[' | ']' => CharClass::Punctuation(ch),
        '_' => CharClass::Word,
        ch if ch.is_whitespace() => CharClass::Whitespace,
        ch if ch.is_alphanumeric() => CharClass::Word,
        _ => CharClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify('\n'), CharClass::LineBreak);
        assert_eq!(classify('\t'), CharClass::Whitespace);
        assert_eq!(classify('x'), CharClass::Word);
        assert_eq!(classify('9'), CharClass::Word);
        assert_eq!(classify('_'), CharClass::Word);
        assert_eq!(classify('é'), CharClass::Word);
        assert_eq!(classify('='), CharClass::Other);
        assert_eq!(classify('.'), CharClass::Other);
    }

    #[test]
    fn test_punctuation_marks_are_distinct() {
        assert_eq!(classify('('), CharClass::Punctuation('('));
        assert_ne!(classify('('), classify(')'));
        assert_ne!(classify(','), classify(';'));
    }
}
