//! Property tests for scanner invariants.

use lyra_lex::{Scanner, TokenKind};
use proptest::prelude::*;

proptest! {
    /// The stream always ends with exactly one Eof token.
    #[test]
    fn ends_with_single_eof(source in ".{0,200}") {
        let tokens = Scanner::new(&source).scan();
        prop_assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
        prop_assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(),
            1
        );
    }

    /// Every non-error token's lexeme is the source slice of its span.
    #[test]
    fn lexemes_are_slices(source in "[ -~\n]{0,200}") {
        let tokens = Scanner::new(&source).scan();
        for token in tokens {
            if token.kind == TokenKind::Error {
                continue;
            }
            prop_assert_eq!(
                token.lexeme.as_str(),
                &source[token.span.start..token.span.end]
            );
        }
    }

    /// Scanning is deterministic.
    #[test]
    fn scanning_is_deterministic(source in ".{0,200}") {
        let first = Scanner::new(&source).scan();
        let second = Scanner::new(&source).scan();
        prop_assert_eq!(first, second);
    }
}
