//! Lexical pass over PGN movetext.
//!
//! The tokenizer classifies movetext without looking at surrounding context:
//! comments, glyphs, variation markers, result markers and moves (with their
//! optional move-number prefix and `!`/`?` suffix). Text that matches none of
//! these is surfaced as [`Token::Unknown`] so the caller can log and skip it.

use regex::{CaptureMatches, Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

use crate::types::GameResult;

static MOVETEXT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?s)",
        r"(?P<rest>;[^\n\r]*)",
        r"|(?P<brace>\{.*?\})",
        r"|(?P<nag>\$[0-9]+)",
        r"|(?P<open>\()",
        r"|(?P<close>\))",
        r"|(?P<result>\*|1-0|0-1|1/2-1/2|1/2)",
        r"|(?P<count>(?:[0-9]{1,3}\.+\s*)*)",
        r"(?P<san>[a-hxOoKQRBN0-8+#=-]{2,7})(?P<suffix>[?!]{1,2})?",
    ))
    .expect("movetext token pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// `;` comment, without the leading semicolon.
    LineComment(&'a str),
    /// `{...}` comment, without the braces. May span lines.
    BraceComment(&'a str),
    /// Numeric annotation glyph, including the `$`.
    Nag(&'a str),
    VariationStart,
    VariationEnd,
    Result(GameResult),
    Move {
        /// Move-number prefix as written (`"5."`, `"5..."`), trailing space removed.
        count: Option<&'a str>,
        san: &'a str,
        suffix: Option<&'a str>,
    },
    /// Non-whitespace text that matches no other category.
    Unknown(&'a str),
}

/// A token together with the byte range it covers in the movetext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub span: Range<usize>,
}

/// Lazy token stream over a movetext string.
pub struct Tokenizer<'a> {
    input: &'a str,
    matches: CaptureMatches<'static, 'a>,
    last_end: usize,
    pending: Option<Spanned<'a>>,
    finished: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            matches: MOVETEXT_TOKEN.captures_iter(input),
            last_end: 0,
            pending: None,
            finished: false,
        }
    }

    /// Returns the unmatched text between the previous token and `end`, if it
    /// holds anything besides whitespace.
    fn gap(&mut self, end: usize) -> Option<Spanned<'a>> {
        let start = self.last_end;
        self.last_end = end;

        let text = &self.input[start..end];
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let offset = start + (text.len() - text.trim_start().len());
        Some(Spanned {
            token: Token::Unknown(trimmed),
            span: offset..offset + trimmed.len(),
        })
    }
}

fn classify<'a>(caps: &Captures<'a>) -> Option<Token<'a>> {
    if let Some(m) = caps.name("rest") {
        return Some(Token::LineComment(&m.as_str()[1..]));
    }
    if let Some(m) = caps.name("brace") {
        let text = m.as_str();
        return Some(Token::BraceComment(&text[1..text.len() - 1]));
    }
    if let Some(m) = caps.name("nag") {
        return Some(Token::Nag(m.as_str()));
    }
    if caps.name("open").is_some() {
        return Some(Token::VariationStart);
    }
    if caps.name("close").is_some() {
        return Some(Token::VariationEnd);
    }
    if let Some(m) = caps.name("result") {
        return GameResult::from_token(m.as_str()).map(Token::Result);
    }

    let san = caps.name("san")?.as_str();
    let count = caps
        .name("count")
        .map(|m| m.as_str().trim_end())
        .filter(|c| !c.is_empty());
    let suffix = caps.name("suffix").map(|m| m.as_str());
    Some(Token::Move { count, san, suffix })
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Spanned<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pending) = self.pending.take() {
            return Some(pending);
        }
        if self.finished {
            return None;
        }

        loop {
            let Some(caps) = self.matches.next() else {
                self.finished = true;
                return self.gap(self.input.len());
            };

            let Some(whole) = caps.get(0) else {
                continue;
            };
            let Some(token) = classify(&caps) else {
                continue;
            };

            let spanned = Spanned {
                token,
                span: whole.range(),
            };

            if let Some(unknown) = self.gap(whole.start()) {
                self.last_end = whole.end();
                self.pending = Some(spanned);
                return Some(unknown);
            }

            self.last_end = whole.end();
            return Some(spanned);
        }
    }
}

/// Tokenizes a whole movetext eagerly.
pub fn tokenize(movetext: &str) -> Vec<Token<'_>> {
    Tokenizer::new(movetext).map(|s| s.token).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv<'a>(count: Option<&'a str>, san: &'a str, suffix: Option<&'a str>) -> Token<'a> {
        Token::Move { count, san, suffix }
    }

    #[test]
    fn test_moves_with_counts_and_suffixes() {
        let tokens = tokenize("1. e4 e5 2.Nf3!? 2... Nc6?");
        assert_eq!(
            tokens,
            vec![
                mv(Some("1."), "e4", None),
                mv(None, "e5", None),
                mv(Some("2."), "Nf3", Some("!?")),
                mv(Some("2..."), "Nc6", Some("?")),
            ]
        );
    }

    #[test]
    fn test_comments_glyphs_and_variations() {
        let tokens = tokenize("1. e4 {best\nby test} $1 (1. d4 ; queen pawn\n) *");
        assert_eq!(
            tokens,
            vec![
                mv(Some("1."), "e4", None),
                Token::BraceComment("best\nby test"),
                Token::Nag("$1"),
                Token::VariationStart,
                mv(Some("1."), "d4", None),
                Token::LineComment(" queen pawn"),
                Token::VariationEnd,
                Token::Result(GameResult::Ongoing),
            ]
        );
    }

    #[test]
    fn test_result_markers() {
        assert_eq!(tokenize("1-0"), vec![Token::Result(GameResult::WhiteWins)]);
        assert_eq!(tokenize("0-1"), vec![Token::Result(GameResult::BlackWins)]);
        assert_eq!(tokenize("1/2-1/2"), vec![Token::Result(GameResult::Draw)]);
        assert_eq!(tokenize("1/2"), vec![Token::Result(GameResult::Draw)]);
    }

    #[test]
    fn test_castling_forms() {
        let tokens = tokenize("O-O-O 0-0 o-o");
        assert_eq!(
            tokens,
            vec![
                mv(None, "O-O-O", None),
                mv(None, "0-0", None),
                mv(None, "o-o", None),
            ]
        );
    }

    #[test]
    fn test_unknown_text_is_reported_in_order() {
        let tokens = tokenize("1. e4 Qz9 e5 ???");
        assert_eq!(
            tokens,
            vec![
                mv(Some("1."), "e4", None),
                Token::Unknown("Qz9"),
                mv(None, "e5", None),
                Token::Unknown("???"),
            ]
        );
    }

    #[test]
    fn test_spans_cover_source_text() {
        let text = "1. e4 (1. d4) e5";
        let spans: Vec<_> = Tokenizer::new(text).map(|s| &text[s.span]).collect();
        assert_eq!(spans, vec!["1. e4", "(", "1. d4", ")", "e5"]);
    }

    #[test]
    fn test_tokenizing_twice_is_identical() {
        let text = "{intro} 1. e4 e5 2. Nf3 Nc6 (2... Nf6 3. Nc3 $2) 3. Bc4 ; done\n 1/2-1/2";
        assert_eq!(tokenize(text), tokenize(text));
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  \n\t ").is_empty());
    }
}
