//! Tokenizer for editor markup, built on [Logos].
//!
//! [Logos]: https://docs.rs/logos
//!
//! The markup is a small HTML subset, so there are only three token kinds:
//! opening tags (attributes and an optional self-closing slash included),
//! closing tags and character data. A `<` that starts neither kind of tag
//! is a lexing error and is reported with its byte offset.

use logos::Logos;
use std::ops::Range;

use crate::error::EditorError;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"")]
pub(crate) enum TokenKind {
    /// `<tag attr="value" ...>` or `<tag/>`
    #[regex(r#"<[a-zA-Z][a-zA-Z0-9]*(\s+[^\s"'<>/=]+(\s*=\s*("[^"]*"|'[^']*'|[^\s"'<>=]+))?)*\s*/?>"#)]
    OpenTag,

    /// `</tag>`
    #[regex(r"</[a-zA-Z][a-zA-Z0-9]*\s*>")]
    CloseTag,

    /// Character data, entities still encoded
    #[regex(r"[^<]+")]
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

pub(crate) fn lex(input: &str) -> Result<Vec<Token<'_>>, EditorError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let text = lexer.slice();
        match result {
            Ok(kind) => tokens.push(Token { kind, text, span }),
            Err(()) => {
                return Err(EditorError::malformed(
                    format!("`<` does not start a tag near {:?}", snippet(&input[span.start..])),
                    span.start,
                ));
            }
        }
    }

    Ok(tokens)
}

fn snippet(rest: &str) -> &str {
    let end = rest
        .char_indices()
        .nth(12)
        .map_or(rest.len(), |(index, _)| index);
    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<(TokenKind, &str)> {
        lex(input)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(kinds(""), vec![]);
    }

    #[test]
    fn lex_paragraph() {
        assert_eq!(
            kinds("<p>hi</p>"),
            vec![
                (TokenKind::OpenTag, "<p>"),
                (TokenKind::Text, "hi"),
                (TokenKind::CloseTag, "</p>"),
            ]
        );
    }

    #[test]
    fn lex_tag_with_attributes() {
        assert_eq!(
            kinds(r#"<a href="x.html" target='_blank' download>go</a>"#),
            vec![
                (TokenKind::OpenTag, r#"<a href="x.html" target='_blank' download>"#),
                (TokenKind::Text, "go"),
                (TokenKind::CloseTag, "</a>"),
            ]
        );
    }

    #[test]
    fn lex_self_closing() {
        assert_eq!(
            kinds("a<br/>b"),
            vec![
                (TokenKind::Text, "a"),
                (TokenKind::OpenTag, "<br/>"),
                (TokenKind::Text, "b"),
            ]
        );
    }

    #[test]
    fn lex_stray_angle_bracket_is_error() {
        let err = lex("<p>1 < 2</p>").unwrap_err();

        assert!(matches!(err, EditorError::MalformedDocument { offset: 5, .. }));
    }

    #[test]
    fn lex_spans() {
        let tokens = lex("<em>x</em>").unwrap();

        assert_eq!(tokens[1].span, 4..5);
        assert_eq!(tokens[2].span, 5..10);
    }
}
