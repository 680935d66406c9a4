//! Token definitions for the markup reader
//!
//! The markup accepted here is the small subset code fragments actually use: start and end
//! tags, a handful of entities and text. Anything the lexer does not recognize (a stray `<`
//! or `&`) surfaces as a lexing error and is kept as literal text by the reader.
use logos::Logos;

/// All tokens produced by the markup lexer
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
pub enum MarkupToken {
    // <name>, <name attr attr="value">, <name/>
    // Attributes are read by the parser; the lexer only finds the tag's extent.
    #[regex(r"<[A-Za-z][A-Za-z0-9-]*(\s[^<>]*)?/?>")]
    StartTag,

    #[regex(r"</[A-Za-z][A-Za-z0-9-]*\s*>")]
    EndTag,

    #[regex(r"&(lt|gt|amp|quot|apos|#[0-9]+);")]
    Entity,

    #[regex(r"[^<&]+")]
    Text,
}

/// Tokenize a string, keeping source spans.
///
/// Lexing errors come back as `None` so callers can treat them as literal text.
pub fn tokenize_with_spans(source: &str) -> Vec<(Option<MarkupToken>, logos::Span)> {
    let mut lexer = MarkupToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        tokens.push((result.ok(), lexer.span()));
    }

    tokens
}
