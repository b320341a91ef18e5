use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Markup-level tokens. Tags are lexed whole; their insides go through
/// [`TagToken`].
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"<!--([^-]|-[^-])*-->")]
#[logos(skip r"<![dD][oO][cC][tT][yY][pP][eE][^>]*>")]
pub enum Token<'src> {
    #[regex(r#"<[a-zA-Z][a-zA-Z0-9-]*([^>"']|"[^"]*"|'[^']*')*>"#, |lex| lex.slice())]
    OpenTag(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\r\n]*>", |lex| lex.slice())]
    CloseTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),

    /// A `<` that does not start a tag.
    #[token("<")]
    Lt,
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::OpenTag(s) => write!(f, "tag {}", s),
            Token::CloseTag(s) => write!(f, "closing tag {}", s),
            Token::Text(s) => write!(f, "text '{}'", s),
            Token::Lt => write!(f, "<"),
        }
    }
}

/// Tokens inside an opening tag, between `<` and `>`.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TagToken<'src> {
    #[regex(r#"[^ \t\r\n"'=/<>]+"#, |lex| lex.slice())]
    Name(&'src str),

    #[regex(r#""[^"]*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    #[regex(r"'[^']*'", |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Quoted(&'src str),

    #[token("=")]
    Equals,

    #[token("/")]
    Slash,
}

pub fn tokenize(source: &str) -> Vec<(Token<'_>, Range<usize>)> {
    Token::lexer(source)
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, span)))
        .collect()
}

pub fn tokenize_tag(inner: &str) -> Vec<TagToken<'_>> {
    TagToken::lexer(inner).filter_map(Result::ok).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_and_text() {
        let tokens: Vec<_> = tokenize("<p class=\"a>b\">x &lt; y</p>")
            .into_iter()
            .map(|(token, _)| token)
            .collect();
        assert_eq!(
            tokens,
            vec![
                Token::OpenTag("<p class=\"a>b\">"),
                Token::Text("x &lt; y"),
                Token::CloseTag("</p>"),
            ]
        );
    }

    #[test]
    fn test_stray_angle_is_not_a_tag() {
        let tokens: Vec<_> = tokenize("a < b").into_iter().map(|(token, _)| token).collect();
        assert_eq!(tokens, vec![Token::Text("a "), Token::Lt, Token::Text(" b")]);
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = tokenize("<!-- note --><b>x</b>");
        assert_eq!(tokens[0].0, Token::OpenTag("<b>"));
    }

    #[test]
    fn test_tag_inner_tokens() {
        let tokens = tokenize_tag("a href='x y' checked data-n=3 /");
        assert_eq!(
            tokens,
            vec![
                TagToken::Name("a"),
                TagToken::Name("href"),
                TagToken::Equals,
                TagToken::Quoted("x y"),
                TagToken::Name("checked"),
                TagToken::Name("data-n"),
                TagToken::Equals,
                TagToken::Name("3"),
                TagToken::Slash,
            ]
        );
    }
}
