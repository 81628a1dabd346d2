//! Tokenizer for filter expressions.

use super::error::FilterError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    NoneLit,
    And,
    Or,
    Not,
    In,
    Is,
    Del,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// `=`, `:=` and augmented forms such as `+=`
    Assign(&'static str),
    Eof,
}

impl TokenKind {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Name(name) => format!("name '{name}'"),
            Self::Int(number) => format!("number {number}"),
            Self::Float(number) => format!("number {number}"),
            Self::Str(_) => "string literal".to_string(),
            Self::Eof => "end of expression".to_string(),
            Self::Assign(op) => format!("'{op}'"),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::NoneLit => "None",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::In => "in",
            Self::Is => "is",
            Self::Del => "del",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::DoubleSlash => "//",
            Self::Percent => "%",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Assign(op) => *op,
            Self::Name(_) | Self::Int(_) | Self::Float(_) | Self::Str(_) | Self::Eof => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) offset: usize,
}

/// Splits `source` into tokens, always ending with [`TokenKind::Eof`].
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, FilterError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let byte = bytes[pos];
        if byte.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        if byte.is_ascii_alphabetic() || byte == b'_' {
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            tokens.push(Token {
                kind: keyword_or_name(&source[start..pos]),
                offset: start,
            });
            continue;
        }

        if byte.is_ascii_digit() {
            let (kind, end) = lex_number(source, start)?;
            tokens.push(Token { kind, offset: start });
            pos = end;
            continue;
        }

        if byte == b'"' || byte == b'\'' {
            let (text, end) = lex_string(source, start)?;
            tokens.push(Token {
                kind: TokenKind::Str(text),
                offset: start,
            });
            pos = end;
            continue;
        }

        let (kind, width) = lex_operator(source, start)?;
        tokens.push(Token { kind, offset: start });
        pos += width;
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        offset: source.len(),
    });
    Ok(tokens)
}

fn keyword_or_name(word: &str) -> TokenKind {
    match word {
        "True" => TokenKind::True,
        "False" => TokenKind::False,
        "None" => TokenKind::NoneLit,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "in" => TokenKind::In,
        "is" => TokenKind::Is,
        "del" => TokenKind::Del,
        _ => TokenKind::Name(word.to_string()),
    }
}

fn lex_number(source: &str, start: usize) -> Result<(TokenKind, usize), FilterError> {
    let bytes = source.as_bytes();
    let mut pos = start;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }

    let is_float = pos + 1 < bytes.len() && bytes[pos] == b'.' && bytes[pos + 1].is_ascii_digit();
    if is_float {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let text = &source[start..pos];
        let value = text
            .parse::<f64>()
            .map_err(|_| FilterError::syntax(source, start, format!("invalid number {text}")))?;
        return Ok((TokenKind::Float(value), pos));
    }

    if pos < bytes.len() && (bytes[pos].is_ascii_alphabetic() || bytes[pos] == b'_') {
        return Err(FilterError::syntax(source, pos, "invalid number literal"));
    }

    let text = &source[start..pos];
    let value = text
        .parse::<i64>()
        .map_err(|_| FilterError::syntax(source, start, format!("integer {text} out of range")))?;
    Ok((TokenKind::Int(value), pos))
}

fn lex_string(source: &str, start: usize) -> Result<(String, usize), FilterError> {
    let mut chars = source[start..].char_indices();
    let Some((_, quote)) = chars.next() else {
        return Err(FilterError::syntax(source, start, "unterminated string"));
    };

    let mut text = String::new();
    let mut escape = false;
    for (index, ch) in chars {
        if escape {
            text.push(match ch {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '0' => '\0',
                other => other,
            });
            escape = false;
            continue;
        }
        if ch == '\\' {
            escape = true;
            continue;
        }
        if ch == quote {
            return Ok((text, start + index + ch.len_utf8()));
        }
        text.push(ch);
    }

    Err(FilterError::syntax(source, start, "unterminated string"))
}

fn lex_operator(source: &str, start: usize) -> Result<(TokenKind, usize), FilterError> {
    let rest = &source[start..];
    if rest.starts_with("//=") {
        return Ok((TokenKind::Assign("//="), 3));
    }

    let two = [
        ("==", TokenKind::EqEq),
        ("!=", TokenKind::NotEq),
        ("<=", TokenKind::LtEq),
        (">=", TokenKind::GtEq),
        ("//", TokenKind::DoubleSlash),
        (":=", TokenKind::Assign(":=")),
        ("+=", TokenKind::Assign("+=")),
        ("-=", TokenKind::Assign("-=")),
        ("*=", TokenKind::Assign("*=")),
        ("/=", TokenKind::Assign("/=")),
        ("%=", TokenKind::Assign("%=")),
    ];
    for (symbol, kind) in two {
        if rest.starts_with(symbol) {
            return Ok((kind, 2));
        }
    }

    let Some(ch) = rest.chars().next() else {
        return Err(FilterError::syntax(source, start, "unexpected end of expression"));
    };
    let kind = match ch {
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        ',' => TokenKind::Comma,
        '.' => TokenKind::Dot,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        '<' => TokenKind::Lt,
        '>' => TokenKind::Gt,
        '=' => TokenKind::Assign("="),
        other => {
            return Err(FilterError::syntax(
                source,
                start,
                format!("unexpected character '{other}'"),
            ));
        }
    };
    Ok((kind, ch.len_utf8()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_comparison() {
        assert_eq!(
            kinds("likes >= 100"),
            vec![
                TokenKind::Name("likes".to_string()),
                TokenKind::GtEq,
                TokenKind::Int(100),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_keywords_and_strings() {
        assert_eq!(
            kinds(r#"not "cat" in caption_hashtags"#),
            vec![
                TokenKind::Not,
                TokenKind::Str("cat".to_string()),
                TokenKind::In,
                TokenKind::Name("caption_hashtags".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_float_and_floor_division() {
        assert_eq!(
            kinds("2.5 // 1"),
            vec![
                TokenKind::Float(2.5),
                TokenKind::DoubleSlash,
                TokenKind::Int(1),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_assignment_operators() {
        assert_eq!(kinds("x = 5")[1], TokenKind::Assign("="));
        assert_eq!(kinds("(x := 5)")[2], TokenKind::Assign(":="));
        assert_eq!(kinds("x //= 5")[1], TokenKind::Assign("//="));
        assert_eq!(kinds("x == 5")[1], TokenKind::EqEq);
    }

    #[test]
    fn test_tokenize_string_escapes() {
        assert_eq!(
            kinds(r"'it\'s'")[0],
            TokenKind::Str("it's".to_string())
        );
    }

    #[test]
    fn test_tokenize_rejects_unterminated_string() {
        let err = tokenize("owner_username == 'abc").unwrap_err();
        assert!(matches!(err, FilterError::Syntax { offset: 18, .. }));
    }

    #[test]
    fn test_tokenize_rejects_unknown_character() {
        let err = tokenize("likes & 1").unwrap_err();
        assert!(err.to_string().contains("unexpected character '&'"));
    }

    #[test]
    fn test_tokenize_rejects_identifier_glued_to_number() {
        assert!(tokenize("12abc").is_err());
    }

    #[test]
    fn test_token_offsets_point_at_source() {
        let tokens = tokenize("a  or b").unwrap();
        assert_eq!(tokens[1].offset, 3);
        assert_eq!(tokens[2].offset, 6);
    }
}
