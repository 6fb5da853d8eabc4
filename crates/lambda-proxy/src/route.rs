use std::fmt;

use crate::error::RouteError;

/// Path argument after type conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum PathArg {
    Str(String),
    Int(i64),
    Float(f64),
    Uuid(String),
}

impl PathArg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Uuid(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for PathArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) | Self::Uuid(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Converter {
    Str,
    Int,
    Float,
    Uuid,
}

impl Converter {
    fn from_type(name: &str) -> Self {
        match name {
            "int" => Self::Int,
            "float" => Self::Float,
            "uuid" => Self::Uuid,
            // `string` and unrecognized types
            _ => Self::Str,
        }
    }

    /// Whether `b` can appear anywhere in a match of this converter.
    fn admits(self, b: u8) -> bool {
        match self {
            Self::Str => is_word(b),
            Self::Int => b.is_ascii_digit(),
            Self::Float => b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'),
            Self::Uuid => matches!(b, b'0'..=b'9' | b'a'..=b'f' | b'-'),
        }
    }

    /// Full match of `s` and conversion to a [`PathArg`].
    fn convert(self, s: &[u8]) -> Option<PathArg> {
        let text = std::str::from_utf8(s).ok()?;
        match self {
            Self::Str => (!s.is_empty() && s.iter().all(|&b| is_word(b)))
                .then(|| PathArg::Str(text.to_owned())),
            // i64 overflow is treated as no match
            Self::Int => (!s.is_empty() && s.iter().all(u8::is_ascii_digit))
                .then(|| text.parse().ok().map(PathArg::Int))
                .flatten(),
            Self::Float => is_float(s)
                .then(|| text.parse().ok().map(PathArg::Float))
                .flatten(),
            Self::Uuid => is_uuid(s).then(|| PathArg::Uuid(text.to_owned())),
        }
    }
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `[+-]?[0-9]+\.[0-9]+`
fn is_float(s: &[u8]) -> bool {
    let digits = match s.first() {
        Some(b'+' | b'-') => &s[1..],
        _ => s,
    };
    match digits.iter().position(|&b| b == b'.') {
        Some(dot) => {
            let (int, frac) = (&digits[..dot], &digits[dot + 1..]);
            !int.is_empty()
                && !frac.is_empty()
                && int.iter().all(u8::is_ascii_digit)
                && frac.iter().all(u8::is_ascii_digit)
        }
        None => false,
    }
}

/// Lowercase `8-4-4-4-12` hex.
fn is_uuid(s: &[u8]) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];
    if s.len() != 36 {
        return false;
    }
    let mut parts = s.split(|&b| b == b'-');
    GROUPS.iter().all(|&len| {
        parts.next().is_some_and(|p| {
            p.len() == len && p.iter().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        })
    }) && parts.next().is_none()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param { name: String, converter: Converter },
}

/// Compiled URI pattern such as `/users/<string:user>/<int:num>`.
///
/// Matching is anchored at both ends. Parameters are greedy and backtrack,
/// so `/<a>_<b>` splits `x_y_z` as `x_y` / `z`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>,
}

impl Pattern {
    pub fn parse(source: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: source.to_owned(),
            reason: reason.to_owned(),
        };

        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('<') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            if after.starts_with("regex(") {
                return Err(invalid("regex converters are not supported"));
            }
            // Anything but `<name>` or `<type:name>` is plain text
            let Some((kind, name, close)) = placeholder(after) else {
                literal.push('<');
                rest = after;
                continue;
            };

            if tokens
                .iter()
                .any(|t| matches!(t, Token::Param { name: n, .. } if n == name))
            {
                return Err(invalid(&format!("parameter '{name}' appears twice")));
            }
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(Token::Param {
                name: name.to_owned(),
                converter: kind.map_or(Converter::Str, Converter::from_type),
            });
            rest = &after[close + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self {
            source: source.to_owned(),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parameter names in pattern order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Param { name, .. } => Some(name.as_str()),
            Token::Literal(_) => None,
        })
    }

    /// Match the whole of `path`, returning converted arguments by name.
    pub fn matches(&self, path: &str) -> Option<Vec<(String, PathArg)>> {
        let mut args = Vec::new();
        match_from(&self.tokens, path.as_bytes(), &mut args).then_some(args)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split `type:name>...` or `name>...` (text after `<`), returning the
/// converter type, the name and the offset of `>`.
fn placeholder(after: &str) -> Option<(Option<&str>, &str, usize)> {
    let close = after.find('>')?;
    let inner = &after[..close];
    let (kind, name) = match inner.split_once(':') {
        Some((kind, name)) => (Some(kind), name),
        None => (None, inner),
    };
    (is_identifier(name) && kind.is_none_or(is_identifier)).then_some((kind, name, close))
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_word)
}

fn match_from(tokens: &[Token], input: &[u8], args: &mut Vec<(String, PathArg)>) -> bool {
    let Some((first, rest)) = tokens.split_first() else {
        return input.is_empty();
    };

    match first {
        Token::Literal(lit) => input
            .strip_prefix(lit.as_bytes())
            .is_some_and(|remaining| match_from(rest, remaining, args)),
        Token::Param { name, converter } => {
            let run = input
                .iter()
                .take_while(|&&b| converter.admits(b))
                .count();
            for end in (1..=run).rev() {
                let Some(arg) = converter.convert(&input[..end]) else {
                    continue;
                };
                args.push((name.clone(), arg));
                if match_from(rest, &input[end..], args) {
                    return true;
                }
                args.pop();
            }
            false
        }
    }
}
