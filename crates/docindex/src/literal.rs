//! Parser for generated documentation data scripts.
//!
//! Documentation generators emit their navigation and search tables as
//! script files holding nothing but literal assignments:
//!
//! ```text
//! var NAVTREE =
//! [
//!   [ "Introduction", "index.html", null ]
//! ];
//! ```
//!
//! This module parses exactly that subset: `var NAME = <literal>;`
//! statements whose values are arrays, strings, numbers, booleans and
//! `null`. Nothing is evaluated.

use std::fmt;

use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_till1, take_until, take_while, take_while_m_n};
use nom::character::complete::{anychar, char, multispace1, one_of, satisfy};
use nom::combinator::{map, map_opt, opt, recognize, value};
use nom::error::{ErrorKind, ParseError};
use nom::multi::{fold_many0, many0, separated_list0};
use nom::number::complete::double;
use nom::sequence::{delimited, pair, preceded};
use nom::{IResult, Parser};

use crate::error::{Error, Result};

/// A parsed data literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `null`
    Null,
    /// `true` or `false`
    Bool(bool),
    /// A numeric literal.
    Number(f64),
    /// A single- or double-quoted string, with escapes resolved.
    Str(String),
    /// An array literal.
    Array(Vec<Literal>),
}

impl Literal {
    /// Borrow the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the elements, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Literal]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The numeric value, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Whether this is `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the literal kind, for error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Array(_) => "array",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Self::Array(items) => {
                f.write_str("[ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(" ]")
            }
        }
    }
}

/// An ordered list of variable assignments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    assignments: Vec<(String, Literal)>,
}

impl Script {
    /// The value assigned to `name`, if any. The first assignment wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Literal> {
        self.assignments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// The value assigned to `name`, or a [`Error::MissingVariable`].
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is not assigned.
    pub fn require(&self, name: &str) -> Result<&Literal> {
        self.get(name).ok_or_else(|| Error::missing_variable(name))
    }

    /// Names of all assigned variables in source order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|(n, _)| n.as_str())
    }

    /// Number of assignments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the script holds no assignments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Deepest array nesting accepted before parsing gives up.
pub const MAX_DEPTH: usize = 64;

/// Parse a script made of literal assignments.
///
/// # Errors
///
/// Returns [`Error::Syntax`] with the position of the first offending token.
pub fn parse_script(src: &str) -> Result<Script> {
    let src = strip_bom(src);
    match pair(many0(preceded(trivia, assignment)), trivia).parse(src) {
        Ok(("", (assignments, ()))) => Ok(Script { assignments }),
        Ok((rest, _)) => Err(syntax_error(
            src,
            rest,
            format!("expected identifier, found {}", describe(rest)),
        )),
        Err(err) => Err(into_error(src, err)),
    }
}

/// Parse a single bare literal.
///
/// # Errors
///
/// Returns [`Error::Syntax`] if the input is not exactly one literal.
pub fn parse_literal(src: &str) -> Result<Literal> {
    let src = strip_bom(src);
    match ws(required(top_level, "expected a value")).parse(src) {
        Ok(("", value)) => Ok(value),
        Ok((rest, _)) => Err(syntax_error(src, rest, "unexpected trailing input")),
        Err(err) => Err(into_error(src, err)),
    }
}

// --- Errors ---

type PResult<'a, O> = IResult<&'a str, O, SyntaxError<'a>>;

/// Parser error carrying the unconsumed input, so the position can be
/// recovered from its offset into the source.
#[derive(Debug)]
struct SyntaxError<'a> {
    input: &'a str,
    message: String,
}

impl<'a> ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        Self {
            input,
            message: format!("unexpected {} ({kind:?})", describe(input)),
        }
    }

    fn append(_: &'a str, _: ErrorKind, other: Self) -> Self {
        other
    }
}

fn failure<'a, O>(input: &'a str, message: impl Into<String>) -> PResult<'a, O> {
    Err(nom::Err::Failure(SyntaxError {
        input,
        message: message.into(),
    }))
}

/// Turn a recoverable error from `inner` into a hard failure at `input`.
fn required<'a, O, F>(mut inner: F, expected: &'static str) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: Parser<&'a str, Output = O, Error = SyntaxError<'a>>,
{
    move |input: &'a str| match inner.parse(input) {
        Err(nom::Err::Error(_)) => failure(input, format!("{expected}, found {}", describe(input))),
        other => other,
    }
}

fn describe(input: &str) -> String {
    match input.chars().next() {
        Some(c) => format!("'{c}'"),
        None => "end of input".to_string(),
    }
}

/// 1-based line and column of `rest` within `src`.
fn position(src: &str, rest: &str) -> (usize, usize) {
    let consumed = &src[..src.len() - rest.len()];
    let line = consumed.matches('\n').count() + 1;
    let line_start = consumed.rfind('\n').map_or(0, |i| i + 1);
    (line, consumed[line_start..].chars().count() + 1)
}

fn syntax_error(src: &str, rest: &str, message: impl Into<String>) -> Error {
    let (line, column) = position(src, rest);
    Error::syntax(line, column, message)
}

fn into_error(src: &str, err: nom::Err<SyntaxError<'_>>) -> Error {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => syntax_error(src, e.input, e.message),
        nom::Err::Incomplete(_) => syntax_error(src, "", "unexpected end of input"),
    }
}

fn strip_bom(src: &str) -> &str {
    src.strip_prefix('\u{feff}').unwrap_or(src)
}

// --- Trivia ---

fn symbol<'a>(c: char) -> impl Parser<&'a str, Output = char, Error = SyntaxError<'a>> {
    char(c)
}

fn line_comment(input: &str) -> PResult<'_, &str> {
    recognize(pair(tag("//"), opt(is_not("\n")))).parse(input)
}

fn block_comment(input: &str) -> PResult<'_, &str> {
    let closed: PResult<'_, &str> =
        delimited(tag("/*"), take_until("*/"), tag("*/")).parse(input);
    match closed {
        Err(nom::Err::Error(_)) if input.starts_with("/*") => {
            failure(input, "unterminated comment")
        }
        other => other,
    }
}

fn trivia(input: &str) -> PResult<'_, ()> {
    value((), many0(alt((multispace1, line_comment, block_comment)))).parse(input)
}

fn ws<'a, F, O>(inner: F) -> impl Parser<&'a str, Output = O, Error = SyntaxError<'a>>
where
    F: Parser<&'a str, Output = O, Error = SyntaxError<'a>>,
{
    delimited(trivia, inner, trivia)
}

// --- Statements ---

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(satisfy(is_ident_start), take_while(is_ident_continue))).parse(input)
}

/// `[var|let|const] NAME = <literal> [;]`
fn assignment(input: &str) -> PResult<'_, (String, Literal)> {
    let (mut rest, mut name) = identifier(input)?;
    if matches!(name, "var" | "let" | "const") {
        (rest, name) = preceded(trivia, required(identifier, "expected identifier")).parse(rest)?;
    }
    let (rest, _) = preceded(trivia, required(symbol('='), "expected '='")).parse(rest)?;
    let (rest, assigned) =
        preceded(trivia, required(top_level, "expected a value")).parse(rest)?;
    let (rest, ()) = trivia(rest)?;

    if let Ok((rest, _)) = symbol(';').parse(rest) {
        return Ok((rest, (name.to_string(), assigned)));
    }
    // The last statement may omit its semicolon.
    if rest.is_empty() || rest.starts_with(is_ident_start) {
        Ok((rest, (name.to_string(), assigned)))
    } else {
        failure(rest, "expected ';' after assignment")
    }
}

// --- Literals ---

fn top_level(input: &str) -> PResult<'_, Literal> {
    literal(input, 0)
}

fn literal<'a>(input: &'a str, depth: usize) -> PResult<'a, Literal> {
    alt((
        |i: &'a str| array(i, depth),
        map(string, Literal::Str),
        keyword,
        map(double, Literal::Number),
    ))
    .parse(input)
}

fn keyword(input: &str) -> PResult<'_, Literal> {
    let (rest, word) = identifier(input)?;
    match word {
        "null" | "undefined" => Ok((rest, Literal::Null)),
        "true" => Ok((rest, Literal::Bool(true))),
        "false" => Ok((rest, Literal::Bool(false))),
        other => failure(input, format!("unexpected identifier '{other}'")),
    }
}

fn array<'a>(input: &'a str, depth: usize) -> PResult<'a, Literal> {
    let (body, _) = symbol('[').parse(input)?;
    if depth >= MAX_DEPTH {
        return failure(input, format!("arrays nested deeper than {MAX_DEPTH} levels"));
    }

    let (rest, items) = separated_list0(
        ws(symbol(',')),
        preceded(trivia, |i: &'a str| literal(i, depth + 1)),
    )
    .parse(body)?;
    let (rest, _) = opt(ws(symbol(','))).parse(rest)?;
    let (rest, ()) = trivia(rest)?;

    match symbol(']').parse(rest) {
        Ok((rest, _)) => Ok((rest, Literal::Array(items))),
        Err(_) if rest.is_empty() => failure(input, "unterminated array"),
        Err(_) => failure(rest, format!("expected ',' or ']', found {}", describe(rest))),
    }
}

enum Fragment<'a> {
    Text(&'a str),
    Escaped(char),
}

fn string(input: &str) -> PResult<'_, String> {
    let opened: PResult<'_, char> = one_of("\"'").parse(input);
    let (body, quote) = opened?;

    let fragment = alt((
        map(
            take_till1(move |c: char| c == quote || c == '\\' || c == '\n'),
            Fragment::Text,
        ),
        map(escape, Fragment::Escaped),
    ));
    let (rest, text) = fold_many0(fragment, String::new, |mut text, fragment| {
        match fragment {
            Fragment::Text(s) => text.push_str(s),
            Fragment::Escaped(c) => text.push(c),
        }
        text
    })
    .parse(body)?;

    match symbol(quote).parse(rest) {
        Ok((rest, _)) => Ok((rest, text)),
        Err(_) => failure(input, "unterminated string"),
    }
}

fn escape(input: &str) -> PResult<'_, char> {
    preceded(
        symbol('\\'),
        alt((
            preceded(symbol('u'), unicode_escape),
            map(one_of("nrtbf0"), |c| match c {
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                'b' => '\u{8}',
                'f' => '\u{c}',
                _ => '\0',
            }),
            // \\ \' \" \/ and any other escaped char stand for themselves
            anychar,
        )),
    )
    .parse(input)
}

fn utf16_unit(input: &str) -> PResult<'_, u16> {
    map_opt(take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()), |hex: &str| {
        u16::from_str_radix(hex, 16).ok()
    })
    .parse(input)
}

/// The `XXXX` of a `\uXXXX` escape. A high surrogate followed by a
/// `\u` low surrogate decodes to a single character.
fn unicode_escape(input: &str) -> PResult<'_, char> {
    let Ok((rest, unit)) = utf16_unit(input) else {
        return failure(input, "invalid \\u escape: expected four hex digits");
    };

    if (0xD800..0xDC00).contains(&unit) {
        let low: PResult<'_, u16> = preceded(tag("\\u"), utf16_unit).parse(rest);
        if let Ok((after, low)) = low {
            if let Some(Ok(c)) = char::decode_utf16([unit, low]).next() {
                return Ok((after, c));
            }
        }
    }

    let c = char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER);
    Ok((rest, c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_arrays() {
        let lit = parse_literal(r#"[ "a", [ 1, null ], [] ]"#).unwrap();
        assert_eq!(
            lit,
            Literal::Array(vec![
                Literal::Str("a".to_string()),
                Literal::Array(vec![Literal::Number(1.0), Literal::Null]),
                Literal::Array(vec![]),
            ])
        );
    }

    #[test]
    fn test_single_quoted_strings() {
        let lit = parse_literal("['sci_5fspi',['sci_spi',['../a.html#x',1,'r_spi.h']]]").unwrap();
        let items = lit.as_array().unwrap();
        assert_eq!(items[0].as_str(), Some("sci_5fspi"));
        let inner = items[1].as_array().unwrap();
        let target = inner[1].as_array().unwrap();
        assert_eq!(target[1].as_f64(), Some(1.0));
        assert_eq!(target[2].as_str(), Some("r_spi.h"));
    }

    #[test]
    fn test_string_escapes() {
        let lit = parse_literal(r#""a\"b\\c\/d\n""#).unwrap();
        assert_eq!(lit.as_str(), Some("a\"b\\c/d\n"));

        let lit = parse_literal(r"'it\'s'").unwrap();
        assert_eq!(lit.as_str(), Some("it's"));
    }

    #[test]
    fn test_unicode_escapes() {
        let lit = parse_literal(r#""\u0041\u00e9\u2192""#).unwrap();
        assert_eq!(lit.as_str(), Some("A\u{e9}\u{2192}"));
    }

    #[test]
    fn test_surrogate_pair_escape() {
        let lit = parse_literal(r#""\uD83D\uDE00""#).unwrap();
        assert_eq!(lit.as_str(), Some("\u{1f600}"));

        let lit = parse_literal(r#"'\ud83dx'"#).unwrap();
        assert_eq!(lit.as_str(), Some("\u{fffd}x"));
    }

    #[test]
    fn test_unicode_escape_needs_four_hex_digits() {
        for src in [r#""\u+041""#, r#""\u12""#, r#""\u004G""#] {
            let err = parse_literal(src).unwrap_err();
            match err {
                Error::Syntax { line, column, message } => {
                    assert_eq!((line, column), (1, 4), "{src}");
                    assert!(message.contains("\\u escape"), "{src}: {message}");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_byte_order_mark_skipped() {
        let script = parse_script("\u{feff}var a = [ 1 ];").unwrap();
        assert_eq!(script.get("a").and_then(Literal::as_array).map(<[Literal]>::len), Some(1));

        let err = parse_literal("\u{feff}oops").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 1, column: 1, .. }));
    }

    #[test]
    fn test_nesting_limit() {
        let ok = "[".repeat(MAX_DEPTH) + &"]".repeat(MAX_DEPTH);
        assert!(parse_literal(&ok).is_ok());

        let deep = "[".repeat(1000) + &"]".repeat(1000);
        match parse_literal(&deep).unwrap_err() {
            Error::Syntax { line, column, message } => {
                assert_eq!((line, column), (1, MAX_DEPTH + 1));
                assert!(message.contains("nested"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_semicolon_between_values() {
        let err = parse_script("var a = 1 2").unwrap_err();
        assert!(err.to_string().contains("expected ';'"));
    }

    #[test]
    fn test_missing_separator_in_array() {
        let err = parse_literal("[1 2]").unwrap_err();
        assert!(err.to_string().contains("expected ',' or ']'"));
    }

    #[test]
    fn test_trailing_comma_allowed() {
        let lit = parse_literal("[1, 2,]").unwrap();
        assert_eq!(lit.as_array().map(<[Literal]>::len), Some(2));
    }

    #[test]
    fn test_booleans_and_numbers() {
        assert_eq!(parse_literal("true").unwrap(), Literal::Bool(true));
        assert_eq!(parse_literal("false").unwrap(), Literal::Bool(false));
        assert_eq!(parse_literal("-2.5e1").unwrap(), Literal::Number(-25.0));
    }

    #[test]
    fn test_parse_script_assignments() {
        let src = r#"
var NAVTREE =
[
  [ "Docs", "index.html", null ]
];

var NAVTREEINDEX =
[
"index.html"
];

var SYNCONMSG = 'click to disable panel synchronisation';
"#;
        let script = parse_script(src).unwrap();
        assert_eq!(script.len(), 3);
        assert_eq!(
            script.names().collect::<Vec<_>>(),
            vec!["NAVTREE", "NAVTREEINDEX", "SYNCONMSG"]
        );
        assert_eq!(
            script.get("SYNCONMSG").and_then(Literal::as_str),
            Some("click to disable panel synchronisation")
        );
    }

    #[test]
    fn test_parse_script_without_var_or_semicolon() {
        let script = parse_script("searchData=[ ]").unwrap();
        assert_eq!(script.get("searchData"), Some(&Literal::Array(vec![])));
    }

    #[test]
    fn test_parse_script_skips_comments() {
        let src = "// generated\n/* block\ncomment */ var x = [ 1 /* inline */, 2 ]; // tail";
        let script = parse_script(src).unwrap();
        assert_eq!(script.get("x").and_then(Literal::as_array).map(<[Literal]>::len), Some(2));
    }

    #[test]
    fn test_empty_script() {
        let script = parse_script("  \n// nothing here\n").unwrap();
        assert!(script.is_empty());
    }

    #[test]
    fn test_require_missing_variable() {
        let script = parse_script("var a = 1;").unwrap();
        let err = script.require("b").unwrap_err();
        assert!(matches!(err, Error::MissingVariable { ref name } if name == "b"));
    }

    #[test]
    fn test_error_position() {
        let err = parse_literal("[\n  \"a\",\n  oops ]").unwrap_err();
        match err {
            Error::Syntax { line, column, message } => {
                assert_eq!(line, 3);
                assert_eq!(column, 3);
                assert!(message.contains("oops"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_array() {
        let err = parse_literal("[1, 2").unwrap_err();
        assert!(err.to_string().contains("unterminated array"));
    }

    #[test]
    fn test_unterminated_string() {
        let err = parse_literal("'abc").unwrap_err();
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = parse_script("/* never closed").unwrap_err();
        assert!(err.to_string().contains("unterminated comment"));
    }

    #[test]
    fn test_missing_equals() {
        let err = parse_script("var x [1]").unwrap_err();
        assert!(err.to_string().contains("expected '='"));
    }

    #[test]
    fn test_trailing_input_rejected() {
        assert!(parse_literal("[1] [2]").is_err());
    }

    #[test]
    fn test_display_roundtrips_through_parser() {
        let lit = parse_literal(r#"[ "Say \"hi\"", "index.html", null ]"#).unwrap();
        let text = lit.to_string();
        assert_eq!(text, r#"[ "Say \"hi\"", "index.html", null ]"#);
        assert_eq!(parse_literal(&text).unwrap(), lit);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Literal::Null.kind(), "null");
        assert_eq!(Literal::Str(String::new()).kind(), "string");
        assert_eq!(Literal::Array(vec![]).kind(), "array");
    }
}
