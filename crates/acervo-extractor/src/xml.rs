//! WordprocessingML scanning
//!
//! `word/document.xml` is walked token by token with nom parsers. Only the
//! elements that carry visible text or line structure are interpreted; all
//! other markup is skipped.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, value},
    sequence::{delimited, preceded, tuple},
    IResult,
};
use std::borrow::Cow;

/// Property containers whose children never contribute text
/// `mc:Choice` duplicates the content of its sibling `mc:Fallback`
const SKIPPED_CONTAINERS: [&str; 4] = ["w:pPr", "w:rPr", "w:sectPr", "mc:Choice"];

/// One lexical unit of XML
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Open(&'a str),
    Close(&'a str),
    Empty(&'a str),
    Text(&'a str),
    CData(&'a str),
    Other,
}

fn name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && c != '>' && c != '/')(input)
}

fn markup_declaration(input: &str) -> IResult<&str, Token<'_>> {
    value(
        Token::Other,
        alt((
            delimited(tag("<?"), take_until("?>"), tag("?>")),
            delimited(tag("<!--"), take_until("-->"), tag("-->")),
        )),
    )(input)
}

fn cdata(input: &str) -> IResult<&str, Token<'_>> {
    map(
        delimited(tag("<![CDATA["), take_until("]]>"), tag("]]>")),
        Token::CData,
    )(input)
}

fn doctype(input: &str) -> IResult<&str, Token<'_>> {
    value(Token::Other, delimited(tag("<!"), is_not(">"), char('>')))(input)
}

fn close_tag(input: &str) -> IResult<&str, Token<'_>> {
    map(
        delimited(tag("</"), name, preceded(multispace0, char('>'))),
        Token::Close,
    )(input)
}

fn start_tag(input: &str) -> IResult<&str, Token<'_>> {
    map(
        tuple((char('<'), name, opt(is_not(">")), char('>'))),
        |(_, tag_name, attributes, _)| {
            let self_closing = attributes.map_or(false, |a| a.trim_end().ends_with('/'));
            if self_closing {
                Token::Empty(tag_name)
            } else {
                Token::Open(tag_name)
            }
        },
    )(input)
}

fn text(input: &str) -> IResult<&str, Token<'_>> {
    map(is_not("<"), Token::Text)(input)
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((markup_declaration, cdata, doctype, close_tag, start_tag, text))(input)
}

/// Parse a single character entity such as `&amp;` or `&#233;`
fn entity(input: &str) -> IResult<&str, Option<char>> {
    map(
        delimited(char('&'), take_while1(|c: char| c != ';' && c != '&'), char(';')),
        |name: &str| match name {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => {
                let code = if let Some(hex) = name.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = name.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
            }
        },
    )(input)
}

/// Decode XML character entities; unknown entities are kept verbatim
pub(crate) fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match entity(rest) {
            Ok((next, Some(ch))) => {
                out.push(ch);
                rest = next;
            }
            _ => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Extract the visible text of a `word/document.xml` part
///
/// Paragraph ends and `w:br`/`w:cr` become line breaks and `w:tab` a tab.
/// Trailing line breaks are trimmed. Returns a description of the position
/// on malformed markup.
pub(crate) fn document_text(xml: &str) -> Result<String, String> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);

    let mut out = String::new();
    let mut rest = xml;
    let mut skip_depth = 0usize;
    let mut in_text = false;

    while !rest.is_empty() {
        let (next, tok) = token(rest)
            .map_err(|_| format!("unparseable markup at byte {}", xml.len() - rest.len()))?;
        rest = next;

        match tok {
            Token::Open(n) if SKIPPED_CONTAINERS.contains(&n) => skip_depth += 1,
            Token::Close(n) if SKIPPED_CONTAINERS.contains(&n) => {
                skip_depth = skip_depth.saturating_sub(1)
            }
            _ if skip_depth > 0 => {}
            Token::Open("w:t") => in_text = true,
            Token::Close("w:t") => in_text = false,
            Token::Text(t) if in_text => out.push_str(&decode_entities(t)),
            Token::CData(t) if in_text => out.push_str(t),
            Token::Empty("w:tab") => out.push('\t'),
            Token::Empty("w:br") | Token::Empty("w:cr") => out.push('\n'),
            Token::Close("w:p") | Token::Empty("w:p") => out.push('\n'),
            _ => {}
        }
    }

    let trimmed_len = out.trim_end_matches(['\n', '\r']).len();
    out.truncate(trimmed_len);
    Ok(out)
}
