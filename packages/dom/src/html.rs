//! HTML reader and writer for [`DomItem`] trees.
//!
//! The reader is lenient the way browsers are about unclosed elements (they
//! close at their parent's end or at end of input) but rejects closing tags
//! that match nothing open.

use crate::error::{DomError, DomResult};
use crate::item::{DomElement, DomId, DomItem, DomText};
use crate::tokenizer::{tokenize, tokenize_tag, TagToken, Token};
use folio_model::Attributes;
use serde::Deserialize;
use smol_str::SmolStr;
use tracing::trace;

const VOID_TAGS: &[&str] = &[
    "AREA", "BASE", "BR", "COL", "EMBED", "HR", "IMG", "INPUT", "LINK", "META", "PARAM", "SOURCE",
    "TRACK", "WBR",
];

/// Tags the pretty printer puts on their own line.
const BLOCK_TAGS: &[&str] = &[
    "ADDRESS", "ARTICLE", "ASIDE", "BLOCKQUOTE", "DIV", "FIGURE", "FOOTER", "H1", "H2", "H3", "H4",
    "H5", "H6", "HEADER", "LI", "MAIN", "NAV", "OL", "P", "PRE", "SECTION", "TABLE", "TBODY", "TD",
    "TH", "THEAD", "TR", "UL",
];

pub fn is_void(tag: &str) -> bool {
    VOID_TAGS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

pub fn is_block(tag: &str) -> bool {
    BLOCK_TAGS.iter().any(|block| block.eq_ignore_ascii_case(tag))
}

/// Options for [`write_html`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DomRenderOptions {
    /// Put block elements on their own lines
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
}

impl Default for DomRenderOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: "  ".to_string(),
        }
    }
}

struct OpenElement {
    element: DomElement,
    pos: usize,
}

/// Read an HTML fragment into top-level items.
///
/// Adjacent text is merged, so no two text items are siblings and no text
/// item is empty. A `<br>` directly following another `<br>` at the end of
/// its parent is flagged as a placeholder.
pub fn read_html(source: &str) -> DomResult<Vec<DomItem>> {
    let mut roots: Vec<DomItem> = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();

    for (token, span) in tokenize(source) {
        match token {
            Token::Text(text) => push_text(&mut stack, &mut roots, &decode_entities(text)),
            Token::Lt => push_text(&mut stack, &mut roots, "<"),
            Token::OpenTag(raw) => {
                let (element, self_closing) = parse_open_tag(raw, span.start)?;
                trace!(tag = %element.tag, pos = span.start, "Open tag");
                if self_closing || is_void(&element.tag) {
                    push_item(&mut stack, &mut roots, DomItem::Element(element));
                } else {
                    stack.push(OpenElement {
                        element,
                        pos: span.start,
                    });
                }
            }
            Token::CloseTag(raw) => {
                let tag = raw[2..raw.len() - 1].trim().to_ascii_uppercase();
                if is_void(&tag) {
                    continue;
                }
                let Some(depth) = stack.iter().rposition(|open| open.element.tag == tag) else {
                    return Err(DomError::UnexpectedClose {
                        pos: span.start,
                        tag: tag.to_ascii_lowercase(),
                    });
                };
                while stack.len() > depth {
                    close_top(&mut stack, &mut roots);
                }
            }
        }
    }

    while !stack.is_empty() {
        if let Some(open) = stack.last() {
            trace!(tag = %open.element.tag, pos = open.pos, "Closing unclosed element at end of input");
        }
        close_top(&mut stack, &mut roots);
    }

    mark_placeholders(&mut roots);
    Ok(roots)
}

fn close_top(stack: &mut Vec<OpenElement>, roots: &mut Vec<DomItem>) {
    if let Some(open) = stack.pop() {
        push_item(stack, roots, DomItem::Element(open.element));
    }
}

fn siblings<'a>(stack: &'a mut [OpenElement], roots: &'a mut Vec<DomItem>) -> &'a mut Vec<DomItem> {
    match stack.last_mut() {
        Some(open) => &mut open.element.children,
        None => roots,
    }
}

fn push_item(stack: &mut [OpenElement], roots: &mut Vec<DomItem>, item: DomItem) {
    siblings(stack, roots).push(item);
}

fn push_text(stack: &mut [OpenElement], roots: &mut Vec<DomItem>, text: &str) {
    if text.is_empty() {
        return;
    }
    let siblings = siblings(stack, roots);
    if let Some(DomItem::Text(previous)) = siblings.last_mut() {
        previous.text.push_str(text);
        return;
    }
    siblings.push(DomItem::Text(DomText {
        id: DomId::next(),
        text: text.to_string(),
    }));
}

fn parse_open_tag(raw: &str, pos: usize) -> DomResult<(DomElement, bool)> {
    let inner = &raw[1..raw.len() - 1];
    let mut tokens = tokenize_tag(inner).into_iter().peekable();

    let tag = match tokens.next() {
        Some(TagToken::Name(name)) => SmolStr::new(name.to_ascii_uppercase()),
        _ => return Err(DomError::malformed(pos, "missing tag name")),
    };

    let mut attributes = Attributes::new();
    let mut self_closing = false;
    while let Some(token) = tokens.next() {
        match token {
            TagToken::Name(name) => {
                let value = if tokens.peek() == Some(&TagToken::Equals) {
                    tokens.next();
                    match tokens.next() {
                        Some(TagToken::Quoted(value)) | Some(TagToken::Name(value)) => {
                            decode_entities(value)
                        }
                        _ => {
                            return Err(DomError::malformed(
                                pos,
                                format!("attribute '{}' is missing its value", name),
                            ))
                        }
                    }
                } else {
                    String::new()
                };
                attributes.set(name.to_ascii_lowercase(), value);
            }
            TagToken::Slash if tokens.peek().is_none() => self_closing = true,
            other => {
                return Err(DomError::malformed(pos, format!("unexpected {:?} in tag", other)));
            }
        }
    }

    Ok((
        DomElement {
            id: DomId::next(),
            tag,
            attributes,
            children: Vec::new(),
            placeholder: false,
        },
        self_closing,
    ))
}

fn mark_placeholders(items: &mut [DomItem]) {
    for item in items.iter_mut() {
        if let DomItem::Element(element) = item {
            mark_placeholders(&mut element.children);
            let len = element.children.len();
            if len >= 2
                && element.children[len - 2].is_element("BR")
                && element.children[len - 1].is_element("BR")
            {
                if let DomItem::Element(last) = &mut element.children[len - 1] {
                    last.placeholder = true;
                }
            }
        }
    }
}

pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        let decoded = rest.find(';').and_then(|end| {
            let entity = &rest[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|ch| (ch, end))
        });
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\u{a0}', "&nbsp;")
}

fn escape_attribute(text: &str) -> String {
    text.replace('&', "&amp;").replace('"', "&quot;")
}

struct Writer<'o> {
    options: &'o DomRenderOptions,
    depth: usize,
    buffer: String,
}

impl<'o> Writer<'o> {
    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_indent(&mut self) {
        for _ in 0..self.depth {
            self.buffer.push_str(&self.options.indent);
        }
    }

    fn newline(&mut self) {
        if self.options.pretty && !self.buffer.is_empty() && !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
    }

    fn write_items(&mut self, items: &[DomItem]) {
        for item in items {
            self.write_item(item);
        }
    }

    fn write_item(&mut self, item: &DomItem) {
        match item {
            DomItem::Text(text) => self.add(&escape_text(&text.text)),
            DomItem::Element(element) => {
                let own_line = self.options.pretty && is_block(&element.tag);
                if own_line {
                    self.newline();
                    self.add_indent();
                }
                self.write_open(element);
                if is_void(&element.tag) {
                    if own_line {
                        self.newline();
                    }
                    return;
                }

                // Blocks holding only blocks get their children on separate lines
                let nested = own_line
                    && !element.children.is_empty()
                    && element
                        .children
                        .iter()
                        .all(|child| child.tag().map_or(false, is_block));
                if nested {
                    self.depth += 1;
                    self.write_items(&element.children);
                    self.depth -= 1;
                    self.newline();
                    self.add_indent();
                } else {
                    self.write_items(&element.children);
                }
                self.add("</");
                self.add(&element.tag.to_ascii_lowercase());
                self.add(">");
                if own_line {
                    self.newline();
                }
            }
        }
    }

    fn write_open(&mut self, element: &DomElement) {
        self.add("<");
        self.add(&element.tag.to_ascii_lowercase());
        for (name, value) in element.attributes.iter() {
            self.add(" ");
            self.add(name);
            if !value.is_empty() {
                self.add("=\"");
                self.add(&escape_attribute(value));
                self.add("\"");
            }
        }
        self.add(">");
    }
}

/// Serialize items to HTML. Tags are written lowercase.
pub fn write_html(items: &[DomItem], options: &DomRenderOptions) -> String {
    let mut writer = Writer {
        options,
        depth: 0,
        buffer: String::new(),
    };
    writer.write_items(items);
    if options.pretty {
        writer.buffer.trim_end().to_string()
    } else {
        writer.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(source: &str) -> String {
        write_html(&read_html(source).unwrap(), &DomRenderOptions::default())
    }

    #[test]
    fn test_read_nested_elements() {
        let items = read_html("<p>a<b>b</b></p>c").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].tag(), Some("P"));
        assert_eq!(items[0].children()[1].tag(), Some("B"));
        assert!(items[1].is_text());
    }

    #[test]
    fn test_attributes_and_entities() {
        let items = read_html("<a href=\"x?a=1&amp;b=2\" data-x='q'>&lt;tag&gt; &#65;&#x42;</a>").unwrap();
        let attrs = items[0].attributes().unwrap();
        assert_eq!(attrs.get("href"), Some("x?a=1&b=2"));
        assert_eq!(attrs.get("data-x"), Some("q"));
        assert_eq!(items[0].text_content(), "<tag> AB");
    }

    #[test]
    fn test_void_and_self_closing() {
        let items = read_html("a<br>b<img src=x/><span/>c").unwrap();
        let tags: Vec<_> = items.iter().map(|item| item.tag().unwrap_or("#text")).collect();
        assert_eq!(tags, ["#text", "BR", "#text", "IMG", "SPAN", "#text"]);
    }

    #[test]
    fn test_unclosed_elements_close_at_end() {
        let items = read_html("<p><b>x</p>y").unwrap();
        assert_eq!(items[0].children()[0].text_content(), "x");
        assert_eq!(items[1].text_content(), "y");
    }

    #[test]
    fn test_unexpected_close_is_error() {
        assert_eq!(
            read_html("<p>x</b></p>"),
            Err(DomError::UnexpectedClose {
                pos: 4,
                tag: "b".to_string()
            })
        );
    }

    #[test]
    fn test_trailing_double_br_marks_placeholder() {
        let items = read_html("<p>a<br><br></p><p>b<br></p>").unwrap();
        let first = items[0].children();
        assert!(!first[1].is_placeholder());
        assert!(first[2].is_placeholder());
        assert!(!items[1].children()[1].is_placeholder());
    }

    #[test]
    fn test_round_trip_is_stable() {
        for source in [
            "<b>ab</b>c",
            "<p class=\"lead\">x &amp; y</p><p>z<br><br></p>",
            "<ul><li>one</li><li>two</li></ul>",
        ] {
            assert_eq!(round_trip(source), source);
        }
    }

    #[test]
    fn test_pretty_output() {
        let items = read_html("<div><p>a<b>b</b></p><p>c</p></div>").unwrap();
        let options = DomRenderOptions {
            pretty: true,
            ..Default::default()
        };
        assert_eq!(
            write_html(&items, &options),
            "<div>\n  <p>a<b>b</b></p>\n  <p>c</p>\n</div>"
        );
    }
}
