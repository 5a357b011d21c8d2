//! Namespace-agnostic helpers for reading with `roxmltree`, and thin wrappers for writing with `quick-xml`

use std::io::{self, Cursor};

use quick_xml::{
    Reader, Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
    name::Prefix,
};
use roxmltree::Node;

pub const CML_NAMESPACE: &str = "http://www.xml-cml.org/schema";
pub const C4W_NAMESPACE: &str = "http://www.chem4word.com/cml";
pub const MARVIN_NAMESPACE: &str = "http://www.chemaxon.com";
pub const XAML_NAMESPACE: &str = "http://schemas.microsoft.com/winfx/2006/xaml/presentation";
pub const XAML_X_NAMESPACE: &str = "http://schemas.microsoft.com/winfx/2006/xaml";

// Reading =============================================================================================================

// NOTE: Everything here matches on local names only, so documents parse the same whether they use `cml:`, `c4w:`, a
// default namespace, or no namespace at all

pub fn is_named(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

pub fn children_named<'a, 'i>(
    node: Node<'a, 'i>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(move |n| is_named(n, name))
}

pub fn child_named<'a, 'i>(node: Node<'a, 'i>, name: &'static str) -> Option<Node<'a, 'i>> {
    children_named(node, name).next()
}

/// Looks up an attribute by local name, ignoring any namespace prefix
pub fn attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|a| a.name() == name)
        .map(|a| a.value())
}

/// Like `attr()`, but treats blank values as missing
pub fn non_blank_attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    attr(node, name).map(str::trim).filter(|v| !v.is_empty())
}

pub fn parse_attr<T: std::str::FromStr>(node: Node, name: &str) -> Option<T> {
    non_blank_attr(node, name).and_then(|v| v.parse().ok())
}

/// Parses `true`/`false` case-insensitively
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        t if t.eq_ignore_ascii_case("true") => Some(true),
        t if t.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// All of the text directly and indirectly contained by `node`, trimmed
pub fn text(node: Node) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_owned()
}

/// The exact source text of `node`, including its tags
pub fn fragment<'i>(raw: &'i str, node: Node) -> &'i str {
    raw.get(node.range()).unwrap_or_default()
}

/// The exact source text between the start and end tags of `node`
pub fn inner_markup<'i>(raw: &'i str, node: Node) -> &'i str {
    let (Some(first), Some(last)) = (node.first_child(), node.last_child()) else {
        return "";
    };
    raw.get(first.range().start..last.range().end)
        .unwrap_or_default()
}

// Writing =============================================================================================================

pub type XmlWriter = Writer<Cursor<Vec<u8>>>;

pub fn new_writer(compressed: bool) -> XmlWriter {
    let buffer = Cursor::new(Vec::new());
    if compressed {
        Writer::new(buffer)
    } else {
        Writer::new_with_indent(buffer, b' ', 2)
    }
}

pub fn start(writer: &mut XmlWriter, tag: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
    writer.write_event(Event::Start(element(tag, attrs)))
}

pub fn end(writer: &mut XmlWriter, tag: &str) -> io::Result<()> {
    writer.write_event(Event::End(BytesEnd::new(tag)))
}

pub fn empty(writer: &mut XmlWriter, tag: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
    writer.write_event(Event::Empty(element(tag, attrs)))
}

/// Writes `<tag ...>content</tag>`, escaping `content`
pub fn text_element(
    writer: &mut XmlWriter,
    tag: &str,
    attrs: &[(&str, &str)],
    content: &str,
) -> io::Result<()> {
    start(writer, tag, attrs)?;
    writer.write_event(Event::Text(BytesText::new(content)))?;
    end(writer, tag)
}

/// Writes `<tag ...>markup</tag>`, copying `markup` through verbatim
pub fn markup_element(
    writer: &mut XmlWriter,
    tag: &str,
    attrs: &[(&str, &str)],
    markup: &str,
) -> io::Result<()> {
    start(writer, tag, attrs)?;
    writer.write_event(Event::Text(BytesText::from_escaped(markup)))?;
    end(writer, tag)
}

fn element<'a>(tag: &'a str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(tag);
    for &attr in attrs {
        element.push_attribute(attr);
    }
    element
}

/// Declares the XAML namespaces on the root element of a rich-text payload if it uses them without declaring them.
/// Payloads that aren't well-formed are returned untouched.
pub fn with_xaml_namespaces(markup: &str) -> String {
    fn is_x(prefix: Option<Prefix>) -> bool {
        prefix.is_some_and(|p| p.as_ref() == b"x")
    }

    let mut reader = Reader::from_str(markup);
    // Where the root's attributes end, and whether it already declares the default and `x:` namespaces
    let mut root: Option<(usize, bool, bool)> = None;
    let mut uses_x = false;
    loop {
        let (element, closing) = match reader.read_event() {
            Ok(Event::Start(element)) => (element, ">".len()),
            Ok(Event::Empty(element)) => (element, "/>".len()),
            Ok(Event::Eof) => break,
            Ok(_) => continue,
            Err(_) => return markup.to_owned(),
        };

        let attributes: Vec<_> = element.attributes().flatten().collect();
        uses_x |= is_x(element.name().prefix()) || attributes.iter().any(|a| is_x(a.key.prefix()));
        if root.is_none() {
            let Some(at) = usize::try_from(reader.buffer_position())
                .ok()
                .and_then(|end| end.checked_sub(closing))
            else {
                return markup.to_owned();
            };
            let declares = |name: &[u8]| attributes.iter().any(|a| a.key.as_ref() == name);
            root = Some((at, declares(b"xmlns"), declares(b"xmlns:x")));
        }
    }

    let Some((at, has_default, has_x)) = root else {
        return markup.to_owned();
    };
    let mut declarations = String::new();
    if !has_default {
        declarations.push_str(&format!(r#" xmlns="{XAML_NAMESPACE}""#));
    }
    if uses_x && !has_x {
        declarations.push_str(&format!(r#" xmlns:x="{XAML_X_NAMESPACE}""#));
    }

    let mut fixed = markup.to_owned();
    fixed.insert_str(at, &declarations);
    fixed
}
