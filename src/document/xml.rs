//! Owned XML element tree for package parts.
//!
//! Parts are small enough to hold in memory. The tree keeps qualified names
//! and attribute order as written so that untouched markup serializes back
//! unchanged apart from insignificant whitespace outside the root element.

use crate::error::{FillerError, FillerResult};
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Write as _;

/// A node inside an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
    /// `<?target data?>`, stored without the delimiters.
    ProcessingInstruction(String),
    /// `<!DOCTYPE ...>` content, only valid before the root.
    DocType(String),
}

/// An element with its qualified name, attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Direct children with the given qualified name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |el| el.is(name))
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut XmlElement> {
        self.elements_mut().filter(move |el| el.is(name))
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|el| el.is(name))
    }

    /// Concatenated text and CDATA content of direct children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(text) | XmlNode::CData(text) => out.push_str(text),
                _ => {}
            }
        }
        out
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", key, escape(value.as_str()));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.children {
            write_node(node, out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn write_node(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Element(el) => el.write_to(out),
        XmlNode::Text(text) => out.push_str(&partial_escape(text.as_str())),
        XmlNode::CData(data) => {
            out.push_str("<![CDATA[");
            out.push_str(data);
            out.push_str("]]>");
        }
        XmlNode::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        XmlNode::ProcessingInstruction(pi) => {
            out.push_str("<?");
            out.push_str(pi);
            out.push_str("?>");
        }
        XmlNode::DocType(doctype) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype);
            out.push('>');
        }
    }
}

/// The `<?xml ...?>` declaration of a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Declaration {
    fn from_event(decl: &BytesDecl<'_>) -> FillerResult<Self> {
        let lossy = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
        let version = decl
            .version()
            .map_err(|e| FillerError::read_failure("malformed XML declaration", e))?;
        let version = lossy(&version);
        let encoding = decl
            .encoding()
            .transpose()
            .map_err(|e| FillerError::read_failure("malformed XML declaration", e))?
            .map(|e| lossy(&e));
        let standalone = decl
            .standalone()
            .transpose()
            .map_err(|e| FillerError::read_failure("malformed XML declaration", e))?
            .map(|s| lossy(&s));
        Ok(Self {
            version,
            encoding,
            standalone,
        })
    }
}

/// A parsed part: optional declaration, prolog nodes, root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub declaration: Option<Declaration>,
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn parse(bytes: &[u8]) -> FillerResult<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut prolog = Vec::new();
        let mut declaration = None;
        let mut root = None;

        loop {
            let node = match reader.read_event_into(&mut buf)? {
                Event::Decl(decl) => {
                    declaration = Some(Declaration::from_event(&decl)?);
                    None
                }
                Event::Start(start) => {
                    stack.push(element_from(&start)?);
                    None
                }
                Event::Empty(start) => Some(XmlNode::Element(element_from(&start)?)),
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| FillerError::ReadFailure {
                        reason: "unbalanced closing tag".to_string(),
                        source: None,
                    })?;
                    Some(XmlNode::Element(element))
                }
                Event::Text(text) => Some(XmlNode::Text(text.unescape()?.into_owned())),
                Event::CData(data) => Some(XmlNode::CData(
                    String::from_utf8_lossy(&data.into_inner()).into_owned(),
                )),
                Event::Comment(comment) => Some(XmlNode::Comment(
                    String::from_utf8_lossy(&comment).into_owned(),
                )),
                Event::PI(pi) => Some(XmlNode::ProcessingInstruction(
                    String::from_utf8_lossy(&pi).into_owned(),
                )),
                Event::DocType(doctype) => Some(XmlNode::DocType(
                    String::from_utf8_lossy(&doctype).trim().to_string(),
                )),
                Event::Eof => break,
            };
            buf.clear();

            let Some(node) = node else { continue };
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => match node {
                    XmlNode::Element(element) if root.is_none() => root = Some(element),
                    XmlNode::Comment(_) | XmlNode::ProcessingInstruction(_) | XmlNode::DocType(_)
                        if root.is_none() =>
                    {
                        prolog.push(node)
                    }
                    XmlNode::Text(ref text)
                        if text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}').is_empty() => {}
                    _ => {
                        return Err(FillerError::ReadFailure {
                            reason: "content outside the root element".to_string(),
                            source: None,
                        })
                    }
                },
            }
        }

        if !stack.is_empty() {
            return Err(FillerError::ReadFailure {
                reason: "unclosed element at end of part".to_string(),
                source: None,
            });
        }
        let root = root.ok_or_else(|| FillerError::ReadFailure {
            reason: "part has no root element".to_string(),
            source: None,
        })?;

        Ok(Self {
            declaration,
            prolog,
            root,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        if let Some(decl) = &self.declaration {
            let _ = write!(out, "<?xml version=\"{}\"", decl.version);
            if let Some(encoding) = &decl.encoding {
                let _ = write!(out, " encoding=\"{}\"", encoding);
            }
            if let Some(standalone) = &decl.standalone {
                let _ = write!(out, " standalone=\"{}\"", standalone);
            }
            out.push_str("?>\r\n");
        }
        for node in &self.prolog {
            write_node(node, &mut out);
        }
        self.root.write_to(&mut out);
        out.into_bytes()
    }
}

fn element_from(start: &BytesStart<'_>) -> FillerResult<XmlElement> {
    let name = utf8(start.name().as_ref())?;
    let mut element = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| FillerError::read_failure("malformed attribute", e))?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn utf8(bytes: &[u8]) -> FillerResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| FillerError::read_failure("markup is not valid UTF-8", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\r\n",
        r#"<?mso-application progid="Word.Document"?>"#,
        r#"<w:document xmlns:w="urn:w"><w:body><w:p w:rsidR="00A1">"#,
        r#"<w:r><w:t xml:space="preserve">Hello &amp; #name </w:t></w:r>"#,
        r#"<!-- note --><w:r><w:tab/></w:r></w:p><?pi data?></w:body></w:document>"#,
    );

    #[test]
    fn test_parse_keeps_structure() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes()).unwrap();
        let decl = doc.declaration.as_ref().unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.standalone.as_deref(), Some("yes"));

        let body = doc.root.child("w:body").unwrap();
        let p = body.child("w:p").unwrap();
        assert_eq!(p.attribute("w:rsidR"), Some("00A1"));
        let t = p.child("w:r").unwrap().child("w:t").unwrap();
        assert_eq!(t.text(), "Hello & #name ");
    }

    #[test]
    fn test_serialize_reproduces_input() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes()).unwrap();
        let written = String::from_utf8(doc.to_bytes()).unwrap();
        assert_eq!(written, SAMPLE);
    }

    #[test]
    fn test_keeps_processing_instructions() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            doc.prolog,
            vec![XmlNode::ProcessingInstruction(
                r#"mso-application progid="Word.Document""#.to_string()
            )]
        );
        let body = doc.root.child("w:body").unwrap();
        assert!(body
            .children
            .contains(&XmlNode::ProcessingInstruction("pi data".to_string())));
    }

    #[test]
    fn test_escapes_written_text() {
        let mut el = XmlElement::new("w:t");
        el.set_attribute("note", "a\"b");
        el.children.push(XmlNode::Text("1 < 2 & 3".to_string()));
        let mut out = String::new();
        el.write_to(&mut out);
        assert_eq!(out, r#"<w:t note="a&quot;b">1 &lt; 2 &amp; 3</w:t>"#);
    }

    #[test]
    fn test_malformed_markup_is_read_failure() {
        let err = XmlDocument::parse(b"<w:document><w:body></w:document>").unwrap_err();
        assert_eq!(err.code(), "READ_FAILURE");

        let err = XmlDocument::parse(b"").unwrap_err();
        assert_eq!(err.code(), "READ_FAILURE");
    }
}
