//! Sectioned word-processing document model.
//!
//! A [`Docx`] is the structural arena the scanner walks and the fill engine
//! re-navigates: header parts, body paragraphs, body tables and footer parts,
//! each addressed by plain indices. Everything the engine does not touch is
//! carried through to the output package unchanged.

pub mod package;
pub mod xml;

pub use package::{Package, PackageEntry, Relationship};
pub use xml::{XmlDocument, XmlElement, XmlNode};

use crate::domain::{Coordinates, PlaceholderMatcher};
use crate::error::{FillerError, FillerResult};

const WORDML_NAMESPACES: [&str; 2] = [
    "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
    "http://purl.oclc.org/ooxml/wordprocessingml/main",
];

/// Qualified WordprocessingML element names for one part's prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordNames {
    pub body: String,
    pub p: String,
    pub r: String,
    pub r_pr: String,
    pub t: String,
    pub tab: String,
    pub br: String,
    pub cr: String,
    pub hyperlink: String,
    pub tbl: String,
    pub tr: String,
    pub tc: String,
}

impl WordNames {
    pub fn with_prefix(prefix: Option<&str>) -> Self {
        let q = |local: &str| match prefix {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        };
        Self {
            body: q("body"),
            p: q("p"),
            r: q("r"),
            r_pr: q("rPr"),
            t: q("t"),
            tab: q("tab"),
            br: q("br"),
            cr: q("cr"),
            hyperlink: q("hyperlink"),
            tbl: q("tbl"),
            tr: q("tr"),
            tc: q("tc"),
        }
    }

    /// Detects the prefix bound to the WordprocessingML namespace on `root`.
    pub fn detect(root: &XmlElement) -> Self {
        for (key, value) in &root.attributes {
            if !WORDML_NAMESPACES.contains(&value.as_str()) {
                continue;
            }
            if key == "xmlns" {
                return Self::with_prefix(None);
            }
            if let Some(prefix) = key.strip_prefix("xmlns:") {
                return Self::with_prefix(Some(prefix));
            }
        }
        Self::with_prefix(Some("w"))
    }
}

/// A parsed XML part of the package.
#[derive(Debug, Clone)]
struct Part {
    name: String,
    xml: XmlDocument,
    names: WordNames,
}

impl Part {
    fn load(package: &Package, name: &str) -> FillerResult<Self> {
        let xml = package.xml(name)?;
        let names = WordNames::detect(&xml.root);
        Ok(Self {
            name: name.to_string(),
            xml,
            names,
        })
    }

    /// Direct paragraphs of a header or footer root.
    fn paragraphs(&self) -> Vec<Paragraph<'_>> {
        paragraphs_of(&self.xml.root, &self.names)
    }

    fn paragraph_mut(&mut self, index: usize) -> Option<ParagraphMut<'_>> {
        let Part { xml, names, .. } = self;
        let names: &WordNames = names;
        xml.root
            .children_named_mut(&names.p)
            .nth(index)
            .map(move |element| ParagraphMut { element, names })
    }
}

fn paragraphs_of<'a>(container: &'a XmlElement, names: &'a WordNames) -> Vec<Paragraph<'a>> {
    container
        .children_named(&names.p)
        .map(move |element| Paragraph { element, names })
        .collect()
}

/// Paragraphs of one table cell.
pub type Cell<'a> = Vec<Paragraph<'a>>;
/// Cells of one table row, in column order.
pub type Row<'a> = Vec<Cell<'a>>;
/// Rows of one table.
pub type Table<'a> = Vec<Row<'a>>;

/// An opened word-processing document.
#[derive(Debug, Clone)]
pub struct Docx {
    package: Package,
    main: Part,
    headers: Vec<Part>,
    footers: Vec<Part>,
}

impl Docx {
    /// Opens a package and parses its main, header and footer parts.
    pub fn from_bytes(bytes: &[u8]) -> FillerResult<Self> {
        let package = Package::from_bytes(bytes)?;
        let main_name = package.main_part()?;
        let main = Part::load(&package, &main_name)?;
        if main.xml.root.child(&main.names.body).is_none() {
            return Err(FillerError::ReadFailure {
                reason: format!("main part '{}' has no body", main_name),
                source: None,
            });
        }

        let mut headers = Vec::new();
        let mut footers = Vec::new();
        for rel in package.relationships(&main_name)? {
            if rel.external {
                continue;
            }
            if rel.is_kind("header") {
                headers.push(Part::load(&package, &rel.target)?);
            } else if rel.is_kind("footer") {
                footers.push(Part::load(&package, &rel.target)?);
            }
        }

        tracing::trace!(
            main = %main_name,
            headers = headers.len(),
            footers = footers.len(),
            "opened document package"
        );

        Ok(Self {
            package,
            main,
            headers,
            footers,
        })
    }

    /// Serializes the document, re-encoding only the parsed parts.
    pub fn to_bytes(&self) -> FillerResult<Vec<u8>> {
        let mut package = self.package.clone();
        for part in std::iter::once(&self.main)
            .chain(&self.headers)
            .chain(&self.footers)
        {
            package.put(&part.name, part.xml.to_bytes());
        }
        package.to_bytes()
    }

    fn body(&self) -> Option<&XmlElement> {
        self.main.xml.root.child(&self.main.names.body)
    }

    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    pub fn footer_count(&self) -> usize {
        self.footers.len()
    }

    /// Paragraphs of each header, in header order.
    pub fn headers(&self) -> Vec<Vec<Paragraph<'_>>> {
        self.headers.iter().map(Part::paragraphs).collect()
    }

    /// Paragraphs of each footer, in footer order.
    pub fn footers(&self) -> Vec<Vec<Paragraph<'_>>> {
        self.footers.iter().map(Part::paragraphs).collect()
    }

    /// Top-level body paragraphs. Paragraphs inside tables are not included.
    pub fn body_paragraphs(&self) -> Vec<Paragraph<'_>> {
        match self.body() {
            Some(body) => paragraphs_of(body, &self.main.names),
            None => Vec::new(),
        }
    }

    /// Top-level body tables.
    pub fn tables(&self) -> Vec<Table<'_>> {
        let names = &self.main.names;
        let Some(body) = self.body() else {
            return Vec::new();
        };
        body.children_named(&names.tbl)
            .map(|tbl| {
                tbl.children_named(&names.tr)
                    .map(|tr| {
                        tr.children_named(&names.tc)
                            .map(|tc| paragraphs_of(tc, names))
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }

    /// Paragraphs addressed by `coordinates` in the live structure.
    ///
    /// Returns `None` when the position no longer exists. A table coordinate
    /// yields every paragraph of the cell.
    pub fn locate_mut(&mut self, coordinates: &Coordinates) -> Option<Vec<ParagraphMut<'_>>> {
        match *coordinates {
            Coordinates::Header {
                header_index,
                paragraph_index,
            } => self
                .headers
                .get_mut(header_index)?
                .paragraph_mut(paragraph_index)
                .map(|p| vec![p]),
            Coordinates::Footer {
                footer_index,
                paragraph_index,
            } => self
                .footers
                .get_mut(footer_index)?
                .paragraph_mut(paragraph_index)
                .map(|p| vec![p]),
            Coordinates::Paragraph { paragraph_index } => {
                let Part { xml, names, .. } = &mut self.main;
                let names: &WordNames = names;
                let body = xml.root.child_mut(&names.body)?;
                let element = body.children_named_mut(&names.p).nth(paragraph_index)?;
                Some(vec![ParagraphMut { element, names }])
            }
            Coordinates::Table {
                table_index,
                row_index,
                column_index,
            } => {
                let Part { xml, names, .. } = &mut self.main;
                let names: &WordNames = names;
                let body = xml.root.child_mut(&names.body)?;
                let cell = body
                    .children_named_mut(&names.tbl)
                    .nth(table_index)?
                    .children_named_mut(&names.tr)
                    .nth(row_index)?
                    .children_named_mut(&names.tc)
                    .nth(column_index)?;
                Some(
                    cell.children_named_mut(&names.p)
                        .map(move |element| ParagraphMut { element, names })
                        .collect(),
                )
            }
        }
    }
}

/// Read-only view of a paragraph.
#[derive(Debug, Clone, Copy)]
pub struct Paragraph<'a> {
    element: &'a XmlElement,
    names: &'a WordNames,
}

impl<'a> Paragraph<'a> {
    /// Visible text assembled across all runs.
    pub fn text(&self) -> String {
        paragraph_text(self.element, self.names)
    }

    pub fn run_count(&self) -> usize {
        runs(self.element, self.names).count()
    }

    pub fn element(&self) -> &'a XmlElement {
        self.element
    }
}

/// Mutable view of a paragraph.
#[derive(Debug)]
pub struct ParagraphMut<'a> {
    element: &'a mut XmlElement,
    names: &'a WordNames,
}

impl ParagraphMut<'_> {
    pub fn text(&self) -> String {
        paragraph_text(self.element, self.names)
    }

    /// Replaces every whole-token occurrence of `token` in the assembled text.
    ///
    /// Only complete `#\w+` matches count, so `#name` never touches
    /// `#name_full`. The paragraph collapses to a single run carrying the
    /// first run's properties; all other runs are dropped. Returns false,
    /// leaving the paragraph untouched, when the token is not present.
    pub fn replace_token(&mut self, token: &str, value: &str) -> bool {
        let text = self.text();
        let pattern = PlaceholderMatcher::pattern();
        if token.is_empty() || !pattern.find_iter(&text).any(|m| m.as_str() == token) {
            return false;
        }
        let replaced = pattern
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                let found = &caps[0];
                if found == token {
                    value.to_string()
                } else {
                    found.to_string()
                }
            })
            .into_owned();
        let names = self.names;

        let mut first_run: Option<XmlElement> = None;
        let mut insert_at = None;
        let mut kept = Vec::with_capacity(self.element.children.len());

        for node in std::mem::take(&mut self.element.children) {
            match node {
                XmlNode::Element(el) if el.is(&names.r) => {
                    if first_run.is_none() {
                        insert_at = Some(kept.len());
                        first_run = Some(el);
                    }
                }
                XmlNode::Element(el)
                    if el.is(&names.hyperlink) && el.children_named(&names.r).next().is_some() =>
                {
                    if first_run.is_none() {
                        insert_at = Some(kept.len());
                        first_run = el.children.into_iter().find_map(|child| match child {
                            XmlNode::Element(run) if run.is(&names.r) => Some(run),
                            _ => None,
                        });
                    }
                }
                other => kept.push(other),
            }
        }

        let run = collapsed_run(first_run, &replaced, names);
        let at = insert_at.unwrap_or(kept.len());
        kept.insert(at, XmlNode::Element(run));
        self.element.children = kept;
        true
    }
}

fn runs<'a>(paragraph: &'a XmlElement, names: &'a WordNames) -> impl Iterator<Item = &'a XmlElement> {
    paragraph.elements().flat_map(move |child| {
        let nested: Box<dyn Iterator<Item = &'a XmlElement> + 'a> = if child.is(&names.r) {
            Box::new(std::iter::once(child))
        } else if child.is(&names.hyperlink) {
            Box::new(child.children_named(&names.r))
        } else {
            Box::new(std::iter::empty())
        };
        nested
    })
}

fn paragraph_text(paragraph: &XmlElement, names: &WordNames) -> String {
    let mut text = String::new();
    for run in runs(paragraph, names) {
        for piece in run.elements() {
            if piece.is(&names.t) {
                text.push_str(&piece.text());
            } else if piece.is(&names.tab) {
                text.push('\t');
            } else if piece.is(&names.br) || piece.is(&names.cr) {
                text.push('\n');
            }
        }
    }
    text
}

/// Builds the single replacement run from the first original run.
fn collapsed_run(first: Option<XmlElement>, text: &str, names: &WordNames) -> XmlElement {
    let mut run = XmlElement::new(names.r.as_str());
    if let Some(first) = first {
        run.attributes = first.attributes;
        run.children.extend(
            first
                .children
                .into_iter()
                .filter(|node| matches!(node, XmlNode::Element(el) if el.is(&names.r_pr))),
        );
    }

    let mut pending = String::new();
    let flush = |pending: &mut String, run: &mut XmlElement| {
        if pending.is_empty() {
            return;
        }
        let mut t = XmlElement::new(names.t.as_str());
        t.set_attribute("xml:space", "preserve");
        t.children.push(XmlNode::Text(std::mem::take(pending)));
        run.children.push(XmlNode::Element(t));
    };
    for c in text.chars() {
        match c {
            '\t' => {
                flush(&mut pending, &mut run);
                run.children.push(XmlNode::Element(XmlElement::new(names.tab.as_str())));
            }
            '\n' => {
                flush(&mut pending, &mut run);
                run.children.push(XmlNode::Element(XmlElement::new(names.br.as_str())));
            }
            other => pending.push(other),
        }
    }
    flush(&mut pending, &mut run);
    if text.is_empty() {
        run.children.push(XmlNode::Element(XmlElement::new(names.t.as_str())));
    }
    run
}
