//! Test fixtures and template builders.
//!
//! Provides a builder that writes real word-processing packages with the
//! `zip` crate, following the Builder pattern for clean test setup.

use anyhow::Result;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Escapes character data for element content.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A paragraph with one run per piece of text. Odd runs are bold so run
/// boundaries carry distinct formatting.
pub fn runs_paragraph(pieces: &[&str]) -> String {
    let mut xml = String::from("<w:p>");
    for (i, piece) in pieces.iter().enumerate() {
        xml.push_str("<w:r>");
        if i % 2 == 1 {
            xml.push_str("<w:rPr><w:b/></w:rPr>");
        }
        xml.push_str(&format!(
            r#"<w:t xml:space="preserve">{}</w:t></w:r>"#,
            escape(piece)
        ));
    }
    xml.push_str("</w:p>");
    xml
}

/// A paragraph with a single run.
pub fn paragraph(text: &str) -> String {
    runs_paragraph(&[text])
}

/// Builder for test templates.
///
/// # Example
///
/// ```no_run
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// let bytes = TestDocxBuilder::new()
///     .with_header(&["Date: #date"])
///     .with_paragraph("Dear #name,")
///     .with_table(&[&["#item", "#price"]])
///     .with_footer(&["Page footer"])
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TestDocxBuilder {
    headers: Vec<Vec<String>>,
    body: Vec<String>,
    footers: Vec<Vec<String>>,
}

impl TestDocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header part with one paragraph per line.
    pub fn with_header(mut self, lines: &[&str]) -> Self {
        self.headers.push(lines.iter().map(|l| paragraph(l)).collect());
        self
    }

    /// Adds a footer part with one paragraph per line.
    pub fn with_footer(mut self, lines: &[&str]) -> Self {
        self.footers.push(lines.iter().map(|l| paragraph(l)).collect());
        self
    }

    /// Adds a single-run body paragraph.
    pub fn with_paragraph(mut self, text: &str) -> Self {
        self.body.push(paragraph(text));
        self
    }

    /// Adds a body paragraph split into the given runs.
    pub fn with_runs(mut self, pieces: &[&str]) -> Self {
        self.body.push(runs_paragraph(pieces));
        self
    }

    /// Adds raw paragraph-level markup to the body.
    pub fn with_raw(mut self, xml: &str) -> Self {
        self.body.push(xml.to_string());
        self
    }

    /// Adds a table; each cell holds one paragraph. A cell string containing
    /// `\n` becomes several paragraphs.
    pub fn with_table(mut self, rows: &[&[&str]]) -> Self {
        let mut xml = String::from(r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/></w:tblPr>"#);
        for row in rows {
            xml.push_str("<w:tr>");
            for cell in row.iter() {
                xml.push_str("<w:tc><w:tcPr/>");
                for line in cell.split('\n') {
                    xml.push_str(&paragraph(line));
                }
                xml.push_str("</w:tc>");
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
        self.body.push(xml);
        self
    }

    fn document_xml(&self) -> String {
        let mut section = String::from("<w:sectPr>");
        for i in 0..self.headers.len() {
            section.push_str(&format!(
                r#"<w:headerReference w:type="default" r:id="rIdH{}"/>"#,
                i + 1
            ));
        }
        for i in 0..self.footers.len() {
            section.push_str(&format!(
                r#"<w:footerReference w:type="default" r:id="rIdF{}"/>"#,
                i + 1
            ));
        }
        section.push_str("</w:sectPr>");

        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                "\r\n",
                r#"<w:document xmlns:w="{}" xmlns:r="{}"><w:body>{}{}</w:body></w:document>"#
            ),
            W_NS,
            R_NS,
            self.body.concat(),
            section
        )
    }

    fn part_xml(root: &str, paragraphs: &[String]) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                "\r\n",
                r#"<w:{root} xmlns:w="{w}" xmlns:r="{r}">{body}</w:{root}>"#
            ),
            root = root,
            w = W_NS,
            r = R_NS,
            body = paragraphs.concat()
        )
    }

    fn content_types(&self) -> String {
        let mut overrides = String::from(concat!(
            r#"<Override PartName="/word/document.xml" "#,
            r#"ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#
        ));
        for i in 0..self.headers.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/word/header{}.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#,
                i + 1
            ));
        }
        for i in 0..self.footers.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/word/footer{}.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>"#,
                i + 1
            ));
        }
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                "{}</Types>"
            ),
            overrides
        )
    }

    fn package_rels() -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="{}/officeDocument" Target="word/document.xml"/>"#,
                "</Relationships>"
            ),
            REL_BASE
        )
    }

    fn document_rels(&self) -> String {
        let mut rels = String::new();
        for i in 0..self.headers.len() {
            rels.push_str(&format!(
                r#"<Relationship Id="rIdH{n}" Type="{base}/header" Target="header{n}.xml"/>"#,
                n = i + 1,
                base = REL_BASE
            ));
        }
        for i in 0..self.footers.len() {
            rels.push_str(&format!(
                r#"<Relationship Id="rIdF{n}" Type="{base}/footer" Target="footer{n}.xml"/>"#,
                n = i + 1,
                base = REL_BASE
            ));
        }
        rels.push_str(&format!(
            r#"<Relationship Id="rIdL" Type="{}/hyperlink" Target="https://example.com" TargetMode="External"/>"#,
            REL_BASE
        ));
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                "{}</Relationships>"
            ),
            rels
        )
    }

    /// Writes the package to memory.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut out));
            let options = SimpleFileOptions::default();

            let mut entries = vec![
                ("[Content_Types].xml".to_string(), self.content_types()),
                ("_rels/.rels".to_string(), Self::package_rels()),
                ("word/document.xml".to_string(), self.document_xml()),
                ("word/_rels/document.xml.rels".to_string(), self.document_rels()),
            ];
            for (i, header) in self.headers.iter().enumerate() {
                entries.push((format!("word/header{}.xml", i + 1), Self::part_xml("hdr", header)));
            }
            for (i, footer) in self.footers.iter().enumerate() {
                entries.push((format!("word/footer{}.xml", i + 1), Self::part_xml("ftr", footer)));
            }

            for (name, content) in entries {
                zip.start_file(name, options)?;
                zip.write_all(content.as_bytes())?;
            }
            zip.finish()?;
        }
        Ok(out)
    }

    /// Writes the package to `path`.
    pub fn write(&self, path: &Path) -> Result<PathBuf> {
        std::fs::write(path, self.build()?)?;
        Ok(path.to_path_buf())
    }
}

/// The contract template used across scenarios: `#date` in the header and
/// `#name` in the first body paragraph.
pub fn contract_template() -> Vec<u8> {
    TestDocxBuilder::new()
        .with_header(&["Date: #date"])
        .with_runs(&["Dear #na", "me,"])
        .with_paragraph("Thank you for your order.")
        .build()
        .expect("contract template builds")
}
