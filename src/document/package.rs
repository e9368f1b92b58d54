//! ZIP package container for Office Open XML documents.
//!
//! Entries are kept in their original order with their original compression
//! so that a repacked document differs from its source only in the parts
//! that were actually rewritten.

use super::xml::XmlDocument;
use crate::error::{FillerError, FillerResult};
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const RELATIONSHIP_SUFFIX_OFFICE_DOCUMENT: &str = "/officeDocument";

/// One stored entry of the package.
#[derive(Debug, Clone)]
pub struct PackageEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: CompressionMethod,
    pub is_dir: bool,
}

/// A relationship declared in a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub kind: String,
    /// Target resolved to a package entry name.
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Returns true when the relationship type URI ends with `/{suffix}`.
    pub fn is_kind(&self, suffix: &str) -> bool {
        self.kind
            .rsplit('/')
            .next()
            .is_some_and(|last| last == suffix.trim_start_matches('/'))
    }
}

/// An opened package.
#[derive(Debug, Clone, Default)]
pub struct Package {
    entries: Vec<PackageEntry>,
}

impl Package {
    pub fn from_bytes(bytes: &[u8]) -> FillerResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
            if !file.is_dir() {
                file.read_to_end(&mut data).map_err(|e| {
                    FillerError::read_failure(format!("failed to read package entry '{}'", name), e)
                })?;
            }
            entries.push(PackageEntry {
                name,
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        Ok(Self { entries })
    }

    pub fn to_bytes(&self) -> FillerResult<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut out));
            for entry in &self.entries {
                let method = match entry.compression {
                    CompressionMethod::Stored => CompressionMethod::Stored,
                    _ => CompressionMethod::Deflated,
                };
                let options = SimpleFileOptions::default().compression_method(method);
                if entry.is_dir {
                    zip.add_directory(entry.name.as_str(), options)
                        .map_err(|e| FillerError::read_failure("failed to repack document", e))?;
                    continue;
                }
                zip.start_file(entry.name.as_str(), options)
                    .map_err(|e| FillerError::read_failure("failed to repack document", e))?;
                zip.write_all(&entry.data)
                    .map_err(|e| FillerError::read_failure("failed to repack document", e))?;
            }
            zip.finish()
                .map_err(|e| FillerError::read_failure("failed to repack document", e))?;
        }
        Ok(out)
    }

    pub fn entries(&self) -> &[PackageEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| !entry.is_dir && entry.name == name)
            .map(|entry| entry.data.as_slice())
    }

    /// Overwrites the data of an existing entry, or appends a new one.
    pub fn put(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(PackageEntry {
                name: name.to_string(),
                data,
                compression: CompressionMethod::Deflated,
                is_dir: false,
            }),
        }
    }

    /// Parses an XML entry.
    pub fn xml(&self, name: &str) -> FillerResult<XmlDocument> {
        let data = self.get(name).ok_or_else(|| FillerError::ReadFailure {
            reason: format!("package part '{}' is missing", name),
            source: None,
        })?;
        XmlDocument::parse(data)
    }

    /// Relationships of `part`, in declaration order. A part without a
    /// relationships entry has none.
    pub fn relationships(&self, part: &str) -> FillerResult<Vec<Relationship>> {
        let rels_name = rels_path(part);
        if self.get(&rels_name).is_none() {
            return Ok(Vec::new());
        }
        let rels = self.xml(&rels_name)?;
        let base = part_directory(part);

        Ok(rels
            .root
            .elements()
            .filter(|el| local_name(&el.name) == "Relationship")
            .filter_map(|el| {
                let id = el.attribute("Id")?.to_string();
                let kind = el.attribute("Type")?.to_string();
                let raw_target = el.attribute("Target")?;
                let external = el.attribute("TargetMode") == Some("External");
                let target = if external {
                    raw_target.to_string()
                } else {
                    resolve_target(base, raw_target)
                };
                Some(Relationship {
                    id,
                    kind,
                    target,
                    external,
                })
            })
            .collect())
    }

    /// Name of the main document part, from the package relationships.
    pub fn main_part(&self) -> FillerResult<String> {
        let from_rels = self
            .relationships("")?
            .into_iter()
            .find(|rel| rel.is_kind(RELATIONSHIP_SUFFIX_OFFICE_DOCUMENT) && !rel.external)
            .map(|rel| rel.target);
        Ok(from_rels.unwrap_or_else(|| "word/document.xml".to_string()))
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`; `""` -> `_rels/.rels`.
fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

fn part_directory(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolves a relationship target against the source part's directory.
fn resolve_target(base: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
