#![forbid(unsafe_code)]

//! Definition documents.
//!
//! Parsing a definition file into a tree is an external concern; this module
//! only fixes the shape the builders navigate: an [`Element`] with string
//! attributes and an ordered list of text and element children. Any document
//! parser can produce it. [`JsonDefinitionSource`] reads the tree from its
//! serde JSON form, which is what the inspection tool and tests use.
//! [`DirectorySource`] finds such files under a directory tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{Result, SqlsetError};

/// One element of a definition document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name.
    pub name: String,
    /// Attributes in document order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
    /// Children in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Content>,
}

/// Child content of an [`Element`]. Text and CDATA sections are both `Text`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Character data, preserved exactly.
    Text(String),
    /// Nested element.
    Element(Element),
}

impl Element {
    /// Creates an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Appends a text child.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Content::Text(text.into()));
        self
    }

    /// Appends an element child.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Content::Element(child));
        self
    }

    /// Returns the raw attribute value when present.
    pub fn string_attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Returns the attribute value when present and not blank.
    pub fn non_blank_attr(&self, key: &str) -> Option<&str> {
        self.string_attr(key).filter(|v| !v.trim().is_empty())
    }

    /// Parses an integer attribute, falling back to `default` when absent or blank.
    pub fn int_attr(&self, key: &'static str, default: i64) -> Result<i64> {
        match self.non_blank_attr(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| SqlsetError::InvalidAttribute {
                    attribute: key,
                    value: raw.to_owned(),
                }),
        }
    }

    /// Parses a boolean attribute (`true`/`false`, case-insensitive).
    pub fn bool_attr(&self, key: &'static str, default: bool) -> Result<bool> {
        match self.non_blank_attr(key) {
            None => Ok(default),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(SqlsetError::InvalidAttribute {
                    attribute: key,
                    value: raw.to_owned(),
                }),
            },
        }
    }

    /// Iterates over element children, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Content::Element(e) => Some(e),
            Content::Text(_) => None,
        })
    }

    /// Element children with the given tag name, in document order.
    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// Resolves a slash-separated child path such as `parameter-mappings/parameter`.
    pub fn eval_path(&self, path: &str) -> Vec<&Element> {
        let mut current = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|e| e.elements().filter(move |c| c.name == step))
                .collect();
        }
        current
    }

    /// Concatenated text children.
    pub fn body(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Content::Text(t) => Some(t.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }

    /// Attribute value, or the trimmed body of a same-named child element.
    pub fn attr_or_child_text(&self, key: &str) -> Option<String> {
        if let Some(value) = self.string_attr(key) {
            return Some(value.to_owned());
        }
        self.elements_named(key)
            .next()
            .map(|e| e.body().trim().to_owned())
    }
}

/// Supplies one definition document together with its resource identifier.
pub trait DefinitionSource {
    /// Stable identifier used for load idempotency.
    fn resource_id(&self) -> &str;
    /// Produces the document tree.
    fn document(&self) -> Result<Element>;
}

/// Reads an [`Element`] tree stored as JSON on disk.
#[derive(Clone, Debug)]
pub struct JsonDefinitionSource {
    path: PathBuf,
    resource: String,
}

impl JsonDefinitionSource {
    /// Uses the file path as the resource identifier.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let resource = path.display().to_string();
        Self { path, resource }
    }

    /// Overrides the resource identifier.
    pub fn with_resource_id(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// Location of the document on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DefinitionSource for JsonDefinitionSource {
    fn resource_id(&self) -> &str {
        &self.resource
    }

    fn document(&self) -> Result<Element> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// In-memory source, handy when a document was already parsed elsewhere.
#[derive(Clone, Debug)]
pub struct ElementSource {
    resource: String,
    root: Element,
}

impl ElementSource {
    /// Wraps an already-built tree.
    pub fn new(resource: impl Into<String>, root: Element) -> Self {
        Self {
            resource: resource.into(),
            root,
        }
    }
}

impl DefinitionSource for ElementSource {
    fn resource_id(&self) -> &str {
        &self.resource
    }

    fn document(&self) -> Result<Element> {
        Ok(self.root.clone())
    }
}

/// Default file name suffix of definition documents found by a directory scan.
pub const DEFAULT_DEFINITION_SUFFIX: &str = "sqlset.json";

/// Recursively finds definition documents under a root directory.
///
/// A file qualifies when its name starts with `prefix` and ends with `suffix`.
/// Files are returned in file-name order within each directory, so repeated
/// scans of an unchanged tree yield the same sequence.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
    prefix: String,
    suffix: String,
}

impl DirectorySource {
    /// Scans `root` with an empty prefix and [`DEFAULT_DEFINITION_SUFFIX`].
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            prefix: String::new(),
            suffix: DEFAULT_DEFINITION_SUFFIX.to_owned(),
        }
    }

    /// Requires file names to start with `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Requires file names to end with `suffix`.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Scanned directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn matches(&self, file_name: &str) -> bool {
        file_name.starts_with(&self.prefix) && file_name.ends_with(&self.suffix)
    }

    /// Lists one [`JsonDefinitionSource`] per matching file.
    ///
    /// Fails when the root is not a directory. Entries that cannot be read
    /// during the walk are logged and skipped.
    pub fn sources(&self) -> Result<Vec<JsonDefinitionSource>> {
        if !self.root.is_dir() {
            return Err(SqlsetError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root.display()),
            )));
        }
        let mut out = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(root = %self.root.display(), error = %err, "sqlset.scan.entry_skipped");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name().to_str().is_some_and(|name| self.matches(name)) {
                out.push(JsonDefinitionSource::open(entry.path()));
            }
        }
        Ok(out)
    }
}
