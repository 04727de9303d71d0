//! Tree value types: nodes, file metadata, annotations and patches

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Structured value attached to a node by map and reduce stages.
///
/// A tagged union of null, bool, number, string, list and an
/// insertion-ordered string-keyed mapping.
pub type Annotation = serde_json::Value;

/// The annotation every freshly built node starts with.
pub fn empty_annotation() -> Annotation {
    Annotation::Object(serde_json::Map::new())
}

/// Text analysis of a file that decoded as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStats {
    pub encoding: String,
    pub line_count: usize,
    pub word_count: usize,
    pub character_count: usize,
}

/// Filesystem metadata of one node.
///
/// The four text fields live in one `Option<TextStats>`, so they are either
/// all present or all absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawFileInfo")]
pub struct FileInfo {
    pub full_path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub text: Option<TextStats>,
}

impl FileInfo {
    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    pub fn line_count(&self) -> Option<usize> {
        self.text.as_ref().map(|t| t.line_count)
    }
}

impl Serialize for FileInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.text.is_some() { 8 } else { 4 };
        let mut state = serializer.serialize_struct("FileInfo", len)?;
        state.serialize_field("full_path", &self.full_path)?;
        state.serialize_field("file_size_bytes", &self.size)?;
        state.serialize_field("last_modified", &self.modified)?;
        state.serialize_field("is_text_file", &self.text.is_some())?;
        if let Some(ref text) = self.text {
            state.serialize_field("text_encoding", &text.encoding)?;
            state.serialize_field("line_count", &text.line_count)?;
            state.serialize_field("word_count", &text.word_count)?;
            state.serialize_field("character_count", &text.character_count)?;
        }
        state.end()
    }
}

/// Flat document shape of `FileInfo`, validated on the way in.
#[derive(Deserialize)]
struct RawFileInfo {
    full_path: PathBuf,
    file_size_bytes: u64,
    last_modified: DateTime<Utc>,
    is_text_file: bool,
    text_encoding: Option<String>,
    line_count: Option<usize>,
    word_count: Option<usize>,
    character_count: Option<usize>,
}

impl TryFrom<RawFileInfo> for FileInfo {
    type Error = String;

    fn try_from(raw: RawFileInfo) -> Result<Self, Self::Error> {
        let text = match (
            raw.is_text_file,
            raw.text_encoding,
            raw.line_count,
            raw.word_count,
            raw.character_count,
        ) {
            (true, Some(encoding), Some(line_count), Some(word_count), Some(character_count)) => {
                Some(TextStats {
                    encoding,
                    line_count,
                    word_count,
                    character_count,
                })
            }
            (false, None, None, None, None) => None,
            (true, ..) => {
                return Err(format!(
                    "{}: text file is missing text analysis fields",
                    raw.full_path.display()
                ));
            }
            (false, ..) => {
                return Err(format!(
                    "{}: non-text file carries text analysis fields",
                    raw.full_path.display()
                ));
            }
        };

        Ok(FileInfo {
            full_path: raw.full_path,
            size: raw.file_size_bytes,
            modified: raw.last_modified,
            text,
        })
    }
}

/// One filesystem entry and its descendants.
///
/// Files have no child list (`children == None`); directories always have
/// one, possibly empty. Children keep filesystem iteration order, which is
/// platform dependent.
///
/// In documents a directory carries `child_nodes`; an empty directory also
/// carries `is_directory: true`, since files may be written with an empty
/// `child_nodes` list too.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawFileNode")]
pub struct FileNode {
    pub name: String,
    pub file_info: FileInfo,
    pub annotation: Annotation,
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    pub fn file(name: impl Into<String>, file_info: FileInfo) -> Self {
        Self {
            name: name.into(),
            file_info,
            annotation: empty_annotation(),
            children: None,
        }
    }

    pub fn dir(name: impl Into<String>, file_info: FileInfo, children: Vec<FileNode>) -> Self {
        Self {
            name: name.into(),
            file_info,
            annotation: empty_annotation(),
            children: Some(children),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.children.is_some()
    }

    pub fn is_file(&self) -> bool {
        self.children.is_none()
    }

    pub fn is_text(&self) -> bool {
        self.file_info.is_text()
    }

    /// Child nodes; empty for files.
    pub fn children(&self) -> &[FileNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Look up a direct child by name.
    pub fn child(&self, name: &str) -> Option<&FileNode> {
        self.children().iter().find(|c| c.name == name)
    }

    /// Pre-order iterator over this node and all descendants.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Build a new node with the patched fields replaced wholesale.
    pub fn apply(mut self, patch: NodePatch) -> FileNode {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(file_info) = patch.file_info {
            self.file_info = file_info;
        }
        if let Some(annotation) = patch.annotation {
            self.annotation = annotation;
        }
        if let Some(children) = patch.children {
            self.children = Some(children);
        }
        self
    }

    /// Everything but the descendants.
    fn same_entry(&self, other: &FileNode) -> bool {
        self.name == other.name
            && self.file_info == other.file_info
            && self.annotation == other.annotation
            && self.children.as_ref().map(Vec::len) == other.children.as_ref().map(Vec::len)
    }
}

impl PartialEq for FileNode {
    /// Walks both trees in pre-order; equal child counts at every node make
    /// equal sequences mean equal shapes.
    fn eq(&self, other: &Self) -> bool {
        let mut left = self.iter();
        let mut right = other.iter();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a.same_entry(b) => {}
                _ => return false,
            }
        }
    }
}

impl Drop for FileNode {
    // Unlink descendants onto a heap stack so dropping a deep tree does not
    // recurse once per level.
    fn drop(&mut self) {
        let Some(children) = self.children.take() else {
            return;
        };
        let mut pending = children;
        while let Some(mut node) = pending.pop() {
            if let Some(grandchildren) = node.children.take() {
                pending.extend(grandchildren);
            }
        }
    }
}

impl Serialize for FileNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let empty_dir = self.children.as_ref().is_some_and(Vec::is_empty);
        let len = 3 + usize::from(self.children.is_some()) + usize::from(empty_dir);
        let mut state = serializer.serialize_struct("FileNode", len)?;
        state.serialize_field("file_name", &self.name)?;
        state.serialize_field("file_info", &self.file_info)?;
        state.serialize_field("custom_data", &self.annotation)?;
        if empty_dir {
            state.serialize_field("is_directory", &true)?;
        }
        if let Some(ref children) = self.children {
            state.serialize_field("child_nodes", children)?;
        }
        state.end()
    }
}

/// Document shape of `FileNode`.
///
/// `child_nodes` may be omitted or empty for files. Without an explicit
/// `is_directory`, only a non-empty child list makes a directory.
#[derive(Deserialize)]
struct RawFileNode {
    file_name: String,
    file_info: FileInfo,
    #[serde(default = "empty_annotation")]
    custom_data: Annotation,
    #[serde(default)]
    is_directory: Option<bool>,
    #[serde(default)]
    child_nodes: Option<Vec<FileNode>>,
}

impl TryFrom<RawFileNode> for FileNode {
    type Error = String;

    fn try_from(raw: RawFileNode) -> Result<Self, Self::Error> {
        let children = match (raw.is_directory, raw.child_nodes) {
            (Some(true), children) => Some(children.unwrap_or_default()),
            (Some(false), Some(children)) if !children.is_empty() => {
                return Err(format!(
                    "{}: file node carries child nodes",
                    raw.file_info.full_path.display()
                ));
            }
            (None, Some(children)) if !children.is_empty() => Some(children),
            _ => None,
        };

        Ok(FileNode {
            name: raw.file_name,
            file_info: raw.file_info,
            annotation: raw.custom_data,
            children,
        })
    }
}

pub struct Iter<'a> {
    stack: Vec<&'a FileNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a FileNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

/// Top-level field replacement for a `FileNode`.
///
/// Every `Some` slot replaces the node's field entirely; nothing is merged.
/// Setting `children` gives the node a child list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub name: Option<String>,
    pub file_info: Option<FileInfo>,
    pub annotation: Option<Annotation>,
    pub children: Option<Vec<FileNode>>,
}

impl NodePatch {
    /// Patch that leaves the node unchanged.
    pub fn none() -> Self {
        Self::default()
    }

    /// Patch that replaces only the annotation.
    pub fn annotation(annotation: Annotation) -> Self {
        Self {
            annotation: Some(annotation),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.file_info.is_none()
            && self.annotation.is_none()
            && self.children.is_none()
    }
}
