//! Tree documents: the text form trees take between pipeline stages
//!
//! Nesting depth is not capped in either format. Writing and JSON reading
//! go through `serde_stacker`, which grows the stack on demand; YAML is read
//! by an event loop in [`yaml`].

mod yaml;

use std::fmt;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tree::FileNode;

/// Document syntax. Both carry the same schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Yaml => f.write_str("yaml"),
            Format::Json => f.write_str("json"),
        }
    }
}

/// Render a tree as a document.
///
/// Fails only for trees the schema cannot express, e.g. paths that are not
/// valid UTF-8.
pub fn serialize(tree: &FileNode, format: Format) -> Result<String> {
    let mut buf = Vec::with_capacity(4096);
    match format {
        Format::Yaml => {
            let mut ser = serde_yaml::Serializer::new(&mut buf);
            tree.serialize(serde_stacker::Serializer::new(&mut ser))?;
            ser.flush()?;
        }
        Format::Json => {
            let mut ser = serde_json::Serializer::pretty(&mut buf);
            tree.serialize(serde_stacker::Serializer::new(&mut ser))?;
        }
    }
    String::from_utf8(buf).map_err(|e| Error::Validation(e.to_string()))
}

/// Parse and validate a document.
pub fn deserialize(text: &str, format: Format) -> Result<FileNode> {
    match format {
        Format::Yaml => {
            let value = yaml::parse(text)?;
            Ok(FileNode::deserialize(serde_stacker::Deserializer::new(value))?)
        }
        Format::Json => {
            let mut de = serde_json::Deserializer::from_str(text);
            de.disable_recursion_limit();
            let tree = FileNode::deserialize(serde_stacker::Deserializer::new(&mut de))?;
            de.end()?;
            Ok(tree)
        }
    }
}

/// Read a whole document from `reader`.
pub fn read_tree<R: Read>(mut reader: R, format: Format) -> Result<FileNode> {
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            Error::Validation(format!("document is not valid UTF-8: {}", e))
        } else {
            Error::Io(e)
        }
    })?;
    deserialize(&text, format)
}

/// Write a document to `writer`, newline-terminated.
pub fn write_tree<W: Write>(mut writer: W, tree: &FileNode, format: Format) -> Result<()> {
    let text = serialize(tree, format)?;
    writer.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
