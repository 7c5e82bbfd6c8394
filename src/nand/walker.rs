// nand/walker.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Implements walking the directory tree stored in the FST, handing each directory and file off
// to a visitor.

use std::collections::HashSet;
use std::fmt;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::warn;
use crate::nand::fst::{EntryKind, FSTEntry};
use crate::nand::session::Session;
use crate::nand::NANDError;

/// The index of the root directory in the FST.
pub const FST_ROOT: u16 = 0;

/// A path inside the NAND, stored as its separate components.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct NandPath {
    segments: Vec<String>,
}

impl NandPath {
    pub fn root() -> Self {
        NandPath::default()
    }

    /// Parses a path like `/title/00000001/00000002`. Empty components are ignored, so leading,
    /// trailing, and doubled slashes don't matter.
    pub fn parse(path: &str) -> Self {
        NandPath {
            segments: path.split('/').filter(|s| !s.is_empty()).map(String::from).collect(),
        }
    }

    /// Creates a new path with another component added onto this one.
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        NandPath { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Builds the matching path under a directory on the host, with every component made safe
    /// to use as a host file name.
    pub fn to_host_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in &self.segments {
            path.push(sanitize_name(segment));
        }
        path
    }
}

impl fmt::Display for NandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Replaces characters that can't be used in file names on the host. NAND names like
/// `00010000:00000000` are common, since the Wii itself doesn't restrict them.
pub fn sanitize_name(name: &str) -> String {
    if name.is_empty() {
        return String::from("-");
    }
    if name == "." || name == ".." {
        return name.replace('.', "-");
    }
    name.chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\\' | '/' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}

/// Something that consumes the entries found while walking the FST.
pub trait FstVisitor {
    /// Called for every directory, before any of its contents.
    fn directory<R: Read + Seek>(&mut self, session: &Session<R>, entry: &FSTEntry, path: &NandPath) -> Result<(), NANDError>;
    fn file<R: Read + Seek>(&mut self, session: &Session<R>, entry: &FSTEntry, path: &NandPath) -> Result<(), NANDError>;
}

enum Work {
    Chain(u16, NandPath),
    Entry(u16, FSTEntry, NandPath),
}

/// Walks the whole FST starting from the root directory.
///
/// Entries are visited in the same order as a recursive walk of the FST: the last sibling in a
/// chain comes first, and a directory's contents come right after the directory itself. An
/// explicit stack is used instead of recursion, and an entry that's reached a second time is
/// skipped so that a damaged FST can't loop forever.
pub fn walk<R: Read + Seek, V: FstVisitor>(session: &Session<R>, visitor: &mut V) -> Result<(), NANDError> {
    let mut visited: HashSet<u16> = HashSet::new();
    let mut stack: Vec<Work> = vec![Work::Chain(FST_ROOT, NandPath::root())];
    while let Some(work) = stack.pop() {
        match work {
            Work::Chain(first, parent) => {
                // Read the whole sibling chain first. Pushing it in order means the last sibling
                // is popped first.
                let mut index = first;
                loop {
                    if !visited.insert(index) {
                        warn!("FST entry {:#06X} was already visited, the FST may be damaged", index);
                        break;
                    }
                    let entry = session.fst_entry(index)?;
                    let sibling = entry.sibling();
                    stack.push(Work::Entry(index, entry, parent.clone()));
                    match sibling {
                        Some(sibling) => index = sibling,
                        None => break,
                    }
                }
            },
            Work::Entry(index, entry, parent) => {
                match entry.kind() {
                    Some(EntryKind::Directory) => {
                        // The root's own name is never part of a path.
                        let path = if index == FST_ROOT {
                            parent
                        } else {
                            let path = parent.join(&entry.name_str());
                            visitor.directory(session, &entry, &path)?;
                            path
                        };
                        if let Some(child) = entry.child() {
                            stack.push(Work::Chain(child, path));
                        }
                    },
                    Some(EntryKind::File) => {
                        visitor.file(session, &entry, &parent.join(&entry.name_str()))?;
                    },
                    None => warn!("ignoring unsupported mode {:#x} for FST entry {:#06X}", entry.mode, index),
                }
            },
        }
    }
    Ok(())
}
