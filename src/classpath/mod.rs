//! Classpath and module layout.
//!
//! Answers which classpath roots a module sees, which module owns a file,
//! and how a relative resource path is probed against directory and archive
//! roots. Loose files get `file://` URIs, archive entries `jar://<archive>!/<entry>`.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

use crate::error::Result;
use crate::index::models::{ModuleDef, RootDef};
use crate::index::sqlite::SqliteIndex;

/// Extensions accepted for resource lookups on top of the binary sniff.
static TEXT_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "txt", "properties", "xml", "json", "yml", "yaml", "csv", "md", "ini", "conf", "cfg",
        "proto", "sql", "graphql", "gql",
    ]
    .into_iter()
    .collect()
});

/// A file located by probing, with the bytes read during classification.
#[derive(Debug, Clone)]
pub struct ResourceHit {
    pub uri: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct ClasspathLayout {
    modules: Vec<ModuleDef>,
    roots: Vec<RootDef>,
}

impl ClasspathLayout {
    pub fn new(modules: Vec<ModuleDef>, roots: Vec<RootDef>) -> Self {
        Self { modules, roots }
    }

    /// Reads the layout stored alongside the declarations.
    pub fn from_index(index: &SqliteIndex) -> Result<Self> {
        Ok(Self::new(index.modules()?, index.roots()?))
    }

    fn module(&self, name: &str) -> Option<&ModuleDef> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Module names visible from `name`: the module itself plus its
    /// transitive dependencies.
    fn visible_modules(&self, name: &str) -> HashSet<String> {
        let mut visible = HashSet::new();
        let mut queue = vec![name.to_string()];
        while let Some(module) = queue.pop() {
            if !visible.insert(module.clone()) {
                continue;
            }
            if let Some(def) = self.module(&module) {
                queue.extend(def.deps.iter().cloned());
            }
        }
        visible
    }

    /// Classpath roots for a module (its own, its dependencies', and
    /// module-less library roots), in declaration order. An absent or
    /// unknown module yields every root.
    pub fn class_roots_for(&self, module_name: Option<&str>) -> Vec<&RootDef> {
        match module_name {
            Some(name) if self.module(name).is_some() => {
                let visible = self.visible_modules(name);
                self.roots
                    .iter()
                    .filter(|root| match &root.module {
                        Some(owner) => visible.contains(owner),
                        None => true,
                    })
                    .collect()
            }
            _ => self.roots.iter().collect(),
        }
    }

    /// The module owning the file behind `uri`, by containing root.
    /// Prefers the longest matching directory root.
    pub fn owner_module(&self, uri: &str) -> Option<String> {
        let target = parse_uri(uri)?;
        let mut best: Option<(&RootDef, usize)> = None;
        for root in &self.roots {
            let depth = match (&target, root.archive) {
                (UriTarget::File(path), false) => {
                    let root_path = Path::new(&root.path);
                    if path.starts_with(root_path) {
                        root_path.components().count()
                    } else {
                        continue;
                    }
                }
                (UriTarget::ArchiveEntry { archive, .. }, true) => {
                    if archive == Path::new(&root.path) {
                        usize::MAX
                    } else {
                        continue;
                    }
                }
                _ => continue,
            };
            if best.map(|(_, d)| depth > d).unwrap_or(true) {
                best = Some((root, depth));
            }
        }
        best.and_then(|(root, _)| root.module.clone())
    }

    /// Presentable classpath-entry label: distinct labels of every root
    /// containing the file, joined with " | ".
    pub fn classpath_label(&self, uri: &str) -> String {
        let Some(target) = parse_uri(uri) else {
            return String::new();
        };
        let mut labels: Vec<&str> = Vec::new();
        for root in &self.roots {
            let contains = match (&target, root.archive) {
                (UriTarget::File(path), false) => path.starts_with(Path::new(&root.path)),
                (UriTarget::ArchiveEntry { archive, .. }, true) => {
                    archive == Path::new(&root.path)
                }
                _ => false,
            };
            if contains && !labels.contains(&root.label.as_str()) {
                labels.push(&root.label);
            }
        }
        labels.join(" | ")
    }

    /// Probes the attempts in order against the given roots, stopping at the
    /// first attempt that yields at least one textual hit across all roots.
    /// Hits from different attempts are never mixed.
    pub fn resolve_resource(
        &self,
        attempts: &[String],
        module_name: Option<&str>,
    ) -> Vec<ResourceHit> {
        let roots = self.class_roots_for(module_name);
        for attempt in attempts {
            let mut hits = Vec::new();
            for root in &roots {
                if let Some(hit) = probe_root(root, attempt) {
                    if is_probably_text(&hit.bytes, extension_of(attempt)) {
                        hits.push(hit);
                    }
                }
            }
            if !hits.is_empty() {
                return hits;
            }
        }
        Vec::new()
    }
}

/// Parsed form of a location URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriTarget {
    File(PathBuf),
    ArchiveEntry { archive: PathBuf, entry: String },
}

pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

pub fn jar_uri(archive: &Path, entry: &str) -> String {
    format!("jar://{}!/{}", archive.display(), entry)
}

pub fn is_archive_uri(uri: &str) -> bool {
    uri.starts_with("jar://")
}

pub fn parse_uri(uri: &str) -> Option<UriTarget> {
    if let Some(rest) = uri.strip_prefix("file://") {
        return Some(UriTarget::File(PathBuf::from(rest)));
    }
    if let Some(rest) = uri.strip_prefix("jar://") {
        let (archive, entry) = rest.split_once("!/")?;
        return Some(UriTarget::ArchiveEntry {
            archive: PathBuf::from(archive),
            entry: entry.to_string(),
        });
    }
    None
}

/// Reads the full content behind a `file://` or `jar://` URI.
pub fn read_uri_bytes(uri: &str) -> Result<Vec<u8>> {
    match parse_uri(uri) {
        Some(UriTarget::File(path)) => Ok(std::fs::read(path)?),
        Some(UriTarget::ArchiveEntry { archive, entry }) => {
            let file = File::open(archive)?;
            let mut zip = zip::ZipArchive::new(file)?;
            let mut entry = zip.by_name(&entry)?;
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;
            Ok(bytes)
        }
        None => Ok(std::fs::read(uri)?),
    }
}

pub fn read_uri_text(uri: &str) -> Result<String> {
    Ok(String::from_utf8_lossy(&read_uri_bytes(uri)?).into_owned())
}

fn probe_root(root: &RootDef, relative: &str) -> Option<ResourceHit> {
    if root.archive {
        let file = File::open(&root.path).ok()?;
        let mut zip = zip::ZipArchive::new(file).ok()?;
        let mut entry = zip.by_name(relative).ok()?;
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).ok()?;
        Some(ResourceHit {
            uri: jar_uri(Path::new(&root.path), relative),
            bytes,
        })
    } else {
        let path = Path::new(&root.path).join(relative);
        if !path.is_file() {
            return None;
        }
        let bytes = std::fs::read(&path).ok()?;
        Some(ResourceHit {
            uri: file_uri(&path),
            bytes,
        })
    }
}

fn extension_of(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx < name.len() - 1 => Some(&name[idx + 1..]),
        _ => None,
    }
}

/// A file is textual when its content does not sniff as binary and its
/// extension, if any, is on the allow-list.
pub fn is_probably_text(bytes: &[u8], extension: Option<&str>) -> bool {
    let prefix = &bytes[..bytes.len().min(4096)];
    if prefix.contains(&0) {
        return false;
    }
    match extension {
        Some(ext) => TEXT_EXTENSIONS.contains(ext.to_lowercase().as_str()),
        None => true,
    }
}
