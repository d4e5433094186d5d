//! Maps a request path onto the file that answers it.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::content::random::RandomSource;

pub const INDEX_FILE: &str = "index.html";
const CSV_EXTENSION: &str = "csv";

/// How request paths are turned into files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// `*.html` paths are served statically, anything else renders a random CSV line.
    #[default]
    Extension,
    /// The last path segment names a static file; the root maps to `index.html`.
    Segment,
}

impl FromStr for ResolutionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "extension" => Ok(ResolutionMode::Extension),
            "segment" => Ok(ResolutionMode::Segment),
            other => Err(anyhow::anyhow!("unknown resolution mode {:?}", other)),
        }
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionMode::Extension => f.write_str("extension"),
            ResolutionMode::Segment => f.write_str("segment"),
        }
    }
}

/// Whether a request may name a file outside the base directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalPolicy {
    /// Any `..` or absolute component in the request resolves to not found.
    #[default]
    Reject,
    /// Plain path join. A decoded `..` can escape the base directory.
    Allow,
}

/// The file chosen for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    StaticFile(PathBuf),
    RandomCsv(PathBuf),
    NotFound,
}

pub struct Resolver {
    base_directory: PathBuf,
    mode: ResolutionMode,
    traversal: TraversalPolicy,
    random: Arc<dyn RandomSource>,
}

impl Resolver {
    pub fn new(
        base_directory: impl Into<PathBuf>,
        mode: ResolutionMode,
        traversal: TraversalPolicy,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            base_directory: base_directory.into(),
            mode,
            traversal,
            random,
        }
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    pub fn random(&self) -> &Arc<dyn RandomSource> {
        &self.random
    }

    /// Resolves a decoded absolute request path such as `/docs/index.html`.
    ///
    /// Only listing the base directory can fail; a missing CSV candidate is
    /// reported as [`ResolvedSource::NotFound`], not as an error.
    pub async fn resolve(&self, path: &str) -> io::Result<ResolvedSource> {
        match self.mode {
            ResolutionMode::Extension => {
                if path.ends_with(".html") {
                    Ok(self.static_file(path.trim_start_matches('/')))
                } else {
                    self.random_csv().await
                }
            }
            ResolutionMode::Segment => match last_segment(path) {
                Some(segment) => Ok(self.static_file(segment)),
                None => Ok(ResolvedSource::StaticFile(self.base_directory.join(INDEX_FILE))),
            },
        }
    }

    fn static_file(&self, relative: &str) -> ResolvedSource {
        if self.traversal == TraversalPolicy::Reject && escapes_base(Path::new(relative)) {
            tracing::warn!(path = relative, "Rejected path outside base directory");
            return ResolvedSource::NotFound;
        }
        ResolvedSource::StaticFile(self.base_directory.join(relative))
    }

    async fn random_csv(&self) -> io::Result<ResolvedSource> {
        let candidates = csv_files(&self.base_directory).await?;
        if candidates.is_empty() {
            return Ok(ResolvedSource::NotFound);
        }

        let index = self.random.pick(candidates.len());
        Ok(ResolvedSource::RandomCsv(candidates[index].clone()))
    }
}

/// Regular `*.csv` files directly inside `dir`, sorted by path.
pub async fn csv_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut found = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(CSV_EXTENSION) {
            continue;
        }
        // Follows symlinks; dangling ones are skipped.
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => found.push(path),
            _ => {}
        }
    }

    found.sort();
    Ok(found)
}

fn last_segment(path: &str) -> Option<&str> {
    path.split('/').rfind(|segment| !segment.trim().is_empty())
}

fn escapes_base(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
}
