use std::path::{Path, PathBuf};

/// The XML documents served at fixed paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Description {
    Root,
    ContentDirectory,
    ConnectionManager,
    MediaReceiverRegistrar,
}

impl Description {
    pub const ALL: [Description; 4] = [
        Description::Root,
        Description::ContentDirectory,
        Description::ConnectionManager,
        Description::MediaReceiverRegistrar,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Description::Root => "/rootDesc.xml",
            Description::ContentDirectory => "/ContentDir.xml",
            Description::ConnectionManager => "/ConnectionMgr.xml",
            Description::MediaReceiverRegistrar => "/X_MS_MediaReceiverRegistrar.xml",
        }
    }

    /// Exact match on the request path.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.path() == path)
    }
}

/// Produces a description document, `None` when it cannot be generated.
pub trait DescriptionProvider: Send + Sync {
    fn describe(&self, which: Description) -> Option<String>;
}

/// Serves descriptions from files named like their URL path inside a
/// directory (`rootDesc.xml`, `ContentDir.xml`, ...).
#[derive(Debug, Clone, Default)]
pub struct DescriptionFiles {
    dir: Option<PathBuf>,
}

impl DescriptionFiles {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

impl DescriptionProvider for DescriptionFiles {
    fn describe(&self, which: Description) -> Option<String> {
        let dir = self.dir.as_ref()?;
        let file = dir.join(which.path().trim_start_matches('/'));
        match std::fs::read_to_string(&file) {
            Ok(xml) => Some(xml),
            Err(e) => {
                tracing::error!(file = %file.display(), error = %e, "Failed to load XML description");
                None
            }
        }
    }
}
