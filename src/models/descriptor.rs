//! Test descriptors
//!
//! Input records identifying one test file and the project it belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-project settings passed through to the executor unchanged
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Display name of the project
    pub name: Option<String>,

    /// Working directory for spawned test processes
    pub root_dir: Option<PathBuf>,
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            root_dir: None,
        }
    }

    pub fn with_root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(dir.into());
        self
    }
}

/// Execution context shared by every test of a project
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestContext {
    pub config: ProjectConfig,
}

impl TestContext {
    pub fn new(config: ProjectConfig) -> Self {
        Self { config }
    }
}

/// One test file scheduled for execution
#[derive(Clone, Debug)]
pub struct TestDescriptor {
    pub path: PathBuf,
    pub context: Arc<TestContext>,
}

impl TestDescriptor {
    pub fn new(path: impl Into<PathBuf>, context: Arc<TestContext>) -> Self {
        Self {
            path: path.into(),
            context,
        }
    }

    /// Build descriptors for many paths sharing one context
    pub fn from_paths<I, P>(paths: I, context: Arc<TestContext>) -> Vec<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths
            .into_iter()
            .map(|p| Self::new(p, Arc::clone(&context)))
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for TestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
