use serde::{Deserialize, Serialize};

/// A spec file selected for execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecDescriptor {
    /// Display name (usually the file name)
    pub name: String,
    /// Path relative to the project root
    pub relative: String,
    /// Absolute path, used to build the iframe URL
    pub absolute: String,
}

impl SpecDescriptor {
    pub fn new(absolute: impl Into<String>) -> Self {
        let absolute = absolute.into();
        let name = absolute
            .rsplit('/')
            .next()
            .unwrap_or(absolute.as_str())
            .to_string();
        Self {
            name,
            relative: absolute.clone(),
            absolute,
        }
    }

    pub fn with_relative(mut self, relative: impl Into<String>) -> Self {
        self.relative = relative.into();
        self
    }
}

impl std::fmt::Display for SpecDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.relative)
    }
}
