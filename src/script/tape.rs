use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::RunnerEvent;

pub const SCRIPT_SCHEMA_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ScriptParseError {
    #[error("Failed to read script: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid JSON on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Script header must be the first line, found on line {0}")]
    MisplacedHeader(usize),
    #[error("Missing script header")]
    MissingHeader,
    #[error("Unsupported script schema version {0}")]
    UnsupportedVersion(u32),
}

/// One scripted action against a mounted runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptStep {
    SetSpec {
        absolute: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relative: Option<String>,
    },
    ClearSpec,
    Ready {
        #[serde(default = "default_true")]
        ready: bool,
    },
    /// Deliver an event as if the channel had received it
    Emit {
        event: RunnerEvent,
    },
    SelectSnapshot {
        index: usize,
    },
    StepSnapshot {
        delta: isize,
    },
    ToggleHighlights,
    SelectorPlayground {
        enabled: bool,
    },
    SelectorHighlight {
        showing: bool,
    },
    ContainerSize {
        width: u32,
        height: u32,
    },
    Delay {
        ms: u64,
    },
    Unmount,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ScriptHeader {
    Header {
        schema_version: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

/// A JSONL run script: a header line followed by one step per line.
#[derive(Debug, Clone, PartialEq)]
pub struct RunScript {
    pub schema_version: u32,
    pub name: Option<String>,
    pub steps: Vec<ScriptStep>,
}

impl RunScript {
    pub fn new(name: Option<String>) -> Self {
        Self {
            schema_version: SCRIPT_SCHEMA_VERSION,
            name,
            steps: Vec::new(),
        }
    }

    pub fn read_jsonl_from_path(path: &Path) -> Result<Self, ScriptParseError> {
        let file = File::open(path)?;
        Self::read_jsonl(BufReader::new(file))
    }

    pub fn parse_jsonl(contents: &str) -> Result<Self, ScriptParseError> {
        Self::read_jsonl(contents.as_bytes())
    }

    fn read_jsonl(reader: impl BufRead) -> Result<Self, ScriptParseError> {
        let mut header: Option<(u32, Option<String>)> = None;
        let mut steps = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            let value: serde_json::Value =
                serde_json::from_str(&line).map_err(|source| ScriptParseError::Json {
                    line: line_no,
                    source,
                })?;

            if value.get("type").and_then(|t| t.as_str()) == Some("header") {
                if header.is_some() || !steps.is_empty() {
                    return Err(ScriptParseError::MisplacedHeader(line_no));
                }
                let ScriptHeader::Header {
                    schema_version,
                    name,
                } = serde_json::from_value(value).map_err(|source| ScriptParseError::Json {
                    line: line_no,
                    source,
                })?;
                if schema_version != SCRIPT_SCHEMA_VERSION {
                    return Err(ScriptParseError::UnsupportedVersion(schema_version));
                }
                header = Some((schema_version, name));
                continue;
            }

            if header.is_none() {
                return Err(ScriptParseError::MissingHeader);
            }
            let step: ScriptStep =
                serde_json::from_value(value).map_err(|source| ScriptParseError::Json {
                    line: line_no,
                    source,
                })?;
            steps.push(step);
        }

        let (schema_version, name) = header.ok_or(ScriptParseError::MissingHeader)?;
        Ok(Self {
            schema_version,
            name,
            steps,
        })
    }

    pub fn write_jsonl_to_path(&self, path: &Path) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let header = ScriptHeader::Header {
            schema_version: self.schema_version,
            name: self.name.clone(),
        };
        writeln!(
            writer,
            "{}",
            serde_json::to_string(&header).map_err(io::Error::other)?
        )?;
        for step in &self.steps {
            writeln!(
                writer,
                "{}",
                serde_json::to_string(step).map_err(io::Error::other)?
            )?;
        }
        writer.flush()?;
        Ok(())
    }
}
