use serde::{Deserialize, Serialize};

use crate::snapshot::{HighlightProps, Point, SnapshotRecord};
use crate::state::Viewport;

/// Navigation into the AUT frame failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitFailure {
    pub url: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Network-level error, when the request never got a response
    #[serde(default)]
    pub message: Option<String>,
}

impl VisitFailure {
    pub fn summary(&self) -> String {
        match (self.status, &self.status_text, &self.message) {
            (Some(status), Some(text), _) => format!("{} - {} {}", self.url, status, text),
            (Some(status), None, _) => format!("{} - {}", self.url, status),
            (None, _, Some(message)) => format!("{} - {}", self.url, message),
            (None, _, None) => self.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScreenshotCapture {
    #[default]
    Viewport,
    FullPage,
    Runner,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotConfig {
    /// Selectors of elements to black out in the capture
    #[serde(default)]
    pub blackout: Vec<String>,
    #[serde(default)]
    pub capture: ScreenshotCapture,
    #[serde(default)]
    pub app_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorMethod {
    #[default]
    Get,
    Contains,
}

impl SelectorMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorMethod::Get => "get",
            SelectorMethod::Contains => "contains",
        }
    }
}

/// Selector playground query to evaluate inside the AUT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorQuery {
    pub selector: String,
    #[serde(default)]
    pub method: SelectorMethod,
}

/// Snapshots of one command, as sent when the user inspects it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotProps {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub viewport: Option<Viewport>,
    #[serde(default)]
    pub snapshots: Vec<SnapshotRecord>,
    #[serde(default)]
    pub coords: Option<Point>,
}

impl SnapshotProps {
    pub fn highlight_props(&self) -> HighlightProps {
        HighlightProps {
            coords: self.coords,
        }
    }
}

/// Events the surface reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum RunnerEvent {
    #[serde(rename = "visit:failed")]
    VisitFailed(VisitFailure),
    #[serde(rename = "before:screenshot")]
    BeforeScreenshot(ScreenshotConfig),
    #[serde(rename = "after:screenshot")]
    AfterScreenshot(ScreenshotConfig),
    #[serde(rename = "script:error")]
    ScriptError(Option<String>),
    #[serde(rename = "restart")]
    Restart,
    #[serde(rename = "print:selector:elements:to:console")]
    PrintSelectorElementsToConsole(SelectorQuery),
    #[serde(rename = "window:before:load")]
    WindowBeforeLoad,
    #[serde(rename = "window:load")]
    WindowLoad,
    #[serde(rename = "run:start")]
    RunStart,
    #[serde(rename = "run:end")]
    RunEnd,
    #[serde(rename = "viewport:changed")]
    ViewportChanged(Viewport),
    #[serde(rename = "url:changed")]
    UrlChanged(String),
    #[serde(rename = "page:loading")]
    PageLoading(bool),
    #[serde(rename = "show:snapshot")]
    ShowSnapshot(SnapshotProps),
    #[serde(rename = "hide:snapshot")]
    HideSnapshot,
    #[serde(rename = "pin:snapshot")]
    PinSnapshot(SnapshotProps),
    #[serde(rename = "unpin:snapshot")]
    UnpinSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerEventKind {
    VisitFailed,
    BeforeScreenshot,
    AfterScreenshot,
    ScriptError,
    Restart,
    PrintSelectorElementsToConsole,
    WindowBeforeLoad,
    WindowLoad,
    RunStart,
    RunEnd,
    ViewportChanged,
    UrlChanged,
    PageLoading,
    ShowSnapshot,
    HideSnapshot,
    PinSnapshot,
    UnpinSnapshot,
}

impl RunnerEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunnerEventKind::VisitFailed => "visit:failed",
            RunnerEventKind::BeforeScreenshot => "before:screenshot",
            RunnerEventKind::AfterScreenshot => "after:screenshot",
            RunnerEventKind::ScriptError => "script:error",
            RunnerEventKind::Restart => "restart",
            RunnerEventKind::PrintSelectorElementsToConsole => {
                "print:selector:elements:to:console"
            }
            RunnerEventKind::WindowBeforeLoad => "window:before:load",
            RunnerEventKind::WindowLoad => "window:load",
            RunnerEventKind::RunStart => "run:start",
            RunnerEventKind::RunEnd => "run:end",
            RunnerEventKind::ViewportChanged => "viewport:changed",
            RunnerEventKind::UrlChanged => "url:changed",
            RunnerEventKind::PageLoading => "page:loading",
            RunnerEventKind::ShowSnapshot => "show:snapshot",
            RunnerEventKind::HideSnapshot => "hide:snapshot",
            RunnerEventKind::PinSnapshot => "pin:snapshot",
            RunnerEventKind::UnpinSnapshot => "unpin:snapshot",
        }
    }
}

impl std::fmt::Display for RunnerEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RunnerEvent {
    pub fn kind(&self) -> RunnerEventKind {
        match self {
            RunnerEvent::VisitFailed(_) => RunnerEventKind::VisitFailed,
            RunnerEvent::BeforeScreenshot(_) => RunnerEventKind::BeforeScreenshot,
            RunnerEvent::AfterScreenshot(_) => RunnerEventKind::AfterScreenshot,
            RunnerEvent::ScriptError(_) => RunnerEventKind::ScriptError,
            RunnerEvent::Restart => RunnerEventKind::Restart,
            RunnerEvent::PrintSelectorElementsToConsole(_) => {
                RunnerEventKind::PrintSelectorElementsToConsole
            }
            RunnerEvent::WindowBeforeLoad => RunnerEventKind::WindowBeforeLoad,
            RunnerEvent::WindowLoad => RunnerEventKind::WindowLoad,
            RunnerEvent::RunStart => RunnerEventKind::RunStart,
            RunnerEvent::RunEnd => RunnerEventKind::RunEnd,
            RunnerEvent::ViewportChanged(_) => RunnerEventKind::ViewportChanged,
            RunnerEvent::UrlChanged(_) => RunnerEventKind::UrlChanged,
            RunnerEvent::PageLoading(_) => RunnerEventKind::PageLoading,
            RunnerEvent::ShowSnapshot(_) => RunnerEventKind::ShowSnapshot,
            RunnerEvent::HideSnapshot => RunnerEventKind::HideSnapshot,
            RunnerEvent::PinSnapshot(_) => RunnerEventKind::PinSnapshot,
            RunnerEvent::UnpinSnapshot => RunnerEventKind::UnpinSnapshot,
        }
    }
}
