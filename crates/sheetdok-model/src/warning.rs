//! Recoverable conversion warnings
//!
//! Every condition that does not abort a conversion is recorded as a
//! [`Warning`] in an append-only [`Warnings`] sink. Warnings are never thrown
//! mid-pipeline; the caller decides what to do with them once assembly and
//! inference are complete.

use std::fmt;

use serde::Serialize;

/// Category of a recoverable condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A recognized element that is not fully modeled; raw XML is preserved
    Unsupported,
    /// A connector endpoint had no shape within tolerance, or needed a tie-break
    GeometryAmbiguity,
    /// A cell referenced an unknown style id and fell back to the default
    StyleResolution,
    /// A merge region overlapped an earlier one and was dropped
    MergeConflict,
    /// An optional part (drawing, media) was referenced but absent
    MissingPart,
}

impl WarningKind {
    /// All kinds, in reporting order
    pub fn all() -> &'static [WarningKind] {
        &[
            Self::Unsupported,
            Self::GeometryAmbiguity,
            Self::StyleResolution,
            Self::MergeConflict,
            Self::MissingPart,
        ]
    }

    /// Stable identifier used in rendered output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unsupported => "unsupported",
            Self::GeometryAmbiguity => "geometry_ambiguity",
            Self::StyleResolution => "style_resolution",
            Self::MergeConflict => "merge_conflict",
            Self::MissingPart => "missing_part",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded warning
///
/// # Example
///
/// ```
/// use sheetdok_model::{Warning, WarningKind};
///
/// let warning = Warning::new(WarningKind::Unsupported, "unknown worksheet element")
///     .with_scope("Sheet1")
///     .with_location("xl/worksheets/sheet1.xml")
///     .with_element("customPr")
///     .with_raw("<customPr/>");
///
/// assert!(warning.is_unsupported());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    /// Warning category
    pub kind: WarningKind,

    /// Workbook-level (`None`) or the name of the sheet it belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Part path, cell coordinate or object uid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Local name of the offending element, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,

    /// Raw serialized XML fragment kept as fallback content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,

    /// Human-readable reason
    pub reason: String,
}

impl Warning {
    /// Create a new warning
    pub fn new(kind: WarningKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            scope: None,
            location: None,
            element: None,
            raw: None,
            reason: reason.into(),
        }
    }

    /// Set the sheet scope
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the element name
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Attach the raw XML fragment
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    /// Whether this warning escalates in strict mode
    pub fn is_unsupported(&self) -> bool {
        self.kind == WarningKind::Unsupported
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(ref scope) = self.scope {
            write!(f, " {}", scope)?;
        }
        if let Some(ref location) = self.location {
            write!(f, " @ {}", location)?;
        }
        if let Some(ref element) = self.element {
            write!(f, " <{}>", element)?;
        }
        write!(f, ": {}", self.reason)
    }
}

/// Append-only, order-preserving warning sink
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Warnings {
    entries: Vec<Warning>,
}

impl Warnings {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a warning
    pub fn push(&mut self, warning: Warning) {
        self.entries.push(warning);
    }

    /// Append every warning of another sink, keeping its order
    pub fn append(&mut self, other: Warnings) {
        self.entries.extend(other.entries);
    }

    /// Iterate in recording order
    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.entries.iter()
    }

    /// Number of recorded warnings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of warnings of a given kind
    pub fn count(&self, kind: WarningKind) -> usize {
        self.entries.iter().filter(|w| w.kind == kind).count()
    }

    /// Warnings that escalate in strict mode
    pub fn unsupported(&self) -> impl Iterator<Item = &Warning> {
        self.entries.iter().filter(|w| w.is_unsupported())
    }

    /// Whether any warning escalates in strict mode
    pub fn has_unsupported(&self) -> bool {
        self.entries.iter().any(Warning::is_unsupported)
    }
}

impl Extend<Warning> for Warnings {
    fn extend<T: IntoIterator<Item = Warning>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a Warning;
    type IntoIter = std::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
