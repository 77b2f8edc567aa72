//! `[Content_Types].xml` lookup
//!
//! Content types come from explicit `Override` entries first, then from the
//! `Default` entry for the part's extension, then from a small built-in
//! extension table.

use std::collections::HashMap;

use crate::error::Result;
use crate::xml::XmlDocument;

/// Path of the content types part
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Main part content type of a regular workbook
pub const WORKBOOK_MAIN: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";

/// Main part content type of a macro-enabled workbook
pub const WORKBOOK_MACRO_MAIN: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";

/// Main part content type of a macro-enabled template
pub const TEMPLATE_MACRO_MAIN: &str = "application/vnd.ms-excel.template.macroEnabled.main+xml";

/// Parsed content type declarations
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    /// Extension (lowercase, no dot) to content type
    defaults: HashMap<String, String>,
    /// Part path (no leading slash) to content type
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    /// Parse the content types part
    pub fn parse(source: String) -> Result<Self> {
        let doc = XmlDocument::parse(CONTENT_TYPES_PART, source)?;
        let mut types = Self::default();

        for child in doc.root.elements() {
            let content_type = match child.attr("ContentType") {
                Some(ct) if !ct.is_empty() => ct.to_string(),
                _ => continue,
            };
            match child.local.as_str() {
                "Default" => {
                    if let Some(ext) = child.attr("Extension") {
                        types.defaults.insert(ext.to_ascii_lowercase(), content_type);
                    }
                }
                "Override" => {
                    if let Some(part) = child.attr("PartName") {
                        types
                            .overrides
                            .insert(part.trim_start_matches('/').to_string(), content_type);
                    }
                }
                _ => {}
            }
        }

        Ok(types)
    }

    /// Declared content type of a part, if any
    pub fn declared(&self, part: &str) -> Option<&str> {
        let part = part.trim_start_matches('/');
        if let Some(ct) = self.overrides.get(part) {
            return Some(ct.as_str());
        }
        extension(part).and_then(|ext| self.defaults.get(&ext).map(|s| s.as_str()))
    }

    /// Content type of a part, falling back to the extension table
    pub fn content_type_for(&self, part: &str) -> String {
        match self.declared(part) {
            Some(ct) => ct.to_string(),
            None => extension(part)
                .map(|ext| content_type_for_extension(&ext))
                .unwrap_or("application/octet-stream")
                .to_string(),
        }
    }

    /// Whether any part declares a macro-enabled workbook type
    pub fn is_macro_enabled(&self) -> bool {
        self.overrides
            .values()
            .chain(self.defaults.values())
            .any(|ct| ct == WORKBOOK_MACRO_MAIN || ct == TEMPLATE_MACRO_MAIN)
            || self.overrides.keys().any(|p| p.ends_with("vbaProject.bin"))
    }
}

fn extension(part: &str) -> Option<String> {
    let file = part.rsplit('/').next()?;
    file.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Content type for common media extensions
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        "tiff" | "tif" => "image/tiff",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "xml" => "application/xml",
        _ => "application/octet-stream",
    }
}
