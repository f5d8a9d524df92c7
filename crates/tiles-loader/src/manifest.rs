//! Tile manifest types.
//!
//! Only the fields the runtime acts on are typed; everything else in the
//! manifest document is kept untouched in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tile manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Tile title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Icons in order of preference. The first one is authoritative.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<IconDescriptor>,
    /// Fields the runtime does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the manifest `icons` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconDescriptor {
    /// Tile-relative path of the icon.
    pub src: String,
    /// Space separated sizes, e.g. `"48x48 96x96"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    /// MIME type hint.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl IconDescriptor {
    /// An icon with only a source path.
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            sizes: None,
            mime_type: None,
        }
    }
}

impl Manifest {
    /// An empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON manifest document.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the document is not a manifest object.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Set the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append an icon.
    #[must_use]
    pub fn with_icon(mut self, src: impl Into<String>) -> Self {
        self.icons.push(IconDescriptor::new(src));
        self
    }

    /// The title to apply, if the manifest declares a non-empty name.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// The authoritative icon. Later icons are never used as a fallback.
    #[must_use]
    pub fn primary_icon(&self) -> Option<&IconDescriptor> {
        self.icons.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_web_manifest() {
        let manifest = Manifest::from_slice(
            br#"{
                "name": "Foo",
                "icons": [
                    {"src": "/a.png", "sizes": "48x48", "type": "image/png"},
                    {"src": "/b.png"}
                ],
                "start_url": "/index.html"
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.title(), Some("Foo"));
        let icon = manifest.primary_icon().unwrap();
        assert_eq!(icon.src, "/a.png");
        assert_eq!(icon.mime_type.as_deref(), Some("image/png"));
        assert_eq!(manifest.extra["start_url"], "/index.html");
    }

    #[test]
    fn test_only_empty_name_is_no_title() {
        assert_eq!(Manifest::new().with_name("").title(), None);
        assert_eq!(Manifest::new().with_name("   ").title(), Some("   "));
        assert_eq!(Manifest::new().title(), None);
    }

    #[test]
    fn test_empty_document() {
        let manifest = Manifest::from_slice(b"{}").unwrap();
        assert!(manifest.primary_icon().is_none());
        assert!(manifest.title().is_none());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(Manifest::from_slice(b"[1, 2]").is_err());
    }
}
