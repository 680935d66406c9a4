//! Processing options
//!
//! Knobs shared by the reindenter, the symbol index and the highlight view. All of them
//! deserialize with serde (missing keys fall back to the defaults) so `notex-config` can
//! load them straight from TOML.

use serde::Deserialize;

/// Everything `process_code_block` needs besides the registry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
    pub markers: MarkerOptions,
    pub reindent: ReindentOptions,
    pub highlight: HighlightOptions,
    pub preformat: PreformatOptions,
}

/// Attribute names read from code elements and their descendants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MarkerOptions {
    /// Text below an element with this attribute is blanked for pattern matching.
    pub ignore: String,
    /// Inside an ignore zone, text below an element with this attribute is never tagged.
    pub no_color: String,
    /// Names the highlight engine on the code element itself.
    pub language: String,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        MarkerOptions {
            ignore: "ignore".to_string(),
            no_color: "no-color".to_string(),
            language: "data-hl".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ReindentOptions {
    /// Delete the line break of blank lines found at line start instead of keeping it.
    pub collapse_blank_lines: bool,
}

/// Shape of the wrapper elements created by tagging.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HighlightOptions {
    pub wrapper_tag: String,
    pub class_attribute: String,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        HighlightOptions {
            wrapper_tag: "span".to_string(),
            class_attribute: "class".to_string(),
        }
    }
}

/// Attribute set on multi-line code elements so they render as whitespace preserving blocks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreformatOptions {
    pub attribute: String,
    pub value: String,
}

impl Default for PreformatOptions {
    fn default() -> Self {
        PreformatOptions {
            attribute: "style".to_string(),
            value: "display: block; white-space: pre-wrap".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ProcessOptions::default();
        assert_eq!(options.markers.ignore, "ignore");
        assert_eq!(options.markers.no_color, "no-color");
        assert_eq!(options.highlight.wrapper_tag, "span");
        assert!(!options.reindent.collapse_blank_lines);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let options: ProcessOptions =
            serde_json::from_str(r#"{"markers": {"language": "lang"}}"#).unwrap();
        assert_eq!(options.markers.language, "lang");
        assert_eq!(options.markers.ignore, "ignore");
        assert_eq!(options.preformat, PreformatOptions::default());
    }
}
