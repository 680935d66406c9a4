//! Testing helpers
//!
//! Fixtures are written as markup. [`code_block`] wraps a snippet in a `code` element so
//! tests can state the content of a block exactly as it would appear in a page, leading
//! newline and trailing indentation included.
//!
//! ```rust,ignore
//! let (fragment, code) = code_block("\n    line1\n      line2\n    ");
//! let events = content_events(&fragment, code)?;
//! assert!(is_well_bracketed(&events));
//! ```

use crate::notex::dom::{Fragment, NodeId};
use crate::notex::events::ContentEvent;
use crate::notex::markup::parse_fragment;

/// Parse `<code>{inner}</code>` and return the fragment with the code element's id.
///
/// Panics on malformed markup: fixtures are expected to be valid.
pub fn code_block(inner: &str) -> (Fragment, NodeId) {
    code_block_with(inner, "")
}

/// Like [`code_block`], with raw attribute text for the code element (`data-hl="js"`).
pub fn code_block_with(inner: &str, attributes: &str) -> (Fragment, NodeId) {
    let source = if attributes.is_empty() {
        format!("<code>{}</code>", inner)
    } else {
        format!("<code {}>{}</code>", attributes, inner)
    };
    let fragment = parse_fragment(&source)
        .unwrap_or_else(|e| panic!("invalid fixture markup {:?}: {}", source, e));
    let code = fragment.elements_named("code")[0];
    (fragment, code)
}

/// Every `Open` has exactly one matching later `Close` at the same depth.
pub fn is_well_bracketed(events: &[ContentEvent]) -> bool {
    let mut open: Vec<NodeId> = Vec::new();
    for event in events {
        match event {
            ContentEvent::Text(_) => {}
            ContentEvent::Open(node) => open.push(*node),
            ContentEvent::Close(node) => {
                if open.pop() != Some(*node) {
                    return false;
                }
            }
        }
    }
    open.is_empty()
}
