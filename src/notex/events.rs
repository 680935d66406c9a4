//! Flattens a fragment subtree into a stream of content events.
//!
//! # The High-Level Concept
//!
//! Every later stage (reindenting, symbol indexing) needs to look at a code element as if
//! it were one flat string while still knowing where the markup boundaries are. The
//! linearizer walks the subtree depth first and emits `Text` for text nodes, `Open` when
//! entering an element and `Close` when leaving it. The root itself is never emitted.
//!
//! # The Algorithm
//!
//! 1. Start at the root's first child (no children: empty stream)
//! 2. Emit `Text` or `Open` for the current node
//! 3. If it has children, remember it as a parent and descend into the first child
//! 4. Otherwise, if it is an element, emit its `Close` right away (it is already "closed")
//! 5. Move to the next sibling; when there is none, pop parents, emitting `Close` for each,
//!    until one has a next sibling
//! 6. Stop when the walk pops past the root
//!
//! The result is well bracketed: each `Open` has exactly one later `Close` at the same
//! depth, and the nesting mirrors the tree.

use crate::notex::dom::{DomError, Fragment, NodeId};

/// A single step of a document order replay of a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEvent {
    Text(NodeId),
    Open(NodeId),
    Close(NodeId),
}

impl ContentEvent {
    pub fn node(&self) -> NodeId {
        match *self {
            ContentEvent::Text(node) | ContentEvent::Open(node) | ContentEvent::Close(node) => {
                node
            }
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ContentEvent::Text(_))
    }
}

/// Linearize the descendants of `root`.
pub fn content_events(fragment: &Fragment, root: NodeId) -> Result<Vec<ContentEvent>, DomError> {
    fragment.node(root)?;
    let mut events = Vec::new();
    let Some(mut current) = fragment.first_child(root) else {
        return Ok(events);
    };

    let mut parents: Vec<NodeId> = Vec::new();
    loop {
        let is_text = fragment.node(current)?.is_text();
        events.push(if is_text {
            ContentEvent::Text(current)
        } else {
            ContentEvent::Open(current)
        });

        if let Some(child) = fragment.first_child(current) {
            parents.push(current);
            current = child;
            continue;
        }

        if !is_text {
            events.push(ContentEvent::Close(current));
        }

        current = loop {
            if let Some(sibling) = fragment.next_sibling(current) {
                break sibling;
            }
            match parents.pop() {
                Some(parent) => {
                    events.push(ContentEvent::Close(parent));
                    current = parent;
                }
                None => return Ok(events),
            }
        };
    }
}

/// Whether any text event contains a line break.
pub fn is_multiline(fragment: &Fragment, events: &[ContentEvent]) -> Result<bool, DomError> {
    for event in events {
        if let ContentEvent::Text(node) = event {
            if fragment.text(*node)?.contains('\n') {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Total character count over the text events.
pub fn char_count(fragment: &Fragment, events: &[ContentEvent]) -> Result<usize, DomError> {
    let mut count = 0;
    for event in events {
        if let ContentEvent::Text(node) = event {
            count += fragment.text(*node)?.chars().count();
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notex::markup::parse_fragment;
    use crate::notex::testing::is_well_bracketed;

    fn describe(fragment: &Fragment, events: &[ContentEvent]) -> Vec<String> {
        events
            .iter()
            .map(|event| match event {
                ContentEvent::Text(id) => format!("text:{}", fragment.text(*id).unwrap()),
                ContentEvent::Open(id) => format!("open:{}", fragment.element(*id).unwrap().name),
                ContentEvent::Close(id) => {
                    format!("close:{}", fragment.element(*id).unwrap().name)
                }
            })
            .collect()
    }

    #[test]
    fn test_empty_subtree() {
        let fragment = parse_fragment("<code></code>").unwrap();
        let code = fragment.elements_named("code")[0];
        assert!(content_events(&fragment, code).unwrap().is_empty());
    }

    #[test]
    fn test_root_is_not_emitted() {
        let fragment = parse_fragment("<code>ab<em>cd</em>ef</code>").unwrap();
        let code = fragment.elements_named("code")[0];
        let events = content_events(&fragment, code).unwrap();

        assert_eq!(
            describe(&fragment, &events),
            vec!["text:ab", "open:em", "text:cd", "close:em", "text:ef"]
        );
    }

    #[test]
    fn test_nested_closes_are_emitted_when_popping() {
        let fragment = parse_fragment("<a><b><c>x</c></b></a>y").unwrap();
        let events = content_events(&fragment, fragment.root()).unwrap();

        assert_eq!(
            describe(&fragment, &events),
            vec![
                "open:a", "open:b", "open:c", "text:x", "close:c", "close:b", "close:a", "text:y"
            ]
        );
    }

    #[test]
    fn test_childless_elements_close_immediately() {
        let fragment = parse_fragment("<a><b></b></a><c></c>").unwrap();
        let events = content_events(&fragment, fragment.root()).unwrap();

        assert_eq!(
            describe(&fragment, &events),
            vec!["open:a", "open:b", "close:b", "close:a", "open:c", "close:c"]
        );
        assert!(is_well_bracketed(&events));
    }

    #[test]
    fn test_is_multiline() {
        let single = parse_fragment("a<b>b</b>").unwrap();
        let events = content_events(&single, single.root()).unwrap();
        assert!(!is_multiline(&single, &events).unwrap());

        let multi = parse_fragment("a<b>b\n</b>").unwrap();
        let events = content_events(&multi, multi.root()).unwrap();
        assert!(is_multiline(&multi, &events).unwrap());
    }

    #[test]
    fn test_char_count() {
        let fragment = parse_fragment("ab<em>cd</em>ef").unwrap();
        let events = content_events(&fragment, fragment.root()).unwrap();
        assert_eq!(char_count(&fragment, &events).unwrap(), 6);
    }
}
