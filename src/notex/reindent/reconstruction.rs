//! Tree reconstruction with caller supplied text
//!
//!     Rebuilding a code element is a two party affair: this state machine replays the
//!     content events (cloning elements as it goes) but cannot produce text on its own. At
//!     every text event it stops and hands out a [`TextSlot`]. The caller computes the text
//!     for that slot and consumes it with [`TextSlot::fill`], then asks for the next slot.
//!
//!     A slot is a move-only token: it can be filled once, and the machine cannot advance
//!     past a slot without the caller coming back, so there is a single forward cursor and
//!     no re-entrancy.

use crate::notex::dom::{DomError, Fragment, Node, NodeId};
use crate::notex::events::ContentEvent;

/// A text position waiting for its content.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a text slot must be filled"]
pub struct TextSlot {
    event_index: usize,
    parent: NodeId,
}

impl TextSlot {
    /// Index of the `Text` event this slot stands for.
    pub fn event_index(&self) -> usize {
        self.event_index
    }

    /// Append the slot's text node to its parent.
    pub fn fill(self, fragment: &mut Fragment, text: String) -> Result<NodeId, DomError> {
        fragment.append(self.parent, Node::Text(text))
    }
}

/// Replays content events under a fresh root, one text slot at a time.
#[derive(Debug)]
pub struct Reconstruction<'e> {
    events: &'e [ContentEvent],
    cursor: usize,
    parents: Vec<NodeId>,
}

impl<'e> Reconstruction<'e> {
    /// `root` receives the rebuilt children. It is normally a shallow clone of the node the
    /// events came from.
    pub fn new(root: NodeId, events: &'e [ContentEvent]) -> Self {
        Reconstruction {
            events,
            cursor: 0,
            parents: vec![root],
        }
    }

    /// Replay events up to the next text event and return its slot, or `None` once every
    /// event has been replayed.
    pub fn next_slot(&mut self, fragment: &mut Fragment) -> Result<Option<TextSlot>, DomError> {
        while let Some(event) = self.events.get(self.cursor) {
            let event_index = self.cursor;
            self.cursor += 1;
            let parent = self.parent();
            match *event {
                ContentEvent::Text(_) => {
                    return Ok(Some(TextSlot {
                        event_index,
                        parent,
                    }))
                }
                ContentEvent::Open(node) => {
                    let clone = fragment.shallow_clone(node)?;
                    fragment.append_id(parent, clone)?;
                    self.parents.push(clone);
                }
                ContentEvent::Close(_) => {
                    // the root stays even on a stray close
                    if self.parents.len() > 1 {
                        self.parents.pop();
                    }
                }
            }
        }
        Ok(None)
    }

    fn parent(&self) -> NodeId {
        self.parents[self.parents.len() - 1]
    }
}
