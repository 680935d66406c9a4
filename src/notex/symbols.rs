//! Character addressable symbol index
//!
//!     A symbol is one character of a code block, addressed by its logical index in the
//!     block rather than by the text node that currently stores it. Each symbol remembers
//!     its owning text node and its offset there; tagging rewrites those two fields as it
//!     splits nodes, but never adds or removes symbols.
//!
//! Marker zones
//!
//!     Two attribute delimited zones are tracked while scanning the events:
//!
//!     - ignore: opened by an element carrying the ignore marker while no no-color zone is
//!       active. Its characters read as spaces, so patterns never match inside it, but
//!       lengths and columns are unchanged.
//!     - no-color: opened by an element carrying the no-color marker while an ignore zone is
//!       active. Its characters are not colorable.
//!
//!     A zone belongs to the element that last opened it and ends when that element closes.
//!     A nested marker of the same kind therefore takes the zone over, and the rest of the
//!     outer element is outside it. Markers that cannot open a zone have no effect and are
//!     reported.

use crate::notex::dom::{DomError, Fragment, NodeId};
use crate::notex::events::ContentEvent;
use crate::notex::options::MarkerOptions;

/// One character slot of a code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// The character as engines see it (a space inside ignore zones)
    pub value: char,
    /// The text node currently holding the character
    pub node: NodeId,
    /// Character offset inside `node`
    pub offset: usize,
    pub colorable: bool,
}

/// The ordered symbols of one code block.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    symbols: Vec<Symbol>,
}

impl SymbolIndex {
    /// Expand the text events of a block into symbols.
    pub fn build(
        fragment: &Fragment,
        events: &[ContentEvent],
        markers: &MarkerOptions,
    ) -> Result<Self, DomError> {
        let mut symbols = Vec::new();
        let mut ignore: Option<NodeId> = None;
        let mut no_color: Option<NodeId> = None;

        for event in events {
            match *event {
                ContentEvent::Open(node) => {
                    let element = fragment.element(node)?;
                    if element.has_attribute(&markers.ignore) {
                        if no_color.is_some() {
                            tracing::warn!(
                                element = %element.name,
                                "'{}' marker has no effect inside a '{}' zone",
                                markers.ignore,
                                markers.no_color
                            );
                        } else {
                            if ignore.is_some() {
                                tracing::warn!(
                                    element = %element.name,
                                    "nested '{}' marker takes over the active zone",
                                    markers.ignore
                                );
                            }
                            ignore = Some(node);
                        }
                    }
                    // checked after ignore so one element can open both zones
                    if element.has_attribute(&markers.no_color) {
                        if ignore.is_none() {
                            tracing::warn!(
                                element = %element.name,
                                "'{}' marker has no effect outside a '{}' zone",
                                markers.no_color,
                                markers.ignore
                            );
                        } else {
                            if no_color.is_some() {
                                tracing::warn!(
                                    element = %element.name,
                                    "nested '{}' marker takes over the active zone",
                                    markers.no_color
                                );
                            }
                            no_color = Some(node);
                        }
                    }
                }
                ContentEvent::Close(node) => {
                    if no_color == Some(node) {
                        no_color = None;
                    }
                    if ignore == Some(node) {
                        ignore = None;
                    }
                }
                ContentEvent::Text(node) => {
                    for (offset, c) in fragment.text(node)?.chars().enumerate() {
                        symbols.push(Symbol {
                            value: if ignore.is_none() { c } else { ' ' },
                            node,
                            offset,
                            colorable: no_color.is_none(),
                        });
                    }
                }
            }
        }

        Ok(SymbolIndex { symbols })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Symbol> {
        self.symbols.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.symbols.iter()
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Symbol] {
        &mut self.symbols
    }
}
