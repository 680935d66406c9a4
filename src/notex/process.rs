//! Per-block processing
//!
//! One code element goes through:
//!
//! 1. content events
//! 2. if any text holds a line break: preformat, reindent, and recompute the events on
//!    the rebuilt element
//! 3. if the element names a language: symbol index, highlight view and the registered
//!    engine
//!
//! Finding the code elements of a page is left to the caller; each block is independent.

use crate::notex::dom::{DomError, Fragment, NodeId};
use crate::notex::events::{content_events, is_multiline, ContentEvent};
use crate::notex::options::{HighlightOptions, MarkerOptions, ProcessOptions};
use crate::notex::registry::EngineRegistry;
use crate::notex::reindent::reindent;
use crate::notex::symbols::SymbolIndex;
use crate::notex::view::HighlightView;

/// Reindent and highlight the code element `code`.
///
/// Returns the id of the processed element, which differs from `code` when the block was
/// reindented (the rebuilt element replaces the original in the tree). Engine problems are
/// logged and leave the block untagged; only tree inconsistencies are returned.
pub fn process_code_block(
    fragment: &mut Fragment,
    code: NodeId,
    registry: &EngineRegistry,
    options: &ProcessOptions,
) -> Result<NodeId, DomError> {
    let mut code = code;
    let mut events = content_events(fragment, code)?;

    if is_multiline(fragment, &events)? {
        fragment.set_attribute(
            code,
            options.preformat.attribute.as_str(),
            options.preformat.value.as_str(),
        )?;
        code = reindent(fragment, code, &events, &options.reindent)?;
        events = content_events(fragment, code)?;
    }

    let language = fragment
        .element(code)?
        .attribute(&options.markers.language)
        .map(str::to_string);
    if let Some(language) = language {
        highlight_code(
            fragment,
            &language,
            &events,
            registry,
            &options.markers,
            &options.highlight,
        )?;
    }

    Ok(code)
}

/// Run the engine registered for `language` over a block's content events.
pub fn highlight_code(
    fragment: &mut Fragment,
    language: &str,
    events: &[ContentEvent],
    registry: &EngineRegistry,
    markers: &MarkerOptions,
    options: &HighlightOptions,
) -> Result<(), DomError> {
    let engine = match registry.try_find(language) {
        Ok(engine) => engine,
        Err(error) => {
            error.log();
            return Ok(());
        }
    };

    let symbols = SymbolIndex::build(fragment, events, markers)?;
    tracing::debug!(language, symbols = symbols.len(), "highlighting code block");
    let mut view = HighlightView::new(fragment, symbols, options);
    engine.run(&mut view);
    Ok(())
}
