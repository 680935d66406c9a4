//! Highlight view
//!
//!     The view is what highlight engines work against: a code block seen as a flat,
//!     indexable string of symbols, plus one mutation, [`HighlightView::tag`], which wraps a
//!     range of symbols in styled elements.
//!
//!     Capabilities
//!
//!     - `len` / `is_empty`
//!     - `read(i)`: the value of symbol `i`
//!     - `slice(start, end)`: values in `[start, end)`
//!     - `to_string()` (via `Display`): the full content
//!     - `tag(start, count, classes)`
//!
//!     Each has a `try_` twin returning a [`HighlightError`]. The plain forms log the error
//!     and degrade (no value, empty string, no mutation): an engine's mistake never stops
//!     the rest of the block or the page.
//!
//! Tagging
//!
//!     The range is cut into maximal runs of colorable symbols that share an owning text
//!     node. Each run's node is split in up to three: the text before the run stays in
//!     place, the run moves into a new wrapper element inserted right after it, and the text
//!     after the run goes to a new text node after the wrapper. Empty pieces are not kept.
//!     Every symbol of the run, and every later symbol of the same original node, is then
//!     pointed at its new node and offset, so the next call sees a consistent index whatever
//!     earlier calls did to the tree.

use crate::notex::dom::{char_to_byte, DomError, Element, Fragment, Node, NodeId};
use crate::notex::options::HighlightOptions;
use crate::notex::symbols::{Symbol, SymbolIndex};
use std::fmt;

/// Error type for view queries and tagging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightError {
    /// `tag` called with a zero count
    EmptyRange { start: usize },
    /// The range reaches past the last symbol (or starts after it ends)
    Range { start: usize, end: usize, len: usize },
    /// Read of an index with no symbol
    PropertyNotFound(usize),
    Dom(DomError),
}

impl HighlightError {
    /// Report the error the way non-fatal view failures are reported.
    pub fn log(&self) {
        match self {
            HighlightError::EmptyRange { .. } => tracing::warn!("{}", self),
            _ => tracing::error!("{}", self),
        }
    }
}

impl fmt::Display for HighlightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightError::EmptyRange { start } => {
                write!(f, "Can't highlight an empty range at symbol {}", start)
            }
            HighlightError::Range { start, end, len } => write!(
                f,
                "Range {}..{} is out of bounds for {} symbols",
                start, end, len
            ),
            HighlightError::PropertyNotFound(index) => {
                write!(f, "Input doesn't have '{}' property", index)
            }
            HighlightError::Dom(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for HighlightError {}

impl From<DomError> for HighlightError {
    fn from(error: DomError) -> Self {
        HighlightError::Dom(error)
    }
}

/// A code block as seen by highlight engines.
pub struct HighlightView<'a> {
    fragment: &'a mut Fragment,
    symbols: SymbolIndex,
    options: &'a HighlightOptions,
}

impl<'a> HighlightView<'a> {
    pub fn new(
        fragment: &'a mut Fragment,
        symbols: SymbolIndex,
        options: &'a HighlightOptions,
    ) -> Self {
        HighlightView {
            fragment,
            symbols,
            options,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &SymbolIndex {
        &self.symbols
    }

    pub fn fragment(&self) -> &Fragment {
        &*self.fragment
    }

    pub fn try_read(&self, index: usize) -> Result<char, HighlightError> {
        self.symbols
            .get(index)
            .map(|symbol| symbol.value)
            .ok_or(HighlightError::PropertyNotFound(index))
    }

    /// The value of symbol `index`; logs and returns `None` past the end.
    pub fn read(&self, index: usize) -> Option<char> {
        self.try_read(index).map_err(|error| error.log()).ok()
    }

    pub fn try_slice(&self, start: usize, end: usize) -> Result<String, HighlightError> {
        let len = self.len();
        if start > len || end > len || start > end {
            return Err(HighlightError::Range { start, end, len });
        }
        Ok(self.symbols.as_slice()[start..end]
            .iter()
            .map(|symbol| symbol.value)
            .collect())
    }

    /// Values of `[start, end)`; logs and returns an empty string when out of range.
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.try_slice(start, end).unwrap_or_else(|error| {
            error.log();
            String::new()
        })
    }

    /// Wrap symbols `[start, start + count)` in elements carrying `classes`.
    pub fn try_tag<S: AsRef<str>>(
        &mut self,
        start: usize,
        count: usize,
        classes: &[S],
    ) -> Result<(), HighlightError> {
        if count == 0 {
            return Err(HighlightError::EmptyRange { start });
        }
        let len = self.len();
        let end = match start.checked_add(count) {
            Some(end) if end <= len => end,
            _ => {
                return Err(HighlightError::Range {
                    start,
                    end: start.saturating_add(count),
                    len,
                })
            }
        };

        let class_value = classes
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" ");

        let mut run_start = start;
        while run_start < end {
            let first = self.symbols.as_slice()[run_start];
            if !first.colorable {
                run_start += 1;
                continue;
            }
            let mut run_end = run_start + 1;
            while run_end < end {
                let symbol = &self.symbols.as_slice()[run_end];
                if !symbol.colorable || symbol.node != first.node {
                    break;
                }
                run_end += 1;
            }
            self.wrap_run(run_start, run_end, &class_value)?;
            run_start = run_end;
        }

        Ok(())
    }

    /// Like [`HighlightView::try_tag`]; failures are logged and leave the tree untouched.
    pub fn tag<S: AsRef<str>>(&mut self, start: usize, count: usize, classes: &[S]) {
        if let Err(error) = self.try_tag(start, count, classes) {
            error.log();
        }
    }

    /// Move symbols `[run_start, run_end)`, all owned by one text node, into a wrapper.
    fn wrap_run(
        &mut self,
        run_start: usize,
        run_end: usize,
        class_value: &str,
    ) -> Result<(), DomError> {
        let Symbol {
            node: owner,
            offset: from,
            ..
        } = self.symbols.as_slice()[run_start];
        let to = from + (run_end - run_start);

        let text = self.fragment.text(owner)?;
        let (Some(from_byte), Some(to_byte)) = (char_to_byte(text, from), char_to_byte(text, to))
        else {
            return Err(DomError::OffsetOutOfBounds {
                node: owner,
                offset: to,
                len: text.chars().count(),
            });
        };
        let before = text[..from_byte].to_string();
        let inner = text[from_byte..to_byte].to_string();
        let after = text[to_byte..].to_string();

        let wrapper = self.fragment.create(
            Element::new(self.options.wrapper_tag.as_str())
                .with_attribute(self.options.class_attribute.as_str(), class_value),
        );
        let inner_node = self.fragment.append(wrapper, Node::Text(inner))?;
        self.fragment.insert_id_after(owner, wrapper)?;
        let after_node = if after.is_empty() {
            None
        } else {
            Some(self.fragment.insert_after(wrapper, Node::Text(after))?)
        };
        if before.is_empty() {
            self.fragment.detach(owner)?;
        } else {
            self.fragment.set_text(owner, before)?;
        }

        let symbols = self.symbols.as_mut_slice();
        for (offset, symbol) in symbols[run_start..run_end].iter_mut().enumerate() {
            symbol.node = inner_node;
            symbol.offset = offset;
        }
        if let Some(after_node) = after_node {
            relocate_tail(&mut symbols[run_end..], owner, after_node, to);
        }

        Ok(())
    }
}

/// Point the leading symbols still owned by `owner` at `node`, shifting offsets by `shift`.
fn relocate_tail(symbols: &mut [Symbol], owner: NodeId, node: NodeId, shift: usize) {
    for symbol in symbols.iter_mut().take_while(|symbol| symbol.node == owner) {
        symbol.node = node;
        symbol.offset -= shift;
    }
}

impl fmt::Display for HighlightView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in self.symbols.iter() {
            write!(f, "{}", symbol.value)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HighlightView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighlightView")
            .field("len", &self.len())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notex::events::content_events;
    use crate::notex::options::MarkerOptions;
    use crate::notex::testing::code_block;

    fn view_over<'a>(
        fragment: &'a mut Fragment,
        code: NodeId,
        options: &'a HighlightOptions,
    ) -> HighlightView<'a> {
        let events = content_events(fragment, code).unwrap();
        let symbols = SymbolIndex::build(fragment, &events, &MarkerOptions::default()).unwrap();
        HighlightView::new(fragment, symbols, options)
    }

    #[test]
    fn test_read_and_slice() {
        let options = HighlightOptions::default();
        let (mut fragment, code) = code_block("ab<em>cd</em>ef");
        let view = view_over(&mut fragment, code, &options);

        assert_eq!(view.len(), 6);
        assert_eq!(view.read(2), Some('c'));
        assert_eq!(view.read(6), None);
        assert_eq!(view.try_read(6), Err(HighlightError::PropertyNotFound(6)));
        assert_eq!(view.slice(1, 4), "bcd");
        assert_eq!(view.slice(6, 6), "");
        assert_eq!(view.to_string(), "abcdef");
    }

    #[test]
    fn test_slice_out_of_range() {
        let options = HighlightOptions::default();
        let (mut fragment, code) = code_block("abc");
        let view = view_over(&mut fragment, code, &options);

        assert_eq!(
            view.try_slice(1, 4),
            Err(HighlightError::Range {
                start: 1,
                end: 4,
                len: 3
            })
        );
        assert_eq!(view.slice(1, 4), "");
        assert!(view.try_slice(2, 1).is_err());
    }

    #[test]
    fn test_tag_within_one_node() {
        let options = HighlightOptions::default();
        let (mut fragment, code) = code_block("let x");
        let mut view = view_over(&mut fragment, code, &options);

        view.try_tag(0, 3, &["kw"]).unwrap();

        assert_eq!(
            fragment.inner_markup(code).unwrap(),
            r#"<span class="kw">let</span> x"#
        );
    }

    #[test]
    fn test_tag_across_nodes() {
        let options = HighlightOptions::default();
        let (mut fragment, code) = code_block("ab<em>cd</em>ef");
        let mut view = view_over(&mut fragment, code, &options);

        view.try_tag(1, 3, &["x"]).unwrap();
        assert_eq!(view.slice(0, 6), "abcdef");
        assert_eq!(view.len(), 6);

        assert_eq!(
            fragment.inner_markup(code).unwrap(),
            r#"a<span class="x">b</span><em><span class="x">cd</span></em>ef"#
        );
    }

    #[test]
    fn test_repeated_tagging_resplits_wrappers() {
        let options = HighlightOptions::default();
        let (mut fragment, code) = code_block("abcdef");
        let mut view = view_over(&mut fragment, code, &options);

        view.try_tag(1, 4, &["outer"]).unwrap();
        view.try_tag(2, 2, &["inner"]).unwrap();
        view.try_tag(0, 6, &["all"]).unwrap();

        assert_eq!(view.to_string(), "abcdef");
        assert_eq!(fragment.text_content(code).unwrap(), "abcdef");
        assert_eq!(
            fragment.inner_markup(code).unwrap(),
            concat!(
                r#"<span class="all">a</span>"#,
                r#"<span class="outer"><span class="all">b</span>"#,
                r#"<span class="inner"><span class="all">cd</span></span>"#,
                r#"<span class="all">e</span></span>"#,
                r#"<span class="all">f</span>"#
            )
        );
    }

    #[test]
    fn test_symbols_follow_their_nodes() {
        let options = HighlightOptions::default();
        let (mut fragment, code) = code_block("abcdef");
        let mut view = view_over(&mut fragment, code, &options);

        view.try_tag(2, 2, &["k"]).unwrap();

        for symbol in view.symbols().iter() {
            let text = view.fragment().text(symbol.node).unwrap();
            assert_eq!(text.chars().nth(symbol.offset), Some(symbol.value));
        }
    }

    #[test]
    fn test_empty_range_is_rejected() {
        let options = HighlightOptions::default();
        let (mut fragment, code) = code_block("abc");
        let mut view = view_over(&mut fragment, code, &options);

        assert_eq!(
            view.try_tag(1, 0, &["x"]),
            Err(HighlightError::EmptyRange { start: 1 })
        );
        view.tag(1, 0, &["x"]);
        assert_eq!(fragment.inner_markup(code).unwrap(), "abc");
    }

    #[test]
    fn test_out_of_range_tag_leaves_tree_unchanged() {
        let options = HighlightOptions::default();
        let (mut fragment, code) = code_block("ab<em>cd</em>ef");
        let before = fragment.to_string();
        let mut view = view_over(&mut fragment, code, &options);

        assert_eq!(
            view.try_tag(10, 1, &["x"]),
            Err(HighlightError::Range {
                start: 10,
                end: 11,
                len: 6
            })
        );
        view.tag(4, 3, &["x"]);
        view.tag(usize::MAX, 2, &["x"]);
        assert_eq!(fragment.to_string(), before);
    }

    #[test]
    fn test_no_color_symbols_are_skipped() {
        let options = HighlightOptions::default();
        let (mut fragment, code) = code_block("a<i ignore>b<u no-color>c</u></i>d");
        let mut view = view_over(&mut fragment, code, &options);

        view.try_tag(0, 4, &["x"]).unwrap();

        assert_eq!(
            fragment.inner_markup(code).unwrap(),
            concat!(
                r#"<span class="x">a</span>"#,
                r#"<i ignore><span class="x">b</span><u no-color>c</u></i>"#,
                r#"<span class="x">d</span>"#
            )
        );
    }

    #[test]
    fn test_multiple_classes_and_custom_wrapper() {
        let options = HighlightOptions {
            wrapper_tag: "mark".to_string(),
            class_attribute: "data-style".to_string(),
        };
        let (mut fragment, code) = code_block("xy");
        let mut view = view_over(&mut fragment, code, &options);

        view.tag(0, 1, &["kw", "bold"]);

        insta::assert_snapshot!(
            fragment.inner_markup(code).unwrap(),
            @r#"<mark data-style="kw bold">x</mark>y"#
        );
    }
}
