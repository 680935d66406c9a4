//! Indentation removal for multi-line code elements
//!
//!     Code pasted into markup usually carries the indentation of the surrounding document.
//!     The reindenter finds the smallest leading space run shared by the block's lines and
//!     strips exactly that much from each of them, without disturbing inline markup.
//!
//!     The block's text events are read as if they were one string. Space runs never span
//!     text nodes: a run belongs to the text node it starts in, and is recorded as a
//!     [`SpaceRemovalTarget`] pointing into that node.
//!
//! Algorithm
//!
//!     1. Candidates: scan characters with a line start flag.
//!        - At line start, spaces extend the pending run.
//!        - A newline at line start emits a one character blank line marker at the newline.
//!        - Any other character emits the pending run (possibly empty) and clears the flag.
//!        - An `Open` event at line start emits the pending run too: the line starts with
//!          markup.
//!        - A newline elsewhere sets the flag and starts a new pending run after it.
//!        - At the end, a pending run still at line start becomes the trailing target.
//!     2. Indentation: the minimum run length over the candidates, skipping blank line
//!        markers and a last candidate whose text is only spaces from its start to the end
//!        of its node. No candidate left means no indentation to remove.
//!     3. Application: every candidate that was not skipped is cut down to the indentation.
//!        A skipped whitespace-only tail is removed in full. A blank line marker removes its
//!        line break only when `collapse_blank_lines` is set.
//!     4. Reconstruction: the element is cloned and its content replayed through
//!        [`Reconstruction`], each text slot receiving its text minus the targets' ranges.
//!        The clone replaces the original element.

pub mod reconstruction;

use crate::notex::dom::{DomError, Fragment, NodeId};
use crate::notex::events::ContentEvent;
use crate::notex::options::ReindentOptions;
pub use reconstruction::{Reconstruction, TextSlot};

/// A run of leading characters inside one text node that may be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceRemovalTarget {
    /// Index of the `Text` event owning the run
    pub event_index: usize,
    /// Character offset of the run inside the text node
    pub start: usize,
    pub len: usize,
}

impl SpaceRemovalTarget {
    pub fn new(event_index: usize, start: usize, len: usize) -> Self {
        SpaceRemovalTarget {
            event_index,
            start,
            len,
        }
    }
}

/// Characters of each event's text node; empty for `Open`/`Close`.
pub fn event_texts(
    fragment: &Fragment,
    events: &[ContentEvent],
) -> Result<Vec<Vec<char>>, DomError> {
    events
        .iter()
        .map(|event| match event {
            ContentEvent::Text(node) => Ok(fragment.text(*node)?.chars().collect()),
            _ => Ok(Vec::new()),
        })
        .collect()
}

/// Pass 1: detect candidate targets in document order.
pub fn space_removal_candidates(
    texts: &[Vec<char>],
    events: &[ContentEvent],
) -> Vec<SpaceRemovalTarget> {
    let mut targets = Vec::new();
    let mut at_line_start = true;
    let mut pending: Option<SpaceRemovalTarget> = None;

    for (index, event) in events.iter().enumerate() {
        match event {
            ContentEvent::Close(_) => continue,
            ContentEvent::Open(_) => {
                if at_line_start {
                    targets.extend(pending.take());
                    at_line_start = false;
                }
            }
            ContentEvent::Text(_) => {
                if at_line_start {
                    pending = Some(SpaceRemovalTarget::new(index, 0, 0));
                }
                for (offset, &c) in texts[index].iter().enumerate() {
                    if at_line_start {
                        match c {
                            '\n' => {
                                targets.push(SpaceRemovalTarget::new(index, offset, 1));
                                pending = Some(SpaceRemovalTarget::new(index, offset + 1, 0));
                            }
                            ' ' => {
                                if let Some(run) = pending.as_mut() {
                                    run.len += 1;
                                }
                            }
                            _ => {
                                at_line_start = false;
                                targets.extend(pending.take());
                            }
                        }
                    } else if c == '\n' {
                        at_line_start = true;
                        pending = Some(SpaceRemovalTarget::new(index, offset + 1, 0));
                    }
                }
            }
        }
    }

    if at_line_start {
        targets.extend(pending);
    }

    targets
}

fn is_blank_line_marker(texts: &[Vec<char>], target: &SpaceRemovalTarget) -> bool {
    texts[target.event_index].get(target.start) == Some(&'\n')
}

fn is_whitespace_tail(texts: &[Vec<char>], target: &SpaceRemovalTarget) -> bool {
    texts[target.event_index]
        .iter()
        .skip(target.start)
        .all(|&c| c == ' ')
}

/// Whether pass 2 leaves the `i`-th target out of the indentation.
fn is_excluded(texts: &[Vec<char>], targets: &[SpaceRemovalTarget], i: usize) -> bool {
    let target = &targets[i];
    is_blank_line_marker(texts, target)
        || (i + 1 == targets.len() && is_whitespace_tail(texts, target))
}

/// Pass 2: the shared indentation, `None` when no target qualifies.
pub fn compute_indentation(texts: &[Vec<char>], targets: &[SpaceRemovalTarget]) -> Option<usize> {
    (0..targets.len())
        .filter(|&i| !is_excluded(texts, targets, i))
        .map(|i| targets[i].len)
        .min()
}

/// Passes 1 to 3: the targets with their final removal lengths.
pub fn space_removal_targets(
    texts: &[Vec<char>],
    events: &[ContentEvent],
    options: &ReindentOptions,
) -> Vec<SpaceRemovalTarget> {
    let mut targets = space_removal_candidates(texts, events);
    let indentation = compute_indentation(texts, &targets);

    for i in 0..targets.len() {
        if is_blank_line_marker(texts, &targets[i]) {
            if !options.collapse_blank_lines {
                targets[i].len = 0;
            }
        } else if !is_excluded(texts, &targets, i) {
            if let Some(indentation) = indentation {
                targets[i].len = indentation;
            }
        }
    }

    tracing::debug!(
        indentation = ?indentation,
        targets = targets.len(),
        "computed space removal targets"
    );
    targets
}

/// Text of one slot with every target of that event elided.
///
/// `cursor` walks `targets` across calls; slots must be asked for in event order.
fn dedent_slot(
    text: &[char],
    event_index: usize,
    targets: &[SpaceRemovalTarget],
    cursor: &mut usize,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while let Some(target) = targets.get(*cursor) {
        if target.event_index > event_index {
            break;
        }
        *cursor += 1;
        if target.event_index < event_index {
            continue;
        }
        let start = target.start.min(text.len());
        if start > i {
            out.extend(&text[i..start]);
        }
        i = i.max(target.start + target.len);
    }

    if i < text.len() {
        out.extend(&text[i..]);
    }
    out
}

/// Rebuild `node` without its shared indentation and return the replacement's id.
///
/// `events` must be the content events of `node`. The replacement takes the node's place in
/// its parent; the original is detached.
pub fn reindent(
    fragment: &mut Fragment,
    node: NodeId,
    events: &[ContentEvent],
    options: &ReindentOptions,
) -> Result<NodeId, DomError> {
    let texts = event_texts(fragment, events)?;
    let targets = space_removal_targets(&texts, events, options);

    let clone = fragment.shallow_clone(node)?;
    let mut reconstruction = Reconstruction::new(clone, events);
    let mut cursor = 0;
    while let Some(slot) = reconstruction.next_slot(fragment)? {
        let index = slot.event_index();
        let text = dedent_slot(&texts[index], index, &targets, &mut cursor);
        slot.fill(fragment, text)?;
    }

    fragment.replace(node, clone)?;
    Ok(clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notex::events::content_events;
    use crate::notex::markup::parse_fragment;
    use crate::notex::testing::code_block;

    fn candidates_of(markup: &str) -> (Vec<Vec<char>>, Vec<SpaceRemovalTarget>) {
        let (fragment, code) = code_block(markup);
        let events = content_events(&fragment, code).unwrap();
        let texts = event_texts(&fragment, &events).unwrap();
        let targets = space_removal_candidates(&texts, &events);
        (texts, targets)
    }

    fn reindented(markup: &str, options: &ReindentOptions) -> String {
        let (mut fragment, code) = code_block(markup);
        let events = content_events(&fragment, code).unwrap();
        let code = reindent(&mut fragment, code, &events, options).unwrap();
        fragment.inner_markup(code).unwrap()
    }

    #[test]
    fn test_candidates_for_simple_block() {
        let (_, targets) = candidates_of("\n    line1\n      line2\n    ");
        assert_eq!(
            targets,
            vec![
                SpaceRemovalTarget::new(0, 0, 1),
                SpaceRemovalTarget::new(0, 1, 4),
                SpaceRemovalTarget::new(0, 11, 6),
                SpaceRemovalTarget::new(0, 23, 4),
            ]
        );
    }

    #[test]
    fn test_indentation_skips_markers_and_tail() {
        let (texts, targets) = candidates_of("\n    line1\n      line2\n    ");
        assert_eq!(compute_indentation(&texts, &targets), Some(4));
    }

    #[test]
    fn test_indentation_unbounded_without_qualifying_lines() {
        let (texts, targets) = candidates_of("\n   ");
        assert_eq!(compute_indentation(&texts, &targets), None);
    }

    #[test]
    fn test_open_at_line_start_flushes_pending_run() {
        let (_, targets) = candidates_of("\n  <b>x</b>\n    y");
        assert_eq!(
            targets,
            vec![
                SpaceRemovalTarget::new(0, 0, 1),
                SpaceRemovalTarget::new(0, 1, 2),
                SpaceRemovalTarget::new(4, 1, 4),
            ]
        );
    }

    #[test]
    fn test_markup_at_column_zero_means_no_indentation() {
        let (texts, targets) = candidates_of("\n<b>x</b>\n    y");
        assert_eq!(compute_indentation(&texts, &targets), Some(0));
    }

    #[test]
    fn test_block_starting_with_markup_has_no_first_line_target() {
        let (_, targets) = candidates_of("<b>x</b>\n    y");
        assert_eq!(targets, vec![SpaceRemovalTarget::new(3, 1, 4)]);
    }

    #[test]
    fn test_dedent_example() {
        assert_eq!(
            reindented("\n    line1\n      line2\n    ", &ReindentOptions::default()),
            "\nline1\n  line2\n"
        );
    }

    #[test]
    fn test_dedent_keeps_nested_markup() {
        assert_eq!(
            reindented(
                "\n    fn <em>main</em>() {\n        <b>body</b>\n    }\n  ",
                &ReindentOptions::default()
            ),
            "\nfn <em>main</em>() {\n    <b>body</b>\n}\n"
        );
    }

    #[test]
    fn test_blank_lines_are_kept_by_default() {
        assert_eq!(
            reindented("\n  a\n\n  b", &ReindentOptions::default()),
            "\na\n\nb"
        );
    }

    #[test]
    fn test_blank_lines_collapse_when_asked() {
        let options = ReindentOptions {
            collapse_blank_lines: true,
        };
        assert_eq!(reindented("\n  a\n\n  b", &options), "a\nb");
    }

    #[test]
    fn test_whitespace_only_line_keeps_its_spaces() {
        assert_eq!(
            reindented("\n  a\n \n  b", &ReindentOptions::default()),
            "\na\n \nb"
        );
    }

    #[test]
    fn test_zero_indentation_is_identity() {
        let source = "a\n  b\nc";
        assert_eq!(reindented(source, &ReindentOptions::default()), source);
    }

    #[test]
    fn test_runs_inside_nested_elements() {
        assert_eq!(
            reindented("<i>\n    x</i>\n      y", &ReindentOptions::default()),
            "<i>\nx</i>\n  y"
        );
    }

    #[test]
    fn test_replacement_takes_the_original_place() {
        let mut fragment = parse_fragment("before<code>\n  x\n  y</code>after").unwrap();
        let root = fragment.root();
        let code = fragment.elements_named("code")[0];
        let events = content_events(&fragment, code).unwrap();

        let replacement = reindent(&mut fragment, code, &events, &ReindentOptions::default())
            .unwrap();

        assert_ne!(replacement, code);
        assert_eq!(fragment.children(root)[1], replacement);
        assert_eq!(fragment.to_string(), "before<code>\nx\ny</code>after");
    }

    #[test]
    fn test_dedent_slot_elides_ranges() {
        let text: Vec<char> = "  ab\n  cd".chars().collect();
        let targets = vec![
            SpaceRemovalTarget::new(0, 0, 2),
            SpaceRemovalTarget::new(0, 5, 1),
        ];
        let mut cursor = 0;
        assert_eq!(dedent_slot(&text, 0, &targets, &mut cursor), "ab\n cd");
        assert_eq!(cursor, 2);
    }
}
