//! # notex
//!
//! Normalizes and annotates code fragments embedded in markup trees.
//!
//! Pipeline
//!
//!     Every code element goes through the same steps:
//!
//!     events (linearize) -> reindent (multi-line only) -> events -> symbols -> view -> engine
//!
//!     The tree is flattened into a well bracketed stream of content events, which is what
//!     every later stage works on. The reindenter treats that stream as one flat string to
//!     find the shared indentation and rebuilds the tree without it. The symbol index then
//!     gives each character a stable logical position, so highlight engines can tag
//!     arbitrary ranges while the physical text nodes underneath are split and wrapped.
//!
//! File Layout
//!
//!     src/notex
//!       ├── dom.rs          Fragment tree primitives (ego_tree backed)
//!       ├── markup.rs       Markup reader (logos) and writer
//!       ├── events.rs       Tree linearizer
//!       ├── reindent.rs     Indentation detection, removal and reconstruction
//!       ├── symbols.rs      Character addressable symbol index
//!       ├── view.rs         Highlight view over the symbol index
//!       ├── rules.rs        Declarative rule engine adapter
//!       ├── registry.rs     Language -> engine registry
//!       ├── options.rs      Processing options
//!       └── process.rs      Per code element processing
//!
//! For test helpers, see the [testing module](notex::testing).

pub mod notex;

pub use notex::dom::{DomError, Element, Fragment, Node, NodeId};
pub use notex::events::{content_events, ContentEvent};
pub use notex::markup::{parse_fragment, MarkupError};
pub use notex::options::{
    HighlightOptions, MarkerOptions, PreformatOptions, ProcessOptions, ReindentOptions,
};
pub use notex::process::{highlight_code, process_code_block};
pub use notex::registry::{Engine, EngineRegistry, RegistryError};
pub use notex::rules::{highlight_with_rules, HighlightRule};
pub use notex::symbols::{Symbol, SymbolIndex};
pub use notex::view::{HighlightError, HighlightView};
