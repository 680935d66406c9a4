//! Main module for notex library functionality

pub mod dom;
pub mod events;
pub mod markup;
pub mod options;
pub mod process;
pub mod reindent;
pub mod registry;
pub mod rules;
pub mod symbols;
pub mod testing;
pub mod view;
