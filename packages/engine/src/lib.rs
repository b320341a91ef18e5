//! # Folio Engine
//!
//! Format-generic conversion between external items and tree nodes.
//!
//! ## Architecture
//!
//! ```text
//! items ──► ParsingEngine<F> ──► nodes ──► RenderingEngine<F> ──► items
//!              │                                 │
//!              └── handlers: latest first,       └── runs of inline nodes
//!                  then base engines,                grouped by modifier
//!                  then the default
//! ```
//!
//! A [`Format`] names the item type and how items are identified. Engines
//! are stored in an [`Engines`] registry by id; an engine may extend another
//! engine of the same format, in which case its own handlers are consulted
//! before the base's. Every parse and render records which items correspond
//! to which nodes in the engine's [`Mapping`].

mod engines;
mod error;
mod format;
mod mapping;
mod parsing;
mod rendering;

pub use engines::{Engines, Registration, SavedMappings};
pub use error::{EngineError, EngineResult};
pub use format::Format;
pub use mapping::Mapping;
pub use parsing::{ItemPredicate, ParseContext, Parser, ParsingEngine};
pub use rendering::{
    ModifierPredicate, ModifierRenderer, NodePredicate, RenderContext, Renderer, RenderingEngine,
};

// Re-exported so handler crates use the same macro version
pub use async_trait::async_trait;
