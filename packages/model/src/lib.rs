//! # Folio Model
//!
//! The format-agnostic document tree every other Folio package works on.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Tree: arena of nodes, ownership + wiring    │
//! │  - NodeKind tag + NodeTraits capabilities   │
//! │  - Modifiers stack per node                 │
//! └─────────────────────────────────────────────┘
//!            ↓                      ↓
//! ┌──────────────────────┐ ┌──────────────────────┐
//! │ Walker: predicate    │ │ Range: anchor/focus  │
//! │ traversal            │ │ positions + direction│
//! └──────────────────────┘ └──────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use folio_model::{predicate, Modifier, NodeKind, Tree};
//!
//! let mut tree = Tree::new();
//! let p = tree.create(NodeKind::block("p"));
//! let a = tree.create(NodeKind::char('a'));
//! tree.append(tree.root(), &[p]).unwrap();
//! tree.append(p, &[a]).unwrap();
//! tree.modifiers_mut(a).unwrap().append(Modifier::format("B"));
//!
//! assert_eq!(tree.walk().next(p, predicate::is_char), Some(a));
//! ```

mod error;
mod modifier;
mod node;
pub mod predicate;
mod range;
mod traversal;
mod tree;

pub use error::{RangeError, RangeResult, TreeError, TreeResult};
pub use modifier::{Attributes, Modifier, Modifiers};
pub use node::{CustomKind, NodeId, NodeKind, NodePayload, NodeTraits};
pub use range::{Direction, Gap, Placement, Position, Range, Shape};
pub use traversal::{Traversal, Walker};
pub use tree::{NodeData, Tree};
