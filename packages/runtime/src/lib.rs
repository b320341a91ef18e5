//! # Folio Runtime
//!
//! Plugin runtime and command dispatcher for a Folio editing session.
//!
//! ## Architecture
//!
//! ```text
//! EditorConfig ──► resolve_order ──► instantiate plugins
//!                                      │ commands, hooks
//!                                      │ loadables ──► owning loader
//!                                      ▼
//!                                   start hooks ──► Editor
//!
//! exec_command(id, args)
//!   └─ queue (Mutex) ─► snapshot ─► before hooks ─► handler ─► after hooks
//!                          ▲                                     │
//!                          └────────── restore on error ◄───────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use folio_runtime::{Editor, EditorConfig};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let editor = Editor::new(EditorConfig::new()).await?;
//! editor.exec_command("insertText", json!({ "text": "hello" })).await?;
//! let state = editor.state().await;
//! assert_eq!(state.tree.text_content(state.tree.root()), "hello");
//! # Ok(())
//! # }
//! ```

pub mod builtin;
mod command;
mod config;
mod editor;
mod error;
mod extensions;
mod loadables;
mod order;
mod plugin;

pub use builtin::CorePlugin;
pub use command::{Command, CommandContext, CommandHandler, FnHandler, Hook, HookStage, HookTarget};
pub use config::{EditorConfig, PluginSpec};
pub use editor::{Editor, EditorState};
pub use error::{CommandError, CommandResult, RuntimeError, RuntimeResult};
pub use extensions::Extensions;
pub use loadables::{Loadable, Loadables};
pub use order::resolve_order;
pub use plugin::{AsAny, Plugin, PluginConfig, PluginDefinition, PluginType};

pub use async_trait::async_trait;
