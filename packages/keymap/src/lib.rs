//! # Folio Keymap
//!
//! Maps physical key presses to command invocations.
//!
//! Bindings live on two layers. Plugins contribute default bindings through
//! the `shortcuts` loadable category; the user layer comes from
//! [`KeymapConfig`]. Matching scans the user layer first and only falls
//! through to the defaults when nothing there matched, so a user unbinding
//! masks a built-in shortcut.
//!
//! ```rust,no_run
//! use folio_keymap::{dispatch_key, KeyEvent, KeyModifiers, KeymapPlugin};
//! use folio_runtime::{Editor, EditorConfig, PluginSpec};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let editor = Editor::new(EditorConfig::new().with(PluginSpec::of::<KeymapPlugin>())).await?;
//! let bold = KeyEvent::new("b", "KeyB").with_modifiers(KeyModifiers::CTRL);
//! dispatch_key(&editor, &bold).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod keymap;
mod plugin;
mod shortcut;

pub use error::{KeymapError, KeymapResult};
pub use keymap::{Binding, Invocation, Keymap, Layer, ShortcutSpec};
pub use plugin::{dispatch_key, KeymapConfig, KeymapPlugin, SHORTCUTS};
pub use shortcut::{KeyEvent, KeyModifiers, Shortcut, Trigger};
