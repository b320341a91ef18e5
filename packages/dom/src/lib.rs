//! # Folio DOM
//!
//! Two concrete formats for the Folio engines:
//!
//! - `dom`: an element/text item tree ([`DomItem`]) with an HTML reader and
//!   writer, parsers and renderers for text, line breaks, blocks and inline
//!   formats, and the [`Surface`] that maps flat selections to ranges.
//! - `text`: plain strings ([`TextChunk`]).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use folio_dom::{dom_parsing_engine, dom_rendering_engine, DomRenderOptions, Surface};
//! use folio_engine::Engines;
//! use folio_model::Tree;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engines = Engines::new();
//! engines.add_parsing_engine(dom_parsing_engine()?)?;
//! engines.add_rendering_engine(dom_rendering_engine()?)?;
//!
//! let mut tree = Tree::new();
//! Surface::from_html("<b>ab</b>c")?.load(&mut engines, &mut tree).await?;
//! let html = Surface::render(&mut engines, &tree).await?.to_html(&DomRenderOptions::default());
//! assert_eq!(html, "<b>ab</b>c");
//! # Ok(())
//! # }
//! ```

mod engines;
mod error;
pub mod html;
mod item;
pub mod parsers;
mod plugin;
pub mod renderers;
mod surface;
mod text;
mod tokenizer;

pub use engines::{dom_parsing_engine, dom_rendering_engine};
pub use error::{DomError, DomResult};
pub use html::{read_html, write_html, DomRenderOptions};
pub use item::{DomElement, DomFormat, DomId, DomItem, DomText};
pub use plugin::{DomConfig, DomPlugin};
pub use surface::{DomPoint, DomSelection, Surface};
pub use text::{
    render_plain_text, text_parsing_engine, text_rendering_engine, PlainTextParser, PlainTextRenderer, TextChunk,
    TextFormat,
};
pub use tokenizer::{tokenize, Token};
