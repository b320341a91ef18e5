use crate::item::DomFormat;
use crate::parsers::{BlockParser, ElementParser, FormatParser, LineBreakParser, TextParser};
use crate::renderers::{CharRenderer, ContainerRenderer, FormatRenderer, LineBreakRenderer};
use folio_engine::{EngineResult, Format, ParsingEngine, RenderingEngine};

/// The `dom` parsing engine with the built-in handler set.
pub fn dom_parsing_engine() -> EngineResult<ParsingEngine<DomFormat>> {
    let mut engine = ParsingEngine::new(DomFormat::ID, ElementParser)?;
    engine.register(BlockParser)?;
    engine.register(LineBreakParser)?;
    engine.register(FormatParser)?;
    engine.register(TextParser)?;
    Ok(engine)
}

/// The `dom` rendering engine with the built-in handler set.
pub fn dom_rendering_engine() -> EngineResult<RenderingEngine<DomFormat>> {
    let mut engine =
        RenderingEngine::new(DomFormat::ID, ContainerRenderer)?.with_modifier_default(FormatRenderer)?;
    engine.register(LineBreakRenderer)?;
    engine.register(CharRenderer)?;
    Ok(engine)
}
