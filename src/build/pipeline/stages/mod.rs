//! Default pipeline stages.
//!
//! A document is read and parsed by [`load`], then moved forward by:
//!
//! 1. **ResolveStage** - Pick the page template
//! 2. **RenderStage** - Render markdown and the template
//! 3. **EmitStage** - Hand the page to the output sink

mod emit;
mod load;
mod render;
mod resolve;

pub use emit::EmitStage;
pub use load::load;
pub use render::RenderStage;
pub use resolve::ResolveStage;
