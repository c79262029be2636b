#![forbid(unsafe_code)]

pub mod axis;
pub mod batch;
pub mod color;
pub mod error;
pub mod fields;
pub mod fonts;
pub mod model;
pub mod renderer;
pub mod resolve;
pub mod surface;
pub mod text;

pub use batch::BatchRenderer;
pub use error::{FormfillError, FormfillResult};
pub use fonts::{FontConfig, FontFamilyConfig, FontLibrary};
pub use model::{
    Alignment, Axis, Bounds, Dimensions, Field, FieldKind, MarkType, Padding, Preset, Style,
};
pub use renderer::{FieldOutcome, FieldStatus, FormRenderer, RenderReport, RendererConfig};
pub use resolve::resolve;
