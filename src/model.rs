use std::{collections::BTreeSet, fs, path::Path};

use anyhow::Context as _;

use crate::error::{FormfillError, FormfillResult};

/// A saved field schema describing how to populate one form image.
///
/// `fields` order is significant: later fields paint over earlier ones
/// wherever their marks overlap.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub form_name: String,
    #[serde(default)]
    pub form_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_dimensions: Option<Dimensions>,
    pub fields: Vec<Field>,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    #[serde(default = "default_dimension")]
    pub width: u32,
    #[serde(default = "default_dimension")]
    pub height: u32,
}

fn default_dimension() -> u32 {
    1000
}

/// One placeable, typed element of a preset.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Field {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub bounds: Bounds,
    #[serde(default)]
    pub style: Style,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<Axis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<Axis>,
}

impl Field {
    /// Data lookup key: explicit `data_path`, falling back to the field id.
    pub fn lookup_path(&self) -> &str {
        self.data_path.as_deref().unwrap_or(&self.id)
    }
}

/// The seven supported visual encodings. Unrecognized tags deserialize to
/// [`FieldKind::Unknown`] and are skipped with a warning at dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    MultilineText,
    Checkbox,
    LineGraph,
    BarGraph,
    DotSeries,
    BpLadder,
    #[serde(other)]
    Unknown,
}

/// Field rectangle in pixel units, top-left origin, y growing downward.
///
/// `width`/`height` are optional in the document; each renderer applies its
/// own default when absent.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Bounds {
    pub fn width_or(&self, default: f64) -> f64 {
        self.width.unwrap_or(default)
    }

    pub fn height_or(&self, default: f64) -> f64 {
        self.height.unwrap_or(default)
    }
}

/// Bag of rendering hints. Every member has a wire default so presets only
/// state what they override.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Style {
    /// Hex color string; the fallback varies per field kind, so absent means
    /// "renderer's choice".
    pub color: Option<String>,
    pub font_size: f32,
    pub bold: bool,
    pub font_family: String,
    pub alignment: Alignment,
    pub padding: Padding,
    pub mark_type: MarkType,
    pub line_width: f64,
    pub dot_radius: f64,
    pub bar_width: f64,
    pub marker_size: f64,
    pub show_dots: bool,
    pub connect_points: bool,
    pub text_rows: u32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: None,
            font_size: 12.0,
            bold: false,
            font_family: "default".to_string(),
            alignment: Alignment::Left,
            padding: Padding::default(),
            mark_type: MarkType::X,
            line_width: 2.0,
            dot_radius: 3.0,
            bar_width: 5.0,
            marker_size: 4.0,
            show_dots: true,
            connect_points: true,
            text_rows: 3,
        }
    }
}

impl Style {
    pub fn color_or(&self, default: &str) -> crate::color::Rgba8 {
        crate::color::parse_hex(self.color.as_deref().unwrap_or(default))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    #[default]
    X,
    Check,
    Fill,
}

/// Data-space range mapped onto one pixel dimension of the bounds.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
}

impl Default for Axis {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
        }
    }
}

impl Axis {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl Preset {
    /// Loads and validates a preset document from disk.
    pub fn load(path: &Path) -> FormfillResult<Self> {
        let bytes = fs::read(path).with_context(|| format!("read preset '{}'", path.display()))?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse preset '{}'", path.display()))?;
        Self::from_value(value)
    }

    /// Validates and deserializes an already-parsed preset document.
    ///
    /// The `fields` member is checked on the raw value first so a missing
    /// collection reports as a schema error rather than a serde one.
    pub fn from_value(value: serde_json::Value) -> FormfillResult<Self> {
        if value.get("fields").is_none() {
            return Err(FormfillError::schema(
                "preset must contain a 'fields' array",
            ));
        }
        let preset: Preset = serde_json::from_value(value)
            .map_err(|e| FormfillError::schema(format!("invalid preset: {e}")))?;

        let mut seen = BTreeSet::new();
        for field in &preset.fields {
            if !field.id.is_empty() && !seen.insert(field.id.as_str()) {
                tracing::warn!(field = %field.id, "duplicate field id in preset");
            }
        }
        Ok(preset)
    }
}
