use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use image::RgbaImage;
use serde_json::Value;

use crate::{
    error::{FormfillError, FormfillResult},
    fields,
    fonts::{FontConfig, FontLibrary},
    model::{Field, FieldKind, Preset},
    resolve,
    surface::{Surface, flatten_to_rgb},
};

/// Configuration injected into renderer construction. Resolved once; no
/// hidden global state.
#[derive(Clone, Debug, Default)]
pub struct RendererConfig {
    /// Extra directory searched when a preset's form image is not found
    /// next to the preset itself.
    pub form_images_dir: Option<PathBuf>,
    pub fonts: FontConfig,
}

/// Per-field result of one render pass. Errors are captured here instead of
/// aborting the pass; the output image always reflects every field that
/// rendered successfully.
#[derive(Debug)]
pub struct FieldOutcome {
    pub field_id: String,
    pub status: FieldStatus,
}

#[derive(Debug)]
pub enum FieldStatus {
    Rendered,
    SkippedNoData,
    SkippedUnknownKind,
    Failed(FormfillError),
}

#[derive(Debug, Default)]
pub struct RenderReport {
    pub outcomes: Vec<FieldOutcome>,
}

impl RenderReport {
    pub fn rendered(&self) -> usize {
        self.count(|s| matches!(s, FieldStatus::Rendered))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FieldStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| {
            matches!(
                s,
                FieldStatus::SkippedNoData | FieldStatus::SkippedUnknownKind
            )
        })
    }

    fn count(&self, pred: impl Fn(&FieldStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Renders populated forms from one preset.
///
/// Construction loads and validates the preset, resolves the form image
/// reference, and loads fonts. Each render call is a pure function of
/// (preset, data); nothing is mutated across calls, so a renderer is safe
/// to share behind `&self` across threads.
#[derive(Debug)]
pub struct FormRenderer {
    preset: Preset,
    form_image_path: PathBuf,
    fonts: FontLibrary,
}

impl FormRenderer {
    pub fn open(preset_path: impl AsRef<Path>) -> FormfillResult<Self> {
        Self::with_config(preset_path, &RendererConfig::default())
    }

    pub fn with_config(
        preset_path: impl AsRef<Path>,
        config: &RendererConfig,
    ) -> FormfillResult<Self> {
        let preset_path = preset_path.as_ref();
        let preset = Preset::load(preset_path)?;
        let form_image_path = resolve_form_image(
            preset_path,
            &preset.form_image,
            config.form_images_dir.as_deref(),
        )?;
        let fonts = FontLibrary::load(&config.fonts);

        tracing::info!(
            form = %preset.form_name,
            image = %form_image_path.display(),
            fields = preset.fields.len(),
            "initialized form renderer"
        );
        Ok(Self {
            preset,
            form_image_path,
            fonts,
        })
    }

    pub fn preset(&self) -> &Preset {
        &self.preset
    }

    pub fn form_image_path(&self) -> &Path {
        &self.form_image_path
    }

    /// Full render: base form image with the field overlay composited on.
    pub fn render(&self, data: &Value, output: &Path) -> FormfillResult<RenderReport> {
        self.render_with_prefix(data, output, "")
    }

    /// Full render with a dotted prefix applied to every field's data path
    /// (e.g. `"patient"` when the case document nests form data).
    pub fn render_with_prefix(
        &self,
        data: &Value,
        output: &Path,
        prefix: &str,
    ) -> FormfillResult<RenderReport> {
        let (image, report) = self.render_to_image(data, prefix)?;
        write_image(&image, output)?;
        tracing::info!(output = %output.display(), "saved rendered form");
        Ok(report)
    }

    /// Full render into memory; the compositing step without encoding.
    pub fn render_to_image(
        &self,
        data: &Value,
        prefix: &str,
    ) -> FormfillResult<(RgbaImage, RenderReport)> {
        let mut base = image::open(&self.form_image_path)
            .with_context(|| {
                format!("decode form image '{}'", self.form_image_path.display())
            })?
            .to_rgba8();

        let mut surface = Surface::new(base.width(), base.height());
        let report = self.render_fields(data, &mut surface, prefix);
        surface.composite_onto(&mut base);
        Ok((base, report))
    }

    /// Overlay-only render: the transparent mark layer alone, for downstream
    /// composition by another tool.
    pub fn render_overlay_only(&self, data: &Value, output: &Path) -> FormfillResult<RenderReport> {
        let (overlay, report) = self.overlay_image(data)?;
        write_image(&overlay, output)?;
        tracing::info!(output = %output.display(), "saved overlay");
        Ok(report)
    }

    /// Overlay-only render into memory. Sized from the preset's
    /// `image_dimensions` when present, otherwise from the base image header
    /// (pixel data is never decoded in this mode).
    pub fn overlay_image(&self, data: &Value) -> FormfillResult<(RgbaImage, RenderReport)> {
        let (width, height) = match self.preset.image_dimensions {
            Some(dims) => (dims.width, dims.height),
            None => image::image_dimensions(&self.form_image_path).with_context(|| {
                format!("read form image size '{}'", self.form_image_path.display())
            })?,
        };

        let mut surface = Surface::new(width, height);
        let report = self.render_fields(data, &mut surface, "");
        Ok((surface.into_image(), report))
    }

    /// Dispatches every field in preset order; that order is the z-stack.
    fn render_fields(&self, data: &Value, surface: &mut Surface, prefix: &str) -> RenderReport {
        let mut outcomes = Vec::with_capacity(self.preset.fields.len());
        for field in &self.preset.fields {
            let status = self.render_one(field, data, surface, prefix);
            outcomes.push(FieldOutcome {
                field_id: field.id.clone(),
                status,
            });
        }

        let report = RenderReport { outcomes };
        tracing::debug!(
            rendered = report.rendered(),
            skipped = report.skipped(),
            failed = report.failed(),
            "field pass complete"
        );
        report
    }

    fn render_one(
        &self,
        field: &Field,
        data: &Value,
        surface: &mut Surface,
        prefix: &str,
    ) -> FieldStatus {
        let Some(value) = resolve::field_value(data, &field.id, field.lookup_path(), prefix)
        else {
            if field.mandatory {
                tracing::warn!(field = %field.id, "missing data for mandatory field");
            }
            return FieldStatus::SkippedNoData;
        };

        if field.kind == FieldKind::Unknown {
            tracing::warn!(field = %field.id, "unknown field type, skipped");
            return FieldStatus::SkippedUnknownKind;
        }

        match fields::render_field(field, value, surface, &self.fonts) {
            Ok(()) => FieldStatus::Rendered,
            Err(e) => {
                tracing::error!(field = %field.id, error = %e, "field render failed");
                FieldStatus::Failed(e)
            }
        }
    }
}

/// Resolution order: next to the preset, then the configured form-image
/// directory, then the reference taken verbatim.
fn resolve_form_image(
    preset_path: &Path,
    form_image: &str,
    form_images_dir: Option<&Path>,
) -> FormfillResult<PathBuf> {
    if form_image.is_empty() {
        return Err(FormfillError::asset_not_found(
            "preset does not reference a form image",
        ));
    }

    if let Some(parent) = preset_path.parent() {
        let candidate = parent.join(form_image);
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    if let Some(dir) = form_images_dir {
        let candidate = dir.join(form_image);
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    let candidate = PathBuf::from(form_image);
    if candidate.exists() {
        return Ok(candidate);
    }

    Err(FormfillError::asset_not_found(format!(
        "form image '{form_image}' not found"
    )))
}

/// Encodes to the format implied by the output extension. JPEG flattens to
/// RGB first since the format carries no alpha channel.
fn write_image(img: &RgbaImage, path: &Path) -> FormfillResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => flatten_to_rgb(img)
            .save(path)
            .with_context(|| format!("write jpeg '{}'", path.display()))?,
        _ => img
            .save(path)
            .with_context(|| format!("write image '{}'", path.display()))?,
    }
    Ok(())
}
