use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde_json::Value;

use crate::{
    error::FormfillResult,
    renderer::{FormRenderer, RendererConfig},
};

/// Renders every form of a patient case from a directory of presets.
///
/// Presets are loaded once at construction, keyed by their declared form
/// name (file stem when the document omits one). A preset that fails to
/// load is logged and excluded rather than failing the batch.
pub struct BatchRenderer {
    renderers: BTreeMap<String, FormRenderer>,
}

impl BatchRenderer {
    pub fn load(presets_dir: impl AsRef<Path>, config: &RendererConfig) -> FormfillResult<Self> {
        let dir = presets_dir.as_ref();
        let entries =
            fs::read_dir(dir).with_context(|| format!("read presets dir '{}'", dir.display()))?;

        let mut renderers = BTreeMap::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("read presets dir '{}'", dir.display()))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match FormRenderer::with_config(&path, config) {
                Ok(renderer) => {
                    let name = form_key(&path, &renderer.preset().form_name);
                    tracing::info!(form = %name, preset = %path.display(), "loaded preset");
                    renderers.insert(name, renderer);
                }
                Err(e) => {
                    tracing::error!(preset = %path.display(), error = %e, "failed to load preset");
                }
            }
        }

        tracing::info!(count = renderers.len(), "loaded presets");
        Ok(Self { renderers })
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    pub fn form_names(&self) -> impl Iterator<Item = &str> {
        self.renderers.keys().map(String::as_str)
    }

    pub fn renderer(&self, form: &str) -> Option<&FormRenderer> {
        self.renderers.get(form)
    }

    /// Renders all loaded presets, or the named subset, against one data
    /// document. One output file per form; a failure rendering one form is
    /// logged and does not stop the rest.
    pub fn render_case(
        &self,
        data: &Value,
        output_dir: &Path,
        forms: Option<&[&str]>,
    ) -> FormfillResult<Vec<PathBuf>> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("create output dir '{}'", output_dir.display()))?;

        let mut rendered = Vec::new();
        for (name, renderer) in &self.renderers {
            if let Some(wanted) = forms
                && !wanted.contains(&name.as_str())
            {
                continue;
            }

            let output = output_dir.join(format!("{name}.png"));
            match renderer.render(data, &output) {
                Ok(_) => rendered.push(output),
                Err(e) => {
                    tracing::error!(form = %name, error = %e, "failed to render form");
                }
            }
        }

        tracing::info!(count = rendered.len(), "rendered case");
        Ok(rendered)
    }
}

fn form_key(path: &Path, form_name: &str) -> String {
    if form_name.is_empty() {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        form_name.to_string()
    }
}
