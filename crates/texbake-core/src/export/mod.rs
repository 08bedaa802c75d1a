//! Metadata exporters.
//!
//! JSON-shaped formats are built with `serde_json`; text formats are
//! handlebars templates rendered against a [`TemplateContext`].

use serde::Serialize;

use crate::config::{Exporter, PackerExporterType};
use crate::error::{PipelineError, Result};
use crate::model::{Frame, Meta, Page};

pub mod json;
pub mod template;

pub use json::{to_json_array, to_json_hash, to_phaser3};
pub use template::render_template;

/// Everything an exporter needs to describe one page.
#[derive(Debug, Clone, Copy)]
pub struct PageExport<'a> {
    pub page: &'a Page,
    pub meta: &'a Meta,
    /// File name of the page image (`pack-result.png`, `pack-result-1.png`, ...).
    pub image_name: &'a str,
}

/// Renders the metadata file for one page with the configured exporter.
pub fn export_page(exporter: &Exporter, page: PageExport<'_>) -> Result<String> {
    match exporter {
        Exporter::Named(kind) => match kind {
            PackerExporterType::JsonHash | PackerExporterType::PhaserHash => {
                Ok(pretty(&to_json_hash(page, false)))
            }
            PackerExporterType::Pixi => Ok(pretty(&to_json_hash(page, true))),
            PackerExporterType::JsonArray | PackerExporterType::PhaserArray => {
                Ok(pretty(&to_json_array(page)))
            }
            PackerExporterType::Phaser3 => Ok(pretty(&to_phaser3(page))),
            text => match template::builtin(*text) {
                Some(source) => render_template(source, template::escapes(*text), page),
                None => Err(PipelineError::InvalidConfig(format!(
                    "exporter {text:?} has no template"
                ))),
            },
        },
        Exporter::Custom(custom) => {
            let source = match (&custom.content, &custom.template) {
                (Some(content), _) => content.clone(),
                (None, Some(path)) => std::fs::read_to_string(path)
                    .map_err(|e| PipelineError::io(path, e))?,
                (None, None) => {
                    return Err(PipelineError::InvalidConfig(
                        "custom exporter needs either `template` or `content`".into(),
                    ));
                }
            };
            render_template(&source, false, page)
        }
    }
}

fn pretty(value: &serde_json::Value) -> String {
    // Serializing a `Value` cannot fail.
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Data handed to handlebars templates (custom exporters included).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateContext {
    pub rects: Vec<TemplateRect>,
    pub config: TemplateConfig,
    pub app_info: TemplateAppInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRect {
    pub name: String,
    /// `name` reduced to `[A-Za-z0-9_-]`, usable as a CSS class.
    pub css_name: String,
    pub frame: TemplateFrame,
    pub rotated: bool,
    pub trimmed: bool,
    pub sprite_source_size: TemplateSourceRect,
    pub source_size: TemplateSize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFrame {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Half sizes, for pivot-centred formats.
    pub hw: f32,
    pub hh: f32,
    /// `y` measured from the bottom edge of the page.
    pub flipped_y: u32,
}

#[derive(Debug, Serialize)]
pub struct TemplateSourceRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Serialize)]
pub struct TemplateSize {
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    pub image_name: String,
    pub image_width: u32,
    pub image_height: u32,
    pub format: String,
    pub scale: f32,
    pub trim_mode: String,
}

#[derive(Debug, Serialize)]
pub struct TemplateAppInfo {
    pub name: String,
    pub version: String,
}

impl TemplateContext {
    pub fn new(page: PageExport<'_>) -> Self {
        let rects = page
            .page
            .frames
            .iter()
            .map(|fr| TemplateRect::new(fr, page.page.height))
            .collect();
        Self {
            rects,
            config: TemplateConfig {
                image_name: page.image_name.to_string(),
                image_width: page.page.width,
                image_height: page.page.height,
                format: page.meta.format.clone(),
                scale: page.meta.scale,
                trim_mode: page.meta.trim_mode.clone(),
            },
            app_info: TemplateAppInfo {
                name: page.meta.app.clone(),
                version: page.meta.version.clone(),
            },
        }
    }
}

impl TemplateRect {
    fn new(fr: &Frame, page_height: u32) -> Self {
        Self {
            name: fr.key.clone(),
            css_name: css_class(&fr.key),
            frame: TemplateFrame {
                x: fr.frame.x,
                y: fr.frame.y,
                w: fr.frame.w,
                h: fr.frame.h,
                hw: fr.frame.w as f32 / 2.0,
                hh: fr.frame.h as f32 / 2.0,
                flipped_y: page_height.saturating_sub(fr.frame.y + fr.frame.h),
            },
            rotated: fr.rotated,
            trimmed: fr.trimmed,
            sprite_source_size: TemplateSourceRect {
                x: fr.source.x,
                y: fr.source.y,
                w: fr.source.w,
                h: fr.source.h,
            },
            source_size: TemplateSize {
                w: fr.source_size.0,
                h: fr.source_size.1,
            },
        }
    }
}

fn css_class(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_class_replaces_separators() {
        assert_eq!(css_class("ui/button.png"), "ui-button-png");
        assert_eq!(css_class("hero_idle-01"), "hero_idle-01");
    }
}
