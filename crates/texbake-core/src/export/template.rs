use handlebars::Handlebars;

use super::{PageExport, TemplateContext};
use crate::config::PackerExporterType;
use crate::error::Result;

/// Built-in template source for a text exporter; `None` for the JSON-shaped ones.
pub fn builtin(kind: PackerExporterType) -> Option<&'static str> {
    Some(match kind {
        PackerExporterType::Css => include_str!("templates/css.hbs"),
        PackerExporterType::OldCss => include_str!("templates/old_css.hbs"),
        PackerExporterType::Xml => include_str!("templates/xml.hbs"),
        PackerExporterType::Starling => include_str!("templates/starling.hbs"),
        PackerExporterType::Cocos2d => include_str!("templates/cocos2d.hbs"),
        PackerExporterType::Spine => include_str!("templates/spine.hbs"),
        PackerExporterType::Unreal => include_str!("templates/unreal.hbs"),
        PackerExporterType::UiKit => include_str!("templates/uikit.hbs"),
        PackerExporterType::Unity3D => include_str!("templates/unity3d.hbs"),
        PackerExporterType::JsonHash
        | PackerExporterType::JsonArray
        | PackerExporterType::Pixi
        | PackerExporterType::PhaserHash
        | PackerExporterType::PhaserArray
        | PackerExporterType::Phaser3 => return None,
    })
}

/// Whether values are XML-escaped for this exporter.
pub fn escapes(kind: PackerExporterType) -> bool {
    matches!(
        kind,
        PackerExporterType::Xml
            | PackerExporterType::Starling
            | PackerExporterType::Cocos2d
            | PackerExporterType::UiKit
    )
}

/// Renders `source` against the page's [`TemplateContext`] in strict mode, so
/// a reference to an unknown field is an error rather than an empty string.
pub fn render_template(source: &str, escape: bool, page: PageExport<'_>) -> Result<String> {
    let mut reg = Handlebars::new();
    reg.set_strict_mode(true);
    if !escape {
        reg.register_escape_fn(handlebars::no_escape);
    }
    reg.register_template_string("tpl", source)?;
    let ctx = TemplateContext::new(page);
    Ok(reg.render("tpl", &ctx)?)
}
