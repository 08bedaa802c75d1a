use serde_json::{Map, Value, json};

use super::PageExport;
use crate::model::Frame;

fn frame_fields(fr: &Frame) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert(
        "frame".into(),
        json!({"x": fr.frame.x, "y": fr.frame.y, "w": fr.frame.w, "h": fr.frame.h}),
    );
    m.insert("rotated".into(), json!(fr.rotated));
    m.insert("trimmed".into(), json!(fr.trimmed));
    m.insert(
        "spriteSourceSize".into(),
        json!({"x": fr.source.x, "y": fr.source.y, "w": fr.source.w, "h": fr.source.h}),
    );
    m.insert(
        "sourceSize".into(),
        json!({"w": fr.source_size.0, "h": fr.source_size.1}),
    );
    m
}

fn meta(page: PageExport<'_>) -> Value {
    json!({
        "app": page.meta.app,
        "version": page.meta.version,
        "image": page.image_name,
        "format": page.meta.format,
        "size": {"w": page.page.width, "h": page.page.height},
        "scale": page.meta.scale.to_string(),
    })
}

/// TexturePacker-style JSON hash: `{ frames: { name: {...} }, meta }`.
/// `pivot` adds a centred `pivot` entry per frame (Pixi flavour).
pub fn to_json_hash(page: PageExport<'_>, pivot: bool) -> Value {
    let mut frames = Map::new();
    for fr in &page.page.frames {
        let mut fields = frame_fields(fr);
        if pivot {
            fields.insert("pivot".into(), json!({"x": 0.5, "y": 0.5}));
        }
        frames.insert(fr.key.clone(), Value::Object(fields));
    }
    json!({ "frames": frames, "meta": meta(page) })
}

/// JSON array flavour: `{ frames: [ { filename, ... } ], meta }`.
pub fn to_json_array(page: PageExport<'_>) -> Value {
    let frames: Vec<Value> = page
        .page
        .frames
        .iter()
        .map(|fr| {
            let mut fields = Map::new();
            fields.insert("filename".into(), json!(fr.key));
            fields.extend(frame_fields(fr));
            Value::Object(fields)
        })
        .collect();
    json!({ "frames": frames, "meta": meta(page) })
}

/// Phaser 3 multi-atlas shape: `{ textures: [ { image, format, size, scale, frames } ], meta }`.
pub fn to_phaser3(page: PageExport<'_>) -> Value {
    let frames: Vec<Value> = page
        .page
        .frames
        .iter()
        .map(|fr| {
            let mut fields = Map::new();
            fields.insert("filename".into(), json!(fr.key));
            fields.extend(frame_fields(fr));
            Value::Object(fields)
        })
        .collect();
    json!({
        "textures": [{
            "image": page.image_name,
            "format": page.meta.format,
            "size": {"w": page.page.width, "h": page.page.height},
            "scale": page.meta.scale,
            "frames": frames,
        }],
        "meta": {
            "app": page.meta.app,
            "version": page.meta.version,
        },
    })
}
