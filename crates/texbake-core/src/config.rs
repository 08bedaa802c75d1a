use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{PipelineError, Result};

/// How transparent borders are handled when `allow_trim` is on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrimMode {
    /// Remove transparent borders but keep the original frame size in metadata
    /// (the trimmed offset is reported as `spriteSourceSize`).
    #[default]
    Trim,
    /// Remove transparent borders and shrink the reported frame size to the trimmed bounds.
    Crop,
}

impl FromStr for TrimMode {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trim" => Ok(Self::Trim),
            "crop" => Ok(Self::Crop),
            _ => Err(()),
        }
    }
}

/// Encoding of the atlas page images.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextureFormat {
    /// Lossless with alpha.
    #[default]
    Png,
    /// Lossy, alpha is dropped.
    Jpg,
}

impl TextureFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
}

impl FromStr for TextureFormat {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            _ => Err(()),
        }
    }
}

/// Packer family.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PackerType {
    /// Single free-list MaxRects bin, heuristic chosen by [`MaxRectsBinMethod`].
    #[default]
    MaxRectsBin,
    /// Guillotine-split MaxRects variant, behaviour chosen by [`MaxRectsPackerMethod`].
    MaxRectsPacker,
    /// Try every candidate of both families and keep the best (pages, then area).
    OptimalPacker,
}

impl FromStr for PackerType {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "maxrectsbin" => Ok(Self::MaxRectsBin),
            "maxrectspacker" => Ok(Self::MaxRectsPacker),
            "optimalpacker" | "optimal" => Ok(Self::OptimalPacker),
            _ => Err(()),
        }
    }
}

/// MaxRects placement heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MaxRectsBinMethod {
    BestShortSideFit,
    BestLongSideFit,
    BestAreaFit,
    BottomLeftRule,
    ContactPointRule,
}

impl MaxRectsBinMethod {
    pub const ALL: [Self; 5] = [
        Self::BestShortSideFit,
        Self::BestLongSideFit,
        Self::BestAreaFit,
        Self::BottomLeftRule,
        Self::ContactPointRule,
    ];
}

impl FromStr for MaxRectsBinMethod {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bl" | "bottomleftrule" => Ok(Self::BottomLeftRule),
            "cp" | "contactpointrule" => Ok(Self::ContactPointRule),
            _ => Err(()),
        }
    }
}

/// Guillotine packer behaviours.
///
/// - `Smart`: evaluate both split axes per page and keep the tighter one
/// - `Square`: grow the page to a square
/// - `Area`: choose free rects by best area fit (short-side fit otherwise)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MaxRectsPackerMethod {
    Smart,
    Square,
    SmartSquare,
    SmartArea,
    SquareArea,
    SmartSquareArea,
}

impl MaxRectsPackerMethod {
    pub const ALL: [Self; 6] = [
        Self::Smart,
        Self::Square,
        Self::SmartSquare,
        Self::SmartArea,
        Self::SquareArea,
        Self::SmartSquareArea,
    ];

    pub fn smart(&self) -> bool {
        matches!(
            self,
            Self::Smart | Self::SmartSquare | Self::SmartArea | Self::SmartSquareArea
        )
    }

    pub fn square(&self) -> bool {
        matches!(
            self,
            Self::Square | Self::SmartSquare | Self::SquareArea | Self::SmartSquareArea
        )
    }

    pub fn area(&self) -> bool {
        matches!(
            self,
            Self::SmartArea | Self::SquareArea | Self::SmartSquareArea
        )
    }
}

impl FromStr for MaxRectsPackerMethod {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smart" => Ok(Self::Smart),
            "square" => Ok(Self::Square),
            "smartsquare" => Ok(Self::SmartSquare),
            "smartarea" => Ok(Self::SmartArea),
            "squarearea" => Ok(Self::SquareArea),
            "smartsquarearea" => Ok(Self::SmartSquareArea),
            _ => Err(()),
        }
    }
}

/// `packerMethod` as written in configuration files; its family must match `packer`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PackerMethod {
    Bin(MaxRectsBinMethod),
    Packer(MaxRectsPackerMethod),
}

impl FromStr for PackerMethod {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse()
            .map(Self::Bin)
            .or_else(|_| s.parse().map(Self::Packer))
    }
}

/// Resolved packer selection after validating `packer` against `packerMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackerChoice {
    Bin(MaxRectsBinMethod),
    Guillotine(MaxRectsPackerMethod),
    Optimal,
}

/// Named metadata formats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PackerExporterType {
    #[default]
    JsonHash,
    JsonArray,
    Css,
    OldCss,
    Pixi,
    PhaserHash,
    PhaserArray,
    Phaser3,
    #[serde(rename = "XML")]
    Xml,
    Starling,
    Cocos2d,
    Spine,
    Unreal,
    #[serde(rename = "UIKit")]
    UiKit,
    Unity3D,
}

impl PackerExporterType {
    /// Extension of the metadata file this exporter writes.
    pub fn file_ext(&self) -> &'static str {
        match self {
            Self::JsonHash
            | Self::JsonArray
            | Self::Pixi
            | Self::PhaserHash
            | Self::PhaserArray
            | Self::Phaser3 => "json",
            Self::Css | Self::OldCss => "css",
            Self::Xml | Self::Starling => "xml",
            Self::Cocos2d | Self::UiKit => "plist",
            Self::Spine => "atlas",
            Self::Unreal => "paper2dsprites",
            Self::Unity3D => "tpsheet",
        }
    }
}

impl FromStr for PackerExporterType {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonhash" | "json-hash" => Ok(Self::JsonHash),
            "jsonarray" | "json-array" => Ok(Self::JsonArray),
            "css" => Ok(Self::Css),
            "oldcss" => Ok(Self::OldCss),
            "pixi" => Ok(Self::Pixi),
            "phaserhash" => Ok(Self::PhaserHash),
            "phaserarray" => Ok(Self::PhaserArray),
            "phaser3" => Ok(Self::Phaser3),
            "xml" => Ok(Self::Xml),
            "starling" => Ok(Self::Starling),
            "cocos2d" => Ok(Self::Cocos2d),
            "spine" => Ok(Self::Spine),
            "unreal" => Ok(Self::Unreal),
            "uikit" => Ok(Self::UiKit),
            "unity3d" => Ok(Self::Unity3D),
            _ => Err(()),
        }
    }
}

/// User-supplied handlebars exporter: a template file or inline template content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomExporter {
    pub file_ext: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Exporter {
    Named(PackerExporterType),
    Custom(CustomExporter),
}

impl Default for Exporter {
    fn default() -> Self {
        Self::Named(PackerExporterType::default())
    }
}

impl Exporter {
    pub fn file_ext(&self) -> &str {
        match self {
            Self::Named(t) => t.file_ext(),
            Self::Custom(c) => c.file_ext.trim_start_matches('.'),
        }
    }
}

/// Post-process filter applied to composed pages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BitmapFilterType {
    Grayscale,
    Mask,
    #[default]
    None,
}

impl FromStr for BitmapFilterType {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grayscale" => Ok(Self::Grayscale),
            "mask" => Ok(Self::Mask),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Interpolation used when `scale != 1`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleMethod {
    #[default]
    Bilinear,
    NearestNeighbor,
    Hermite,
    Bezier,
}

impl ScaleMethod {
    pub fn filter_type(&self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            Self::Bilinear => FilterType::Triangle,
            Self::NearestNeighbor => FilterType::Nearest,
            Self::Hermite => FilterType::CatmullRom,
            Self::Bezier => FilterType::Gaussian,
        }
    }
}

impl FromStr for ScaleMethod {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bilinear" => Ok(Self::Bilinear),
            "nearest_neighbor" | "nearest" => Ok(Self::NearestNeighbor),
            "hermite" => Ok(Self::Hermite),
            "bezier" => Ok(Self::Bezier),
            _ => Err(()),
        }
    }
}

/// One configuration variant. Field names follow the camelCase keys used in
/// settings files; every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PackingConfiguration {
    /// Base name of the output files (`{texture_name}.png`, `{texture_name}.json`).
    pub texture_name: String,
    /// Maximum page width in pixels.
    pub width: u32,
    /// Maximum page height in pixels.
    pub height: u32,
    /// Pages are exactly `width` x `height`.
    pub fixed_size: bool,
    /// Round page dimensions up to powers of two.
    pub power_of_two: bool,
    /// Pixels between frames.
    pub padding: u32,
    /// Edge pixels repeated around each frame.
    pub extrude: u32,
    pub allow_rotation: bool,
    /// Pack pixel-identical sprites once and alias the duplicates.
    pub detect_identical: bool,
    pub allow_trim: bool,
    pub trim_mode: TrimMode,
    /// Pixels with alpha <= threshold count as transparent for trimming.
    pub alpha_threshold: u8,
    pub remove_file_extension: bool,
    pub prepend_folder_name: bool,
    pub texture_format: TextureFormat,
    pub scale: f32,
    pub scale_method: ScaleMethod,
    pub packer: PackerType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packer_method: Option<PackerMethod>,
    pub exporter: Exporter,
    pub filter: BitmapFilterType,
}

impl Default for PackingConfiguration {
    fn default() -> Self {
        Self {
            texture_name: "pack-result".into(),
            width: 2048,
            height: 2048,
            fixed_size: false,
            power_of_two: false,
            padding: 0,
            extrude: 0,
            allow_rotation: true,
            detect_identical: true,
            allow_trim: true,
            trim_mode: TrimMode::Trim,
            alpha_threshold: 0,
            remove_file_extension: false,
            prepend_folder_name: true,
            texture_format: TextureFormat::Png,
            scale: 1.0,
            scale_method: ScaleMethod::Bilinear,
            packer: PackerType::MaxRectsBin,
            packer_method: None,
            exporter: Exporter::default(),
            filter: BitmapFilterType::None,
        }
    }
}

impl PackingConfiguration {
    /// Validates the configuration.
    ///
    /// Returns an error if:
    /// - Dimensions are zero
    /// - Padding and extrusion leave no usable space
    /// - `scale` is not a positive finite number
    /// - `packer_method` belongs to another packer family
    /// - A custom exporter has neither `template` nor `content`
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let reserved = self
            .padding
            .saturating_add(self.extrude.saturating_mul(2));
        if reserved >= self.width || reserved >= self.height {
            return Err(PipelineError::InvalidConfig(format!(
                "padding ({}) + extrude ({}) * 2 leaves no space in {}x{}",
                self.padding, self.extrude, self.width, self.height
            )));
        }

        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "scale must be > 0, got {}",
                self.scale
            )));
        }

        if self.texture_name.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "textureName must not be empty".into(),
            ));
        }

        self.packer_choice()?;

        if let Exporter::Custom(c) = &self.exporter {
            if c.template.is_none() && c.content.is_none() {
                return Err(PipelineError::InvalidConfig(
                    "custom exporter needs either `template` or `content`".into(),
                ));
            }
            if c.file_ext.trim_start_matches('.').is_empty() {
                return Err(PipelineError::InvalidConfig(
                    "custom exporter needs a non-empty `fileExt`".into(),
                ));
            }
        }

        Ok(())
    }

    /// Resolves `packer` + `packer_method` into a typed selection.
    pub fn packer_choice(&self) -> Result<PackerChoice> {
        match (self.packer, self.packer_method) {
            (PackerType::MaxRectsBin, None) => {
                Ok(PackerChoice::Bin(MaxRectsBinMethod::BestShortSideFit))
            }
            (PackerType::MaxRectsBin, Some(PackerMethod::Bin(m))) => Ok(PackerChoice::Bin(m)),
            (PackerType::MaxRectsPacker, None) => {
                Ok(PackerChoice::Guillotine(MaxRectsPackerMethod::Smart))
            }
            (PackerType::MaxRectsPacker, Some(PackerMethod::Packer(m))) => {
                Ok(PackerChoice::Guillotine(m))
            }
            (PackerType::OptimalPacker, _) => Ok(PackerChoice::Optimal),
            (packer, Some(method)) => Err(PipelineError::InvalidConfig(format!(
                "packerMethod {method:?} does not belong to packer {packer:?}"
            ))),
        }
    }

    /// Create a fluent builder for `PackingConfiguration`.
    pub fn builder() -> PackingConfigurationBuilder {
        PackingConfigurationBuilder::new()
    }
}

/// Builder for `PackingConfiguration` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackingConfigurationBuilder {
    cfg: PackingConfiguration,
}

impl PackingConfigurationBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackingConfiguration::default(),
        }
    }
    pub fn texture_name(mut self, v: impl Into<String>) -> Self {
        self.cfg.texture_name = v.into();
        self
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.width = w;
        self.cfg.height = h;
        self
    }
    pub fn fixed_size(mut self, v: bool) -> Self {
        self.cfg.fixed_size = v;
        self
    }
    pub fn power_of_two(mut self, v: bool) -> Self {
        self.cfg.power_of_two = v;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn extrude(mut self, v: u32) -> Self {
        self.cfg.extrude = v;
        self
    }
    pub fn allow_rotation(mut self, v: bool) -> Self {
        self.cfg.allow_rotation = v;
        self
    }
    pub fn detect_identical(mut self, v: bool) -> Self {
        self.cfg.detect_identical = v;
        self
    }
    pub fn allow_trim(mut self, v: bool) -> Self {
        self.cfg.allow_trim = v;
        self
    }
    pub fn trim_mode(mut self, v: TrimMode) -> Self {
        self.cfg.trim_mode = v;
        self
    }
    pub fn alpha_threshold(mut self, v: u8) -> Self {
        self.cfg.alpha_threshold = v;
        self
    }
    pub fn remove_file_extension(mut self, v: bool) -> Self {
        self.cfg.remove_file_extension = v;
        self
    }
    pub fn prepend_folder_name(mut self, v: bool) -> Self {
        self.cfg.prepend_folder_name = v;
        self
    }
    pub fn texture_format(mut self, v: TextureFormat) -> Self {
        self.cfg.texture_format = v;
        self
    }
    pub fn scale(mut self, v: f32, method: ScaleMethod) -> Self {
        self.cfg.scale = v;
        self.cfg.scale_method = method;
        self
    }
    pub fn max_rects_bin(mut self, method: MaxRectsBinMethod) -> Self {
        self.cfg.packer = PackerType::MaxRectsBin;
        self.cfg.packer_method = Some(PackerMethod::Bin(method));
        self
    }
    pub fn max_rects_packer(mut self, method: MaxRectsPackerMethod) -> Self {
        self.cfg.packer = PackerType::MaxRectsPacker;
        self.cfg.packer_method = Some(PackerMethod::Packer(method));
        self
    }
    pub fn optimal(mut self) -> Self {
        self.cfg.packer = PackerType::OptimalPacker;
        self.cfg.packer_method = None;
        self
    }
    pub fn exporter(mut self, v: PackerExporterType) -> Self {
        self.cfg.exporter = Exporter::Named(v);
        self
    }
    pub fn custom_exporter(mut self, v: CustomExporter) -> Self {
        self.cfg.exporter = Exporter::Custom(v);
        self
    }
    pub fn filter(mut self, v: BitmapFilterType) -> Self {
        self.cfg.filter = v;
        self
    }
    pub fn build(self) -> PackingConfiguration {
        self.cfg
    }
}
