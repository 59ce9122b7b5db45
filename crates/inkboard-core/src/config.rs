//! Editor configuration.

use crate::error::ConfigError;
use crate::shapes::Color;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Defaults for newly placed circles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CircleDefaults {
    pub center: Point,
    pub radius: f64,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
}

impl Default for CircleDefaults {
    fn default() -> Self {
        Self {
            center: Point::new(100.0, 100.0),
            radius: 70.0,
            fill: Color::new("red"),
            stroke: Color::black(),
            stroke_width: 4.0,
        }
    }
}

/// Defaults for newly placed rectangles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RectangleDefaults {
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
}

impl Default for RectangleDefaults {
    fn default() -> Self {
        Self {
            position: Point::new(20.0, 50.0),
            width: 100.0,
            height: 50.0,
            fill: Color::new("green"),
            stroke: Color::black(),
            stroke_width: 4.0,
        }
    }
}

/// Defaults for newly placed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextDefaults {
    pub position: Point,
    pub content: String,
    pub font_size: f64,
    pub width: f64,
    pub fill: Color,
}

impl Default for TextDefaults {
    fn default() -> Self {
        Self {
            position: Point::new(50.0, 80.0),
            content: "Some text here".to_string(),
            font_size: 20.0,
            width: 200.0,
            fill: Color::black(),
        }
    }
}

/// Defaults for brush and eraser strokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrokeDefaults {
    pub color: Color,
    pub width: f64,
}

impl Default for StrokeDefaults {
    fn default() -> Self {
        Self {
            color: Color::new("#df4b26"),
            width: 5.0,
        }
    }
}

/// Construction defaults for every node kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeDefaults {
    pub circle: CircleDefaults,
    pub rectangle: RectangleDefaults,
    pub text: TextDefaults,
    pub stroke: StrokeDefaults,
    /// Where imported images are placed.
    pub image_position: Point,
}

impl Default for ShapeDefaults {
    fn default() -> Self {
        Self {
            circle: CircleDefaults::default(),
            rectangle: RectangleDefaults::default(),
            text: TextDefaults::default(),
            stroke: StrokeDefaults::default(),
            image_position: Point::new(120.0, 50.0),
        }
    }
}

/// Configuration for an editor instance.
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Id of the host element the stage is bound to.
    pub container_id: String,
    pub stage_width: u32,
    pub stage_height: u32,
    /// Page-space position of the stage container's top-left corner.
    pub container_origin: Point,
    /// Hit test slack in stage units.
    pub hit_tolerance: f64,
    /// Maximum time between clicks of a double click, in milliseconds.
    pub double_click_ms: u64,
    /// Maximum pointer travel between clicks of a double click.
    pub double_click_distance: f64,
    pub defaults: ShapeDefaults,
    /// Colours offered by the host toolbar.
    pub palette: Vec<Color>,
    /// Font sizes offered by the host toolbar.
    pub font_sizes: Vec<f64>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            container_id: "container".to_string(),
            stage_width: 1024,
            stage_height: 800,
            container_origin: Point::ZERO,
            hit_tolerance: 2.0,
            double_click_ms: 500,
            double_click_distance: 5.0,
            defaults: ShapeDefaults::default(),
            palette: ["red", "green", "blue", "yellow"]
                .into_iter()
                .map(Color::new)
                .collect(),
            font_sizes: vec![10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 24.0],
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
