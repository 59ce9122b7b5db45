//! Text node.

use super::{Color, NodeId, NodeKind, NodeTransform, ShapeTrait};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Stable per-editor identifier of a text node.
///
/// Unlike `NodeId` this survives serialization, so overlays can be keyed by it.
/// `TextId(0)` is never minted and marks a node that still needs an id.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TextId(pub u64);

impl TextId {
    pub const UNASSIGNED: TextId = TextId(0);
    /// Largest id the generator hands out. Loaded ids above it are re-minted.
    pub const MAX: TextId = TextId((1 << 53) - 1);

    /// Whether this id can be kept as is when a document is loaded.
    pub fn is_valid(self) -> bool {
        self != Self::UNASSIGNED && self <= Self::MAX
    }
}

impl fmt::Display for TextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A style keyword the parser does not recognise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct StyleParseError {
    pub kind: &'static str,
    pub value: String,
}

/// Font style keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "bold")]
    Bold,
    #[serde(rename = "italic")]
    Italic,
    #[serde(rename = "italic bold")]
    BoldItalic,
}

impl FontStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Bold => "bold",
            FontStyle::Italic => "italic",
            FontStyle::BoldItalic => "italic bold",
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }
}

impl FromStr for FontStyle {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = s.split_whitespace().collect();
        match words.as_slice() {
            [] | ["normal"] => Ok(FontStyle::Normal),
            ["bold"] => Ok(FontStyle::Bold),
            ["italic"] => Ok(FontStyle::Italic),
            ["italic", "bold"] | ["bold", "italic"] => Ok(FontStyle::BoldItalic),
            _ => Err(StyleParseError {
                kind: "font style",
                value: s.to_string(),
            }),
        }
    }
}

/// Text decoration keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextDecoration {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "underline")]
    Underline,
    #[serde(rename = "line-through")]
    LineThrough,
    #[serde(rename = "underline line-through")]
    Both,
}

impl TextDecoration {
    pub fn as_str(self) -> &'static str {
        match self {
            TextDecoration::None => "",
            TextDecoration::Underline => "underline",
            TextDecoration::LineThrough => "line-through",
            TextDecoration::Both => "underline line-through",
        }
    }

    pub fn has_underline(self) -> bool {
        matches!(self, TextDecoration::Underline | TextDecoration::Both)
    }

    pub fn has_line_through(self) -> bool {
        matches!(self, TextDecoration::LineThrough | TextDecoration::Both)
    }

    fn is_none(&self) -> bool {
        *self == TextDecoration::None
    }
}

impl FromStr for TextDecoration {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut underline = false;
        let mut line_through = false;
        for word in s.split_whitespace() {
            match word {
                "underline" => underline = true,
                "line-through" => line_through = true,
                "none" => {}
                _ => {
                    return Err(StyleParseError {
                        kind: "text decoration",
                        value: s.to_string(),
                    });
                }
            }
        }
        Ok(match (underline, line_through) {
            (false, false) => TextDecoration::None,
            (true, false) => TextDecoration::Underline,
            (false, true) => TextDecoration::LineThrough,
            (true, true) => TextDecoration::Both,
        })
    }
}

fn default_font_size() -> f64 {
    Text::DEFAULT_FONT_SIZE
}

fn default_fill() -> Option<Color> {
    Some(Color::black())
}

/// An editable text node; the transform position is its top-left corner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    #[serde(skip, default = "Uuid::new_v4")]
    pub(crate) id: NodeId,
    #[serde(rename = "id", default)]
    pub text_id: TextId,
    #[serde(flatten)]
    pub transform: NodeTransform,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default, skip_serializing_if = "TextDecoration::is_none")]
    pub text_decoration: TextDecoration,
    #[serde(default = "default_fill", skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    /// Wrapping width; `None` sizes the box to its content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default)]
    pub draggable: bool,
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;
    /// Average advance of a glyph relative to the font size.
    const CHAR_WIDTH_FACTOR: f64 = 0.55;
    const LINE_HEIGHT: f64 = 1.0;

    /// Create a new text node.
    pub fn new(text_id: TextId, position: Point, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text_id,
            transform: NodeTransform::at(position),
            text: text.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_style: FontStyle::default(),
            text_decoration: TextDecoration::default(),
            fill: default_fill(),
            width: None,
            draggable: false,
        }
    }

    /// Height of one line of text.
    pub fn line_height(&self) -> f64 {
        self.font_size * Self::LINE_HEIGHT
    }

    fn line_advance(&self, line: &str) -> f64 {
        line.chars().count() as f64 * self.font_size * Self::CHAR_WIDTH_FACTOR
    }

    /// Approximate `(width, height)` of the laid-out text box.
    pub fn approximate_size(&self) -> (f64, f64) {
        let lines: Vec<&str> = self.text.split('\n').collect();
        match self.width {
            Some(width) if width > 0.0 => {
                let rows: usize = lines
                    .iter()
                    .map(|line| ((self.line_advance(line) / width).ceil() as usize).max(1))
                    .sum();
                (width, rows as f64 * self.line_height())
            }
            _ => {
                let widest = lines
                    .iter()
                    .map(|line| self.line_advance(line))
                    .fold(0.0, f64::max);
                (widest, lines.len() as f64 * self.line_height())
            }
        }
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Text
    }

    fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut NodeTransform {
        &mut self.transform
    }

    fn local_bounds(&self) -> Rect {
        let (width, height) = self.approximate_size();
        Rect::new(0.0, 0.0, width, height)
    }

    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool {
        self.local_bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn draggable(&self) -> bool {
        self.draggable
    }
}
