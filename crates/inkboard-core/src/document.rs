//! Stage document reading and writing.
//!
//! Documents are stage trees:
//! `{"attrs":{"width":W,"height":H},"className":"Stage","children":[Layer...]}`
//! where each layer holds `{"attrs":{...},"className":"Circle"}` style nodes.

use crate::error::DocumentError;
use crate::scene::Scene;
use crate::shapes::{KNOWN_CLASS_NAMES, Node, NodeKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

const STAGE: &str = "Stage";
const LAYER: &str = "Layer";

#[derive(Debug, Serialize)]
struct StageAttrs {
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct StageOut<'a> {
    attrs: StageAttrs,
    #[serde(rename = "className")]
    class_name: &'static str,
    children: [LayerOut<'a>; 1],
}

#[derive(Debug, Serialize)]
struct LayerOut<'a> {
    attrs: Map<String, Value>,
    #[serde(rename = "className")]
    class_name: &'static str,
    children: Vec<&'a Node>,
}

/// A stage or layer as read from a document.
#[derive(Debug, Deserialize)]
struct Container {
    #[serde(default)]
    attrs: Value,
    #[serde(rename = "className")]
    class_name: String,
    #[serde(default)]
    children: Vec<Value>,
}

/// Why a node in a document was not loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The class name is not a node kind this editor draws.
    Unsupported,
    /// The attributes could not be read.
    Malformed(String),
}

/// A node left out while loading a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedNode {
    pub class_name: String,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            SkipReason::Unsupported => write!(f, "unsupported node `{}`", self.class_name),
            SkipReason::Malformed(e) => write!(f, "malformed `{}` node: {e}", self.class_name),
        }
    }
}

/// Summary of a document load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of nodes placed in the scene.
    pub loaded: usize,
    /// Image nodes queued for rehydration.
    pub images: usize,
    /// Text nodes that were given a new id.
    pub reassigned_text_ids: usize,
    pub skipped: Vec<SkippedNode>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Serialize a scene as a stage document.
pub fn write_document(scene: &Scene) -> Result<String, DocumentError> {
    let stage = StageOut {
        attrs: StageAttrs {
            width: scene.width,
            height: scene.height,
        },
        class_name: STAGE,
        children: [LayerOut {
            attrs: Map::new(),
            class_name: LAYER,
            children: scene.nodes_ordered().collect(),
        }],
    };
    Ok(serde_json::to_string(&stage)?)
}

/// Parse a stage document into a fresh scene.
///
/// A JSON string literal wrapping the document is unwrapped first. The stage
/// size stored in the document wins over `default_size`; sides above
/// `Scene::MAX_SIDE` are rejected. Nodes of every layer
/// end up in the single drawing layer, in document order.
pub fn read_document(json: &str, default_size: (u32, u32)) -> Result<(Scene, LoadReport), DocumentError> {
    let mut value: Value = serde_json::from_str(json)?;
    if let Value::String(inner) = value {
        value = serde_json::from_str(&inner)?;
    }
    let stage: Container = serde_json::from_value(value)?;
    if stage.class_name != STAGE {
        return Err(DocumentError::MissingStage(stage.class_name));
    }

    let dimension = |key: &str, fallback: u32| -> Result<u32, DocumentError> {
        match stage.attrs.get(key) {
            None | Some(Value::Null) => Ok(fallback),
            Some(v) => v
                .as_f64()
                .filter(|n| n.is_finite() && *n >= 0.0 && *n <= f64::from(Scene::MAX_SIDE))
                .map(|n| n.round() as u32)
                .ok_or_else(|| DocumentError::Malformed(format!("stage {key} is {v}"))),
        }
    };
    let width = dimension("width", default_size.0)?;
    let height = dimension("height", default_size.1)?;

    let mut scene = Scene::with_size(width, height);
    let mut report = LoadReport::default();

    for child in stage.children {
        let layer: Container = match serde_json::from_value(child) {
            Ok(layer) => layer,
            Err(e) => {
                return Err(DocumentError::Malformed(format!("stage child: {e}")));
            }
        };
        if layer.class_name != LAYER {
            log::warn!("Skipping `{}` outside a layer", layer.class_name);
            report.skipped.push(SkippedNode {
                class_name: layer.class_name,
                reason: SkipReason::Unsupported,
            });
            continue;
        }
        for raw in layer.children {
            match read_node(raw) {
                Ok(node) => {
                    if node.kind() == NodeKind::Image {
                        report.images += 1;
                    }
                    scene.add(node);
                    report.loaded += 1;
                }
                Err(skipped) => {
                    log::warn!("Skipping {skipped}");
                    report.skipped.push(skipped);
                }
            }
        }
    }

    log::info!(
        "Read document: {} nodes ({} images), {} skipped",
        report.loaded,
        report.images,
        report.skipped.len()
    );
    Ok((scene, report))
}

fn read_node(raw: Value) -> Result<Node, SkippedNode> {
    let class_name = raw
        .get("className")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if !KNOWN_CLASS_NAMES.contains(&class_name.as_str()) {
        return Err(SkippedNode {
            class_name,
            reason: SkipReason::Unsupported,
        });
    }
    // Nodes with nothing but defaults may omit `attrs`.
    let raw = match raw {
        Value::Object(mut map) => {
            map.entry("attrs").or_insert_with(|| Value::Object(Map::new()));
            Value::Object(map)
        }
        other => other,
    };
    serde_json::from_value(raw).map_err(|e| SkippedNode {
        class_name,
        reason: SkipReason::Malformed(e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Color, Image, Rectangle, Stroke, StrokeMode, Text, TextId};
    use kurbo::Point;

    fn sample_scene() -> Scene {
        let mut scene = Scene::with_size(640, 480);
        let mut circle = Circle::new(Point::new(100.0, 100.0), 70.0);
        circle.fill = Some(Color::new("red"));
        circle.draggable = true;
        scene.add(Node::Circle(circle));
        let mut rect = Rectangle::new(Point::new(20.0, 50.0), 100.0, 50.0);
        rect.transform.rotation = 30.0;
        rect.transform.scale_x = 1.5;
        scene.add(Node::Rectangle(rect));
        let mut stroke = Stroke::new(Point::new(10.0, 10.0), StrokeMode::Erase);
        stroke.add_point(Point::new(20.0, 20.0));
        scene.add(Node::Stroke(stroke));
        scene.add(Node::Text(Text::new(TextId(4), Point::new(50.0, 80.0), "hello")));
        scene
    }

    fn attrs_of(scene: &Scene) -> Vec<Value> {
        scene
            .nodes_ordered()
            .map(|n| serde_json::to_value(n).unwrap())
            .collect()
    }

    #[test]
    fn test_stage_tree_shape() {
        let json = write_document(&sample_scene()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["className"], "Stage");
        assert_eq!(value["attrs"]["width"], 640);
        assert_eq!(value["children"][0]["className"], "Layer");
        let nodes = value["children"][0]["children"].as_array().unwrap();
        let classes: Vec<&str> = nodes.iter().map(|n| n["className"].as_str().unwrap()).collect();
        assert_eq!(classes, ["Circle", "Rect", "Line", "Text"]);
        assert_eq!(nodes[2]["attrs"]["points"], serde_json::json!([10.0, 10.0, 20.0, 20.0]));
    }

    #[test]
    fn test_round_trip_equal_modulo_identity() {
        let scene = sample_scene();
        let json = write_document(&scene).unwrap();
        let (loaded, report) = read_document(&json, (1, 1)).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.loaded, 4);
        assert_eq!((loaded.width, loaded.height), (640, 480));
        assert_eq!(attrs_of(&loaded), attrs_of(&scene));
    }

    #[test]
    fn test_double_encoded_document() {
        let json = write_document(&sample_scene()).unwrap();
        let wrapped = serde_json::to_string(&json).unwrap();
        let (loaded, _) = read_document(&wrapped, (1, 1)).unwrap();
        assert_eq!(loaded.len(), 4);
    }

    #[test]
    fn test_flattens_layers_and_skips_unknown() {
        let json = r#"{
            "attrs": {},
            "className": "Stage",
            "children": [
                {"attrs": {}, "className": "Layer", "children": [
                    {"attrs": {"x": 1, "y": 2, "radius": 3}, "className": "Circle"},
                    {"attrs": {}, "className": "Transformer"}
                ]},
                {"className": "Layer", "children": [
                    {"attrs": {"points": [1, 2, 3]}, "className": "Line"},
                    {"attrs": {"x": 120, "y": 50, "source": "data:image/png;base64,AA"}, "className": "Image"}
                ]}
            ]
        }"#;
        let (scene, report) = read_document(json, (1024, 800)).unwrap();
        assert_eq!((scene.width, scene.height), (1024, 800));
        assert_eq!(scene.len(), 2);
        assert_eq!(report.images, 1);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].reason, SkipReason::Unsupported);
        assert!(matches!(report.skipped[1].reason, SkipReason::Malformed(_)));
        let kinds: Vec<NodeKind> = scene.nodes_ordered().map(Node::kind).collect();
        assert_eq!(kinds, [NodeKind::Circle, NodeKind::Image]);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(read_document("not json", (1, 1)), Err(DocumentError::InvalidJson(_))));
        assert!(matches!(
            read_document(r#"{"className":"Layer"}"#, (1, 1)),
            Err(DocumentError::MissingStage(_))
        ));
        assert!(matches!(
            read_document(r#"{"attrs":{"width":"wide"},"className":"Stage"}"#, (1, 1)),
            Err(DocumentError::Malformed(_))
        ));
    }

    #[test]
    fn test_oversized_stage_rejected() {
        let huge = r#"{"attrs":{"width":200000,"height":200000},"className":"Stage","children":[]}"#;
        assert!(matches!(read_document(huge, (1, 1)), Err(DocumentError::Malformed(_))));

        let largest = r#"{"attrs":{"width":8192,"height":8192},"className":"Stage","children":[]}"#;
        let (scene, _) = read_document(largest, (1, 1)).unwrap();
        assert_eq!(scene.width, Scene::MAX_SIDE);
    }

    #[test]
    fn test_image_source_written_verbatim() {
        let mut scene = Scene::new();
        let uri = "data:image/png;base64,iVBORw0KGgo=";
        scene.add(Node::Image(Image::new(Point::new(120.0, 50.0), uri)));
        let json = write_document(&scene).unwrap();
        let (loaded, report) = read_document(&json, (1, 1)).unwrap();
        assert_eq!(report.images, 1);
        let image = loaded.nodes_ordered().next().and_then(Node::as_image).unwrap();
        assert_eq!(image.source, uri);
        assert!(!image.is_loaded());
    }
}
