use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    #[default]
    Box,
    Database,
    // Accepted in catalogs but drawn as a plain box.
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(default, rename = "type")]
    pub shape: NodeShape,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub from: String,
    pub to: String,
    #[serde(default, rename = "fromSide")]
    pub from_side: Option<Side>,
    #[serde(default, rename = "toSide")]
    pub to_side: Option<Side>,
    #[serde(default)]
    pub waypoints: Vec<Point>,
    #[serde(default)]
    pub bidirectional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

fn default_width() -> f32 {
    800.0
}

fn default_height() -> f32 {
    600.0
}

impl Diagram {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            nodes: Vec::new(),
            groups: Vec::new(),
            connections: Vec::new(),
        }
    }

    // Later duplicates of an id shadow earlier ones (last write wins).
    pub fn node_index(&self) -> BTreeMap<&str, &Node> {
        self.nodes
            .iter()
            .map(|node| (node.id.as_str(), node))
            .collect()
    }
}
