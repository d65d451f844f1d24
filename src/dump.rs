use crate::config::GeometryConfig;
use crate::ir::{Diagram, Side};
use crate::render::{connection_point, node_extent};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct GeometryDump {
    pub width: f32,
    pub height: f32,
    pub overflow: bool,
    pub nodes: Vec<NodeDump>,
    pub groups: Vec<GroupDump>,
    pub connections: Vec<ConnectionDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub shape: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct GroupDump {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct ConnectionDump {
    pub from: String,
    pub to: String,
    pub from_resolved: bool,
    pub to_resolved: bool,
    pub bidirectional: bool,
    pub points: Vec<[f32; 2]>,
}

impl GeometryDump {
    pub fn from_diagram(diagram: &Diagram, geometry: &GeometryConfig) -> Self {
        let index = diagram.node_index();

        let nodes: Vec<NodeDump> = diagram
            .nodes
            .iter()
            .map(|node| {
                let (width, height) = node_extent(node, geometry);
                NodeDump {
                    id: node.id.clone(),
                    shape: format!("{:?}", node.shape),
                    x: node.x,
                    y: node.y,
                    width,
                    height,
                }
            })
            .collect();

        let groups = diagram
            .groups
            .iter()
            .map(|group| GroupDump {
                id: group.id.clone(),
                label: group.label.clone(),
                x: group.x,
                y: group.y,
                width: group.width,
                height: group.height,
            })
            .collect();

        let connections = diagram
            .connections
            .iter()
            .map(|connection| {
                let start = connection_point(
                    &index,
                    &connection.from,
                    connection.from_side.unwrap_or(Side::Bottom),
                    geometry,
                );
                let end = connection_point(
                    &index,
                    &connection.to,
                    connection.to_side.unwrap_or(Side::Top),
                    geometry,
                );
                let mut points = vec![[start.x, start.y]];
                points.extend(connection.waypoints.iter().map(|wp| [wp.x, wp.y]));
                points.push([end.x, end.y]);
                ConnectionDump {
                    from: connection.from.clone(),
                    to: connection.to.clone(),
                    from_resolved: index.contains_key(connection.from.as_str()),
                    to_resolved: index.contains_key(connection.to.as_str()),
                    bidirectional: connection.bidirectional,
                    points,
                }
            })
            .collect();

        // Informational only; rendering never clips to the canvas.
        let overflow = nodes
            .iter()
            .map(|n| (n.x + n.width, n.y + n.height))
            .chain(diagram.groups.iter().map(|g| (g.x + g.width, g.y + g.height)))
            .any(|(right, bottom)| right > diagram.width || bottom > diagram.height);

        GeometryDump {
            width: diagram.width,
            height: diagram.height,
            overflow,
            nodes,
            groups,
            connections,
        }
    }
}

pub fn write_geometry_dump(
    path: &Path,
    diagram: &Diagram,
    geometry: &GeometryConfig,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = GeometryDump::from_diagram(diagram, geometry);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
