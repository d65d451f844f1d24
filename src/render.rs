use crate::config::GeometryConfig;
use crate::ir::{Connection, Diagram, Group, Node, NodeShape, Point, Side};
use crate::theme::Theme;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

// Arrowhead geometry is fixed: a 10x6 triangle in a 10x10 marker
// viewport, oriented along the path tangent at the endpoint.
const MARKER_VIEWPORT: f32 = 10.0;
const ARROW_END_REF_X: f32 = 9.0;
const ARROW_START_REF_X: f32 = 1.0;
const ARROW_REF_Y: f32 = 3.0;

pub fn render_svg(diagram: &Diagram, theme: &Theme, geometry: &GeometryConfig) -> String {
    let mut svg = String::new();
    let width = diagram.width;
    let height = diagram.height;
    let index = diagram.node_index();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));

    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrowhead-end\" markerWidth=\"{MARKER_VIEWPORT}\" markerHeight=\"{MARKER_VIEWPORT}\" refX=\"{ARROW_END_REF_X}\" refY=\"{ARROW_REF_Y}\" orient=\"auto\"><polygon points=\"0 0, 10 3, 0 6\" fill=\"{}\"/></marker>",
        theme.line_color
    ));
    svg.push_str(&format!(
        "<marker id=\"arrowhead-start\" markerWidth=\"{MARKER_VIEWPORT}\" markerHeight=\"{MARKER_VIEWPORT}\" refX=\"{ARROW_START_REF_X}\" refY=\"{ARROW_REF_Y}\" orient=\"auto\"><polygon points=\"10 0, 0 3, 10 6\" fill=\"{}\"/></marker>",
        theme.line_color
    ));
    svg.push_str("</defs>");

    // Groups first, then connections, then nodes: connector lines sit
    // behind node shapes, group outlines behind everything.
    for group in &diagram.groups {
        render_group(&mut svg, group, theme, geometry);
    }

    for connection in &diagram.connections {
        render_connection(&mut svg, &index, connection, theme, geometry);
    }

    for node in &diagram.nodes {
        match node.shape {
            NodeShape::Database => render_database(&mut svg, node, theme, geometry),
            NodeShape::Box | NodeShape::Api => render_box(&mut svg, node, theme, geometry),
        }
    }

    svg.push_str("</svg>");
    svg
}

pub fn node_extent(node: &Node, geometry: &GeometryConfig) -> (f32, f32) {
    let w = node.width.unwrap_or(geometry.node_width);
    // Cylinders have a fixed height; a height override is accepted by
    // the data model but ignored here.
    let h = match node.shape {
        NodeShape::Database => geometry.database_height,
        NodeShape::Box | NodeShape::Api => node.height.unwrap_or(geometry.node_height),
    };
    (w, h)
}

pub fn connection_point(
    index: &BTreeMap<&str, &Node>,
    node_id: &str,
    side: Side,
    geometry: &GeometryConfig,
) -> Point {
    // Dangling references degrade to the origin instead of failing;
    // the surrounding page must render regardless.
    let Some(node) = index.get(node_id) else {
        return Point::default();
    };

    let (w, h) = node_extent(node, geometry);
    let (x, y) = (node.x, node.y);

    match side {
        Side::Top => Point { x: x + w / 2.0, y },
        Side::Right => Point { x: x + w, y: y + h / 2.0 },
        Side::Bottom => Point { x: x + w / 2.0, y: y + h },
        Side::Left => Point { x, y: y + h / 2.0 },
    }
}

fn render_group(svg: &mut String, group: &Group, theme: &Theme, geometry: &GeometryConfig) {
    svg.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-dasharray=\"{}\" opacity=\"{}\"/>",
        group.x,
        group.y,
        group.width,
        group.height,
        geometry.group_corner_radius,
        theme.group_stroke,
        geometry.group_stroke_width,
        geometry.group_dasharray,
        geometry.group_opacity
    ));
    let label_x = group.x + group.width / 2.0;
    let label_y = group.y + group.height - geometry.group_label_offset;
    svg.push_str(&format!(
        "<text x=\"{label_x}\" y=\"{label_y}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\" opacity=\"{}\">{}</text>",
        theme.font_family,
        theme.label_font_size,
        theme.group_text_color,
        geometry.group_label_opacity,
        escape_xml(&group.label)
    ));
}

fn render_connection(
    svg: &mut String,
    index: &BTreeMap<&str, &Node>,
    connection: &Connection,
    theme: &Theme,
    geometry: &GeometryConfig,
) {
    let start = connection_point(
        index,
        &connection.from,
        connection.from_side.unwrap_or(Side::Bottom),
        geometry,
    );
    let end = connection_point(
        index,
        &connection.to,
        connection.to_side.unwrap_or(Side::Top),
        geometry,
    );

    let d = connection_path(start, &connection.waypoints, end);
    let marker_start = if connection.bidirectional {
        " marker-start=\"url(#arrowhead-start)\""
    } else {
        ""
    };
    svg.push_str(&format!(
        "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" marker-end=\"url(#arrowhead-end)\"{marker_start}/>",
        theme.line_color,
        geometry.connection_stroke_width
    ));
}

// Polyline through the caller-supplied waypoints; no automatic routing.
fn connection_path(start: Point, waypoints: &[Point], end: Point) -> String {
    let mut d = format!("M {} {}", start.x, start.y);
    for point in waypoints {
        d.push_str(&format!(" L {} {}", point.x, point.y));
    }
    d.push_str(&format!(" L {} {}", end.x, end.y));
    d
}

fn render_box(svg: &mut String, node: &Node, theme: &Theme, geometry: &GeometryConfig) {
    let (w, h) = node_extent(node, geometry);

    svg.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{w}\" height=\"{h}\" rx=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        node.x,
        node.y,
        geometry.box_corner_radius,
        theme.node_fill,
        theme.stroke,
        geometry.node_stroke_width
    ));
    render_label(svg, node.x + w / 2.0, node.y + h / 2.0, &node.label, theme);
}

fn render_database(svg: &mut String, node: &Node, theme: &Theme, geometry: &GeometryConfig) {
    let w = node.width.unwrap_or(geometry.node_width);
    let h = geometry.database_height;
    let ry = geometry.database_ellipse_ry;
    let cx = node.x + w / 2.0;

    svg.push_str(&format!(
        "<ellipse cx=\"{cx}\" cy=\"{}\" rx=\"{}\" ry=\"{ry}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        node.y + ry,
        w / 2.0,
        theme.node_fill,
        theme.stroke,
        geometry.node_stroke_width
    ));
    svg.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{w}\" height=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\" stroke-linejoin=\"miter\"/>",
        node.x,
        node.y + ry,
        h - ry * 2.0,
        theme.node_fill,
        theme.stroke,
        geometry.node_stroke_width
    ));
    svg.push_str(&format!(
        "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        node.x,
        node.y + ry,
        node.x,
        node.y + h - ry,
        theme.stroke,
        geometry.node_stroke_width
    ));
    svg.push_str(&format!(
        "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        node.x + w,
        node.y + ry,
        node.x + w,
        node.y + h - ry,
        theme.stroke,
        geometry.node_stroke_width
    ));
    svg.push_str(&format!(
        "<ellipse cx=\"{cx}\" cy=\"{}\" rx=\"{}\" ry=\"{ry}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        node.y + h - ry,
        w / 2.0,
        theme.node_fill,
        theme.stroke,
        geometry.node_stroke_width
    ));
    render_label(svg, cx, node.y + h / 2.0, &node.label, theme);
}

fn render_label(svg: &mut String, x: f32, y: f32, label: &str, theme: &Theme) {
    svg.push_str(&format!(
        "<text x=\"{x}\" y=\"{y}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        theme.font_family,
        theme.font_size,
        theme.text_color,
        escape_xml(label)
    ));
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme.font_family.clone();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Group;

    fn node(id: &str, x: f32, y: f32, width: Option<f32>, height: Option<f32>) -> Node {
        Node {
            id: id.to_string(),
            label: id.to_uppercase(),
            shape: NodeShape::Box,
            x,
            y,
            width,
            height,
        }
    }

    fn sample_diagram() -> Diagram {
        let mut diagram = Diagram::new(800.0, 600.0);
        diagram.nodes.push(node("a", 0.0, 0.0, Some(100.0), Some(50.0)));
        diagram.nodes.push(Node {
            id: "db".to_string(),
            label: "Store".to_string(),
            shape: NodeShape::Database,
            x: 10.0,
            y: 10.0,
            width: Some(100.0),
            height: None,
        });
        diagram.groups.push(Group {
            id: "backend".to_string(),
            label: "Backend".to_string(),
            x: 0.0,
            y: 0.0,
            width: 300.0,
            height: 200.0,
        });
        diagram.connections.push(Connection {
            from: "a".to_string(),
            to: "db".to_string(),
            from_side: None,
            to_side: None,
            waypoints: Vec::new(),
            bidirectional: false,
        });
        diagram
    }

    #[test]
    fn anchors_on_vertical_midline() {
        let diagram = sample_diagram();
        let index = diagram.node_index();
        let geometry = GeometryConfig::default();
        let top = connection_point(&index, "a", Side::Top, &geometry);
        let bottom = connection_point(&index, "a", Side::Bottom, &geometry);
        assert_eq!(top.x, 50.0);
        assert_eq!(top.x, bottom.x);
        assert_eq!(top.y, 0.0);
    }

    #[test]
    fn anchors_on_horizontal_midline() {
        let diagram = sample_diagram();
        let index = diagram.node_index();
        let geometry = GeometryConfig::default();
        let left = connection_point(&index, "a", Side::Left, &geometry);
        let right = connection_point(&index, "a", Side::Right, &geometry);
        assert_eq!(left.y, 25.0);
        assert_eq!(left.y, right.y);
        assert_eq!(right.x, 100.0);
    }

    #[test]
    fn bottom_anchor_matches_extent() {
        let diagram = sample_diagram();
        let index = diagram.node_index();
        let point = connection_point(&index, "a", Side::Bottom, &GeometryConfig::default());
        assert_eq!((point.x, point.y), (50.0, 50.0));
    }

    #[test]
    fn database_height_override_is_ignored() {
        let geometry = GeometryConfig::default();
        let mut cylinder = node("db", 10.0, 10.0, Some(100.0), Some(500.0));
        cylinder.shape = NodeShape::Database;
        let (w, h) = node_extent(&cylinder, &geometry);
        assert_eq!((w, h), (100.0, 80.0));
    }

    #[test]
    fn database_ellipse_centers() {
        let diagram = sample_diagram();
        let svg = render_svg(&diagram, &Theme::light(), &GeometryConfig::default());
        // Node "db" at (10,10) width 100: top ellipse center (60,22),
        // bottom ellipse center (60,78).
        assert!(svg.contains("<ellipse cx=\"60\" cy=\"22\""));
        assert!(svg.contains("<ellipse cx=\"60\" cy=\"78\""));
    }

    #[test]
    fn dangling_reference_degrades_to_origin() {
        let diagram = sample_diagram();
        let index = diagram.node_index();
        let point = connection_point(&index, "missing", Side::Bottom, &GeometryConfig::default());
        assert_eq!((point.x, point.y), (0.0, 0.0));
    }

    #[test]
    fn dangling_target_path_ends_at_origin() {
        let mut diagram = sample_diagram();
        diagram.connections.clear();
        diagram.connections.push(Connection {
            from: "a".to_string(),
            to: "missing".to_string(),
            from_side: Some(Side::Bottom),
            to_side: None,
            waypoints: Vec::new(),
            bidirectional: false,
        });
        let svg = render_svg(&diagram, &Theme::light(), &GeometryConfig::default());
        assert!(svg.contains("d=\"M 50 50 L 0 0\""));
    }

    #[test]
    fn waypoints_are_rendered_in_order() {
        let d = connection_path(
            Point { x: 0.0, y: 0.0 },
            &[Point { x: 10.0, y: 0.0 }, Point { x: 10.0, y: 20.0 }],
            Point { x: 30.0, y: 20.0 },
        );
        assert_eq!(d, "M 0 0 L 10 0 L 10 20 L 30 20");
    }

    #[test]
    fn bidirectional_renders_both_markers() {
        let mut diagram = sample_diagram();
        diagram.connections[0].bidirectional = true;
        let svg = render_svg(&diagram, &Theme::light(), &GeometryConfig::default());
        assert_eq!(svg.matches("marker-start=\"url(#arrowhead-start)\"").count(), 1);
        assert_eq!(svg.matches("marker-end=\"url(#arrowhead-end)\"").count(), 1);

        let mut one_way = sample_diagram();
        one_way.connections[0].bidirectional = false;
        let svg = render_svg(&one_way, &Theme::light(), &GeometryConfig::default());
        assert_eq!(svg.matches("marker-start").count(), 0);
        assert_eq!(svg.matches("marker-end=\"url(#arrowhead-end)\"").count(), 1);
    }

    #[test]
    fn render_is_deterministic() {
        let diagram = sample_diagram();
        let theme = Theme::light();
        let geometry = GeometryConfig::default();
        let first = render_svg(&diagram, &theme, &geometry);
        let second = render_svg(&diagram, &theme, &geometry);
        assert_eq!(first, second);
    }

    #[test]
    fn groups_precede_connections_precede_nodes() {
        let diagram = sample_diagram();
        let svg = render_svg(&diagram, &Theme::light(), &GeometryConfig::default());
        let body = &svg[svg.find("</defs>").unwrap()..];
        let group_at = body.find("stroke-dasharray").unwrap();
        let connection_at = body.find("<path d=").unwrap();
        let node_at = body.find("rx=\"8\"").unwrap();
        assert!(group_at < connection_at);
        assert!(connection_at < node_at);
    }

    #[test]
    fn content_outside_canvas_still_renders() {
        let mut diagram = sample_diagram();
        diagram.nodes.push(node("far", 2000.0, 2000.0, None, None));
        let svg = render_svg(&diagram, &Theme::light(), &GeometryConfig::default());
        assert!(svg.contains("x=\"2000\""));
    }

    #[test]
    fn api_shape_renders_as_box() {
        let mut diagram = Diagram::new(200.0, 200.0);
        let mut api = node("gw", 0.0, 0.0, None, None);
        api.shape = NodeShape::Api;
        diagram.nodes.push(api);
        let svg = render_svg(&diagram, &Theme::light(), &GeometryConfig::default());
        assert!(svg.contains("rx=\"8\""));
        assert!(!svg.contains("<ellipse"));
    }

    #[test]
    fn labels_are_escaped() {
        let mut diagram = Diagram::new(200.0, 200.0);
        let mut tricky = node("q", 0.0, 0.0, None, None);
        tricky.label = "Cache & \"Queue\" <v2>".to_string();
        diagram.nodes.push(tricky);
        let svg = render_svg(&diagram, &Theme::light(), &GeometryConfig::default());
        assert!(svg.contains("Cache &amp; &quot;Queue&quot; &lt;v2&gt;"));
    }
}
