use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub database_height: f32,
    pub database_ellipse_ry: f32,
    pub box_corner_radius: f32,
    pub node_stroke_width: f32,
    pub connection_stroke_width: f32,
    pub group_corner_radius: f32,
    pub group_stroke_width: f32,
    pub group_dasharray: String,
    pub group_opacity: f32,
    pub group_label_opacity: f32,
    pub group_label_offset: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            node_width: 120.0,
            node_height: 60.0,
            database_height: 80.0,
            database_ellipse_ry: 12.0,
            box_corner_radius: 8.0,
            node_stroke_width: 2.0,
            connection_stroke_width: 2.0,
            group_corner_radius: 12.0,
            group_stroke_width: 1.5,
            group_dasharray: "4 4".to_string(),
            group_opacity: 0.4,
            group_label_opacity: 0.6,
            group_label_offset: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub theme: Theme,
    pub geometry: GeometryConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    theme: Option<String>,
    #[serde(rename = "themeVariables")]
    theme_variables: Option<ThemeVariables>,
    geometry: Option<GeometryOverrides>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ThemeVariables {
    #[serde(rename = "fontFamily")]
    font_family: Option<String>,
    #[serde(rename = "fontSize")]
    font_size: Option<f32>,
    background: Option<String>,
    #[serde(rename = "nodeFill")]
    node_fill: Option<String>,
    stroke: Option<String>,
    #[serde(rename = "textColor")]
    text_color: Option<String>,
    #[serde(rename = "lineColor")]
    line_color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GeometryOverrides {
    #[serde(rename = "nodeWidth")]
    node_width: Option<f32>,
    #[serde(rename = "nodeHeight")]
    node_height: Option<f32>,
    #[serde(rename = "databaseHeight")]
    database_height: Option<f32>,
    #[serde(rename = "boxCornerRadius")]
    box_corner_radius: Option<f32>,
    #[serde(rename = "groupCornerRadius")]
    group_corner_radius: Option<f32>,
    #[serde(rename = "groupDasharray")]
    group_dasharray: Option<String>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = match serde_json::from_str(&contents) {
        Ok(parsed) => parsed,
        // Config files are hand-edited; accept json5 (comments, trailing
        // commas) the way catalog files are accepted.
        Err(_) => json5::from_str(&contents)?,
    };

    if let Some(theme_name) = parsed.theme.as_deref() {
        if let Some(theme) = Theme::by_name(theme_name) {
            config.theme = theme;
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.node_fill {
            config.theme.node_fill = v;
        }
        if let Some(v) = vars.stroke {
            config.theme.stroke = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
    }

    if let Some(geometry) = parsed.geometry {
        if let Some(v) = geometry.node_width {
            config.geometry.node_width = v;
        }
        if let Some(v) = geometry.node_height {
            config.geometry.node_height = v;
        }
        if let Some(v) = geometry.database_height {
            config.geometry.database_height = v;
        }
        if let Some(v) = geometry.box_corner_radius {
            config.geometry.box_corner_radius = v;
        }
        if let Some(v) = geometry.group_corner_radius {
            config.geometry.group_corner_radius = v;
        }
        if let Some(v) = geometry.group_dasharray {
            config.geometry.group_dasharray = v;
        }
    }

    Ok(config)
}
