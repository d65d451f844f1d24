use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub label_font_size: f32,
    pub background: String,
    pub node_fill: String,
    pub stroke: String,
    pub text_color: String,
    pub line_color: String,
    pub group_stroke: String,
    pub group_text_color: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            label_font_size: 12.0,
            background: "#FFFFFF".to_string(),
            node_fill: "#FFFFFF".to_string(),
            stroke: "#1C2430".to_string(),
            text_color: "#1C2430".to_string(),
            line_color: "#1C2430".to_string(),
            group_stroke: "#1C2430".to_string(),
            group_text_color: "#1C2430".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            label_font_size: 12.0,
            background: "#0B0F14".to_string(),
            node_fill: "#11161D".to_string(),
            stroke: "#E6EAF0".to_string(),
            text_color: "#E6EAF0".to_string(),
            line_color: "#E6EAF0".to_string(),
            group_stroke: "#E6EAF0".to_string(),
            group_text_color: "#E6EAF0".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "light" => Some(Self::light()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
