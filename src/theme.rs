use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub bar_color: String,
    pub bar_border_color: String,
    pub bar_text_color: String,
    pub marker_text_color: String,
    pub phase_line_color: String,
    pub handle_color: String,
    pub hover_color: String,
    pub axis_color: String,
    pub axis_text_color: String,
    pub grid_line_color: String,
    pub today_color: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 12.0,
            background: "#FFFFFF".to_string(),
            bar_color: "#ECECFF".to_string(),
            bar_border_color: "#9370DB".to_string(),
            bar_text_color: "#333333".to_string(),
            marker_text_color: "#666666".to_string(),
            phase_line_color: "#9370DB".to_string(),
            handle_color: "#9370DB".to_string(),
            hover_color: "#FFFFDE".to_string(),
            axis_color: "#333333".to_string(),
            axis_text_color: "#333333".to_string(),
            grid_line_color: "#E8E8E8".to_string(),
            today_color: "#AAAA33".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 11.0,
            background: "#FFFFFF".to_string(),
            bar_color: "#6366F1".to_string(),
            bar_border_color: "#4F46E5".to_string(),
            bar_text_color: "#FFFFFF".to_string(),
            marker_text_color: "#5B6475".to_string(),
            phase_line_color: "#7A8AA6".to_string(),
            handle_color: "#C7D2E5".to_string(),
            hover_color: "#818CF8".to_string(),
            axis_color: "#7A8AA6".to_string(),
            axis_text_color: "#1C2430".to_string(),
            grid_line_color: "#EEF2F8".to_string(),
            today_color: "#F97316".to_string(),
        }
    }
}
