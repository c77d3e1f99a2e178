use gpui::*;

/// Categorical palette used for lines, indexed by `color * measures + measure`.
const CATEGORY10: [u32; 10] = [
    0x1f77b4, 0xff7f0e, 0x2ca02c, 0xd62728, 0x9467bd, 0x8c564b, 0xe377c2, 0x7f7f7f, 0xbcbd22,
    0x17becf,
];

#[derive(Clone, Debug)]
pub struct ChartTheme {
    pub background: Hsla,
    pub grid_line: Hsla,
    pub axis_line: Hsla,
    pub axis_label: Hsla,
    pub axis_label_size: Pixels,
    pub missing_data_area: Hsla,
    pub brush_selection: Hsla,
    pub status_text: Hsla,
    pub error_text: Hsla,
    pub palette: Vec<Hsla>,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            background: gpui::black(),
            grid_line: gpui::white().alpha(0.1),
            axis_line: gpui::white().alpha(0.2),
            axis_label: gpui::white().alpha(0.8),
            axis_label_size: px(11.0),
            missing_data_area: gpui::white().alpha(0.15),
            brush_selection: gpui::white().alpha(0.2),
            status_text: gpui::white().alpha(0.6),
            error_text: gpui::red(),
            palette: CATEGORY10.iter().map(|c| Hsla::from(rgb(*c))).collect(),
        }
    }
}

impl ChartTheme {
    pub fn line_color(&self, index: usize) -> Hsla {
        if self.palette.is_empty() {
            return self.axis_label;
        }
        self.palette[index % self.palette.len()]
    }
}
