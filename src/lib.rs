//! lines_chart crate: an interactive lines chart over pivot query results, in GPUI

pub mod activity;
pub mod axis;
pub mod chart;
pub mod chart_def;
pub mod chart_view;
pub mod config;
pub mod drawer;
pub mod error;
pub mod lines_utils;
pub mod painter;
pub mod query;
pub mod request;
pub mod scales;
pub mod scene;
pub mod tensor;
pub mod theme;
pub mod utils;
pub mod zoom;

pub use chart::{LinesChart, PollSummary};
pub use chart_def::ChartDefinition;
pub use chart_view::{init, LinesChartView};
pub use config::LinesChartConfig;
pub use drawer::ChartViewport;
pub use error::QueryError;
pub use lines_utils::Interval;
pub use query::{PivotQueryService, QueryBackend, QueryChannel};
pub use request::PivotRequest;
pub use tensor::PivotResponse;
pub use theme::ChartTheme;
