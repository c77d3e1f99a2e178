//! Zoom and pan interaction: explicit state, transform, debounce and the zoomer.

pub mod behavior;
pub mod debounce;
pub mod state;
pub mod zoomer;

pub use behavior::ZoomBehavior;
pub use debounce::Debouncer;
pub use state::{inspect_zoom, GestureKind, ZoomEvent, ZoomInspection, ZoomPhase, ZoomState};
pub use zoomer::{LinesZoomer, ResponseOutcome, ZoomTick};
