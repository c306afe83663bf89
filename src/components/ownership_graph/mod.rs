//! Ownership graph core: validation, interaction reducer, overlays and the
//! canvas surface that renders them.

mod component;
mod config;
mod context_menu;
mod dispatch;
mod engine;
mod error;
mod keyboard;
mod overlay;
mod panels;
mod render;
mod selection;
mod style;
mod surface;
mod types;
mod validate;

pub use component::{CanvasGraphHandle, OwnershipGraph};
pub use config::{GraphConfig, LayoutConfig, ZoomBounds};
pub use context_menu::{
	ContextMenuState, MenuAction, MenuItem, build_menu, clamp_to_viewport, menu_size,
};
pub use dispatch::{
	ActionLog, Command, FitTarget, InteractionEvent, InteractionState, Transition, reduce,
};
pub use error::{
	OverlaySurfaceUnavailable, RecordKind, RenderEngineInitError, SurfaceError, ValidationError,
};
pub use keyboard::{Direction, FocusTarget, KeyInput, Modifiers, Shortcut, feedback_message, route};
pub use overlay::{
	DismissPolicy, EdgeDetails, EdgeSummary, ModalContent, NodeDetails, OverlayKind,
	OverlayManager, OverlayPanel, OverlayPayload,
};
pub use panels::{GraphErrorPanel, OverlayLayer};
pub use render::{CanvasEngine, CanvasEngineFactory, type_color};
pub use selection::{Highlights, SelectionSet};
pub use style::{ElementStyle, HiddenLedger, VisualState, resolve_style};
pub use surface::{
	EngineFactory, GraphHandle, Outcome, RenderEngine, Session, SurfaceAdapter, SurfaceStatus,
};
pub use types::{
	GraphData, GraphEdge, GraphNode, Point, Position, RenderableEdge, RenderableElement,
	RenderableNode, Size, Target,
};
pub use validate::{
	GraphIndex, ValidationReport, edge_display_label, node_display_label, validate_graph,
};
