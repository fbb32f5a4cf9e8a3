use crate::core::element::ElementType;
use crate::layout::Viewport;
use crate::types::{ElementId, Point};

/// Active tool. Panning is tracked separately and works under any tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Place(ElementType),
    Connect {
        pending_source: Option<ElementId>,
    },
}

/// An element being dragged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub element: ElementId,
    /// Last committed position; restored if the drag is aborted.
    pub origin: Point,
    /// Pointer position relative to the element's top-left corner at grab time.
    pub grab_offset: Point,
    pub current: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanGesture {
    pub last: Point,
}

/// Everything the editor remembers between pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EditorState {
    pub tool: Tool,
    pub viewport: Viewport,
    pub selection: Option<ElementId>,
    pub drag: Option<Drag>,
    pub pan: Option<PanGesture>,
}

impl EditorState {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    pub fn pending_source(&self) -> Option<ElementId> {
        match self.tool {
            Tool::Connect { pending_source } => pending_source,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Input to the editor. Positions are in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorEvent {
    ChooseTool(Tool),
    PointerDown { button: PointerButton, at: Point },
    PointerMove { at: Point },
    PointerUp { button: PointerButton, at: Point },
    /// The surface lost pointer capture mid-gesture.
    CaptureLost,
    Wheel { at: Point, steps: i32 },
    Cancel,
    DeleteSelection,
}
