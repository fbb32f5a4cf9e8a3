//! Pointer-driven editing.
//!
//! `Editor::handle` takes the current `EditorState` and an event and returns the
//! next state plus the effects the host must carry out. Graph changes go through
//! intents, so every persisted change arrives with its undo ops.

use tracing::{debug, warn};

use super::state::{Drag, EditorEvent, EditorState, PanGesture, PointerButton, Tool};
use crate::config::EngineConfig;
use crate::core::element::ElementType;
use crate::core::graph::SchemaGraph;
use crate::core::intent::{ApplyResult, Intent};
use crate::error::Error;
use crate::layout::Layout;
use crate::runtime::catalog::StepCatalog;
use crate::types::{ElementId, Point};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// A committed graph change to send to the collaborator.
    Persist(ApplyResult),
    /// A message for the user; the graph was left untouched.
    Notify(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: EditorState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn quiet(state: EditorState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

pub struct Editor<'a, C: ?Sized> {
    config: &'a EngineConfig,
    layout: Layout,
    catalog: &'a C,
}

impl<'a, C: StepCatalog + ?Sized> Editor<'a, C> {
    pub fn new(config: &'a EngineConfig, catalog: &'a C) -> Self {
        Self {
            config,
            layout: Layout::from_config(config),
            catalog,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn handle(
        &self,
        state: EditorState,
        graph: &mut SchemaGraph,
        event: EditorEvent,
    ) -> Transition {
        match event {
            EditorEvent::ChooseTool(tool) => self.choose_tool(state, graph, tool),
            EditorEvent::PointerDown {
                button: PointerButton::Secondary,
                at,
            } => Transition::quiet(EditorState {
                pan: Some(PanGesture { last: at }),
                ..state
            }),
            EditorEvent::PointerDown {
                button: PointerButton::Primary,
                at,
            } => self.primary_down(state, graph, at),
            EditorEvent::PointerMove { at } => self.pointer_move(state, graph, at),
            EditorEvent::PointerUp {
                button: PointerButton::Secondary,
                ..
            } => Transition::quiet(EditorState { pan: None, ..state }),
            EditorEvent::PointerUp {
                button: PointerButton::Primary,
                ..
            } => self.finish_drag(state, graph),
            EditorEvent::CaptureLost => {
                let state = abort_drag(state, graph);
                Transition::quiet(EditorState { pan: None, ..state })
            }
            EditorEvent::Wheel { at, steps } => {
                let mut state = state;
                state.viewport.zoom_steps_at(at, steps);
                Transition::quiet(state)
            }
            EditorEvent::Cancel => {
                let state = abort_drag(state, graph);
                Transition::quiet(EditorState {
                    tool: Tool::Select,
                    ..state
                })
            }
            EditorEvent::DeleteSelection => match state.selection {
                Some(element) => {
                    let state = EditorState {
                        selection: None,
                        ..state
                    };
                    self.apply(state, graph, Intent::DeleteElement(element))
                }
                None => Transition::quiet(state),
            },
        }
    }

    /// Apply an intent coming from outside the pointer flow (property panels,
    /// rename fields). A rejected intent returns to `Select`.
    pub fn apply(&self, state: EditorState, graph: &mut SchemaGraph, intent: Intent) -> Transition {
        match intent.apply(graph, self.config) {
            Ok(result) if result.delta.is_empty() => Transition::quiet(state),
            Ok(result) => Transition {
                state,
                effects: vec![Effect::Persist(result)],
            },
            Err(err) => reject(state, err),
        }
    }

    /// Topmost element under a screen point.
    pub fn hit_test(
        &self,
        state: &EditorState,
        graph: &SchemaGraph,
        at: Point,
    ) -> Option<ElementId> {
        let world = state.viewport.screen_to_world(at);
        graph
            .elements()
            .filter(|element| element.bounds().contains(world))
            .last()
            .map(|element| element.id())
    }

    fn choose_tool(&self, state: EditorState, graph: &mut SchemaGraph, tool: Tool) -> Transition {
        let state = abort_drag(state, graph);
        let tool = match tool {
            Tool::Connect { .. } => Tool::Connect {
                pending_source: None,
            },
            other => other,
        };
        debug!(?tool, "tool chosen");
        Transition::quiet(EditorState { tool, ..state })
    }

    fn primary_down(&self, state: EditorState, graph: &mut SchemaGraph, at: Point) -> Transition {
        let hit = self.hit_test(&state, graph, at);
        match state.tool {
            Tool::Select => {
                let Some(element) = hit.and_then(|id| graph.element(id)) else {
                    return Transition::quiet(EditorState {
                        selection: None,
                        ..state
                    });
                };
                let origin = element.position();
                let world = state.viewport.screen_to_world(at);
                let drag = Drag {
                    element: element.id(),
                    origin,
                    grab_offset: world - origin,
                    current: origin,
                };
                debug!(element = %drag.element, "drag started");
                Transition::quiet(EditorState {
                    selection: Some(drag.element),
                    drag: Some(drag),
                    ..state
                })
            }
            Tool::Place(element_type) => self.place(state, graph, element_type, at),
            Tool::Connect {
                pending_source: None,
            } => match hit {
                Some(source) => Transition::quiet(EditorState {
                    tool: Tool::Connect {
                        pending_source: Some(source),
                    },
                    selection: Some(source),
                    ..state
                }),
                None => Transition::quiet(state),
            },
            Tool::Connect {
                pending_source: Some(source),
            } => match hit {
                Some(target) => self.connect(state, graph, source, target),
                None => Transition::quiet(state),
            },
        }
    }

    fn place(
        &self,
        state: EditorState,
        graph: &mut SchemaGraph,
        element_type: ElementType,
        at: Point,
    ) -> Transition {
        let size = self.config.element_size;
        let world = state.viewport.screen_to_world(at);
        let position = self.layout.place(world, size);
        let intent = match element_type {
            ElementType::Approval => Intent::PlaceApproval {
                name: None,
                at: position,
            },
            element_type => Intent::PlaceElement {
                element_type,
                name: None,
                at: position,
            },
        };
        let state = EditorState {
            tool: Tool::Select,
            ..state
        };
        let transition = self.apply(state, graph, intent);
        match transition.effects.first() {
            Some(Effect::Persist(result)) => {
                let placed = result.delta.added_elements.first().copied();
                Transition {
                    state: EditorState {
                        selection: placed,
                        ..transition.state
                    },
                    effects: transition.effects,
                }
            }
            _ => transition,
        }
    }

    fn connect(
        &self,
        state: EditorState,
        graph: &mut SchemaGraph,
        source: ElementId,
        target: ElementId,
    ) -> Transition {
        let state = EditorState {
            tool: Tool::Select,
            ..state
        };
        if let Err(err) = graph.check_pairing(source, target) {
            return reject(state, err);
        }
        let gate = graph.element(source).is_some_and(|e| e.is(ElementType::Process))
            && graph.element(target).is_some_and(|e| e.is(ElementType::Decision))
            && self.catalog.requires_approval_gate(source);
        let intent = if gate {
            Intent::ConnectApprovalGate {
                source,
                decision: target,
            }
        } else {
            Intent::Connect {
                source,
                target,
                label: None,
                condition: None,
            }
        };
        self.apply(state, graph, intent)
    }

    fn pointer_move(&self, state: EditorState, graph: &mut SchemaGraph, at: Point) -> Transition {
        let mut state = state;
        if let Some(pan) = state.pan {
            state.viewport.pan_by(at - pan.last);
            state.pan = Some(PanGesture { last: at });
        }
        if let Some(mut drag) = state.drag {
            let size = graph
                .element(drag.element)
                .map(|e| e.size())
                .unwrap_or(self.config.element_size);
            let world = state.viewport.screen_to_world(at);
            let position = self.layout.drag_to(world, drag.grab_offset, size);
            if position != drag.current {
                // Live preview only; the move is committed on release.
                if graph.move_element(drag.element, position).is_err() {
                    return Transition::quiet(EditorState { drag: None, ..state });
                }
                drag.current = position;
                state.drag = Some(drag);
            }
        }
        Transition::quiet(state)
    }

    fn finish_drag(&self, state: EditorState, graph: &mut SchemaGraph) -> Transition {
        let Some(drag) = state.drag else {
            return Transition::quiet(state);
        };
        let state = EditorState { drag: None, ..state };
        if drag.current == drag.origin {
            return Transition::quiet(state);
        }
        // Rewind the preview so the committed move records the right undo.
        if let Err(err) = graph.move_element(drag.element, drag.origin) {
            return reject(state, err);
        }
        debug!(element = %drag.element, "drag committed");
        self.apply(
            state,
            graph,
            Intent::MoveElement {
                element: drag.element,
                to: drag.current,
            },
        )
    }
}

fn abort_drag(state: EditorState, graph: &mut SchemaGraph) -> EditorState {
    if let Some(drag) = state.drag {
        // The element may be gone already; then there is nothing to restore.
        let _ = graph.move_element(drag.element, drag.origin);
        debug!(element = %drag.element, "drag aborted");
    }
    EditorState { drag: None, ..state }
}

fn reject(state: EditorState, err: Error) -> Transition {
    warn!(error = %err, "editor action rejected");
    Transition {
        state: EditorState {
            tool: Tool::Select,
            drag: None,
            ..state
        },
        effects: vec![Effect::Notify(err.to_string())],
    }
}
