//! Interaction controller - pointer events to state transitions
//!
//! | event                         | transition                                  |
//! |-------------------------------|---------------------------------------------|
//! | move over nothing             | idle                                        |
//! | move over building b          | hovering(b), details change                 |
//! | click over building b         | selected = b                                |
//! | click over nothing            | unchanged                                   |
//! | wheel                         | zoom about pointer                          |
//! | middle press                  | panning                                     |
//! | move while panning            | offset follows pointer delta                |
//! | middle release / leave canvas | idle                                        |
//!
//! Selection is kept next to the pointer state so hovering another building
//! does not drop it. Reload and strategy changes call `reset`.

use serde::Serialize;

use crate::config::ViewConfig;
use crate::model::ClassRef;
use crate::projection::ScreenPoint;
use crate::render::{hit_test, HitBox};
use crate::view::ViewTransform;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum PointerState {
    #[default]
    Idle,
    Hovering(ClassRef),
    Panning { last: ScreenPoint },
}

impl PointerState {
    pub fn hovered(self) -> Option<ClassRef> {
        match self {
            PointerState::Hovering(class) => Some(class),
            _ => None,
        }
    }
}

/// The four observable phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Hovering(ClassRef),
    Selected(ClassRef),
    Panning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Canvas-local input events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMoved(ScreenPoint),
    Clicked(ScreenPoint),
    /// Positive steps zoom in
    Wheel { at: ScreenPoint, steps: f64 },
    ButtonPressed { button: PointerButton, at: ScreenPoint },
    ButtonReleased { button: PointerButton },
    PointerLeft,
}

/// What the surface should refresh after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Response {
    pub redraw: bool,
    pub details_changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct InteractionState {
    pub pointer: PointerState,
    pub selected: Option<ClassRef>,
}

impl InteractionState {
    pub fn hovered(&self) -> Option<ClassRef> {
        self.pointer.hovered()
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.pointer, PointerState::Panning { .. })
    }

    pub fn phase(&self) -> Phase {
        match (self.pointer, self.selected) {
            (PointerState::Panning { .. }, _) => Phase::Panning,
            (PointerState::Hovering(class), _) => Phase::Hovering(class),
            (PointerState::Idle, Some(class)) => Phase::Selected(class),
            (PointerState::Idle, None) => Phase::Idle,
        }
    }

    /// Building shown in the details panel: hovered first, then selected
    pub fn focus(&self) -> Option<ClassRef> {
        self.hovered().or(self.selected)
    }

    /// Back to idle with nothing selected
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn handle(
        &mut self,
        event: InputEvent,
        hit_boxes: &[HitBox],
        view: &mut ViewTransform,
        cfg: &ViewConfig,
    ) -> Response {
        match event {
            InputEvent::PointerMoved(at) => {
                if let PointerState::Panning { last } = self.pointer {
                    view.pan(at.x - last.x, at.y - last.y);
                    self.pointer = PointerState::Panning { last: at };
                    return Response { redraw: true, details_changed: false };
                }
                let next = match hit_test(hit_boxes, at) {
                    Some(class) => PointerState::Hovering(class),
                    None => PointerState::Idle,
                };
                self.transition(next)
            }
            InputEvent::Clicked(at) => match hit_test(hit_boxes, at) {
                Some(class) => {
                    let changed = self.selected != Some(class);
                    self.selected = Some(class);
                    if !self.is_panning() {
                        self.pointer = PointerState::Hovering(class);
                    }
                    if changed {
                        tracing::debug!("Selected {:?}", class);
                    }
                    Response { redraw: changed, details_changed: changed }
                }
                None => Response::default(),
            },
            InputEvent::Wheel { at, steps } => {
                view.zoom_at(at, steps, cfg);
                Response { redraw: true, details_changed: false }
            }
            InputEvent::ButtonPressed { button: PointerButton::Middle, at } => {
                let had_hover = self.hovered().is_some();
                self.pointer = PointerState::Panning { last: at };
                Response { redraw: had_hover, details_changed: had_hover }
            }
            InputEvent::ButtonReleased { button: PointerButton::Middle } => {
                if self.is_panning() {
                    self.pointer = PointerState::Idle;
                }
                Response::default()
            }
            InputEvent::ButtonPressed { .. } | InputEvent::ButtonReleased { .. } => Response::default(),
            InputEvent::PointerLeft => self.transition(PointerState::Idle),
        }
    }

    fn transition(&mut self, next: PointerState) -> Response {
        if self.pointer == next {
            return Response::default();
        }
        let hover_changed = self.pointer.hovered() != next.hovered();
        self.pointer = next;
        Response { redraw: hover_changed, details_changed: hover_changed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ScreenRect;

    fn boxes() -> Vec<HitBox> {
        vec![
            HitBox {
                class: ClassRef::new(0, 0),
                bounds: ScreenRect { min_x: 0.0, min_y: 0.0, max_x: 10.0, max_y: 10.0 },
                depth_key: 1.0,
            },
            HitBox {
                class: ClassRef::new(0, 1),
                bounds: ScreenRect { min_x: 20.0, min_y: 0.0, max_x: 30.0, max_y: 10.0 },
                depth_key: 2.0,
            },
        ]
    }

    fn run(state: &mut InteractionState, view: &mut ViewTransform, event: InputEvent) -> Response {
        state.handle(event, &boxes(), view, &ViewConfig::default())
    }

    #[test]
    fn test_hover_then_idle() {
        let mut state = InteractionState::default();
        let mut view = ViewTransform::default();

        let r = run(&mut state, &mut view, InputEvent::PointerMoved(ScreenPoint::new(5.0, 5.0)));
        assert_eq!(state.phase(), Phase::Hovering(ClassRef::new(0, 0)));
        assert!(r.details_changed);

        let r = run(&mut state, &mut view, InputEvent::PointerMoved(ScreenPoint::new(6.0, 5.0)));
        assert_eq!(r, Response::default());

        run(&mut state, &mut view, InputEvent::PointerMoved(ScreenPoint::new(15.0, 5.0)));
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_click_selects_and_persists() {
        let mut state = InteractionState::default();
        let mut view = ViewTransform::default();
        let a = ClassRef::new(0, 0);
        let b = ClassRef::new(0, 1);

        run(&mut state, &mut view, InputEvent::Clicked(ScreenPoint::new(5.0, 5.0)));
        assert_eq!(state.selected, Some(a));

        // Hovering elsewhere keeps the selection
        run(&mut state, &mut view, InputEvent::PointerMoved(ScreenPoint::new(25.0, 5.0)));
        assert_eq!(state.selected, Some(a));
        assert_eq!(state.hovered(), Some(b));
        assert_eq!(state.focus(), Some(b));

        // Clicking empty space keeps it too
        run(&mut state, &mut view, InputEvent::Clicked(ScreenPoint::new(50.0, 50.0)));
        assert_eq!(state.selected, Some(a));

        run(&mut state, &mut view, InputEvent::PointerMoved(ScreenPoint::new(50.0, 50.0)));
        assert_eq!(state.phase(), Phase::Selected(a));

        run(&mut state, &mut view, InputEvent::Clicked(ScreenPoint::new(25.0, 5.0)));
        assert_eq!(state.selected, Some(b));

        state.reset();
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.selected, None);
    }

    #[test]
    fn test_middle_drag_pans() {
        let mut state = InteractionState::default();
        let mut view = ViewTransform::default();

        run(
            &mut state,
            &mut view,
            InputEvent::ButtonPressed { button: PointerButton::Middle, at: ScreenPoint::new(100.0, 100.0) },
        );
        assert_eq!(state.phase(), Phase::Panning);

        // Over a building, but panning suppresses hover
        run(&mut state, &mut view, InputEvent::PointerMoved(ScreenPoint::new(5.0, 5.0)));
        assert_eq!((view.offset_x, view.offset_y), (-95.0, -95.0));
        assert_eq!(state.phase(), Phase::Panning);

        run(&mut state, &mut view, InputEvent::ButtonReleased { button: PointerButton::Middle });
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_leaving_canvas_ends_pan() {
        let mut state = InteractionState::default();
        let mut view = ViewTransform::default();
        run(
            &mut state,
            &mut view,
            InputEvent::ButtonPressed { button: PointerButton::Middle, at: ScreenPoint::new(0.0, 0.0) },
        );
        run(&mut state, &mut view, InputEvent::PointerLeft);
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_wheel_zooms_regardless_of_state() {
        let mut state = InteractionState::default();
        let mut view = ViewTransform::default();
        run(&mut state, &mut view, InputEvent::Clicked(ScreenPoint::new(5.0, 5.0)));

        let r = run(&mut state, &mut view, InputEvent::Wheel { at: ScreenPoint::new(5.0, 5.0), steps: 1.0 });
        assert!(r.redraw);
        assert!((view.scale - 1.1).abs() < 1e-9);
        assert_eq!(state.selected, Some(ClassRef::new(0, 0)));
    }

    #[test]
    fn test_other_buttons_are_ignored() {
        let mut state = InteractionState::default();
        let mut view = ViewTransform::default();
        let r = run(
            &mut state,
            &mut view,
            InputEvent::ButtonPressed { button: PointerButton::Secondary, at: ScreenPoint::new(0.0, 0.0) },
        );
        assert_eq!(r, Response::default());
        assert_eq!(state.phase(), Phase::Idle);
    }
}
