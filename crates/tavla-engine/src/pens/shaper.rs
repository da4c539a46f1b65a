// Imports
use super::PenBehaviour;
use super::PenStyle;
use super::pensconfig::shaperconfig::ShapeKind;
use crate::WidgetFlags;
use crate::element::{Body, BoxGeometry, Element, Frame};
use crate::engine::EngineViewMut;
use crate::pens::pensconfig::ShaperConfig;
use p2d::bounding_volume::Aabb;
use std::time::Instant;
use tavla_compose::eventresult::{EventPropagation, EventResult};
use tavla_compose::ext::AabbExt;
use tavla_compose::penevent::{ModifierKey, PenEvent, PenProgress};

#[derive(Debug, Clone, Copy)]
enum ShaperState {
    Idle,
    Building {
        start: na::Vector2<f64>,
        current: na::Vector2<f64>,
    },
}

/// The shape pen, drawing rectangles, diamonds, ellipses and frames. The element is
/// created on pointer up, when the dragged box exceeds the minimum commit size.
#[derive(Debug, Clone)]
pub struct Shaper {
    state: ShaperState,
}

impl Default for Shaper {
    fn default() -> Self {
        Self {
            state: ShaperState::Idle,
        }
    }
}

impl Shaper {
    /// The dragged box, shift constraining to a square.
    fn build_bounds(
        start: na::Vector2<f64>,
        current: na::Vector2<f64>,
        constrain_square: bool,
    ) -> Aabb {
        let mut current = current;
        if constrain_square {
            let delta = current - start;
            let side = delta[0].abs().max(delta[1].abs());
            current = start + na::vector![side * delta[0].signum(), side * delta[1].signum()];
        }
        Aabb::new_positive(start.into(), current.into())
    }

    fn build_element(&self, bounds: Aabb, engine_view: &mut EngineViewMut) -> Element {
        let config = &engine_view.pens_config.shaper_config;
        let geometry = BoxGeometry::new(
            bounds.mins[0],
            bounds.mins[1],
            bounds.extents()[0],
            bounds.extents()[1],
        );
        let body = match config.kind {
            ShapeKind::Rectangle => Body::Rectangle(geometry),
            ShapeKind::Diamond => Body::Diamond(geometry),
            ShapeKind::Ellipse => Body::Ellipse(geometry),
            ShapeKind::Frame => Body::Frame(Frame {
                geometry,
                label: String::new(),
            }),
        };
        let stroke = engine_view.pens_config.shaper_config.stroke.clone();
        let mut element = Element::new(engine_view.fresh_element_id(), body);
        element.stroke_color = stroke.color;
        element.stroke_width = stroke.width;
        element.opacity = stroke.opacity;
        element
    }
}

impl PenBehaviour for Shaper {
    fn style(&self) -> PenStyle {
        PenStyle::Shaper
    }

    fn deinit(&mut self) -> WidgetFlags {
        self.state = ShaperState::Idle;
        WidgetFlags::default()
    }

    fn handle_event(
        &mut self,
        event: PenEvent,
        _now: Instant,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags) {
        let mut widget_flags = WidgetFlags::default();

        let event_result = match (&mut self.state, event) {
            (ShaperState::Idle, PenEvent::Down { element, .. }) => {
                self.state = ShaperState::Building {
                    start: element.pos,
                    current: element.pos,
                };
                widget_flags.redraw = true;
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (
                ShaperState::Building { start, current },
                PenEvent::Down {
                    element,
                    modifier_keys,
                },
            ) => {
                *current = element.pos;
                let bounds = Self::build_bounds(
                    *start,
                    *current,
                    modifier_keys.contains(&ModifierKey::KeyboardShift),
                );
                let preview = self.build_element(bounds, engine_view);
                engine_view.collab.update_drawing_element(Some(&preview));
                widget_flags |= engine_view.camera.nudge_w_pos(element.pos);
                widget_flags.redraw = true;
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (
                ShaperState::Building { start, .. },
                PenEvent::Up {
                    element,
                    modifier_keys,
                },
            ) => {
                let bounds = Self::build_bounds(
                    *start,
                    element.pos,
                    modifier_keys.contains(&ModifierKey::KeyboardShift),
                );
                self.state = ShaperState::Idle;
                engine_view.collab.update_drawing_element(None);

                if bounds.extents()[0] > ShaperConfig::MIN_COMMIT_SIZE
                    && bounds.extents()[1] > ShaperConfig::MIN_COMMIT_SIZE
                {
                    let shape = self.build_element(bounds, engine_view);
                    if let Err(e) = engine_view.store.add(shape) {
                        tracing::error!("Failed to add shape to the store, Err: {e:?}");
                    } else {
                        widget_flags.store_modified = true;
                    }
                }
                widget_flags.redraw = true;

                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::Finished,
                }
            }
            (ShaperState::Building { .. }, PenEvent::Cancel) => {
                self.state = ShaperState::Idle;
                engine_view.collab.update_drawing_element(None);
                widget_flags.redraw = true;
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::Finished,
                }
            }
            (_, _) => EventResult {
                handled: false,
                propagate: EventPropagation::Proceed,
                progress: PenProgress::Idle,
            },
        };

        (event_result, widget_flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_constrains_to_square() {
        let bounds = Shaper::build_bounds(na::vector![10.0, 10.0], na::vector![50.0, 20.0], true);
        assert_eq!(bounds.extents(), na::vector![40.0, 40.0]);
        // dragging up-left mirrors the square
        let bounds =
            Shaper::build_bounds(na::vector![10.0, 10.0], na::vector![-30.0, 0.0], true);
        assert_eq!(bounds.mins, na::point![-30.0, -30.0]);
        assert_eq!(bounds.maxs, na::point![10.0, 10.0]);
    }
}
