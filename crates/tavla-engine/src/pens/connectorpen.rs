// Imports
use super::PenBehaviour;
use super::PenStyle;
use super::pensconfig::connectorconfig::ConnectorKind;
use crate::WidgetFlags;
use crate::element::{Body, Connection, Connector, ConnectorStyle, Element};
use crate::engine::EngineViewMut;
use crate::router;
use crate::snap::{self, SnapTarget};
use crate::throttle::Throttle;
use std::time::{Duration, Instant};
use tavla_compose::eventresult::{EventPropagation, EventResult};
use tavla_compose::penevent::{PenEvent, PenProgress};

/// The snap search throttle window while drawing.
const SNAP_SEARCH_WAIT: Duration = Duration::from_millis(32);

#[derive(Debug, Clone)]
enum ConnectorPenState {
    Idle,
    Building {
        start: na::Vector2<f64>,
        start_snap: Option<SnapTarget>,
        end: na::Vector2<f64>,
        end_snap: Option<SnapTarget>,
        /// Element snapshot captured at pointer down; the gesture routes against it.
        elements: Vec<Element>,
    },
}

/// The line / arrow pen. Endpoints snap to nearby shapes while drawing, the preview
/// routes according to the toolbar connector style, and connections are written on
/// commit.
#[derive(Debug)]
pub struct ConnectorPen {
    state: ConnectorPenState,
    snap_throttle: Throttle<Option<SnapTarget>>,
}

impl Default for ConnectorPen {
    fn default() -> Self {
        Self {
            state: ConnectorPenState::Idle,
            snap_throttle: Throttle::new(SNAP_SEARCH_WAIT),
        }
    }
}

impl ConnectorPen {
    /// The preview geometry and committed style for the current drag.
    fn preview(
        style: ConnectorStyle,
        start: na::Vector2<f64>,
        start_snap: Option<&SnapTarget>,
        end: na::Vector2<f64>,
        end_snap: Option<&SnapTarget>,
        elements: &[Element],
    ) -> (Vec<na::Vector2<f64>>, ConnectorStyle) {
        let end_point = end_snap.map(|s| s.point).unwrap_or(end);
        let start_id = start_snap.map(|s| s.element_id.as_str());
        let end_id = end_snap.map(|s| s.element_id.as_str());

        match style {
            ConnectorStyle::Elbow => (
                router::elbow_route_around_obstacles(
                    start, end_point, elements, None, start_id, end_id,
                ),
                ConnectorStyle::Elbow,
            ),
            ConnectorStyle::Curved => (
                router::curved_route_around_obstacles(
                    start, end_point, elements, None, start_id, end_id,
                ),
                ConnectorStyle::Curved,
            ),
            ConnectorStyle::Sharp => {
                if end_snap.is_some_and(|s| s.out_of_line_of_sight) {
                    // previewed and committed as elbow, while the tool style stays sharp
                    (
                        router::elbow_route_around_obstacles(
                            start, end_point, elements, None, start_id, end_id,
                        ),
                        ConnectorStyle::Elbow,
                    )
                } else if start_snap.is_some() && end_snap.is_some() {
                    // dual snap: the routed preview exits orthogonal to the connected sides
                    (
                        router::elbow_route_around_obstacles(
                            start, end_point, elements, None, start_id, end_id,
                        ),
                        ConnectorStyle::Sharp,
                    )
                } else {
                    (vec![start, end_point], ConnectorStyle::Sharp)
                }
            }
        }
    }

    fn build_element(
        points: Vec<na::Vector2<f64>>,
        style: ConnectorStyle,
        start_snap: Option<&SnapTarget>,
        end_snap: Option<&SnapTarget>,
        engine_view: &mut EngineViewMut,
    ) -> Element {
        let config = engine_view.pens_config.connector_config.clone();
        let connector = Connector {
            points,
            style,
            elbow_route: Default::default(),
            start_connection: start_snap
                .map(|s| Connection::new(s.element_id.clone(), s.position)),
            end_connection: end_snap.map(|s| Connection::new(s.element_id.clone(), s.position)),
            arrow_start: config.arrow_start,
            arrow_end: config.arrow_end,
        };
        let body = match config.kind {
            ConnectorKind::Line => Body::Line(connector),
            ConnectorKind::Arrow => Body::Arrow(connector),
        };
        let mut element = Element::new(engine_view.fresh_element_id(), body);
        element.stroke_color = config.stroke.color;
        element.stroke_width = config.stroke.width;
        element.opacity = config.stroke.opacity;
        element
    }
}

impl PenBehaviour for ConnectorPen {
    fn style(&self) -> PenStyle {
        PenStyle::ConnectorPen
    }

    fn deinit(&mut self) -> WidgetFlags {
        self.state = ConnectorPenState::Idle;
        self.snap_throttle.reset();
        WidgetFlags::default()
    }

    fn handle_event(
        &mut self,
        event: PenEvent,
        now: Instant,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags) {
        let mut widget_flags = WidgetFlags::default();
        let snap_distance = snap::SNAP_DISTANCE / engine_view.camera.zoom();
        let connector_style = engine_view.pens_config.connector_config.connector_style;

        let event_result = match (&mut self.state, event) {
            (state @ ConnectorPenState::Idle, PenEvent::Down { element, .. }) => {
                let elements = engine_view.store.elements();
                // the start point snaps to a nearby shape and is remembered for commit
                let start_snap = snap::find_nearest_snap_target(
                    element.pos,
                    &elements,
                    None,
                    snap_distance,
                    connector_style,
                    None,
                );
                let start = start_snap.as_ref().map(|s| s.point).unwrap_or(element.pos);
                *state = ConnectorPenState::Building {
                    start,
                    start_snap,
                    end: element.pos,
                    end_snap: None,
                    elements,
                };
                widget_flags.redraw = true;
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (
                ConnectorPenState::Building {
                    start,
                    start_snap,
                    end,
                    end_snap,
                    elements,
                },
                PenEvent::Down { element, .. },
            ) => {
                *end = element.pos;
                let search: &[Element] = elements;
                let start_point = *start;
                *end_snap = self.snap_throttle.run(now, || {
                    snap::find_nearest_snap_target(
                        element.pos,
                        search,
                        None,
                        snap_distance,
                        connector_style,
                        Some(start_point),
                    )
                });

                let (points, style) = Self::preview(
                    connector_style,
                    *start,
                    start_snap.as_ref(),
                    *end,
                    end_snap.as_ref(),
                    search,
                );
                let preview_element = Self::build_element(
                    points,
                    style,
                    start_snap.as_ref(),
                    end_snap.as_ref(),
                    engine_view,
                );
                engine_view
                    .collab
                    .update_drawing_element(Some(&preview_element));
                widget_flags |= engine_view.camera.nudge_w_pos(element.pos);
                widget_flags.redraw = true;

                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (
                ConnectorPenState::Building {
                    start,
                    start_snap,
                    end_snap,
                    elements,
                    ..
                },
                PenEvent::Up { element, .. },
            ) => {
                // final unthrottled snap search
                let search: &[Element] = elements;
                let start_point = *start;
                *end_snap = self.snap_throttle.flush(now, || {
                    snap::find_nearest_snap_target(
                        element.pos,
                        search,
                        None,
                        snap_distance,
                        connector_style,
                        Some(start_point),
                    )
                });

                let (points, style) = Self::preview(
                    connector_style,
                    *start,
                    start_snap.as_ref(),
                    element.pos,
                    end_snap.as_ref(),
                    search,
                );

                let commit = points.len() >= 2
                    && (points[0] - points[points.len() - 1]).magnitude() > f64::EPSILON;
                if commit {
                    let connector = Self::build_element(
                        points,
                        style,
                        start_snap.as_ref(),
                        end_snap.as_ref(),
                        engine_view,
                    );
                    if let Err(e) = engine_view.store.add(connector) {
                        tracing::error!("Failed to add connector to the store, Err: {e:?}");
                    } else {
                        widget_flags.store_modified = true;
                    }
                }

                engine_view.collab.update_drawing_element(None);
                self.state = ConnectorPenState::Idle;
                self.snap_throttle.reset();
                widget_flags.redraw = true;

                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::Finished,
                }
            }
            (ConnectorPenState::Building { .. }, PenEvent::Cancel) => {
                self.state = ConnectorPenState::Idle;
                self.snap_throttle.reset();
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
