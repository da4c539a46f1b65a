// Imports
use super::reshape;
use super::{ModifyState, Selector, SelectorState};
use crate::WidgetFlags;
use crate::connect::{self, ConnectorUpdate};
use crate::element::{Body, ElbowRoute, Element, ElementId};
use crate::engine::EngineViewMut;
use crate::pens::pensconfig::selectorconfig::SelectorStyle;
use crate::ports::{ElementPatch, StorePort};
use crate::throttle::Throttle;
use p2d::bounding_volume::Aabb;
use std::collections::HashSet;
use std::time::Instant;
use tavla_compose::eventresult::{EventPropagation, EventResult};
use tavla_compose::ext::AabbExt;
use tavla_compose::geometry;
use tavla_compose::handles::HandlePosition;
use tavla_compose::penevent::{KeyboardKey, ModifierKey, PenProgress, PointerElement};

fn in_progress() -> EventResult<PenProgress> {
    EventResult {
        handled: true,
        propagate: EventPropagation::Stop,
        progress: PenProgress::InProgress,
    }
}

fn finished() -> EventResult<PenProgress> {
    EventResult {
        handled: true,
        propagate: EventPropagation::Stop,
        progress: PenProgress::Finished,
    }
}

fn idle() -> EventResult<PenProgress> {
    EventResult {
        handled: false,
        propagate: EventPropagation::Proceed,
        progress: PenProgress::Idle,
    }
}

/// The geometry patch mirroring the element's current bounds / points / rotation.
fn geometry_patch(element: &Element) -> ElementPatch {
    let mut patch = ElementPatch {
        rotation: Some(element.rotation),
        ..Default::default()
    };
    if let Some(points) = element.points() {
        patch.points = Some(points.to_vec());
    } else if let Some(geometry) = element.box_geometry() {
        patch.x = Some(geometry.x);
        patch.y = Some(geometry.y);
        patch.width = Some(geometry.width);
        patch.height = Some(geometry.height);
    }
    patch
}

fn followup_patch(update: &ConnectorUpdate) -> ElementPatch {
    ElementPatch {
        points: Some(update.points.clone()),
        connector_style: update.style,
        elbow_route: update.clear_elbow_route.then_some(ElbowRoute::Unset),
        ..Default::default()
    }
}

/// Send the moved elements plus their throttled connector follow-ups as one batch.
fn commit_transform(
    working: &[Element],
    moved_ids: &HashSet<ElementId>,
    throttle: Option<(&mut Throttle<Vec<ConnectorUpdate>>, Instant)>,
    store: &mut dyn StorePort,
) -> Result<(), crate::ports::StoreError> {
    let followups = match throttle {
        Some((throttle, now)) => {
            throttle.run(now, || connect::connected_connector_updates(moved_ids, working))
        }
        None => connect::connected_connector_updates(moved_ids, working),
    };

    let mut patches: Vec<(ElementId, ElementPatch)> = working
        .iter()
        .filter(|e| moved_ids.contains(&e.id))
        .map(|e| (e.id.clone(), geometry_patch(e)))
        .collect();
    // follow-ups already covered by the moved set are skipped
    patches.extend(
        followups
            .iter()
            .filter(|f| !moved_ids.contains(&f.id))
            .map(|f| (f.id.clone(), followup_patch(f))),
    );

    store.batch_update(patches)
}

impl Selector {
    pub(super) fn handle_pen_event_down(
        &mut self,
        element: PointerElement,
        modifier_keys: Vec<ModifierKey>,
        now: Instant,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags) {
        let mut widget_flags = WidgetFlags::default();
        let zoom = engine_view.camera.zoom();
        let pos = element.pos;

        let event_result = match &mut self.state {
            SelectorState::Idle => {
                return self.begin_gesture(element, modifier_keys, engine_view);
            }
            SelectorState::Selecting { path } => {
                match engine_view.pens_config.selector_config.style {
                    SelectorStyle::Rectangle => {
                        // the path stays [start, current]
                        path.truncate(1);
                        path.push(pos);
                    }
                    SelectorStyle::Lasso => {
                        if path
                            .last()
                            .map_or(true, |last| {
                                (pos - last).magnitude() >= Self::LASSO_MIN_SAMPLE_DIST
                            })
                        {
                            path.push(pos);
                        }
                    }
                }
                let live = Self::selection_from_path(
                    path,
                    engine_view.pens_config.selector_config.style,
                    &engine_view.store.elements(),
                    &engine_view.store.remotely_selected_ids(),
                );
                engine_view.collab.update_selected(&live);
                widget_flags |= engine_view.camera.nudge_w_pos(pos);
                widget_flags.redraw = true;
                in_progress()
            }
            SelectorState::ModifySelection {
                modify_state,
                selection,
                selection_bounds,
            } => match modify_state {
                ModifyState::Up | ModifyState::Hover(_) => {
                    return self.begin_gesture(element, modifier_keys, engine_view);
                }
                ModifyState::Translate {
                    start_pos,
                    current_pos,
                    has_drag_moved,
                } => {
                    let offset = pos - *start_pos;
                    *current_pos = pos;
                    if !*has_drag_moved
                        && offset.magnitude() < Self::DRAG_MOVE_THRESHOLD / zoom
                    {
                        in_progress()
                    } else {
                        *has_drag_moved = true;
                        let moved_ids: HashSet<ElementId> = selection.iter().cloned().collect();
                        let mut working = self.original_elements.clone();
                        for e in working.iter_mut() {
                            if moved_ids.contains(&e.id) {
                                e.translate(offset);
                            }
                        }
                        match commit_transform(
                            &working,
                            &moved_ids,
                            Some((&mut self.followup_throttle, now)),
                            engine_view.store,
                        ) {
                            Ok(()) => {
                                if let Some(bounds) = Self::bounds_for(&working, selection) {
                                    *selection_bounds = bounds;
                                }
                                widget_flags.store_modified = true;
                                widget_flags |= engine_view.camera.nudge_w_pos(pos);
                                widget_flags.redraw = true;
                                in_progress()
                            }
                            Err(e) => {
                                tracing::error!(
                                    "Translating the selection failed, aborting the gesture, Err: {e:?}"
                                );
                                *modify_state = ModifyState::Up;
                                finished()
                            }
                        }
                    }
                }
                ModifyState::Rotate {
                    element_id,
                    rotation_center,
                    start_pointer_angle,
                    start_rotation,
                } => {
                    let vec = pos - rotation_center.coords;
                    let pointer_angle = vec[1].atan2(vec[0]).to_degrees();
                    let mut rotation = *start_rotation + (pointer_angle - *start_pointer_angle);
                    if modifier_keys.contains(&ModifierKey::KeyboardShift) {
                        rotation = (rotation / Self::ROTATE_SNAP_DEG).round()
                            * Self::ROTATE_SNAP_DEG;
                    }

                    let moved_ids: HashSet<ElementId> =
                        std::iter::once(element_id.clone()).collect();
                    let mut working = self.original_elements.clone();
                    if let Some(e) = working.iter_mut().find(|e| &e.id == element_id) {
                        e.rotation = rotation;
                    }
                    match commit_transform(
                        &working,
                        &moved_ids,
                        Some((&mut self.followup_throttle, now)),
                        engine_view.store,
                    ) {
                        Ok(()) => {
                            if let Some(bounds) = Self::bounds_for(&working, selection) {
                                *selection_bounds = bounds;
                            }
                            widget_flags.store_modified = true;
                            widget_flags.redraw = true;
                            in_progress()
                        }
                        Err(e) => {
                            tracing::error!(
                                "Rotating the selection failed, aborting the gesture, Err: {e:?}"
                            );
                            *modify_state = ModifyState::Up;
                            finished()
                        }
                    }
                }
                ModifyState::Resize {
                    from_handle,
                    start_bounds,
                    ..
                } => {
                    let lock_ratio = modifier_keys.contains(&ModifierKey::KeyboardShift)
                        || engine_view
                            .pens_config
                            .selector_config
                            .resize_lock_aspectratio;
                    let from_handle = *from_handle;
                    let start_bounds = *start_bounds;

                    let moved_ids: HashSet<ElementId> = selection.iter().cloned().collect();
                    let mut working = self.original_elements.clone();
                    Self::apply_resize(
                        &mut working,
                        &self.original_selected,
                        from_handle,
                        start_bounds,
                        pos,
                        lock_ratio,
                        engine_view,
                    );
                    match commit_transform(
                        &working,
                        &moved_ids,
                        Some((&mut self.followup_throttle, now)),
                        engine_view.store,
                    ) {
                        Ok(()) => {
                            if let Some(bounds) = Self::bounds_for(&working, selection) {
                                *selection_bounds = bounds;
                            }
                            widget_flags.store_modified = true;
                            widget_flags |= engine_view.camera.nudge_w_pos(pos);
                            widget_flags.redraw = true;
                            in_progress()
                        }
                        Err(e) => {
                            tracing::error!(
                                "Resizing the selection failed, aborting the gesture, Err: {e:?}"
                            );
                            *modify_state = ModifyState::Up;
                            finished()
                        }
                    }
                }
                ModifyState::ReshapeConnector(drag) => {
                    drag.apply_move(pos, &self.original_elements, zoom);
                    match engine_view.store.update(
                        &drag.connector_id,
                        ElementPatch::from_points(drag.points.clone()),
                    ) {
                        Ok(()) => {
                            widget_flags.store_modified = true;
                            widget_flags.redraw = true;
                            in_progress()
                        }
                        Err(e) => {
                            tracing::error!(
                                "Reshaping the connector failed, aborting the gesture, Err: {e:?}"
                            );
                            *modify_state = ModifyState::Up;
                            finished()
                        }
                    }
                }
            },
        };

        (event_result, widget_flags)
    }

    pub(super) fn handle_pen_event_up(
        &mut self,
        element: PointerElement,
        _modifier_keys: Vec<ModifierKey>,
        now: Instant,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags) {
        let mut widget_flags = WidgetFlags::default();
        let zoom = engine_view.camera.zoom();

        let event_result = match &mut self.state {
            SelectorState::Idle => idle(),
            SelectorState::Selecting { path } => {
                let style = engine_view.pens_config.selector_config.style;
                let committable = match style {
                    SelectorStyle::Rectangle => {
                        let bounds =
                            Aabb::new_positive(path[0].into(), element.pos.into());
                        bounds.extents().amax() >= Self::BOX_SELECT_MIN_SIZE
                    }
                    SelectorStyle::Lasso => path.len() >= Self::LASSO_MIN_POINTS,
                };

                let selection = if committable {
                    Self::selection_from_path(
                        path,
                        style,
                        &engine_view.store.elements(),
                        &engine_view.store.remotely_selected_ids(),
                    )
                } else {
                    Vec::new()
                };

                widget_flags.selection_changed = true;
                widget_flags.redraw = true;
                engine_view.collab.update_selected(&selection);

                if selection.is_empty() {
                    self.state = SelectorState::Idle;
                    finished()
                } else {
                    let selection_bounds =
                        Self::bounds_for(&engine_view.store.elements(), &selection)
                            .unwrap_or_else(Aabb::new_zero);
                    self.state = SelectorState::ModifySelection {
                        modify_state: ModifyState::Up,
                        selection,
                        selection_bounds,
                    };
                    in_progress()
                }
            }
            SelectorState::ModifySelection {
                modify_state,
                selection,
                selection_bounds,
            } => {
                match modify_state {
                    ModifyState::Translate {
                        has_drag_moved: true,
                        start_pos,
                        ..
                    } => {
                        // the unthrottled follow-up pass runs once on release
                        let offset = element.pos - *start_pos;
                        let moved_ids: HashSet<ElementId> =
                            selection.iter().cloned().collect();
                        let mut working = self.original_elements.clone();
                        for e in working.iter_mut() {
                            if moved_ids.contains(&e.id) {
                                e.translate(offset);
                            }
                        }
                        if let Err(e) =
                            commit_transform(&working, &moved_ids, None, engine_view.store)
                        {
                            tracing::error!("Final translate commit failed, Err: {e:?}");
                        } else {
                            widget_flags.store_modified = true;
                        }
                        if let Some(bounds) = Self::bounds_for(&working, selection) {
                            *selection_bounds = bounds;
                        }
                    }
                    ModifyState::Rotate { .. } | ModifyState::Resize { .. } => {
                        // geometry was already written during the moves; run the final
                        // unthrottled follow-up pass against the current store state
                        let moved_ids: HashSet<ElementId> =
                            selection.iter().cloned().collect();
                        let working = engine_view.store.elements();
                        if let Err(e) =
                            commit_transform(&working, &moved_ids, None, engine_view.store)
                        {
                            tracing::error!("Final transform commit failed, Err: {e:?}");
                        } else {
                            widget_flags.store_modified = true;
                        }
                        if let Some(bounds) = Self::bounds_for(&working, selection) {
                            *selection_bounds = bounds;
                        }
                    }
                    ModifyState::ReshapeConnector(drag) => {
                        let patch = drag.clone().commit(zoom);
                        if let Err(e) = engine_view.store.update(&drag.connector_id, patch) {
                            tracing::error!("Committing the connector reshape failed, Err: {e:?}");
                        } else {
                            widget_flags.store_modified = true;
                        }
                        if let Some(bounds) =
                            Self::bounds_for(&engine_view.store.elements(), selection)
                        {
                            *selection_bounds = bounds;
                        }
                    }
                    _ => {}
                }

                *modify_state = ModifyState::Up;
                self.followup_throttle.reset();
                widget_flags.redraw = true;
                in_progress()
            }
        };

        (event_result, widget_flags)
    }

    pub(super) fn handle_pen_event_proximity(
        &mut self,
        element: PointerElement,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags) {
        let mut widget_flags = WidgetFlags::default();
        let zoom = engine_view.camera.zoom();

        if let SelectorState::ModifySelection {
            modify_state,
            selection,
            selection_bounds,
        } = &mut self.state
        {
            if matches!(modify_state, ModifyState::Up | ModifyState::Hover(_)) {
                *modify_state = ModifyState::Hover(element.pos);
                let rotation =
                    Self::selection_rotation(&engine_view.store.elements(), selection);
                let multi = selection.len() > 1;
                if let Some(handle) = Self::hit_resize_handle(
                    element.pos,
                    *selection_bounds,
                    rotation,
                    multi,
                    zoom,
                ) {
                    widget_flags.cursor = Some(handle.resize_cursor(rotation));
                } else if !multi
                    && Self::hit_rotate_handle(element.pos, *selection_bounds, rotation, zoom)
                {
                    widget_flags.cursor = Some("grab");
                } else {
                    widget_flags.cursor = Some("default");
                }
            }
        }

        (
            EventResult {
                handled: false,
                propagate: EventPropagation::Proceed,
                progress: PenProgress::Idle,
            },
            widget_flags,
        )
    }

    pub(super) fn handle_pen_event_keypressed(
        &mut self,
        keyboard_key: KeyboardKey,
        _modifier_keys: Vec<ModifierKey>,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags) {
        let mut widget_flags = WidgetFlags::default();

        let event_result = match (&mut self.state, keyboard_key) {
            (
                SelectorState::ModifySelection { selection, .. },
                KeyboardKey::Delete | KeyboardKey::BackSpace,
            ) => {
                if let Err(e) = engine_view.store.delete_many(selection) {
                    tracing::error!("Deleting the selection failed, Err: {e:?}");
                } else {
                    widget_flags.store_modified = true;
                }
                engine_view.collab.update_selected(&[]);
                widget_flags.selection_changed = true;
                widget_flags.redraw = true;
                self.state = SelectorState::Idle;
                finished()
            }
            (SelectorState::ModifySelection { .. } | SelectorState::Selecting { .. },
                KeyboardKey::Escape) => {
                engine_view.collab.update_selected(&[]);
                widget_flags.selection_changed = true;
                widget_flags.redraw = true;
                self.state = SelectorState::Idle;
                finished()
            }
            _ => idle(),
        };

        (event_result, widget_flags)
    }

    pub(super) fn handle_pen_event_cancel(&mut self) -> (EventResult<PenProgress>, WidgetFlags) {
        let mut widget_flags = WidgetFlags::default();
        widget_flags.redraw = true;
        self.state = SelectorState::Idle;
        self.followup_throttle.reset();
        (finished(), widget_flags)
    }

    /// Pointer down outside of an active drag: hit-test handles, elements, frames and
    /// empty canvas, and start the matching gesture.
    fn begin_gesture(
        &mut self,
        element: PointerElement,
        _modifier_keys: Vec<ModifierKey>,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags) {
        let mut widget_flags = WidgetFlags::default();
        let zoom = engine_view.camera.zoom();
        let pos = element.pos;
        let elements = engine_view.store.elements();
        let remote = engine_view.store.remotely_selected_ids();

        // double click on a text element hands it to the text editor
        if element.click_count >= 2 {
            if let Some(hit) = Self::topmost_element_at(&elements, pos, &remote, zoom) {
                if matches!(hit.body, Body::Text(_)) {
                    widget_flags.edit_text = Some(hit.id.clone());
                    return (finished(), widget_flags);
                }
            }
        }

        // handles of an existing selection
        if let SelectorState::ModifySelection {
            modify_state,
            selection,
            selection_bounds,
        } = &mut self.state
        {
            let rotation = Self::selection_rotation(&elements, selection);
            let multi = selection.len() > 1;

            if !multi && Self::hit_rotate_handle(pos, *selection_bounds, rotation, zoom) {
                let element_id = selection[0].clone();
                if let Some(e) = elements.iter().find(|e| e.id == element_id) {
                    let rotation_center: na::Point2<f64> = e.bounds().center();
                    let vec = pos - rotation_center.coords;
                    self.original_elements = elements.clone();
                    self.original_selected =
                        vec_selected(&elements, std::slice::from_ref(&element_id));
                    engine_view.store.on_start_transform();
                    *modify_state = ModifyState::Rotate {
                        element_id,
                        rotation_center,
                        start_pointer_angle: vec[1].atan2(vec[0]).to_degrees(),
                        start_rotation: e.rotation,
                    };
                    return (in_progress(), widget_flags);
                }
            }

            let handle = Self::hit_resize_handle(pos, *selection_bounds, rotation, multi, zoom)
                .or_else(|| {
                    (!multi)
                        .then(|| Self::hit_edge_handle(pos, *selection_bounds, rotation, zoom))
                        .flatten()
                });
            if let Some(from_handle) = handle {
                // single selections resize in the element's own frame, multi
                // selections around the merged selection bounds
                let single_connector = selection.len() == 1
                    && elements
                        .iter()
                        .find(|e| Some(&e.id) == selection.first())
                        .is_some_and(|e| e.is_connector());
                if !single_connector {
                    let start_bounds = if multi {
                        *selection_bounds
                    } else {
                        elements
                            .iter()
                            .find(|e| Some(&e.id) == selection.first())
                            .map(|e| e.bounds())
                            .unwrap_or(*selection_bounds)
                    };
                    self.original_elements = elements.clone();
                    self.original_selected = vec_selected(&elements, selection);
                    engine_view.store.on_start_transform();
                    *modify_state = ModifyState::Resize {
                        from_handle,
                        start_bounds,
                        start_pos: pos,
                    };
                    return (in_progress(), widget_flags);
                }
            }

            // reshape handles of a single selected connector
            if !multi {
                if let Some(e) = elements.iter().find(|e| Some(&e.id) == selection.first()) {
                    if e.is_connector() {
                        if let Some(kind) = reshape::hit_connector_handle(e, pos, zoom) {
                            self.original_elements = elements.clone();
                            self.original_selected = vec_selected(&elements, selection);
                            engine_view.store.on_start_transform();
                            *modify_state =
                                ModifyState::ReshapeConnector(reshape::begin_drag(e, kind));
                            return (in_progress(), widget_flags);
                        }
                    }
                }
            }

            // clicking a selected element inside the frame starts translating
            let local = geometry::rotate_point_about(
                pos,
                selection_bounds.center().coords,
                -rotation,
            );
            let inside = local[0] >= selection_bounds.mins[0]
                && local[0] <= selection_bounds.maxs[0]
                && local[1] >= selection_bounds.mins[1]
                && local[1] <= selection_bounds.maxs[1];
            if inside {
                let hit = Self::topmost_element_at(&elements, pos, &remote, zoom);
                if hit.is_some_and(|hit| selection.contains(&hit.id)) {
                    let hit_tile = hit.is_some_and(|h| matches!(h.body, Body::Tile(_)));
                    if hit_tile {
                        // tile bodies are interactive overlays: selection only, no drag
                        return (in_progress(), widget_flags);
                    }
                    self.original_elements = elements.clone();
                    self.original_selected = vec_selected(&elements, selection);
                    engine_view.store.on_start_transform();
                    *modify_state = ModifyState::Translate {
                        start_pos: pos,
                        current_pos: pos,
                        has_drag_moved: false,
                    };
                    return (in_progress(), widget_flags);
                }
            }
        }

        // frame handles: label edit on double click, frame + descendants drag otherwise
        let frame_hit = elements
            .iter()
            .filter(|e| matches!(e.body, Body::Frame(_)) && e.is_selectable())
            .find(|e| {
                let handle = Self::frame_handle_bounds(e, zoom);
                pos[0] >= handle.mins[0]
                    && pos[0] <= handle.maxs[0]
                    && pos[1] >= handle.mins[1]
                    && pos[1] <= handle.maxs[1]
            });
        if let Some(frame) = frame_hit {
            if element.click_count >= 2 {
                widget_flags.edit_frame_label = Some(frame.id.clone());
                return (finished(), widget_flags);
            }
            let selection = Self::frame_with_descendants(&elements, &frame.id, &remote);
            let selection_bounds =
                Self::bounds_for(&elements, &selection).unwrap_or_else(Aabb::new_zero);
            self.original_elements = elements.clone();
            self.original_selected = vec_selected(&elements, &selection);
            engine_view.store.on_start_transform();
            engine_view.collab.update_selected(&selection);
            widget_flags.selection_changed = true;
            self.state = SelectorState::ModifySelection {
                modify_state: ModifyState::Translate {
                    start_pos: pos,
                    current_pos: pos,
                    has_drag_moved: false,
                },
                selection,
                selection_bounds,
            };
            return (in_progress(), widget_flags);
        }

        // clicking an element selects its group and starts translating
        if let Some(hit) = Self::topmost_element_at(&elements, pos, &remote, zoom) {
            let selection = Self::group_members(&elements, hit);
            let selection_bounds =
                Self::bounds_for(&elements, &selection).unwrap_or_else(Aabb::new_zero);
            let modify_state = if matches!(hit.body, Body::Tile(_)) {
                // tile bodies are interactive overlays: selection only, no drag
                ModifyState::Up
            } else {
                ModifyState::Translate {
                    start_pos: pos,
                    current_pos: pos,
                    has_drag_moved: false,
                }
            };
            self.original_elements = elements.clone();
            self.original_selected = vec_selected(&elements, &selection);
            engine_view.store.on_start_transform();
            engine_view.collab.update_selected(&selection);
            widget_flags.selection_changed = true;
            self.state = SelectorState::ModifySelection {
                modify_state,
                selection,
                selection_bounds,
            };
            return (in_progress(), widget_flags);
        }

        // empty canvas: box or lasso selection
        engine_view.collab.update_selected(&[]);
        widget_flags.selection_changed = true;
        widget_flags.redraw = true;
        self.state = SelectorState::Selecting { path: vec![pos] };
        (in_progress(), widget_flags)
    }

    /// The ids selected by the current box or lasso path.
    fn selection_from_path(
        path: &[na::Vector2<f64>],
        style: SelectorStyle,
        elements: &[Element],
        remote: &HashSet<ElementId>,
    ) -> Vec<ElementId> {
        match style {
            SelectorStyle::Rectangle => {
                let (Some(first), Some(last)) = (path.first(), path.last()) else {
                    return Vec::new();
                };
                let bounds = Aabb::new_positive((*first).into(), (*last).into());
                if bounds.extents().amax() < Self::BOX_SELECT_MIN_SIZE {
                    return Vec::new();
                }
                elements
                    .iter()
                    .filter(|e| e.is_selectable() && !remote.contains(&e.id))
                    .filter(|e| {
                        let world = e.world_bounds();
                        world.mins[0] >= bounds.mins[0]
                            && world.mins[1] >= bounds.mins[1]
                            && world.maxs[0] <= bounds.maxs[0]
                            && world.maxs[1] <= bounds.maxs[1]
                    })
                    .map(|e| e.id.clone())
                    .collect()
            }
            SelectorStyle::Lasso => {
                if path.len() < Self::LASSO_MIN_POINTS {
                    return Vec::new();
                }
                elements
                    .iter()
                    .filter(|e| e.is_selectable() && !remote.contains(&e.id))
                    .filter(|e| {
                        geometry::point_in_polygon(e.world_bounds().center().coords, path)
                    })
                    .map(|e| e.id.clone())
                    .collect()
            }
        }
    }

    /// Apply the resize to the selected elements inside the working snapshot.
    #[allow(clippy::too_many_arguments)]
    fn apply_resize(
        working: &mut [Element],
        original_selected: &[Element],
        from_handle: HandlePosition,
        start_bounds: Aabb,
        pointer: na::Vector2<f64>,
        lock_ratio: bool,
        engine_view: &mut EngineViewMut,
    ) {
        let single_box = original_selected.len() == 1
            && original_selected[0].box_geometry().is_some();

        if single_box {
            let original = &original_selected[0];
            let min_size = Self::min_size_for(original, engine_view);
            let allow_mirror = !matches!(original.body, Body::Text(_));
            let resized = super::resize_single_rotated(
                original.rotation,
                from_handle,
                start_bounds,
                pointer,
                min_size,
                lock_ratio,
                allow_mirror,
            );
            if let Some(e) = working.iter_mut().find(|e| e.id == original.id) {
                Self::write_resized_bounds(e, resized.bounds, engine_view);
            }
            return;
        }

        // multi selection / path-like: rescale around the original selection bounds
        let (anchor, scale) =
            super::resize_selection_bounds(from_handle, start_bounds, pointer, lock_ratio);
        for original in original_selected {
            let Some(e) = working.iter_mut().find(|e| e.id == original.id) else {
                continue;
            };
            if let Some(points) = original.points() {
                // negative scales mirror path points intentionally
                let scaled: Vec<na::Vector2<f64>> = points
                    .iter()
                    .map(|p| super::scale_about(*p, anchor, scale))
                    .collect();
                if let Some(target) = e.points_mut() {
                    *target = scaled;
                }
            } else if let Some(geometry) = original.box_geometry() {
                let bounds = geometry.bounds();
                let p1 = super::scale_about(bounds.mins.coords, anchor, scale);
                let p2 = super::scale_about(bounds.maxs.coords, anchor, scale);
                // box-like elements become axis-normalized
                let new_bounds = Aabb::new_positive(p1.into(), p2.into());
                Self::write_resized_bounds(e, new_bounds, engine_view);
            }
        }
    }

    /// The minimum size of a single resized element: the widest character for text,
    /// the tile registry minimum for tiles, two units otherwise.
    fn min_size_for(element: &Element, engine_view: &EngineViewMut) -> na::Vector2<f64> {
        match &element.body {
            Body::Text(text) => {
                let min_width = engine_view.text_metrics.min_single_char_width(
                    &text.text,
                    text.font_size,
                    &text.font_family,
                    text.letter_spacing,
                );
                na::vector![min_width.max(1.0), 1.0]
            }
            Body::Tile(tile) => engine_view.tile_metrics.min_tile_size(&tile.tile_type),
            _ => na::vector![2.0, 2.0],
        }
    }

    /// Write new bounds into a working element. Text keeps its minimum width and gets
    /// its height from the wrapped text metrics, it never mirrors.
    fn write_resized_bounds(element: &mut Element, bounds: Aabb, engine_view: &EngineViewMut) {
        if let Body::Text(text) = &mut element.body {
            let min_width = engine_view.text_metrics.min_single_char_width(
                &text.text,
                text.font_size,
                &text.font_family,
                text.letter_spacing,
            );
            let width = bounds.extents()[0].max(min_width);
            let height = engine_view.text_metrics.measure_wrapped_text_height(
                &text.text,
                width,
                text.font_size,
                text.line_height,
                &text.font_family,
                text.letter_spacing,
                text.text_align,
            );
            text.geometry.x = bounds.mins[0];
            text.geometry.y = bounds.mins[1];
            text.geometry.width = width;
            text.geometry.height = height;
        } else if let Some(geometry) = element.box_geometry_mut() {
            geometry.set_bounds(bounds);
        }
    }
}

fn vec_selected(elements: &[Element], selection: &[ElementId]) -> Vec<Element> {
    elements
        .iter()
        .filter(|e| selection.contains(&e.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Camera;
    use crate::element::{BoxGeometry, TextBlock};
    use crate::engine::ElementIdSource;
    use crate::pens::PensConfig;
    use crate::testing::{FixedTextMetrics, FixedTileMetrics, MemoryStore, RecordingCollab};
    use approx::assert_relative_eq;

    #[test]
    fn text_resize_clamps_width_and_recomputes_wrapped_height() {
        let text_element = Element::new(
            "t1",
            Body::Text(TextBlock {
                geometry: BoxGeometry::new(0.0, 0.0, 200.0, 20.0),
                text: String::from("hello wrapped text"),
                font_size: 16.0,
                font_family: String::from("sans-serif"),
                line_height: 1.25,
                letter_spacing: 0.0,
                ..Default::default()
            }),
        );
        let mut working = vec![text_element.clone()];
        let original_selected = vec![text_element.clone()];

        let mut pens_config = PensConfig::default();
        let mut camera = Camera::default();
        let mut store = MemoryStore::default();
        let mut collab = RecordingCollab::default();
        let text_metrics = FixedTextMetrics;
        let tile_metrics = FixedTileMetrics;
        let mut ids = ElementIdSource::default();
        let mut view = EngineViewMut {
            pens_config: &mut pens_config,
            camera: &mut camera,
            store: &mut store,
            collab: &mut collab,
            text_metrics: &text_metrics,
            tile_metrics: &tile_metrics,
            ids: &mut ids,
            now_ms: 0,
        };

        // drag the east handle far past the west edge: width clamps to the widest char
        Selector::apply_resize(
            &mut working,
            &original_selected,
            HandlePosition::East,
            text_element.bounds(),
            na::vector![-300.0, 10.0],
            false,
            &mut view,
        );

        let resized = match &working[0].body {
            Body::Text(text) => text,
            _ => unreachable!(),
        };
        // FixedTextMetrics: half the font size per char
        assert_relative_eq!(resized.geometry.width, 8.0);
        let expected_height = view.text_metrics.measure_wrapped_text_height(
            "hello wrapped text",
            8.0,
            16.0,
            1.25,
            "sans-serif",
            0.0,
            crate::element::TextAlign::Left,
        );
        assert_relative_eq!(resized.geometry.height, expected_height);
    }
}
