//! The editor session: layer stack, selection, history and the event reducer.
//!
//! An [`EditorSession`] is a plain value owned by the host. Every input goes
//! through [`EditorSession::dispatch`] (or the by-value [`reduce`]), and every
//! layer edit ends in exactly one history commit.

use crate::config::{Background, CanvasSettings, EditorConfig};
use crate::error::{ComposerError, ComposerResult};
use crate::event::{EditorEvent, KeyModifiers, PointerEvent, PointerPhase, Tool};
use crate::geometry::{bounding_box_of, layer_local_to_canvas, Point, Rect};
use crate::history::History;
use crate::interaction::{
    handle_at, resize_factors, resize_in_layer_frame, rotate_handle_position, rotation_for,
    scale_transform, Interaction, DRAG_THRESHOLD_PX, HANDLE_RADIUS_PX, PEN_CLOSE_RADIUS_PX,
    ROTATE_HANDLE_OFFSET_PX,
};
use crate::pen::{PenPath, SelectionPath};
use crate::snapping::{snap_move, SnapLine};
use crate::{
    BlendMode, Layer, LayerId, LayerKind, LayerStack, ReorderDirection, Selection, ShapeKind,
    TextStyle, Transform, MIN_LAYER_SIZE,
};

/// Smallest viewport zoom factor.
pub const MIN_ZOOM: f32 = 0.05;

/// Largest viewport zoom factor.
pub const MAX_ZOOM: f32 = 32.0;

/// Arrow-key nudge distance.
pub const NUDGE_STEP: f32 = 1.0;

/// Arrow-key nudge distance with shift held.
pub const NUDGE_STEP_LARGE: f32 = 10.0;

/// A decoded raster ready to become an image layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Data URL or file path.
    pub src: String,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
}

impl ImageAsset {
    /// Create an asset description.
    #[must_use]
    pub fn new(src: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            src: src.into(),
            width,
            height,
        }
    }
}

/// A single layer-editing session.
#[derive(Debug, Clone)]
pub struct EditorSession {
    config: EditorConfig,
    canvas: CanvasSettings,
    canvas_initialized: bool,
    stack: LayerStack,
    selection: Selection,
    history: History,
    tool: Tool,
    zoom: f32,
    interaction: Interaction,
    pen: Option<PenPath>,
    selection_path: Option<SelectionPath>,
    snap_lines: Vec<SnapLine>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    /// Create an empty session.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        let canvas = config.canvas.clone();
        Self::from_parts(config, canvas, LayerStack::new())
    }

    /// Create an empty session with a canvas of the given size.
    #[must_use]
    pub fn with_canvas(width: u32, height: u32) -> Self {
        Self::new(EditorConfig {
            canvas: CanvasSettings::new(width, height),
            ..EditorConfig::default()
        })
    }

    /// Create a session over an existing stack; history starts at `stack`.
    #[must_use]
    pub fn from_parts(config: EditorConfig, canvas: CanvasSettings, stack: LayerStack) -> Self {
        Self {
            history: History::with_limit(&stack, config.history_limit),
            canvas_initialized: !stack.is_empty(),
            config,
            canvas,
            stack,
            selection: Selection::new(),
            tool: Tool::Select,
            zoom: 1.0,
            interaction: Interaction::Idle,
            pen: None,
            selection_path: None,
            snap_lines: Vec::new(),
        }
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Canvas settings.
    #[must_use]
    pub fn canvas(&self) -> &CanvasSettings {
        &self.canvas
    }

    /// Whether the canvas was sized on purpose or has ever held a layer.
    #[must_use]
    pub fn is_canvas_initialized(&self) -> bool {
        self.canvas_initialized
    }

    /// Keep the current canvas size when the first image arrives.
    pub fn mark_canvas_initialized(&mut self) {
        self.canvas_initialized = true;
    }

    /// The live layer stack.
    #[must_use]
    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    /// Layers top to bottom.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        self.stack.layers()
    }

    /// Look up a layer.
    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.stack.get(id)
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selected layers in stack order.
    #[must_use]
    pub fn selected_layers(&self) -> Vec<&Layer> {
        self.selection.layers(&self.stack)
    }

    /// Bounding box of the selection.
    #[must_use]
    pub fn selection_bounds(&self) -> Option<Rect> {
        self.selection.bounding_box(&self.stack)
    }

    /// Active tool.
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Viewport zoom factor.
    #[must_use]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Interaction in progress.
    #[must_use]
    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Pen path being built, if any.
    #[must_use]
    pub fn pen_path(&self) -> Option<&PenPath> {
        self.pen.as_ref()
    }

    /// Finalized pen selection, if any.
    #[must_use]
    pub fn selection_path(&self) -> Option<&SelectionPath> {
        self.selection_path.as_ref()
    }

    /// Snap guides of the current move tick.
    #[must_use]
    pub fn snap_lines(&self) -> &[SnapLine] {
        &self.snap_lines
    }

    /// Whether undo would change anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether redo would change anything.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Number of history snapshots, including the initial one.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // ---------------------------------------------------------------
    // Reducer
    // ---------------------------------------------------------------

    /// Apply one input event.
    pub fn dispatch(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::Pointer(pointer) => self.handle_pointer(pointer),
            EditorEvent::Key { key, modifiers } => self.handle_key(&key, modifiers),
            EditorEvent::SetTool(tool) => self.set_tool(tool),
            EditorEvent::ClosePenPath => {
                self.close_pen_path();
            }
            EditorEvent::Undo => {
                self.undo();
            }
            EditorEvent::Redo => {
                self.redo();
            }
            EditorEvent::SelectAll => self.select_all(),
            EditorEvent::Deselect => self.deselect(),
            EditorEvent::DeleteSelected => {
                self.delete_selected();
            }
            EditorEvent::SetZoom(zoom) => self.set_zoom(zoom),
        }
    }

    /// Route a pointer event by phase.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let point = event.point();
        match event.phase {
            PointerPhase::Down => self.pointer_down(point, event.modifiers),
            PointerPhase::Move => self.pointer_move(point, event.modifiers),
            PointerPhase::Up => self.pointer_up(point, event.modifiers),
            PointerPhase::Cancel => self.cancel_interaction(),
        }
    }

    fn pointer_down(&mut self, point: Point, modifiers: KeyModifiers) {
        if !self.interaction.is_idle() {
            self.finish_interaction();
        }
        self.snap_lines.clear();
        match self.tool {
            Tool::Select => self.select_pointer_down(point, modifiers),
            Tool::Pen => self.pen_pointer_down(point),
        }
        tracing::debug!("Pointer down -> {}", self.interaction.name());
    }

    fn select_pointer_down(&mut self, point: Point, modifiers: KeyModifiers) {
        let radius = HANDLE_RADIUS_PX / self.zoom;

        if let Some(bounds) = self.selection_bounds() {
            let rotate_handle = rotate_handle_position(bounds, ROTATE_HANDLE_OFFSET_PX / self.zoom);
            if let Some(layer) = self.selection.single().and_then(|id| self.stack.get(id)) {
                if rotate_handle.distance(point) <= radius {
                    self.interaction = Interaction::Rotate {
                        layer: layer.id,
                        center: layer.transform.center(),
                        start: point,
                        initial_rotation: layer.transform.rotation,
                    };
                    self.history.begin(&self.stack);
                    return;
                }
            }
            if let Some(handle) = handle_at(bounds, point, radius) {
                self.interaction = Interaction::Resize {
                    handle,
                    start: point,
                    origin: self.stack.clone(),
                    targets: self.selection.ids().to_vec(),
                    start_bounds: bounds,
                };
                self.history.begin(&self.stack);
                return;
            }
        }

        let Some(hit) = self.stack.hit_test(point) else {
            let base = if modifiers.shift {
                self.selection.ids().to_vec()
            } else {
                Vec::new()
            };
            self.interaction = Interaction::Marquee {
                start: point,
                current: point,
                additive: modifiers.shift,
                base,
                dragged: false,
            };
            return;
        };

        if modifiers.shift {
            match self.selection.toggle(&self.stack, hit) {
                Ok(true) => self.reset_pen(),
                Ok(false) => {
                    self.reset_pen();
                    return;
                }
                Err(err) => {
                    tracing::warn!("Selection refused: {err}");
                    return;
                }
            }
        } else if !self.selection.contains(hit) {
            if let Err(err) = self.selection.select(&self.stack, hit, false) {
                tracing::warn!("Selection refused: {err}");
                return;
            }
            self.reset_pen();
        }

        self.history.begin(&self.stack);
        if modifiers.alt {
            self.interaction = Interaction::DuplicateMove { start: point };
        } else {
            self.start_move(point);
        }
    }

    fn start_move(&mut self, start: Point) {
        let moving = self.selection.ids().to_vec();
        let bounds = bounding_box_of(moving.iter().filter_map(|&id| self.stack.get(id)));
        self.interaction = match bounds {
            Some(start_bounds) => Interaction::Move {
                start,
                origin: self.stack.clone(),
                moving,
                start_bounds,
            },
            None => Interaction::Idle,
        };
    }

    fn pen_pointer_down(&mut self, point: Point) {
        let Some(target) = self.pen_target() else {
            tracing::warn!("Pen tool needs exactly one selected image layer");
            return;
        };

        if self.pen.as_ref().map(PenPath::target) != Some(target) {
            self.pen = Some(PenPath::new(target));
            self.selection_path = None;
        }

        let radius = PEN_CLOSE_RADIUS_PX / self.zoom;
        if self.pen.as_ref().is_some_and(|pen| pen.closes_at(point, radius)) {
            self.close_pen_path();
            return;
        }

        if let Some(pen) = self.pen.as_mut() {
            pen.push_corner(point);
        }
        self.interaction = Interaction::PenHandle { anchor: point };
    }

    fn pen_target(&self) -> Option<LayerId> {
        let id = self.selection.single()?;
        let layer = self.stack.get(id)?;
        (matches!(layer.kind, LayerKind::Image { .. }) && !layer.locked).then_some(id)
    }

    fn pointer_move(&mut self, point: Point, modifiers: KeyModifiers) {
        let interaction = std::mem::take(&mut self.interaction);
        self.interaction = match interaction {
            Interaction::Idle => Interaction::Idle,
            Interaction::Move {
                start,
                origin,
                moving,
                start_bounds,
            } => {
                self.apply_move(start, &origin, &moving, start_bounds, point);
                Interaction::Move {
                    start,
                    origin,
                    moving,
                    start_bounds,
                }
            }
            Interaction::DuplicateMove { start } => {
                if point == start {
                    Interaction::DuplicateMove { start }
                } else {
                    self.duplicate_for_move();
                    self.start_move(start);
                    return self.pointer_move(point, modifiers);
                }
            }
            Interaction::Resize {
                handle,
                start,
                origin,
                targets,
                start_bounds,
            } => {
                let mut next = origin.clone();
                let single_rotated = match targets.as_slice() {
                    [id] => origin
                        .get(*id)
                        .filter(|l| l.transform.rotation.rem_euclid(360.0) > f32::EPSILON),
                    _ => None,
                };
                if let Some(layer) = single_rotated {
                    let resized = resize_in_layer_frame(
                        &layer.transform,
                        handle,
                        start_bounds,
                        start,
                        point,
                        modifiers.shift,
                    );
                    if let Some(target) = next.get_mut(layer.id) {
                        target.transform = resized;
                    }
                } else {
                    let factors = resize_factors(
                        handle,
                        start_bounds,
                        point.x - start.x,
                        point.y - start.y,
                        modifiers.shift,
                    );
                    for layer in next.iter_mut().filter(|l| targets.contains(&l.id)) {
                        layer.transform = scale_transform(&layer.transform, &factors);
                    }
                }
                self.history.commit(&mut self.stack, next, false);
                Interaction::Resize {
                    handle,
                    start,
                    origin,
                    targets,
                    start_bounds,
                }
            }
            Interaction::Rotate {
                layer,
                center,
                start,
                initial_rotation,
            } => {
                let mut next = self.stack.clone();
                if let Some(target) = next.get_mut(layer) {
                    target.transform.rotation =
                        rotation_for(center, start, point, initial_rotation, modifiers.shift);
                }
                self.history.commit(&mut self.stack, next, false);
                Interaction::Rotate {
                    layer,
                    center,
                    start,
                    initial_rotation,
                }
            }
            Interaction::Marquee {
                start,
                additive,
                base,
                dragged,
                ..
            } => {
                let dragged = dragged || start.distance(point) > DRAG_THRESHOLD_PX / self.zoom;
                if dragged {
                    let area = Rect::from_points(start, point);
                    let hits: Vec<LayerId> = self
                        .stack
                        .iter()
                        .filter(|l| l.is_interactive() && l.bounds().intersects(&area))
                        .map(|l| l.id)
                        .collect();
                    self.selection
                        .set(&self.stack, base.iter().copied().chain(hits));
                    self.reset_pen();
                }
                Interaction::Marquee {
                    start,
                    current: point,
                    additive,
                    base,
                    dragged,
                }
            }
            Interaction::PenHandle { anchor } => {
                if anchor.distance(point) > DRAG_THRESHOLD_PX / self.zoom {
                    if let Some(pen) = self.pen.as_mut() {
                        pen.drag_last_handle(point);
                    }
                }
                Interaction::PenHandle { anchor }
            }
        };
    }

    fn apply_move(
        &mut self,
        start: Point,
        origin: &LayerStack,
        moving: &[LayerId],
        start_bounds: Rect,
        point: Point,
    ) {
        if point == start {
            self.snap_lines.clear();
            self.history.commit(&mut self.stack, origin.clone(), false);
            return;
        }
        let targets: Vec<Rect> = origin
            .iter()
            .filter(|l| l.visible && !moving.contains(&l.id))
            .map(Layer::bounds)
            .collect();
        let snap = snap_move(
            start_bounds,
            point.x - start.x,
            point.y - start.y,
            &targets,
            self.canvas.rect(),
            self.zoom,
            &self.config.snap,
        );

        let mut next = origin.clone();
        for layer in next.iter_mut().filter(|l| moving.contains(&l.id)) {
            layer.transform.x += snap.dx;
            layer.transform.y += snap.dy;
        }
        self.snap_lines = snap.lines;
        self.history.commit(&mut self.stack, next, false);
    }

    /// Insert a copy of every selected layer directly above its original and
    /// select the copies.
    fn duplicate_for_move(&mut self) {
        let mut next = self.stack.clone();
        let mut copies = Vec::with_capacity(self.selection.len());
        for layer in self.selection.layers(&self.stack) {
            copies.push(next.insert_above(layer.id, layer.duplicate()));
        }
        tracing::debug!("Duplicate-move created {} layers", copies.len());
        self.history.commit(&mut self.stack, next, false);
        self.selection.set(&self.stack, copies);
        self.reset_pen();
    }

    fn pointer_up(&mut self, point: Point, modifiers: KeyModifiers) {
        if !self.interaction.is_idle() {
            self.pointer_move(point, modifiers);
        }
        self.finish_interaction();
    }

    /// End the current interaction, committing whatever it changed.
    fn finish_interaction(&mut self) {
        match std::mem::take(&mut self.interaction) {
            Interaction::Idle | Interaction::PenHandle { .. } => {}
            Interaction::Move { .. } | Interaction::Resize { .. } | Interaction::Rotate { .. } => {
                if self.history.record(&self.stack) {
                    tracing::debug!("Interaction committed to history");
                }
            }
            Interaction::DuplicateMove { .. } => self.history.cancel(),
            Interaction::Marquee {
                dragged, additive, ..
            } => {
                if !dragged && !additive {
                    self.deselect();
                }
            }
        }
        self.snap_lines.clear();
    }

    /// Abort the current interaction and restore the stack it started from.
    pub fn cancel_interaction(&mut self) {
        if let Some(baseline) = self.history.baseline() {
            self.stack = baseline.clone();
        }
        self.history.cancel();
        self.interaction = Interaction::Idle;
        self.snap_lines.clear();
        self.selection.prune(&self.stack);
    }

    fn handle_key(&mut self, key: &str, modifiers: KeyModifiers) {
        if !self.interaction.is_idle() {
            if key == "Escape" {
                self.cancel_interaction();
            }
            return;
        }

        let step = if modifiers.shift {
            NUDGE_STEP_LARGE
        } else {
            NUDGE_STEP
        };
        match key {
            "Delete" | "Backspace" => {
                self.delete_selected();
            }
            "Escape" => {
                if self.pen.is_some() || self.selection_path.is_some() {
                    self.reset_pen();
                } else {
                    self.deselect();
                }
            }
            "Enter" if self.tool == Tool::Pen => {
                self.close_pen_path();
            }
            "ArrowLeft" => {
                self.nudge_selected(-step, 0.0);
            }
            "ArrowRight" => {
                self.nudge_selected(step, 0.0);
            }
            "ArrowUp" => {
                self.nudge_selected(0.0, -step);
            }
            "ArrowDown" => {
                self.nudge_selected(0.0, step);
            }
            other if modifiers.command() => match other.to_ascii_lowercase().as_str() {
                "z" if modifiers.shift => {
                    self.redo();
                }
                "z" => {
                    self.undo();
                }
                "y" => {
                    self.redo();
                }
                "a" => self.select_all(),
                "d" => {
                    self.duplicate_selected();
                }
                _ => {}
            },
            _ => {}
        }
    }

    // ---------------------------------------------------------------
    // Tools, viewport, canvas
    // ---------------------------------------------------------------

    /// Switch tools. Discards any pen state.
    pub fn set_tool(&mut self, tool: Tool) {
        if !self.interaction.is_idle() {
            self.finish_interaction();
        }
        self.tool = tool;
        self.reset_pen();
    }

    /// Set the viewport zoom, clamped to `MIN_ZOOM..=MAX_ZOOM`.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Resize the export canvas.
    pub fn set_canvas_size(&mut self, width: u32, height: u32) {
        self.canvas.width = width.max(1);
        self.canvas.height = height.max(1);
        self.canvas_initialized = true;
    }

    /// Change the canvas background.
    pub fn set_background(&mut self, background: Background) {
        self.canvas.background = background;
    }

    // ---------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------

    /// Select a layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is missing or locked.
    pub fn select(&mut self, id: LayerId, additive: bool) -> ComposerResult<()> {
        self.selection.select(&self.stack, id, additive)?;
        self.reset_pen();
        Ok(())
    }

    /// Select every visible, unlocked layer.
    pub fn select_all(&mut self) {
        let ids: Vec<LayerId> = self
            .stack
            .iter()
            .filter(|l| l.is_interactive())
            .map(|l| l.id)
            .collect();
        self.selection.set(&self.stack, ids);
        self.reset_pen();
    }

    /// Clear the selection and any pen state.
    pub fn deselect(&mut self) {
        self.selection.clear();
        self.reset_pen();
    }

    fn reset_pen(&mut self) {
        self.pen = None;
        self.selection_path = None;
        if matches!(self.interaction, Interaction::PenHandle { .. }) {
            self.interaction = Interaction::Idle;
        }
    }

    // ---------------------------------------------------------------
    // Pen selection
    // ---------------------------------------------------------------

    /// Finalize the in-progress pen path into a selection path.
    ///
    /// Returns `None` (keeping the nodes) when fewer than three were placed.
    pub fn close_pen_path(&mut self) -> Option<&SelectionPath> {
        let pen = self.pen.take()?;
        let finalized = self
            .stack
            .get(pen.target())
            .and_then(|layer| pen.finalize(layer));
        let Some(path) = finalized else {
            self.pen = Some(pen);
            return None;
        };
        tracing::debug!("Pen path closed with {} points", path.points.len());
        if matches!(self.interaction, Interaction::PenHandle { .. }) {
            self.interaction = Interaction::Idle;
        }
        self.selection_path = Some(path);
        self.selection_path.as_ref()
    }

    /// Drop the finalized pen selection.
    pub fn clear_selection_path(&mut self) {
        self.selection_path = None;
    }

    /// Place an extracted region as a new image layer over its source.
    ///
    /// `src` is the cropped raster of the current selection path. The new
    /// layer covers the path's bounds in the source layer's frame, shares its
    /// rotation and is inserted directly above it. Clears the selection path
    /// and selects the new layer.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no selection path or its layer is gone.
    pub fn place_extracted_region(&mut self, src: impl Into<String>, width: u32, height: u32) -> ComposerResult<LayerId> {
        let path = self
            .selection_path
            .clone()
            .ok_or_else(|| ComposerError::InvalidOperation("no pen selection to extract".into()))?;
        let source = self
            .stack
            .get(path.layer_id)
            .ok_or_else(|| ComposerError::LayerNotFound(path.layer_id.to_string()))?;

        let center = layer_local_to_canvas(path.bounds.center(), source);
        let region_width = path.bounds.width.max(MIN_LAYER_SIZE);
        let region_height = path.bounds.height.max(MIN_LAYER_SIZE);
        let layer = Layer::image(src, width, height)
            .with_name(format!("{} region", source.name))
            .with_transform(Transform {
                x: center.x - region_width / 2.0,
                y: center.y - region_height / 2.0,
                width: region_width,
                height: region_height,
                rotation: source.transform.rotation,
            });
        let below = source.id;
        let id = layer.id;

        self.apply_edit(|stack| {
            stack.insert_above(below, layer);
            true
        });
        self.selection.set(&self.stack, [id]);
        self.reset_pen();
        tracing::info!("Extracted region into layer {id}");
        Ok(id)
    }

    // ---------------------------------------------------------------
    // Layer edits
    // ---------------------------------------------------------------

    /// Run `edit` on a copy of the stack and commit the result as one entry.
    fn apply_edit(&mut self, edit: impl FnOnce(&mut LayerStack) -> bool) -> bool {
        if !self.interaction.is_idle() {
            self.finish_interaction();
        }
        let mut next = self.stack.clone();
        if !edit(&mut next) {
            return false;
        }
        self.history.commit(&mut self.stack, next, true);
        self.selection.prune(&self.stack);
        if let Some(pen) = &self.pen {
            if !self.stack.contains(pen.target()) {
                self.reset_pen();
            }
        }
        true
    }

    /// Add a layer on top of the stack and select it.
    pub fn add_layer(&mut self, layer: Layer) -> LayerId {
        let id = layer.id;
        self.apply_edit(|stack| {
            stack.push_top(layer);
            true
        });
        self.canvas_initialized = true;
        if let Err(err) = self.select(id, false) {
            tracing::debug!("New layer not selected: {err}");
        }
        id
    }

    /// Add a text layer with the configured default style.
    pub fn add_text_layer(&mut self) -> LayerId {
        let style = self.config.text_style.clone();
        self.add_text_layer_with(style)
    }

    /// Add a text layer centered on the canvas, half the canvas wide.
    pub fn add_text_layer_with(&mut self, style: TextStyle) -> LayerId {
        let canvas = self.canvas.rect();
        let width = (canvas.width / 2.0).max(MIN_LAYER_SIZE);
        let height = style.line_height_px().max(MIN_LAYER_SIZE);
        let layer = Layer::text(style).with_transform(Transform {
            x: (canvas.width - width) / 2.0,
            y: (canvas.height - height) / 2.0,
            width,
            height,
            rotation: 0.0,
        });
        tracing::debug!("Adding text layer {}", layer.id);
        self.add_layer(layer)
    }

    /// Add a shape centered on the canvas, a quarter of its short side.
    pub fn add_shape_layer(&mut self, shape: ShapeKind, fill: impl Into<String>) -> LayerId {
        let canvas = self.canvas.rect();
        let size = (canvas.width.min(canvas.height) / 4.0).max(MIN_LAYER_SIZE);
        let layer = Layer::shape(shape, fill).with_transform(Transform {
            x: (canvas.width - size) / 2.0,
            y: (canvas.height - size) / 2.0,
            width: size,
            height: size,
            rotation: 0.0,
        });
        self.add_layer(layer)
    }

    /// Add one image layer fitted inside the canvas.
    pub fn add_image_layer(&mut self, asset: ImageAsset) -> LayerId {
        let ids = self.add_image_layers(vec![asset]);
        ids.first().copied().unwrap_or_default()
    }

    /// Add image layers in one history entry and select them.
    ///
    /// The first image on a pristine canvas sets the canvas size; every image
    /// is scaled down to fit inside the canvas and centered.
    pub fn add_image_layers(&mut self, assets: Vec<ImageAsset>) -> Vec<LayerId> {
        if assets.is_empty() {
            return Vec::new();
        }
        if !self.canvas_initialized && self.stack.is_empty() {
            let first = &assets[0];
            self.canvas.width = first.width.max(1);
            self.canvas.height = first.height.max(1);
            tracing::info!(
                "Canvas sized to first image: {}x{}",
                self.canvas.width,
                self.canvas.height
            );
        }

        let layers: Vec<Layer> = assets
            .into_iter()
            .map(|asset| {
                let transform = self.fitted_transform(asset.width, asset.height);
                Layer::image(asset.src, asset.width, asset.height).with_transform(transform)
            })
            .collect();
        let ids: Vec<LayerId> = layers.iter().map(|l| l.id).collect();

        self.apply_edit(|stack| {
            for layer in layers {
                stack.push_top(layer);
            }
            true
        });
        self.canvas_initialized = true;
        self.selection.set(&self.stack, ids.iter().copied());
        self.reset_pen();
        tracing::info!("Added {} image layers", ids.len());
        ids
    }

    #[allow(clippy::cast_precision_loss)]
    fn fitted_transform(&self, width: u32, height: u32) -> Transform {
        let canvas = self.canvas.rect();
        let natural_width = width.max(1) as f32;
        let natural_height = height.max(1) as f32;
        let scale = (canvas.width / natural_width)
            .min(canvas.height / natural_height)
            .min(1.0);
        let width = natural_width * scale;
        let height = natural_height * scale;
        Transform {
            x: (canvas.width - width) / 2.0,
            y: (canvas.height - height) / 2.0,
            width,
            height,
            rotation: 0.0,
        }
    }

    /// Edit one unlocked layer in a single history entry.
    ///
    /// Missing and locked layers are left alone and `false` is returned.
    /// Size and opacity are re-clamped after `edit` runs.
    pub fn update_layer(&mut self, id: LayerId, edit: impl FnOnce(&mut Layer)) -> bool {
        if !self.stack.get(id).is_some_and(|l| !l.locked) {
            tracing::warn!("Update skipped for missing or locked layer {id}");
            return false;
        }
        self.apply_edit(|stack| {
            let Some(layer) = stack.get_mut(id) else {
                return false;
            };
            edit(layer);
            let (width, height, opacity) =
                (layer.transform.width, layer.transform.height, layer.opacity);
            layer.set_size(width, height);
            layer.set_opacity(opacity);
            true
        })
    }

    /// Rename a layer.
    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> bool {
        let name = name.into();
        self.update_layer(id, |layer| layer.name = name)
    }

    /// Set a layer's opacity (clamped to `0..=100`).
    pub fn set_layer_opacity(&mut self, id: LayerId, opacity: f32) -> bool {
        self.update_layer(id, |layer| layer.set_opacity(opacity))
    }

    /// Set a layer's blend mode.
    pub fn set_layer_blend_mode(&mut self, id: LayerId, blend_mode: BlendMode) -> bool {
        self.update_layer(id, |layer| layer.blend_mode = blend_mode)
    }

    /// Replace an image layer's source, keeping its placement.
    pub fn replace_image_source(&mut self, id: LayerId, asset: ImageAsset) -> bool {
        if !self
            .stack
            .get(id)
            .is_some_and(|l| matches!(l.kind, LayerKind::Image { .. }))
        {
            return false;
        }
        self.update_layer(id, |layer| {
            layer.kind = LayerKind::Image {
                src: asset.src,
                natural_width: asset.width,
                natural_height: asset.height,
            };
        })
    }

    /// Show or hide a layer. Hiding also deselects it.
    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> bool {
        let changed = self.apply_edit(|stack| match stack.get_mut(id) {
            Some(layer) if layer.visible != visible => {
                layer.visible = visible;
                true
            }
            _ => false,
        });
        if changed && !visible {
            self.selection.remove(id);
        }
        changed
    }

    /// Lock or unlock a layer. Locking also deselects it.
    pub fn set_layer_locked(&mut self, id: LayerId, locked: bool) -> bool {
        let changed = self.apply_edit(|stack| match stack.get_mut(id) {
            Some(layer) if layer.locked != locked => {
                layer.locked = locked;
                true
            }
            _ => false,
        });
        if changed && locked && self.pen.as_ref().is_some_and(|p| p.target() == id) {
            self.reset_pen();
        }
        changed
    }

    /// Move a layer within the stack.
    pub fn reorder_layer(&mut self, id: LayerId, direction: ReorderDirection) -> bool {
        if !self.stack.get(id).is_some_and(|l| !l.locked) {
            return false;
        }
        self.apply_edit(|stack| stack.reorder(id, direction))
    }

    /// Delete an unlocked layer.
    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        if !self.stack.get(id).is_some_and(|l| !l.locked) {
            tracing::warn!("Delete skipped for missing or locked layer {id}");
            return false;
        }
        self.apply_edit(|stack| stack.remove(id).is_ok())
    }

    /// Delete every selected layer. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids: Vec<LayerId> = self
            .selection
            .layers(&self.stack)
            .into_iter()
            .filter(|layer| !layer.locked)
            .map(|layer| layer.id)
            .collect();
        if ids.is_empty() {
            return 0;
        }
        let mut removed = 0;
        self.apply_edit(|stack| {
            removed = ids.iter().filter(|&&id| stack.remove(id).is_ok()).count();
            removed > 0
        });
        self.deselect();
        removed
    }

    /// Duplicate the selection with an offset and select the copies.
    pub fn duplicate_selected(&mut self) -> Vec<LayerId> {
        let offset = self.config.duplicate_offset;
        let copies: Vec<(LayerId, Layer)> = self
            .selection
            .layers(&self.stack)
            .into_iter()
            .map(|layer| {
                let mut copy = layer.duplicate();
                copy.transform.x += offset;
                copy.transform.y += offset;
                (layer.id, copy)
            })
            .collect();
        if copies.is_empty() {
            return Vec::new();
        }
        let ids: Vec<LayerId> = copies.iter().map(|(_, copy)| copy.id).collect();
        self.apply_edit(|stack| {
            for (original, copy) in copies {
                stack.insert_above(original, copy);
            }
            true
        });
        self.selection.set(&self.stack, ids.iter().copied());
        self.reset_pen();
        ids
    }

    /// Move the selection by a fixed delta in one history entry.
    pub fn nudge_selected(&mut self, dx: f32, dy: f32) -> bool {
        let ids = self.selection.ids().to_vec();
        if ids.is_empty() {
            return false;
        }
        self.apply_edit(|stack| {
            for layer in stack.iter_mut().filter(|l| ids.contains(&l.id) && !l.locked) {
                layer.transform.x += dx;
                layer.transform.y += dy;
            }
            true
        })
    }

    // ---------------------------------------------------------------
    // History
    // ---------------------------------------------------------------

    /// Restore the previous snapshot. Returns `false` at the oldest entry.
    pub fn undo(&mut self) -> bool {
        self.cancel_interaction();
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    /// Re-apply the next snapshot. Returns `false` at the newest entry.
    pub fn redo(&mut self) -> bool {
        self.cancel_interaction();
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    fn restore(&mut self, snapshot: LayerStack) {
        self.stack = snapshot;
        self.selection.prune(&self.stack);
        self.snap_lines.clear();
        if self
            .pen
            .as_ref()
            .is_some_and(|p| !self.stack.contains(p.target()))
        {
            self.reset_pen();
        }
        tracing::debug!("History restored to entry {}", self.history.cursor());
    }
}

/// Pure reducer form of [`EditorSession::dispatch`].
#[must_use]
pub fn reduce(mut session: EditorSession, event: EditorEvent) -> EditorSession {
    session.dispatch(event);
    session
}
