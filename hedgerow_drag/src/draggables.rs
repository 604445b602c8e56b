// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer drag state machine shared by many draggable registrations.
//!
//! ## Usage
//!
//! 1) Describe each drag source with a [`Draggable`] and [`Draggables::bind`] it.
//! 2) Forward pointer-down events on a bound element to [`Draggables::pointer_down`].
//! 3) Forward every pointer move in the shared context to [`Draggables::pointer_move`].
//! 4) Forward pointer-up to [`Draggables::pointer_up`] (or
//!    [`Draggables::pointer_up_on`] for registrations bound as `local`).
//! 5) Ask [`Draggables::was_dragging`] before acting on a synthetic click.
//!
//! Only one registration is active at a time. A pointer-down on another
//! registration while one is active is ignored.
//!
//! Movement is measured from the pointer-down position. Move callbacks start
//! once the per-axis threshold is exceeded, so small jitters still end in a
//! click instead of a drag.

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;
use core::time::Duration;

use hashbrown::HashMap;
use kurbo::{Point, Rect, Vec2};

use crate::error::DragError;

/// The axes a draggable follows.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DragAxis {
    /// Horizontal and vertical.
    #[default]
    Both,
    /// Horizontal only.
    X,
    /// Vertical only.
    Y,
}

impl DragAxis {
    const fn tracks_x(self) -> bool {
        matches!(self, Self::Both | Self::X)
    }

    const fn tracks_y(self) -> bool {
        matches!(self, Self::Both | Self::Y)
    }
}

/// Which point of the dragged element is reported as its position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Leading edge (`left`/`top`).
    #[default]
    Start,
    /// Middle of the element.
    Center,
    /// Trailing edge (`right`/`bottom`).
    End,
}

impl FromStr for Anchor {
    type Err = DragError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" | "left" | "top" => Ok(Self::Start),
            "center" | "middle" => Ok(Self::Center),
            "end" | "right" | "bottom" => Ok(Self::End),
            _ => Err(DragError::UnknownAnchor(s.to_string())),
        }
    }
}

/// Identifies a bound [`Draggable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DraggableId(u32);

/// A position along one axis, relative to the container origin.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AxisPosition {
    /// Offset in pixels.
    pub px: f64,
    /// Offset as a percentage of the container size along the axis.
    pub percent: f64,
}

/// Position of the dragged element; axes the draggable does not follow are `None`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DragPosition {
    /// Horizontal position.
    pub x: Option<AxisPosition>,
    /// Vertical position.
    pub y: Option<AxisPosition>,
}

/// Movement since the pointer went down.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DragChange {
    /// Pointer offset from the pointer-down position.
    pub delta: Vec2,
    /// The horizontal threshold was exceeded.
    pub x_moved: bool,
    /// The vertical threshold was exceeded.
    pub y_moved: bool,
}

impl DragChange {
    /// Returns `true` if the movement counts as a drag for `axis`.
    #[must_use]
    pub const fn moved(&self, axis: DragAxis) -> bool {
        match axis {
            DragAxis::Both => self.x_moved || self.y_moved,
            DragAxis::X => self.x_moved,
            DragAxis::Y => self.y_moved,
        }
    }
}

/// How a drag ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Release {
    /// Movement stayed within the threshold and a click handler ran.
    Click,
    /// The drag finished; the end handler ran if there was one.
    End,
}

type BeforeFn = Box<dyn FnMut(DraggableId, Point) -> bool>;
type StartFn = Box<dyn FnMut(DraggableId, Point)>;
type UpdateFn = Box<dyn FnMut(DraggableId, &DragPosition, &DragChange)>;

/// A drag source registration.
///
/// Geometry is in the same coordinate space as the pointer positions passed to
/// [`Draggables`]. At least one of [`on_move`](Self::on_move) or
/// [`on_end`](Self::on_end) must be set before binding.
pub struct Draggable {
    /// Bounds the position is measured from and clamped to.
    pub container: Rect,
    /// Bounds of the dragged element; only its size is used.
    pub element: Rect,
    /// Axes to follow.
    pub axis: DragAxis,
    /// Horizontal anchor.
    pub anchor_x: Anchor,
    /// Vertical anchor.
    pub anchor_y: Anchor,
    /// Allow the horizontal position to leave the container.
    pub overflow_x: bool,
    /// Allow the vertical position to leave the container.
    pub overflow_y: bool,
    /// Pointer-up is delivered per element through [`Draggables::pointer_up_on`].
    pub local: bool,
    on_before: Option<BeforeFn>,
    on_start: Option<StartFn>,
    on_move: Option<UpdateFn>,
    on_end: Option<UpdateFn>,
    on_click: Option<UpdateFn>,
}

impl Draggable {
    /// Creates a registration following both axes with start anchors and clamping.
    #[must_use]
    pub fn new(container: Rect, element: Rect) -> Self {
        Self {
            container,
            element,
            axis: DragAxis::Both,
            anchor_x: Anchor::Start,
            anchor_y: Anchor::Start,
            overflow_x: false,
            overflow_y: false,
            local: false,
            on_before: None,
            on_start: None,
            on_move: None,
            on_end: None,
            on_click: None,
        }
    }

    /// Returns a copy following `axis`.
    #[must_use]
    pub fn with_axis(mut self, axis: DragAxis) -> Self {
        self.axis = axis;
        self
    }

    /// Returns a copy with the given anchors.
    #[must_use]
    pub fn with_anchor(mut self, x: Anchor, y: Anchor) -> Self {
        self.anchor_x = x;
        self.anchor_y = y;
        self
    }

    /// Returns a copy with the given overflow policy.
    #[must_use]
    pub fn with_overflow(mut self, x: bool, y: bool) -> Self {
        self.overflow_x = x;
        self.overflow_y = y;
        self
    }

    /// Returns a copy with local pointer-up delivery set.
    #[must_use]
    pub fn with_local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    /// Veto callback run on pointer-down; returning `false` keeps the machine idle.
    #[must_use]
    pub fn on_before(mut self, f: impl FnMut(DraggableId, Point) -> bool + 'static) -> Self {
        self.on_before = Some(Box::new(f));
        self
    }

    /// Called once a pointer-down made this registration active.
    #[must_use]
    pub fn on_start(mut self, f: impl FnMut(DraggableId, Point) + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Called for every pointer move past the threshold.
    #[must_use]
    pub fn on_move(
        mut self,
        f: impl FnMut(DraggableId, &DragPosition, &DragChange) + 'static,
    ) -> Self {
        self.on_move = Some(Box::new(f));
        self
    }

    /// Called when a drag is released.
    #[must_use]
    pub fn on_end(
        mut self,
        f: impl FnMut(DraggableId, &DragPosition, &DragChange) + 'static,
    ) -> Self {
        self.on_end = Some(Box::new(f));
        self
    }

    /// Called instead of the end handler when the pointer never left the threshold.
    #[must_use]
    pub fn on_click(
        mut self,
        f: impl FnMut(DraggableId, &DragPosition, &DragChange) + 'static,
    ) -> Self {
        self.on_click = Some(Box::new(f));
        self
    }

    fn validate(&self) -> Result<(), DragError> {
        if self.on_move.is_none() && self.on_end.is_none() {
            return Err(DragError::MissingHandler);
        }
        Ok(())
    }

    fn position(&self, gesture: &Gesture, delta: Vec2) -> DragPosition {
        let x = self.axis.tracks_x().then(|| {
            AxisLayout {
                origin: self.container.x0,
                size: self.container.width(),
                element: self.element.width(),
                anchor: self.anchor_x,
                overflow: self.overflow_x,
            }
            .position(gesture.start.x + delta.x - gesture.grab.x)
        });
        let y = self.axis.tracks_y().then(|| {
            AxisLayout {
                origin: self.container.y0,
                size: self.container.height(),
                element: self.element.height(),
                anchor: self.anchor_y,
                overflow: self.overflow_y,
            }
            .position(gesture.start.y + delta.y - gesture.grab.y)
        });
        DragPosition { x, y }
    }
}

impl fmt::Debug for Draggable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Draggable")
            .field("container", &self.container)
            .field("element", &self.element)
            .field("axis", &self.axis)
            .field("anchor_x", &self.anchor_x)
            .field("anchor_y", &self.anchor_y)
            .field("overflow_x", &self.overflow_x)
            .field("overflow_y", &self.overflow_y)
            .field("local", &self.local)
            .field("on_move", &self.on_move.is_some())
            .field("on_end", &self.on_end.is_some())
            .field("on_click", &self.on_click.is_some())
            .finish_non_exhaustive()
    }
}

/// Container geometry along one axis.
#[derive(Copy, Clone, Debug)]
struct AxisLayout {
    origin: f64,
    size: f64,
    element: f64,
    anchor: Anchor,
    overflow: bool,
}

impl AxisLayout {
    /// `leading` is the element's leading edge in pointer coordinates.
    fn position(self, leading: f64) -> AxisPosition {
        let mut px = leading - self.origin;
        match self.anchor {
            Anchor::Start => {}
            Anchor::Center => px += self.element / 2.0,
            Anchor::End => px += self.element,
        }
        if !self.overflow {
            if px < 0.0 {
                px = 0.0;
            } else if px > self.size {
                px = self.size;
            }
        }
        let percent = if self.size > 0.0 {
            px / self.size * 100.0
        } else {
            0.0
        };
        AxisPosition { px, percent }
    }
}

/// Tracks the active gesture: where it started and where the element was grabbed.
#[derive(Copy, Clone, Debug)]
struct Gesture {
    id: DraggableId,
    start: Point,
    /// Pointer offset from the grabbed element's origin.
    grab: Vec2,
    /// A move past the threshold has been reported.
    dragged: bool,
}

impl Gesture {
    fn change(&self, pos: Point, threshold: Vec2) -> DragChange {
        let delta = pos - self.start;
        DragChange {
            delta,
            x_moved: exceeds(delta.x, threshold.x),
            y_moved: exceeds(delta.y, threshold.y),
        }
    }
}

fn exceeds(delta: f64, threshold: f64) -> bool {
    delta > threshold || delta < -threshold
}

fn check_threshold(axis: DragAxis, value: f64) -> Result<f64, DragError> {
    if value.is_nan() || value < 0.0 {
        return Err(DragError::InvalidThreshold { axis, value });
    }
    Ok(value)
}

/// Drives any number of [`Draggable`] registrations from one pointer stream.
///
/// Timestamps are host-supplied monotonic [`Duration`]s; they only matter for
/// [`was_dragging`](Self::was_dragging).
#[derive(Debug, Default)]
pub struct Draggables {
    registrations: HashMap<DraggableId, Draggable>,
    next_id: u32,
    threshold: Vec2,
    settle_delay: Duration,
    active: Option<Gesture>,
    settle_until: Option<Duration>,
}

impl Draggables {
    /// Creates an idle machine with zero thresholds and no settle delay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `draggable` and returns its id.
    pub fn bind(&mut self, draggable: Draggable) -> Result<DraggableId, DragError> {
        draggable.validate()?;
        let id = DraggableId(self.next_id);
        self.next_id += 1;
        tracing::trace!(?id, axis = ?draggable.axis, local = draggable.local, "draggable bound");
        self.registrations.insert(id, draggable);
        Ok(id)
    }

    /// Binds several registrations, or none if any of them is invalid.
    pub fn bind_all(
        &mut self,
        draggables: impl IntoIterator<Item = Draggable>,
    ) -> Result<Vec<DraggableId>, DragError> {
        let draggables: Vec<Draggable> = draggables.into_iter().collect();
        for d in &draggables {
            d.validate()?;
        }
        draggables.into_iter().map(|d| self.bind(d)).collect()
    }

    /// Removes a registration, cancelling its drag if it is active.
    pub fn unbind(&mut self, id: DraggableId) -> Option<Draggable> {
        if self.active.is_some_and(|g| g.id == id) {
            self.active = None;
            tracing::debug!(?id, "active draggable unbound");
        }
        self.registrations.remove(&id)
    }

    /// Returns the registration for `id`.
    #[must_use]
    pub fn get(&self, id: DraggableId) -> Option<&Draggable> {
        self.registrations.get(&id)
    }

    /// Replaces the geometry of a registration after a layout change.
    pub fn update_geometry(
        &mut self,
        id: DraggableId,
        container: Rect,
        element: Rect,
    ) -> Result<(), DragError> {
        let d = self
            .registrations
            .get_mut(&id)
            .ok_or(DragError::UnknownDraggable(id))?;
        d.container = container;
        d.element = element;
        Ok(())
    }

    /// Horizontal movement a pointer must exceed before a drag begins.
    #[must_use]
    pub fn threshold_x(&self) -> f64 {
        self.threshold.x
    }

    /// Vertical movement a pointer must exceed before a drag begins.
    #[must_use]
    pub fn threshold_y(&self) -> f64 {
        self.threshold.y
    }

    /// Sets the horizontal threshold; rejects NaN and negative values.
    pub fn set_threshold_x(&mut self, value: f64) -> Result<(), DragError> {
        self.threshold.x = check_threshold(DragAxis::X, value)?;
        Ok(())
    }

    /// Sets the vertical threshold; rejects NaN and negative values.
    pub fn set_threshold_y(&mut self, value: f64) -> Result<(), DragError> {
        self.threshold.y = check_threshold(DragAxis::Y, value)?;
        Ok(())
    }

    /// How long [`was_dragging`](Self::was_dragging) stays `true` after a drag ends.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Sets the settle delay.
    pub fn set_settle_delay(&mut self, delay: Duration) {
        self.settle_delay = delay;
    }

    /// The active registration, if a pointer is down on one.
    #[must_use]
    pub fn active(&self) -> Option<DraggableId> {
        self.active.map(|g| g.id)
    }

    /// Handles a pointer-down on registration `id` at `pos`.
    ///
    /// `target` is the bounds of the element that was hit; the pointer's
    /// offset inside it is kept as the grab offset. Returns `Ok(true)` if the
    /// registration became active, `Ok(false)` if another one is already
    /// active or the before callback vetoed.
    pub fn pointer_down(
        &mut self,
        id: DraggableId,
        pos: Point,
        target: Rect,
    ) -> Result<bool, DragError> {
        let d = self
            .registrations
            .get_mut(&id)
            .ok_or(DragError::UnknownDraggable(id))?;
        if let Some(active) = self.active {
            tracing::trace!(?id, active = ?active.id, "pointer down ignored while dragging");
            return Ok(false);
        }
        if let Some(before) = &mut d.on_before {
            if !before(id, pos) {
                tracing::trace!(?id, "drag vetoed");
                return Ok(false);
            }
        }
        self.active = Some(Gesture {
            id,
            start: pos,
            grab: pos - target.origin(),
            dragged: false,
        });
        tracing::debug!(?id, x = pos.x, y = pos.y, "drag started");
        if let Some(start) = &mut d.on_start {
            start(id, pos);
        }
        Ok(true)
    }

    /// Handles a pointer move anywhere in the shared context.
    ///
    /// Returns `true` if the movement exceeded the threshold and counts as a
    /// drag; the move callback has then been invoked.
    pub fn pointer_move(&mut self, pos: Point) -> bool {
        let Some(gesture) = &mut self.active else {
            return false;
        };
        let Some(d) = self.registrations.get_mut(&gesture.id) else {
            return false;
        };
        let change = gesture.change(pos, self.threshold);
        if !change.moved(d.axis) {
            return false;
        }
        if !gesture.dragged {
            tracing::trace!(id = ?gesture.id, "threshold exceeded");
        }
        gesture.dragged = true;
        let position = d.position(gesture, change.delta);
        if let Some(on_move) = &mut d.on_move {
            on_move(gesture.id, &position, &change);
        }
        true
    }

    /// Handles a pointer-up anywhere in the shared context.
    ///
    /// Returns `None` if nothing was active.
    pub fn pointer_up(&mut self, pos: Point, now: Duration) -> Option<Release> {
        self.release(pos, now)
    }

    /// Handles a pointer-up delivered to registration `id` itself.
    ///
    /// Only acts if `id` is the active registration and was bound `local`.
    pub fn pointer_up_on(&mut self, id: DraggableId, pos: Point, now: Duration) -> Option<Release> {
        let is_active = self.active.is_some_and(|g| g.id == id);
        if !is_active || !self.registrations.get(&id).is_some_and(|d| d.local) {
            return None;
        }
        self.release(pos, now)
    }

    fn release(&mut self, pos: Point, now: Duration) -> Option<Release> {
        let gesture = self.active.take()?;
        let d = self.registrations.get_mut(&gesture.id)?;
        let change = gesture.change(pos, self.threshold);
        let position = d.position(&gesture, change.delta);
        if gesture.dragged {
            self.settle_until = Some(now.saturating_add(self.settle_delay));
        }

        let release = match &mut d.on_click {
            Some(click) if !change.moved(d.axis) => {
                click(gesture.id, &position, &change);
                Release::Click
            }
            _ => {
                if let Some(end) = &mut d.on_end {
                    end(gesture.id, &position, &change);
                }
                Release::End
            }
        };
        tracing::debug!(id = ?gesture.id, ?release, "drag released");
        Some(release)
    }

    /// Returns `true` while a drag is in progress or within the settle delay
    /// after one ended at or before `now`.
    ///
    /// Hosts use this to swallow the click that follows a drag release.
    #[must_use]
    pub fn was_dragging(&self, now: Duration) -> bool {
        self.active.is_some_and(|g| g.dragged) || self.settle_until.is_some_and(|until| now <= until)
    }
}
