// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=hedgerow_drag --heading-base-level=0

//! Hedgerow Drag: a pointer drag state machine for many drag sources.
//!
//! [`Draggables`] serves any number of [`Draggable`] registrations from a
//! single pointer stream. The host forwards pointer-down on a bound element,
//! and every pointer move and pointer-up in the shared context; the machine
//! decides whether the gesture is a click or a drag and calls the
//! registration's callbacks with the clamped position of the dragged element.
//!
//! The crate owns no event loop or timers. Geometry comes in as [`kurbo`]
//! rectangles and timestamps as host-supplied [`Duration`](core::time::Duration)s.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use kurbo::{Point, Rect};
//! use hedgerow_drag::{Draggable, Draggables};
//!
//! let track = Rect::new(0.0, 0.0, 200.0, 20.0);
//! let knob = Rect::new(0.0, 0.0, 20.0, 20.0);
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! let mut drags = Draggables::new();
//! let id = drags
//!     .bind(Draggable::new(track, knob).on_move(move |_, position, _| {
//!         log.borrow_mut().push(position.x.unwrap().percent);
//!     }))
//!     .unwrap();
//!
//! drags.pointer_down(id, Point::new(5.0, 5.0), knob).unwrap();
//! drags.pointer_move(Point::new(105.0, 5.0));
//! assert_eq!(*seen.borrow(), vec![50.0]);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod draggables;
mod error;

pub use draggables::{
    Anchor, AxisPosition, DragAxis, DragChange, DragPosition, Draggable, DraggableId, Draggables,
    Release,
};
pub use error::DragError;
