// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag configuration errors.

use alloc::string::String;

use crate::draggables::{DragAxis, DraggableId};

/// A drag registration or setting was rejected.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DragError {
    /// A threshold was NaN or negative.
    #[error("invalid threshold {value} on {axis:?}, value must be 0 or a positive number")]
    InvalidThreshold {
        /// The axis the threshold was meant for.
        axis: DragAxis,
        /// The rejected value.
        value: f64,
    },
    /// A registration had neither a move nor an end handler.
    #[error("draggable needs an on_move or on_end handler")]
    MissingHandler,
    /// The id does not name a bound draggable.
    #[error("unknown draggable {0:?}")]
    UnknownDraggable(DraggableId),
    /// An anchor keyword was not recognized.
    #[error("unknown anchor \"{0}\"")]
    UnknownAnchor(String),
}
