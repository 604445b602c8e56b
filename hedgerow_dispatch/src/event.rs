// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event values and their detail payload.
//!
//! An [`Event`] is created fresh for every dispatch call and lives only for the
//! synchronous call chain. Its [`Detail`] always carries the dispatcher that
//! originated the event (`target`) and the one currently handling it
//! (`current`), next to caller-supplied fields.
//!
//! ## Shallow cloning
//!
//! When an event bubbles, its detail is cloned once per hop. The clone is
//! shallow: field values are reference counted, so a field holding shared
//! mutable state (for example an `Rc<RefCell<_>>`) is observed by every hop.
//!
//! Fields are read back with [`Detail::get`], which only matches the exact
//! stored type: a field inserted as `0` is an `i32` and `get::<u32>` misses it.
//!
//! ```
//! use core::cell::Cell;
//! use std::rc::Rc;
//! use hedgerow_dispatch::Detail;
//!
//! let counter = Rc::new(Cell::new(0_u32));
//! let detail = Detail::new().with("count", counter.clone()).with("label", "first");
//! let cloned = detail.clone();
//!
//! cloned.get::<Rc<Cell<u32>>>("count").unwrap().set(3);
//! assert_eq!(counter.get(), 3);
//! assert_eq!(detail.get::<&str>("label"), Some(&"first"));
//! ```

use alloc::rc::Rc;
use alloc::string::String;
use core::any::Any;
use core::fmt;

use hashbrown::HashMap;

use crate::bindable::BindableRef;

/// A reference-counted, type-erased detail field.
#[derive(Clone)]
pub struct DetailValue(Rc<dyn Any>);

impl DetailValue {
    /// Wraps a value.
    #[must_use]
    pub fn new<T: 'static>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Returns `true` if the contained value is of type `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.0.as_ref().is::<T>()
    }

    /// Attempts to downcast to a reference of type `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_ref().downcast_ref::<T>()
    }

    /// Returns `true` if both values share the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for DetailValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailValue")
            .field("type_id", &self.0.as_ref().type_id())
            .finish_non_exhaustive()
    }
}

/// The data payload carried by an [`Event`].
#[derive(Clone, Default)]
pub struct Detail {
    target: Option<BindableRef>,
    current: Option<BindableRef>,
    fields: HashMap<String, DetailValue>,
}

impl Detail {
    /// Creates an empty detail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `key` set to `value`.
    #[must_use]
    pub fn with<T: 'static>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key` to `value`, returning the previous value if any.
    pub fn insert<T: 'static>(&mut self, key: impl Into<String>, value: T) -> Option<DetailValue> {
        self.fields.insert(key.into(), DetailValue::new(value))
    }

    /// Sets `key` to an already erased value.
    pub fn insert_value(&mut self, key: impl Into<String>, value: DetailValue) -> Option<DetailValue> {
        self.fields.insert(key.into(), value)
    }

    /// Returns the field `key` downcast to `T`.
    ///
    /// `T` must be the exact stored type; no numeric widening happens.
    #[must_use]
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.fields.get(key).and_then(DetailValue::downcast_ref)
    }

    /// Returns the erased field `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&DetailValue> {
        self.fields.get(key)
    }

    /// Returns `true` if a field named `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Removes and returns the field `key`.
    pub fn remove(&mut self, key: &str) -> Option<DetailValue> {
        self.fields.remove(key)
    }

    /// Number of caller-supplied fields (excluding `target` and `current`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no caller-supplied fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over field names in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.keys().map(String::as_str)
    }

    /// The dispatcher that originated the event.
    #[must_use]
    pub fn target(&self) -> Option<&BindableRef> {
        self.target.as_ref()
    }

    /// The dispatcher currently handling the event.
    #[must_use]
    pub fn current(&self) -> Option<&BindableRef> {
        self.current.as_ref()
    }

    /// Sets the originating dispatcher.
    pub fn set_target(&mut self, target: BindableRef) {
        self.target = Some(target);
    }

    /// Sets the handling dispatcher.
    pub fn set_current(&mut self, current: BindableRef) {
        self.current = Some(current);
    }

    /// Fills `target` and `current` with `this` where they are absent.
    pub(crate) fn populate(&mut self, this: &BindableRef) {
        if self.target.is_none() {
            self.target = Some(this.clone());
        }
        if self.current.is_none() {
            self.current = Some(this.clone());
        }
    }
}

impl fmt::Debug for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detail")
            .field("has_target", &self.target.is_some())
            .field("has_current", &self.current.is_some())
            .field("fields", &self.fields)
            .finish()
    }
}

/// An event produced by a single dispatch call.
#[derive(Clone, Debug)]
pub struct Event {
    name: String,
    detail: Detail,
    bubbles: bool,
    cancelable: bool,
    cancelled: bool,
    default_prevented: bool,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub fn new(name: impl Into<String>, detail: Detail, bubbles: bool, cancelable: bool) -> Self {
        Self {
            name: name.into(),
            detail,
            bubbles,
            cancelable,
            cancelled: false,
            default_prevented: false,
        }
    }

    /// The event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The event payload.
    #[must_use]
    pub fn detail(&self) -> &Detail {
        &self.detail
    }

    /// Mutable access to the event payload.
    pub fn detail_mut(&mut self) -> &mut Detail {
        &mut self.detail
    }

    /// Whether propagation to a parent dispatcher is attempted.
    #[must_use]
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Whether a listener may veto the default action.
    #[must_use]
    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    /// Stops the remaining listeners of this hop and suppresses bubbling.
    ///
    /// On a cancelable event this also vetoes the default action.
    pub fn stop_immediate_propagation(&mut self) {
        self.cancelled = true;
    }

    /// Returns `true` once [`stop_immediate_propagation`](Self::stop_immediate_propagation) was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Vetoes the default action without stopping propagation.
    ///
    /// Has no effect unless the event is cancelable.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Returns `true` if [`prevent_default`](Self::prevent_default) took effect.
    #[must_use]
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Returns `true` if a listener vetoed the default action.
    #[must_use]
    pub fn is_vetoed(&self) -> bool {
        self.cancelable && (self.cancelled || self.default_prevented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn prevent_default_requires_cancelable() {
        let mut ev = Event::new("x", Detail::new(), true, false);
        ev.prevent_default();
        assert!(!ev.is_default_prevented());
        assert!(!ev.is_vetoed());

        let mut ev = Event::new("x", Detail::new(), true, true);
        ev.prevent_default();
        assert!(ev.is_default_prevented());
        assert!(ev.is_vetoed());
        assert!(!ev.is_cancelled());
    }

    #[test]
    fn stop_immediate_only_vetoes_cancelable_events() {
        let mut ev = Event::new("x", Detail::new(), true, false);
        ev.stop_immediate_propagation();
        assert!(ev.is_cancelled());
        assert!(!ev.is_vetoed());

        let mut ev = Event::new("x", Detail::new(), true, true);
        ev.stop_immediate_propagation();
        assert!(ev.is_vetoed());
    }

    #[test]
    fn detail_fields_are_typed() {
        let mut detail = Detail::new().with("n", 4_u32).with("params", vec![1, 2]);
        assert_eq!(detail.get::<u32>("n"), Some(&4));
        assert_eq!(detail.get::<i64>("n"), None);
        assert_eq!(detail.get::<Vec<i32>>("params").map(Vec::len), Some(2));
        assert!(detail.value("n").is_some_and(DetailValue::is::<u32>));

        let previous = detail.insert("n", 5_u32);
        assert!(previous.is_some());
        assert_eq!(detail.len(), 2);
        assert!(detail.remove("params").is_some());
        assert!(!detail.contains("params"));
    }

    #[test]
    fn clone_is_shallow() {
        let detail = Detail::new().with("shared", 1_u8);
        let cloned = detail.clone();
        assert!(detail.value("shared").unwrap().ptr_eq(cloned.value("shared").unwrap()));
    }

    #[test]
    fn get_needs_the_exact_stored_type() {
        let detail = Detail::new().with("n", 0).with("m", 0_u32);
        assert_eq!(detail.get::<u32>("n"), None);
        assert_eq!(detail.get::<i32>("n"), Some(&0));
        assert_eq!(detail.get::<u32>("m"), Some(&0));
    }
}
