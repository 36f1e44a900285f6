//! Per-component state slots.
//!
//! Every component owns an ordered list of slots. The n-th `use_state` call of an
//! invocation reads slot n, so a component has to make the same state calls in
//! the same order every time it runs. Slots are created on first use and never
//! removed.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::collections::map::{new_store_map, StoreMap};
use crate::component::{Component, ComponentId};
use crate::element::{Element, Props};
use crate::runtime::RuntimeHandle;
use crate::{RenderError, StateError};

#[derive(Default)]
struct ComponentSlots {
    values: Vec<Box<dyn Any>>,
    // Slot indices handed out during the running invocation.
    cursor: Vec<usize>,
}

struct StoreInner {
    entries: StoreMap<ComponentId, ComponentSlots>,
    current: Option<ComponentId>,
}

impl StoreInner {
    fn new() -> Self {
        Self {
            entries: new_store_map(),
            current: None,
        }
    }

    fn entry_mut(&mut self, id: ComponentId) -> &mut ComponentSlots {
        self.entries.entry(id).or_default()
    }

    fn slot<T: 'static>(&self, id: ComponentId, index: usize) -> Option<&T> {
        self.entries
            .get(&id)?
            .values
            .get(index)?
            .downcast_ref::<T>()
    }

    fn slot_mut<T: 'static>(&mut self, id: ComponentId, index: usize) -> Option<&mut T> {
        self.entries
            .get_mut(&id)?
            .values
            .get_mut(index)?
            .downcast_mut::<T>()
    }
}

/// Component slots of one root, keyed by [`ComponentId`].
#[derive(Clone)]
pub struct StateStore {
    inner: Rc<RefCell<StoreInner>>,
    runtime: RuntimeHandle,
}

impl StateStore {
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner::new())),
            runtime,
        }
    }

    /// Component whose invocation is running, if any.
    pub fn current(&self) -> Option<ComponentId> {
        self.inner.borrow().current
    }

    /// Number of components that own slots in this store.
    pub fn component_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn slot_count(&self, component: ComponentId) -> usize {
        self.inner
            .borrow()
            .entries
            .get(&component)
            .map_or(0, |entry| entry.values.len())
    }

    /// Runs `component` with a fresh call cursor and returns what it rendered.
    pub(crate) fn invoke(&self, component: &Component, props: &Props) -> Result<Element, RenderError> {
        let _invocation = Invocation::enter(self, component.id());
        log::trace!("invoking component {} {}", component.name(), component.id());
        let scope = Scope {
            store: self.clone(),
            component: component.id(),
        };
        component.call(&scope, props)
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("StateStore")
            .field("components", &inner.entries.len())
            .field("current", &inner.current)
            .finish()
    }
}

/// Marks a component as the running one for as long as it lives. Dropping it
/// restores the previously running component, also when the body bails out early.
struct Invocation<'a> {
    store: &'a StateStore,
    component: ComponentId,
    previous: Option<ComponentId>,
}

impl<'a> Invocation<'a> {
    fn enter(store: &'a StateStore, component: ComponentId) -> Self {
        let mut inner = store.inner.borrow_mut();
        let previous = inner.current.replace(component);
        inner.entry_mut(component).cursor.clear();
        Self {
            store,
            component,
            previous,
        }
    }
}

impl Drop for Invocation<'_> {
    fn drop(&mut self) {
        match self.store.inner.try_borrow_mut() {
            Ok(mut inner) => {
                inner.entry_mut(self.component).cursor.clear();
                inner.current = self.previous;
            }
            Err(_) => log::warn!(
                "state store busy while leaving component {}; marker not restored",
                self.component
            ),
        }
    }
}

/// Invocation context handed to a component body.
#[derive(Clone)]
pub struct Scope {
    store: StateStore,
    component: ComponentId,
}

impl Scope {
    pub fn component(&self) -> ComponentId {
        self.component
    }

    pub fn runtime(&self) -> RuntimeHandle {
        self.store.runtime.clone()
    }

    pub fn use_state<T>(&self, initial: T) -> Result<(T, Setter<T>), StateError>
    where
        T: Clone + PartialEq + 'static,
    {
        self.use_state_with(|| initial)
    }

    /// Like [`Scope::use_state`], building the initial value only when the slot is new.
    pub fn use_state_with<T>(&self, init: impl FnOnce() -> T) -> Result<(T, Setter<T>), StateError>
    where
        T: Clone + PartialEq + 'static,
    {
        let (index, is_new) = {
            let mut inner = self.store.inner.borrow_mut();
            if inner.current != Some(self.component) {
                return Err(StateError::OutsideInvocation);
            }
            let entry = inner.entry_mut(self.component);
            let index = entry.cursor.len();
            (index, index >= entry.values.len())
        };
        // The initializer runs without the store borrowed.
        let initial = is_new.then(init);

        let mut inner = self.store.inner.borrow_mut();
        let entry = inner.entry_mut(self.component);
        if let Some(initial) = initial {
            entry.values.push(Box::new(initial));
        }
        let value = entry.values[index]
            .downcast_ref::<T>()
            .cloned()
            .ok_or(StateError::SlotTypeMismatch {
                component: self.component,
                index,
                expected: type_name::<T>(),
            })?;
        entry.cursor.push(index);
        let setter = Setter {
            store: Rc::downgrade(&self.store.inner),
            runtime: self.store.runtime.clone(),
            component: self.component,
            index,
            _marker: PhantomData,
        };
        Ok((value, setter))
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("component", &self.component)
            .finish()
    }
}

/// Writes one state slot. Setters may be kept past the invocation that created
/// them; they stop doing anything once the owning store is dropped.
pub struct Setter<T> {
    store: Weak<RefCell<StoreInner>>,
    runtime: RuntimeHandle,
    component: ComponentId,
    index: usize,
    _marker: PhantomData<fn(T)>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            runtime: self.runtime.clone(),
            component: self.component,
            index: self.index,
            _marker: PhantomData,
        }
    }
}

impl<T: PartialEq + 'static> Setter<T> {
    /// Stores `value` and requests a re-render, unless the slot already holds an
    /// equal value. Returns whether the slot changed.
    pub fn set(&self, value: T) -> bool {
        let Some(store) = self.store.upgrade() else {
            return false;
        };
        let changed = {
            let mut inner = store.borrow_mut();
            match inner.slot_mut::<T>(self.component, self.index) {
                Some(slot) if *slot != value => {
                    *slot = value;
                    true
                }
                Some(_) => false,
                None => {
                    log::warn!(
                        "setter for slot {} of component {} no longer matches its slot",
                        self.index,
                        self.component
                    );
                    false
                }
            }
        };
        if changed {
            self.runtime.request_rerender();
        }
        changed
    }
}

impl<T: Clone + PartialEq + 'static> Setter<T> {
    /// Current value of the slot, or `None` once the store is gone.
    pub fn get(&self) -> Option<T> {
        let store = self.store.upgrade()?;
        let inner = store.borrow();
        inner.slot::<T>(self.component, self.index).cloned()
    }

    /// Sets the slot to `f(current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        match self.get() {
            Some(current) => self.set(f(&current)),
            None => false,
        }
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("component", &self.component)
            .field("index", &self.index)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
