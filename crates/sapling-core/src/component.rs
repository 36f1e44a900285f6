//! Stateful-logic units.
//!
//! A [`Component`] is a body `Fn(&Scope, &Props) -> Result<Element, RenderError>`
//! plus a [`ComponentId`] handle. Every [`Component::new`] call mints a fresh
//! handle, and clones share it, so state follows the component value rather than
//! the type of its body. [`Component::of`] reuses one handle per function item,
//! which lets a body name a child component without storing it somewhere.

use std::any::TypeId;
use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::collections::map::{new_store_map, StoreMap};
use crate::element::{Element, Props};
use crate::state::Scope;
use crate::RenderError;

/// Opaque handle of a component, unique for the life of the process.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(usize);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static FUNCTION_ITEMS: RefCell<StoreMap<TypeId, ComponentId>> = RefCell::new(new_store_map());
}

fn fresh_id() -> ComponentId {
    ComponentId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

// A zero-sized body carries no captures and no pointer, so its type names
// exactly one function.
fn function_item_id<F: 'static>() -> ComponentId {
    FUNCTION_ITEMS.with(|items| {
        *items
            .borrow_mut()
            .entry(TypeId::of::<F>())
            .or_insert_with(fresh_id)
    })
}

type ComponentBody = dyn Fn(&Scope, &Props) -> Result<Element, RenderError>;

#[derive(Clone)]
pub struct Component {
    id: ComponentId,
    name: &'static str,
    body: Rc<ComponentBody>,
}

impl Component {
    /// Defines a new component with its own handle and state.
    pub fn new<F>(name: &'static str, body: F) -> Self
    where
        F: Fn(&Scope, &Props) -> Result<Element, RenderError> + 'static,
    {
        Self::with_id(fresh_id(), name, body)
    }

    /// Wraps `body`, naming the component after the body's type.
    ///
    /// For a function item every call returns the same handle, so
    /// `Component::of(counter)` inside a render keeps `counter`'s state across
    /// passes. Function pointers and capturing closures get a fresh handle per
    /// call, like [`Component::new`].
    pub fn of<F>(body: F) -> Self
    where
        F: Fn(&Scope, &Props) -> Result<Element, RenderError> + 'static,
    {
        let full = std::any::type_name::<F>();
        let name = full.rsplit("::").next().unwrap_or(full);
        let id = if mem::size_of::<F>() == 0 {
            function_item_id::<F>()
        } else {
            fresh_id()
        };
        Self::with_id(id, name, body)
    }

    fn with_id<F>(id: ComponentId, name: &'static str, body: F) -> Self
    where
        F: Fn(&Scope, &Props) -> Result<Element, RenderError> + 'static,
    {
        Self {
            id,
            name,
            body: Rc::new(body),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn call(&self, scope: &Scope, props: &Props) -> Result<Element, RenderError> {
        (self.body)(scope, props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
