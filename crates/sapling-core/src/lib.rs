#![doc = r"Core runtime pieces for the Sapling rebuild-on-render UI engine."]

pub mod applier;
pub mod collections;
pub mod component;
pub mod element;
pub mod hash;
pub mod platform;
pub mod props;
pub mod root;
pub mod runtime;
pub mod state;

pub use applier::{Applier, Event, MemoryApplier, MemoryNode, MemoryNodeKind};
pub use component::{Component, ComponentId};
pub use element::{
    create_element, fragment, text, Child, Element, ElementKind, EventHandler, PropValue, Props,
    CHILDREN_KEY, EVENT_PREFIX, NODE_VALUE_KEY, TEXT_ELEMENT,
};
pub use platform::RuntimeScheduler;
pub use props::{apply_properties, event_name};
pub use root::{Root, RootSession};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
pub use state::{Scope, Setter, StateStore};

#[cfg(test)]
pub use runtime::TestScheduler;

use std::fmt;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    Missing { id: NodeId },
    NotAnElement { id: NodeId },
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Missing { id } => write!(f, "node {id} missing"),
            NodeError::NotAnElement { id } => {
                write!(f, "node {id} is a text node and cannot hold children or listeners")
            }
        }
    }
}

impl std::error::Error for NodeError {}

/// Misuse of the state primitive inside authored component logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// `use_state` was called while no invocation of the scope's component was running.
    OutsideInvocation,
    /// The slot at `index` was created with a different value type, which means the
    /// component made its state calls in a different order than last time.
    SlotTypeMismatch {
        component: ComponentId,
        index: usize,
        expected: &'static str,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::OutsideInvocation => {
                write!(f, "use_state can only be called inside a component invocation")
            }
            StateError::SlotTypeMismatch {
                component,
                index,
                expected,
            } => write!(
                f,
                "state slot {index} of component {component} does not hold a {expected}"
            ),
        }
    }
}

impl std::error::Error for StateError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    Node(NodeError),
    State(StateError),
    /// Raised by component bodies for failures of their own.
    Component { name: String, message: String },
}

impl RenderError {
    pub fn component(name: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::Component {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Node(err) => write!(f, "backend error: {err}"),
            RenderError::State(err) => write!(f, "state error: {err}"),
            RenderError::Component { name, message } => {
                write!(f, "component {name} failed: {message}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Node(err) => Some(err),
            RenderError::State(err) => Some(err),
            RenderError::Component { .. } => None,
        }
    }
}

impl From<NodeError> for RenderError {
    fn from(err: NodeError) -> Self {
        RenderError::Node(err)
    }
}

impl From<StateError> for RenderError {
    fn from(err: StateError) -> Self {
        RenderError::State(err)
    }
}
