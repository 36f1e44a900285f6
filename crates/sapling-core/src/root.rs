//! Materialization and the root session.
//!
//! [`Root`] turns elements into backend nodes and owns everything a re-render
//! needs: the applier, the state store and the runtime holding the remembered
//! session. Every pass clears the mount target and rebuilds it from scratch. If a
//! pass fails halfway the target keeps whatever was appended before the failure.

use std::sync::Arc;

use crate::applier::Applier;
use crate::element::{Element, ElementKind, Props, NODE_VALUE_KEY};
use crate::props::apply_properties;
use crate::runtime::{DefaultScheduler, Runtime, RuntimeHandle, Task};
use crate::state::StateStore;
use crate::{NodeId, RenderError};

/// Last rendered element together with the node it was mounted into.
#[derive(Clone, Debug)]
pub struct RootSession {
    pub element: Element,
    pub target: NodeId,
}

pub struct Root<A: Applier> {
    applier: A,
    runtime: Runtime,
    store: StateStore,
    passes: u64,
}

impl<A: Applier> Root<A> {
    pub fn new(applier: A) -> Self {
        Self::with_runtime(applier, Runtime::new(Arc::new(DefaultScheduler)))
    }

    pub fn with_runtime(applier: A, runtime: Runtime) -> Self {
        let store = StateStore::new(runtime.handle());
        Self {
            applier,
            runtime,
            store,
            passes: 0,
        }
    }

    pub fn applier(&self) -> &A {
        &self.applier
    }

    pub fn applier_mut(&mut self) -> &mut A {
        &mut self.applier
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn session(&self) -> Option<RootSession> {
        self.runtime.session()
    }

    /// Number of render passes started so far.
    pub fn render_passes(&self) -> u64 {
        self.passes
    }

    /// Mounts `element` as the only content of `target` and remembers both for
    /// later re-renders. Returns the nodes appended to `target`.
    pub fn render(&mut self, element: Element, target: NodeId) -> Result<Vec<NodeId>, RenderError> {
        self.runtime.set_session(RootSession {
            element: element.clone(),
            target,
        });
        self.passes += 1;
        log::debug!("render pass {} into node {target}", self.passes);

        self.applier.clear_children(target)?;
        let nodes = self.materialize(&element)?;
        for node in &nodes {
            self.applier.append_child(target, *node)?;
        }
        Ok(nodes)
    }

    /// Builds the backend nodes for `element`. Components are invoked and replaced
    /// by what they return; fragments contribute all of their children's nodes.
    pub fn materialize(&mut self, element: &Element) -> Result<Vec<NodeId>, RenderError> {
        match element.kind() {
            ElementKind::Component(component) => {
                let rendered = self.store.invoke(component, element.props())?;
                self.materialize(&rendered)
            }
            ElementKind::Fragment => {
                let mut nodes = Vec::new();
                for child in element.children() {
                    nodes.extend(self.materialize(child)?);
                }
                Ok(nodes)
            }
            ElementKind::Tag(_) if element.is_text() => {
                let value = element
                    .props()
                    .get(NODE_VALUE_KEY)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                Ok(vec![self.applier.create_text(&value)?])
            }
            ElementKind::Tag(tag) => {
                let node = self.applier.create_element(tag)?;
                apply_properties(&mut self.applier, node, &Props::new(), element.props())?;
                for child in element.children() {
                    for child_node in self.materialize(child)? {
                        self.applier.append_child(node, child_node)?;
                    }
                }
                Ok(vec![node])
            }
        }
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.runtime.has_pending_tasks()
    }

    /// Runs one turn: everything queued before the call, in FIFO order. A queued
    /// re-render renders the remembered session again. Returns the number of tasks
    /// run, or the error of the first failed re-render once the turn is over.
    pub fn run_pending(&mut self) -> Result<usize, RenderError> {
        let tasks = self.runtime.take_turn();
        let ran = tasks.len();
        let mut failure = None;
        for task in tasks {
            match task {
                Task::Callback(callback) => callback(),
                Task::Rerender => {
                    let result = self.rerender();
                    self.runtime.finish_rerender();
                    if let Err(err) = result {
                        log::debug!("re-render failed: {err}");
                        failure.get_or_insert(err);
                    }
                }
            }
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(ran),
        }
    }

    fn rerender(&mut self) -> Result<(), RenderError> {
        match self.runtime.session() {
            Some(session) => self.render(session.element, session.target).map(|_| ()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "tests/root_tests.rs"]
mod tests;
