use sapling_core::{Element, MemoryApplier, NodeId, RenderError, Root, RuntimeHandle};

/// Upper bound on turns [`TestRule::pump_until_idle`] runs before giving up.
pub const MAX_IDLE_TURNS: usize = 64;

/// Headless harness for exercising element trees in tests.
///
/// `TestRule` owns a [`Root`] over an in-memory applier together with a
/// `<body>` mount target, and exposes helpers for firing events and draining
/// turns without a real host.
pub struct TestRule {
    root: Root<MemoryApplier>,
    target: NodeId,
    content: Option<Element>,
}

impl TestRule {
    /// Create a new test rule backed by the default in-memory applier.
    pub fn new() -> Self {
        let mut root = Root::new(MemoryApplier::new());
        let target = root.applier_mut().create_root("body");
        Self {
            root,
            target,
            content: None,
        }
    }

    /// Install `content` and perform an initial render.
    pub fn set_content(&mut self, content: Element) -> Result<(), RenderError> {
        self.content = Some(content);
        self.render()
    }

    /// Force a full render of the installed content.
    pub fn rerender(&mut self) -> Result<(), RenderError> {
        self.render()
    }

    /// Run turns until nothing is queued. Returns the number of turns run.
    pub fn pump_until_idle(&mut self) -> Result<usize, RenderError> {
        let mut turns = 0;
        while self.root.has_pending_tasks() {
            if turns == MAX_IDLE_TURNS {
                log::warn!("still busy after {MAX_IDLE_TURNS} turns");
                break;
            }
            self.root.run_pending()?;
            turns += 1;
        }
        Ok(turns)
    }

    /// Fire `event` on `node` and process the work it scheduled.
    pub fn dispatch(&mut self, node: NodeId, event: &str) -> Result<usize, RenderError> {
        let handled = self.root.applier().dispatch_event(node, event)?;
        self.pump_until_idle()?;
        Ok(handled)
    }

    /// Click the `index`-th element with `tag` in document order.
    pub fn click_nth(&mut self, tag: &str, index: usize) -> Result<usize, RenderError> {
        match self.find_by_tag(tag).get(index) {
            Some(node) => self.dispatch(*node, "click"),
            None => Ok(0),
        }
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.root.applier().find_by_tag(self.target, tag)
    }

    /// Text of the whole mounted tree.
    pub fn text_content(&self) -> String {
        self.node_text(self.target)
    }

    /// Text below `node`, empty when the node no longer exists.
    pub fn node_text(&self, node: NodeId) -> String {
        self.root.applier().text_content(node).unwrap_or_default()
    }

    pub fn render_passes(&self) -> u64 {
        self.root.render_passes()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.root.runtime_handle()
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn applier(&self) -> &MemoryApplier {
        self.root.applier()
    }

    pub fn applier_mut(&mut self) -> &mut MemoryApplier {
        self.root.applier_mut()
    }

    /// Gain mutable access to the raw root for advanced scenarios.
    pub fn root(&mut self) -> &mut Root<MemoryApplier> {
        &mut self.root
    }

    /// Indented dump of the mounted tree.
    pub fn dump(&self) -> String {
        self.root.applier().dump_tree(Some(self.target))
    }

    fn render(&mut self) -> Result<(), RenderError> {
        if let Some(content) = self.content.clone() {
            self.root.render(content, self.target)?;
        }
        Ok(())
    }
}

impl Default for TestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `TestRule`.
pub fn run_test_root<R>(f: impl FnOnce(&mut TestRule) -> R) -> R {
    let mut rule = TestRule::new();
    f(&mut rule)
}
