use sapling_core::{Applier, Element, MemoryApplier, NodeError, NodeId, Root};
use sapling_runtime_std::StdRuntime;

/// Drives a [`Root`] from a host event loop: renders once on creation, then
/// runs a turn whenever the runtime asks for one.
pub struct AppShell<A: Applier> {
    runtime: StdRuntime,
    root: Root<A>,
    target: NodeId,
}

impl<A: Applier> AppShell<A> {
    pub fn new(applier: A, target: NodeId, content: Element) -> Self {
        let runtime = StdRuntime::new();
        let mut root = Root::with_runtime(applier, runtime.runtime());
        if let Err(err) = root.render(content, target) {
            log::error!("initial render failed: {err}");
        }
        Self {
            runtime,
            root,
            target,
        }
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn runtime(&self) -> &StdRuntime {
        &self.runtime
    }

    pub fn root(&self) -> &Root<A> {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Root<A> {
        &mut self.root
    }

    pub fn applier(&self) -> &A {
        self.root.applier()
    }

    pub fn should_render(&self) -> bool {
        self.runtime.take_turn_request() || self.root.has_pending_tasks()
    }

    /// Runs the pending turn, if any. Failures are logged and the shell keeps
    /// going with whatever the target holds.
    pub fn update(&mut self) {
        if !self.root.has_pending_tasks() {
            return;
        }
        match self.root.run_pending() {
            Ok(ran) => log::trace!("turn ran {ran} task(s)"),
            Err(err) => log::error!("re-render failed: {err}"),
        }
    }

    /// Renders `content` in place of the current tree.
    pub fn set_content(&mut self, content: Element) {
        if let Err(err) = self.root.render(content, self.target) {
            log::error!("render failed: {err}");
        }
    }
}

impl AppShell<MemoryApplier> {
    /// Creates a memory-backed shell mounted into a fresh `<body>` node.
    pub fn headless(content: Element) -> Self {
        let mut applier = MemoryApplier::new();
        let target = applier.create_root("body");
        Self::new(applier, target, content)
    }

    /// Delivers `event` to `node` and runs the turn it scheduled.
    pub fn dispatch_event(&mut self, node: NodeId, event: &str) -> Result<usize, NodeError> {
        let handled = self.root.applier().dispatch_event(node, event)?;
        if self.should_render() {
            self.update();
        }
        Ok(handled)
    }

    pub fn log_debug_info(&self) {
        println!("\n");
        println!("════════════════════════════════════════════════════════");
        println!("           DEBUG: CURRENT TREE");
        println!("════════════════════════════════════════════════════════");
        print!("{}", self.root.applier().dump_tree(Some(self.target)));
        println!("render passes: {}", self.root.render_passes());
        println!("════════════════════════════════════════════════════════");
        println!("\n");
    }
}
