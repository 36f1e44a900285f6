use super::*;
use crate::applier::MemoryApplier;
use crate::component::Component;
use crate::element::{create_element, fragment, text, Child};
use crate::runtime::TestScheduler;
use crate::state::Scope;
use crate::StateError;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

thread_local! {
    static COUNTER_INVOCATIONS: Cell<usize> = Cell::new(0);
    static TURN_LOG: RefCell<Vec<String>> = RefCell::new(Vec::new());
    static FAIL_RENDER: Cell<bool> = Cell::new(false);
}

fn counter(scope: &Scope, _props: &Props) -> Result<Element, RenderError> {
    COUNTER_INVOCATIONS.with(|count| count.set(count.get() + 1));
    let (count, set_count) = scope.use_state(0_i32)?;
    let (name, set_name) = scope.use_state(String::from("John Doe"))?;

    let increment = Props::new().with("id", "inc").on("onClick", move |_| {
        set_count.set(count + 1);
        set_count.set(count + 1);
        set_count.set(count + 1);
    });
    let rename = Props::new().with("id", "rename").on("onClick", move |_| {
        set_name.set("Jane".to_owned());
    });

    Ok(create_element(
        "div",
        Props::new(),
        [
            Child::from(create_element(
                "h1",
                Props::new(),
                [Child::from("Counter: "), Child::from(count)],
            )),
            Child::from(create_element("p", Props::new(), [name])),
            Child::from(create_element("button", increment, ["Increment"])),
            Child::from(create_element("button", rename, ["Rename"])),
        ],
    ))
}

fn app(_scope: &Scope, _props: &Props) -> Result<Element, RenderError> {
    Ok(create_element(
        "div",
        Props::new().with("className", "app"),
        [
            create_element("h1", Props::new(), ["My React Implementation"]),
            create_element(Component::of(counter), Props::new(), None::<Element>),
        ],
    ))
}

fn mount(element: Element) -> (Root<MemoryApplier>, NodeId) {
    let mut root = Root::new(MemoryApplier::new());
    let target = root.applier_mut().create_root("body");
    root.render(element, target).expect("initial render");
    (root, target)
}

fn app_element() -> Element {
    create_element(Component::of(app), Props::new(), None::<Element>)
}

fn button(root: &Root<MemoryApplier>, target: NodeId, id: &str) -> NodeId {
    root.applier()
        .find_by_tag(target, "button")
        .into_iter()
        .find(|node| {
            root.applier().node(*node).unwrap().properties.get("id")
                == Some(&crate::element::PropValue::from(id))
        })
        .expect("button present")
}

fn heading_text(root: &Root<MemoryApplier>, target: NodeId) -> String {
    let headings = root.applier().find_by_tag(target, "h1");
    root.applier().text_content(*headings.last().unwrap()).unwrap()
}

fn paragraph_text(root: &Root<MemoryApplier>, target: NodeId) -> String {
    let paragraphs = root.applier().find_by_tag(target, "p");
    root.applier().text_content(paragraphs[0]).unwrap()
}

#[test]
fn render_mounts_nested_components() {
    let (root, target) = mount(app_element());

    let children = root.applier().children(target).unwrap();
    assert_eq!(children.len(), 1);
    let app_node = root.applier().node(children[0]).unwrap();
    assert_eq!(app_node.tag(), Some("div"));
    assert_eq!(
        app_node.properties.get("className"),
        Some(&crate::element::PropValue::from("app"))
    );
    assert_eq!(heading_text(&root, target), "Counter: 0");
    assert_eq!(paragraph_text(&root, target), "John Doe");
    assert_eq!(root.render_passes(), 1);
}

#[test]
fn end_to_end_counter_coalesces_three_sets_into_one_pass() {
    let (mut root, target) = mount(app_element());
    let before = COUNTER_INVOCATIONS.with(Cell::get);

    let inc = button(&root, target, "inc");
    assert_eq!(root.applier().dispatch_event(inc, "click").unwrap(), 1);
    assert!(root.has_pending_tasks());
    assert_eq!(heading_text(&root, target), "Counter: 0");

    assert_eq!(root.run_pending().unwrap(), 1);
    assert!(!root.has_pending_tasks());
    assert_eq!(root.render_passes(), 2);
    assert_eq!(COUNTER_INVOCATIONS.with(Cell::get), before + 1);
    assert_eq!(heading_text(&root, target), "Counter: 1");
    assert_eq!(paragraph_text(&root, target), "John Doe");

    let rename = button(&root, target, "rename");
    root.applier().dispatch_event(rename, "click").unwrap();
    root.run_pending().unwrap();
    assert_eq!(paragraph_text(&root, target), "Jane");
    assert_eq!(heading_text(&root, target), "Counter: 1");

    // Setting the same name again changes nothing and schedules nothing.
    let rename = button(&root, target, "rename");
    root.applier().dispatch_event(rename, "click").unwrap();
    assert!(!root.has_pending_tasks());
    assert_eq!(root.render_passes(), 3);
}

#[test]
fn full_rebuild_leaves_no_residue() {
    let mut root = Root::new(MemoryApplier::new());
    let target = root.applier_mut().create_root("body");
    let first = create_element(
        "ul",
        Props::new(),
        [
            create_element("li", Props::new(), ["a"]),
            create_element("li", Props::new(), ["b"]),
        ],
    );
    let second = create_element("section", Props::new(), ["only"]);

    root.render(first, target).unwrap();
    let nodes = root.render(second, target).unwrap();

    assert_eq!(root.applier().children(target).unwrap(), nodes.as_slice());
    assert!(root.applier().find_by_tag(target, "li").is_empty());
    assert_eq!(root.applier().text_content(target).unwrap(), "only");
    // body + section + text
    assert_eq!(root.applier().len(), 3);
}

#[test]
fn rerender_binds_exactly_one_listener_per_event() {
    let (mut root, target) = mount(app_element());

    for _ in 0..3 {
        let inc = button(&root, target, "inc");
        root.applier().dispatch_event(inc, "click").unwrap();
        root.run_pending().unwrap();
    }

    let inc = button(&root, target, "inc");
    assert_eq!(root.applier().listener_count(inc, "click").unwrap(), 1);
    assert_eq!(heading_text(&root, target), "Counter: 3");
    let live_buttons = root.applier().find_by_tag(target, "button").len();
    assert_eq!(live_buttons, 2);
}

#[test]
fn fragments_splice_children_into_parent() {
    let mut root = Root::new(MemoryApplier::new());
    let target = root.applier_mut().create_root("body");
    let list = create_element(
        "ol",
        Props::new(),
        [fragment([text("x"), text("y")]), text("z")],
    );

    root.render(list, target).unwrap();

    let ol = root.applier().find_by_tag(target, "ol")[0];
    assert_eq!(root.applier().children(ol).unwrap().len(), 3);
    assert_eq!(root.applier().text_content(ol).unwrap(), "xyz");

    let nodes = root
        .render(fragment([text("left"), text("right")]), target)
        .unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(root.applier().text_content(target).unwrap(), "leftright");
}

#[test]
fn turn_runs_rerender_in_fifo_order_with_other_tasks() {
    let logger = Component::new("Logger", |scope: &Scope, _props: &Props| {
        let (value, set_value) = scope.use_state(0_i32)?;
        TURN_LOG.with(|log| log.borrow_mut().push(format!("render {value}")));
        let runtime = scope.runtime();
        Ok(create_element(
            "button",
            Props::new().on("onClick", move |_| {
                runtime.spawn_task(|| TURN_LOG.with(|log| log.borrow_mut().push("before".into())));
                set_value.set(value + 1);
                runtime.spawn_task(|| TURN_LOG.with(|log| log.borrow_mut().push("after".into())));
            }),
            [value],
        ))
    });
    let (mut root, target) = mount(create_element(&logger, Props::new(), None::<Element>));
    let node = root.applier().find_by_tag(target, "button")[0];

    root.applier().dispatch_event(node, "click").unwrap();
    assert_eq!(root.run_pending().unwrap(), 3);

    let log = TURN_LOG.with(|log| log.borrow().clone());
    assert_eq!(log, vec!["render 0", "before", "render 1", "after"]);
}

#[test]
fn work_queued_during_a_turn_waits_for_the_next_turn() {
    let scheduler = Arc::new(TestScheduler::default());
    let runtime = crate::runtime::Runtime::new(scheduler.clone());
    let mut root = Root::with_runtime(MemoryApplier::new(), runtime);
    let handle = root.runtime_handle();
    let ran = Rc::new(Cell::new(0));

    let inner_handle = handle.clone();
    let runs = ran.clone();
    handle.spawn_task(move || {
        runs.set(runs.get() + 1);
        let runs = runs.clone();
        inner_handle.spawn_task(move || runs.set(runs.get() + 1));
    });

    assert_eq!(root.run_pending().unwrap(), 1);
    assert_eq!(ran.get(), 1);
    assert!(root.has_pending_tasks());
    assert_eq!(root.run_pending().unwrap(), 1);
    assert_eq!(ran.get(), 2);
    assert_eq!(scheduler.requests(), 2);
}

#[test]
fn rerender_request_before_first_render_is_ignored() {
    let root = Root::new(MemoryApplier::new());
    assert!(!root.runtime_handle().request_rerender());
    assert!(!root.has_pending_tasks());
    assert!(root.session().is_none());
}

fn flaky(scope: &Scope, _props: &Props) -> Result<Element, RenderError> {
    let (clicks, set_clicks) = scope.use_state(0_u32)?;
    if FAIL_RENDER.with(Cell::get) {
        return Err(RenderError::component("Flaky", "refusing to render"));
    }
    Ok(create_element(
        "button",
        Props::new().on("onClick", move |_| {
            set_clicks.set(clicks + 1);
        }),
        [clicks],
    ))
}

#[test]
fn failed_rerender_clears_pending_flag_and_target() {
    let (mut root, target) = mount(create_element(
        Component::of(flaky),
        Props::new(),
        None::<Element>,
    ));
    let node = root.applier().find_by_tag(target, "button")[0];

    FAIL_RENDER.with(|flag| flag.set(true));
    root.applier().dispatch_event(node, "click").unwrap();
    let err = root.run_pending().unwrap_err();
    FAIL_RENDER.with(|flag| flag.set(false));

    assert_eq!(err, RenderError::component("Flaky", "refusing to render"));
    assert!(!root.runtime().is_rerender_pending());
    assert!(root.applier().children(target).unwrap().is_empty());
    assert_eq!(root.store().current(), None);

    // The session survives, so an explicit re-render recovers.
    let session = root.session().unwrap();
    root.render(session.element, session.target).unwrap();
    assert_eq!(root.applier().text_content(target).unwrap(), "1");
}

#[test]
fn state_error_aborts_render() {
    let broken = Component::new("Broken", |scope: &Scope, _props: &Props| {
        let stale = scope.clone();
        let outer = Component::new("Outer", move |_scope: &Scope, _props: &Props| {
            stale.use_state(0)?;
            Ok(text("unreachable"))
        });
        Ok(create_element(outer, Props::new(), None::<Element>))
    });
    let mut root = Root::new(MemoryApplier::new());
    let target = root.applier_mut().create_root("body");

    let err = root
        .render(create_element(&broken, Props::new(), None::<Element>), target)
        .unwrap_err();

    assert_eq!(err, RenderError::State(StateError::OutsideInvocation));
}

type Body = fn(&Scope, &Props) -> Result<Element, RenderError>;

fn alpha(scope: &Scope, _props: &Props) -> Result<Element, RenderError> {
    let (value, _) = scope.use_state(String::from("alpha"))?;
    Ok(text(value))
}

fn beta(scope: &Scope, _props: &Props) -> Result<Element, RenderError> {
    let (value, _) = scope.use_state(String::from("beta"))?;
    Ok(text(value))
}

fn labelled(label: &'static str) -> Component {
    Component::new("Labelled", move |scope: &Scope, _props: &Props| {
        let (value, _) = scope.use_state(label.to_owned())?;
        Ok(text(value))
    })
}

fn render_side_by_side(left: &Component, right: &Component) -> String {
    let mut root = Root::new(MemoryApplier::new());
    let target = root.applier_mut().create_root("body");
    let pair = fragment([
        create_element(left, Props::new(), None::<Element>),
        create_element(right, Props::new(), None::<Element>),
    ]);
    root.render(pair.clone(), target).unwrap();
    root.render(pair, target).unwrap();
    root.applier().text_content(target).unwrap()
}

#[test]
fn components_sharing_a_body_type_keep_separate_state() {
    let first = Component::new("Alpha", alpha as Body);
    let second = Component::new("Beta", beta as Body);
    assert_ne!(first.id(), second.id());
    assert_eq!(render_side_by_side(&first, &second), "alphabeta");

    let left = labelled("left");
    let right = labelled("right");
    assert_ne!(left.id(), right.id());
    assert_eq!(render_side_by_side(&left, &right), "leftright");
}

#[test]
fn text_element_renders_non_string_node_value() {
    let mut root = Root::new(MemoryApplier::new());
    let target = root.applier_mut().create_root("body");
    let five = create_element(
        crate::element::TEXT_ELEMENT,
        Props::new().with(crate::element::NODE_VALUE_KEY, 5),
        None::<Element>,
    );
    let flag = create_element(
        crate::element::TEXT_ELEMENT,
        Props::new().with(crate::element::NODE_VALUE_KEY, true),
        None::<Element>,
    );

    root.render(fragment([five, flag]), target).unwrap();

    assert_eq!(root.applier().text_content(target).unwrap(), "5true");
}

#[test]
fn repeated_renders_reuse_backend_storage() {
    let mut root = Root::new(MemoryApplier::new());
    let target = root.applier_mut().create_root("body");
    root.render(create_element("div", Props::new(), [0_i32]), target)
        .unwrap();
    let allocated = root.applier().capacity();

    for pass in 1..1000_i32 {
        root.render(create_element("div", Props::new(), [pass]), target)
            .unwrap();
    }

    assert_eq!(root.applier().capacity(), allocated);
    assert_eq!(root.applier().len(), 3);
    assert_eq!(root.applier().text_content(target).unwrap(), "999");
}
