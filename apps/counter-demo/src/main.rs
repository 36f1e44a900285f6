use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sapling_app_shell::AppShell;
use sapling_core::{
    create_element, Child, Component, Element, Event, MemoryApplier, NodeId, PropValue, Props,
    RenderError, Scope,
};

fn counter(scope: &Scope, _props: &Props) -> Result<Element, RenderError> {
    let (count, set_count) = scope.use_state(0_i32)?;
    let (name, set_name) = scope.use_state(String::from("John Doe"))?;

    let increment = move |_: &Event| {
        // Every call reads the same rendered `count`, so this adds one.
        set_count.set(count + 1);
        set_count.set(count + 1);
        set_count.set(count + 1);
    };
    let rename = move |_: &Event| {
        set_name.set("Jane".to_owned());
    };

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
            Child::from(create_element(
                "button",
                Props::new().with("id", "increment").on("onClick", increment),
                ["Increment"],
            )),
            Child::from(create_element(
                "button",
                Props::new().with("id", "rename").on("onClick", rename),
                ["Change Name"],
            )),
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

fn find_button(shell: &AppShell<MemoryApplier>, id: &str) -> Option<NodeId> {
    let applier = shell.applier();
    applier
        .find_by_tag(shell.target(), "button")
        .into_iter()
        .find(|node| {
            applier
                .node(*node)
                .map(|n| n.properties.get("id") == Some(&PropValue::from(id)))
                .unwrap_or(false)
        })
}

fn main() {
    env_logger::init();

    println!("=== Sapling Counter Example ===");
    println!("Usage: counter-demo [increment|rename|dump]...");
    println!();

    let mut shell = AppShell::headless(create_element(
        Component::of(app),
        Props::new(),
        None::<Element>,
    ));
    let wakes = Arc::new(AtomicUsize::new(0));
    shell.runtime().set_turn_waker({
        let wakes = Arc::clone(&wakes);
        move || {
            wakes.fetch_add(1, Ordering::SeqCst);
        }
    });

    let mut actions: Vec<String> = std::env::args().skip(1).collect();
    if actions.is_empty() {
        actions = ["increment", "increment", "rename", "dump"]
            .into_iter()
            .map(str::to_owned)
            .collect();
    }

    shell.log_debug_info();
    for action in &actions {
        match action.as_str() {
            "dump" => shell.log_debug_info(),
            "increment" | "rename" => match find_button(&shell, action) {
                Some(button) => {
                    if let Err(err) = shell.dispatch_event(button, "click") {
                        log::error!("click on {action} failed: {err}");
                    }
                    println!(
                        "{action}: {}",
                        shell
                            .applier()
                            .text_content(shell.target())
                            .unwrap_or_default()
                    );
                }
                None => log::warn!("no {action} button mounted"),
            },
            other => log::warn!("unknown action {other:?}"),
        }
    }

    println!(
        "render passes: {}, turn wakes: {}",
        shell.root().render_passes(),
        wakes.load(Ordering::SeqCst)
    );
}
