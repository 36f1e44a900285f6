//! Property and listener application.

use crate::applier::Applier;
use crate::element::{Props, CHILDREN_KEY, EVENT_PREFIX};
use crate::{NodeError, NodeId};

/// Backend event name bound by a property key: `"onClick"` maps to `"click"`.
/// Returns `None` for plain keys.
pub fn event_name(key: &str) -> Option<String> {
    key.strip_prefix(EVENT_PREFIX).map(str::to_lowercase)
}

fn is_plain(key: &str) -> bool {
    key != CHILDREN_KEY && event_name(key).is_none()
}

/// Replaces the bindings of `previous` on `node` with those of `next`.
///
/// Old listeners go first, then old plain properties are blanked, then the new
/// plain properties are set and the new listeners attached. Listener removal and
/// attachment derive the event name the same way, so nothing is left bound twice.
pub fn apply_properties<A: Applier + ?Sized>(
    applier: &mut A,
    node: NodeId,
    previous: &Props,
    next: &Props,
) -> Result<(), NodeError> {
    for (key, value) in previous.iter() {
        if let (Some(event), Some(handler)) = (event_name(key), value.as_handler()) {
            applier.remove_event_listener(node, &event, handler)?;
        }
    }

    for (key, _) in previous.iter().filter(|(key, _)| is_plain(key)) {
        applier.clear_property(node, key)?;
    }

    for (key, value) in next.iter().filter(|(key, _)| is_plain(key)) {
        applier.set_property(node, key, value)?;
    }

    for (key, value) in next.iter() {
        let Some(event) = event_name(key) else {
            continue;
        };
        match value.as_handler() {
            Some(handler) => applier.add_event_listener(node, &event, handler)?,
            None => log::warn!("property {key} on node {node} is not an event handler; skipped"),
        }
    }
    Ok(())
}
