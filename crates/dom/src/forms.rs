//! Form entry lists
//!
//! Builds the `(name, value)` list a host produces for `new FormData(form)`.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId};
use crate::utils::collapse_whitespace;

const LISTED_CONTROLS: &[&str] = &["button", "input", "select", "textarea"];

/// Input types that never contribute an entry
const SKIPPED_INPUT_TYPES: &[&str] = &["submit", "button", "reset", "image", "file"];

/// Entries of a form's submittable controls, in tree order
pub fn form_entries(arena: &DomArena, form_id: NodeId) -> Result<Vec<(String, String)>> {
    let form = arena.element(form_id)?;
    if form.node_name != "form" {
        return Err(DomError::InvalidNodeType {
            expected: "form".to_string(),
            actual: form.node_name.clone(),
        });
    }

    let is_control =
        |node: &DomNode| node.is_element() && LISTED_CONTROLS.contains(&node.node_name.as_str());

    // Controls outside the form can join it through their `form` attribute,
    // which only resolves inside the document
    let candidates = if arena.is_connected(form_id) {
        arena.find(is_control)
    } else {
        arena
            .descendants(form_id)?
            .into_iter()
            .filter(|&id| arena.get(id).map(is_control).unwrap_or(false))
            .collect()
    };

    let mut entries = Vec::new();
    for control_id in candidates {
        if form_owner(arena, control_id) != Some(form_id) || is_disabled(arena, control_id) {
            continue;
        }
        let control = arena.get(control_id)?;
        let Some(name) = control.attr("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        for value in control_values(arena, control)? {
            entries.push((name.to_string(), value));
        }
    }

    tracing::debug!(form = form_id, entries = entries.len(), "collected form entries");
    Ok(entries)
}

/// The form a control belongs to: for a connected control, the target of its
/// `form` attribute; otherwise its nearest `<form>` ancestor
fn form_owner(arena: &DomArena, control_id: NodeId) -> Option<NodeId> {
    let control = arena.get(control_id).ok()?;
    if let Some(form_ref) = control.attr("form").filter(|_| arena.is_connected(control_id)) {
        let target = arena.find_by_id(form_ref)?;
        return arena.get(target).ok()?.is_tag("form").then_some(target);
    }
    arena
        .ancestors(control_id)
        .ok()?
        .into_iter()
        .find(|&id| arena.get(id).map(|n| n.is_tag("form")).unwrap_or(false))
}

/// Own `disabled` attribute, or inside a disabled `<fieldset>` but not within
/// that fieldset's first `<legend>`
fn is_disabled(arena: &DomArena, control_id: NodeId) -> bool {
    let Ok(control) = arena.get(control_id) else {
        return true;
    };
    if control.has_attr("disabled") {
        return true;
    }

    let Ok(ancestors) = arena.ancestors(control_id) else {
        return false;
    };
    ancestors.iter().any(|&id| {
        let Ok(node) = arena.get(id) else {
            return false;
        };
        if !node.is_tag("fieldset") || !node.has_attr("disabled") {
            return false;
        }
        let first_legend = node
            .children_ids
            .iter()
            .copied()
            .find(|&c| arena.get(c).map(|n| n.is_tag("legend")).unwrap_or(false));
        match first_legend {
            Some(legend) => !arena.is_inclusive_ancestor(legend, control_id),
            None => true,
        }
    })
}

/// Values contributed by one named, enabled control
fn control_values(arena: &DomArena, control: &DomNode) -> Result<Vec<String>> {
    match control.node_name.as_str() {
        "input" => {
            let kind = control.attr("type").unwrap_or("text").to_ascii_lowercase();
            if SKIPPED_INPUT_TYPES.contains(&kind.as_str()) {
                return Ok(Vec::new());
            }
            if kind == "checkbox" || kind == "radio" {
                if !control.has_attr("checked") {
                    return Ok(Vec::new());
                }
                return Ok(vec![control.attr("value").unwrap_or("on").to_string()]);
            }
            Ok(vec![control.attr("value").unwrap_or("").to_string()])
        }
        "textarea" => Ok(vec![arena.text_content(control.node_id)?]),
        "select" => select_values(arena, control),
        // Buttons only contribute when they submit the form
        _ => Ok(Vec::new()),
    }
}

fn select_values(arena: &DomArena, select: &DomNode) -> Result<Vec<String>> {
    let options: Vec<&DomNode> = arena
        .descendants(select.node_id)?
        .into_iter()
        .filter_map(|id| arena.get(id).ok())
        .filter(|n| n.is_tag("option"))
        .collect();

    let mut selected: Vec<&DomNode> = options
        .iter()
        .copied()
        .filter(|o| o.has_attr("selected") && !o.has_attr("disabled"))
        .collect();

    if !select.has_attr("multiple") {
        // Single select: the last selected option wins, else the first enabled
        selected = match selected.last() {
            Some(&last) => vec![last],
            None => options
                .iter()
                .copied()
                .find(|o| !o.has_attr("disabled"))
                .into_iter()
                .collect(),
        };
    }

    selected
        .into_iter()
        .map(|option| option_value(arena, option))
        .collect()
}

fn option_value(arena: &DomArena, option: &DomNode) -> Result<String> {
    match option.attr("value") {
        Some(value) => Ok(value.to_string()),
        None => {
            let text = arena.text_content(option.node_id)?;
            Ok(collapse_whitespace(&text))
        }
    }
}
