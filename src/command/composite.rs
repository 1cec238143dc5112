//! Compound edits built as macros of the primitive edits.
//!
//! Each builder opens a macro on the stack (or joins one that is already
//! open), pushes primitives against the live model, and closes it. A failure
//! part way through rolls back whatever was already applied.

use crate::command::edits::{AddNode, ConnectPlugs, DeleteNode, DetachPlug, MoveNodes, SetViewing};
use crate::command::stack::CommandStack;
use crate::graph::{GraphError, GraphModel, GraphResult, Plug, PlugRef, Point};

fn attached_inputs_of(model: &GraphModel, name: &str) -> GraphResult<Vec<PlugRef>> {
    Ok(model
        .node(name)?
        .inputs()
        .iter()
        .filter(|input| input.is_attached())
        .map(|input| PlugRef::input(name, input.index()))
        .collect())
}

/// Cut every cable touching `name`.
///
/// With `splice`, the node feeding its first attached input is wired straight
/// to the former consumers so the pipeline stays connected around the gap.
pub fn disconnect_node(
    stack: &mut CommandStack,
    model: &mut GraphModel,
    name: &str,
    splice: bool,
) -> GraphResult<()> {
    stack.with_macro(model, "Disconnect Node", |stack, model| {
        let consumers = model.attached_inputs(&PlugRef::output(name))?;
        for plug in &consumers {
            let cmd = DetachPlug::new(model, plug.clone())?;
            stack.push(model, cmd)?;
        }

        let mut upstream: Option<String> = None;
        for plug in attached_inputs_of(model, name)? {
            let cmd = DetachPlug::new(model, plug)?;
            upstream.get_or_insert_with(|| cmd.origin().to_string());
            stack.push(model, cmd)?;
        }

        if let (true, Some(source)) = (splice, upstream) {
            for plug in consumers.into_iter().filter(|p| p.node != source) {
                let cmd = ConnectPlugs::new(model, PlugRef::output(source.as_str()), plug)?;
                stack.push(model, cmd)?;
            }
        }
        Ok(())
    })
}

/// Disconnect (splicing around the gap) and delete one node.
pub fn delete_node(stack: &mut CommandStack, model: &mut GraphModel, name: &str) -> GraphResult<()> {
    let label = format!("Delete {}", name);
    stack.with_macro(model, &label, |stack, model| {
        disconnect_node(stack, model, name, true)?;
        let cmd = DeleteNode::new(model, name)?;
        stack.push(model, cmd)
    })
}

/// Delete every focussed node as one undo step. Returns how many went.
pub fn delete_selected(stack: &mut CommandStack, model: &mut GraphModel) -> GraphResult<usize> {
    let selected = model.selected_nodes();
    stack.with_macro(model, "Delete Selection", |stack, model| {
        for name in &selected {
            disconnect_node(stack, model, name, true)?;
            let cmd = DeleteNode::new(model, name)?;
            stack.push(model, cmd)?;
        }
        Ok(selected.len())
    })
}

/// Move `src`'s connections, position and view/focus state onto `dst`, then
/// delete `src`.
pub fn replace_node(
    stack: &mut CommandStack,
    model: &mut GraphModel,
    src: &str,
    dst: &str,
) -> GraphResult<()> {
    if src == dst {
        return Err(GraphError::InvalidConnection(format!(
            "cannot replace {} with itself",
            src
        )));
    }
    stack.with_macro(model, "Replace Node", |stack, model| {
        let (src_pos, src_viewing, src_focussed) = {
            let node = model.node(src)?;
            (node.position(), node.is_viewing(), node.is_focussed())
        };
        let (dst_pos, dst_viewing) = {
            let node = model.node(dst)?;
            (node.position(), node.is_viewing())
        };

        let mut feeds = Vec::new();
        for plug in attached_inputs_of(model, src)? {
            let cmd = DetachPlug::new(model, plug.clone())?;
            feeds.push((plug.index.unwrap_or_default(), cmd.origin().to_string()));
            stack.push(model, cmd)?;
        }
        let consumers = model.attached_inputs(&PlugRef::output(src))?;
        for plug in &consumers {
            let cmd = DetachPlug::new(model, plug.clone())?;
            stack.push(model, cmd)?;
        }

        for (index, origin) in feeds {
            let target = PlugRef::input(dst, index);
            let free = matches!(
                model.node(dst)?.input(index),
                Some(input) if !input.is_attached()
            );
            if origin == dst || !free {
                tracing::debug!("Not carrying {} -> {} over to {}", origin, target, dst);
                continue;
            }
            let cmd = ConnectPlugs::new(model, PlugRef::output(origin.as_str()), target)?;
            stack.push(model, cmd)?;
        }
        for plug in consumers.into_iter().filter(|p| p.node != dst) {
            let cmd = ConnectPlugs::new(model, PlugRef::output(dst), plug)?;
            stack.push(model, cmd)?;
        }

        if src_viewing != dst_viewing {
            let cmd = SetViewing::new(model, dst, src_viewing)?;
            stack.push(model, cmd)?;
        }
        model.set_focussed(dst, src_focussed)?;

        let cmd = MoveNodes::new(
            model,
            vec![dst.to_string()],
            src_pos.x - dst_pos.x,
            src_pos.y - dst_pos.y,
        )?;
        stack.push(model, cmd)?;

        let cmd = DeleteNode::new(model, src)?;
        stack.push(model, cmd)
    })
}

/// Add a node of `type_name` with an auto-generated name, centred on `at`.
pub fn create_node(
    stack: &mut CommandStack,
    model: &mut GraphModel,
    type_name: &str,
    at: Point,
) -> GraphResult<String> {
    let name = model.new_node_name(type_name);
    let cmd = AddNode::new(model, &name, type_name, at)?;
    stack.push(model, cmd)?;
    Ok(name)
}

/// Add a node and wire it to the plug the user started from.
///
/// Starting from an output feeds the new node's first input; starting from
/// an input feeds that input from the new node. Source nodes (no inputs) are
/// created unwired. The new node ends up as the only focussed node.
pub fn create_node_connected(
    stack: &mut CommandStack,
    model: &mut GraphModel,
    type_name: &str,
    at: Point,
    context: &PlugRef,
) -> GraphResult<String> {
    stack.with_macro(model, "Create Node", |stack, model| {
        let name = create_node(stack, model, type_name, at)?;
        if model.node(&name)?.arity() > 0 {
            if context.is_output() {
                connect_with_detach(stack, model, context.clone(), PlugRef::input(name.as_str(), 0))?;
            } else {
                connect_with_detach(stack, model, PlugRef::output(name.as_str()), context.clone())?;
            }
        }
        model.focus_exclusive(&name)?;
        Ok(name)
    })
}

/// Create a node of `type_name` and swap it in for `replace`.
pub fn create_replacement_node(
    stack: &mut CommandStack,
    model: &mut GraphModel,
    type_name: &str,
    replace: &str,
    at: Point,
) -> GraphResult<String> {
    stack.with_macro(model, "Create Node", |stack, model| {
        let name = create_node(stack, model, type_name, at)?;
        replace_node(stack, model, replace, &name)?;
        Ok(name)
    })
}

/// Connect two plugs given in either order, detaching the input first if it
/// already has a cable.
pub fn connect_with_detach(
    stack: &mut CommandStack,
    model: &mut GraphModel,
    a: PlugRef,
    b: PlugRef,
) -> GraphResult<()> {
    let (src, dst) = if a.is_input() { (b, a) } else { (a, b) };
    stack.with_macro(model, "Connect Plugs", |stack, model| {
        let attached = matches!(
            model.get_plug(&dst)?,
            Plug::Input { plug, .. } if plug.is_attached()
        );
        if attached {
            let cmd = DetachPlug::new(model, dst.clone())?;
            stack.push(model, cmd)?;
        }
        let cmd = ConnectPlugs::new(model, src, dst)?;
        stack.push(model, cmd)
    })
}

/// Move nodes to absolute positions as one undo step.
pub fn layout_nodes<I>(stack: &mut CommandStack, model: &mut GraphModel, positions: I) -> GraphResult<()>
where
    I: IntoIterator<Item = (String, Point)>,
{
    stack.with_macro(model, "Layout Nodes", |stack, model| {
        for (name, target) in positions {
            let current = model.node(&name)?.position();
            let cmd = MoveNodes::new(
                model,
                vec![name],
                target.x - current.x,
                target.y - current.y,
            )?;
            stack.push(model, cmd)?;
        }
        Ok(())
    })
}
