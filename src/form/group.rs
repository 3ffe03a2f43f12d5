use crate::config::EngineConfig;
use crate::core::document::Document;
use crate::core::error::EngineError;
use crate::core::property_path::PropertyPath;
use crate::form::layout::{LayoutEntry, group_paths, slice_paths};
use crate::inspector::field::FieldSpec;
use crate::inspector::{DocumentKind, Inspector};
use crate::runtime::Instant;
use crate::ui::span::{Span, indent};
use crate::widgets::inputs::{PreDeleteHook, ReferenceTarget, build_editor};
use crate::widgets::traits::{DrawOutput, FieldEditor, FieldInput, InteractionResult, RenderContext};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Everything needed to instantiate editors for one level.
pub struct BuildContext<'a> {
    pub inspector: &'a dyn Inspector,
    pub document: &'a Document,
    pub config: &'a EngineConfig,
    pub targets: &'a IndexMap<DocumentKind, Vec<ReferenceTarget>>,
    /// Pre-delete hooks for file properties, keyed by absolute path.
    pub pre_delete: &'a IndexMap<PropertyPath, PreDeleteHook>,
    pub expanded: &'a dyn Fn(&PropertyPath) -> bool,
}

/// Editors detached from a previous layout, keyed by absolute path, so a
/// rebuild keeps drafts of fields that are still visible.
pub type EditorPool = HashMap<PropertyPath, Box<dyn FieldEditor>>;

pub enum FormNode {
    Field(Box<dyn FieldEditor>),
    Group(GroupRenderer),
}

/// Renders the properties under one prefix. Paths below it are relative;
/// outgoing paths get the head restored.
pub struct GroupRenderer {
    head: PropertyPath,
    absolute: PropertyPath,
    label: String,
    relative: Vec<PropertyPath>,
    expanded: bool,
    children: Option<Vec<FormNode>>,
}

impl GroupRenderer {
    pub fn new(head: PropertyPath, absolute: PropertyPath, label: String, relative: Vec<PropertyPath>) -> Self {
        Self {
            head,
            absolute,
            label,
            relative,
            expanded: false,
            children: None,
        }
    }

    pub fn head(&self) -> &PropertyPath {
        &self.head
    }

    /// Prefix from the form root.
    pub fn absolute(&self) -> &PropertyPath {
        &self.absolute
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Children are only built on first expansion.
    pub fn is_built(&self) -> bool {
        self.children.is_some()
    }

    pub fn children(&self) -> Option<&[FormNode]> {
        self.children.as_deref()
    }

    pub fn set_expanded(
        &mut self,
        expanded: bool,
        ctx: &BuildContext<'_>,
        pool: &mut EditorPool,
    ) -> Result<(), EngineError> {
        self.expanded = expanded;
        if expanded && self.children.is_none() {
            self.build(ctx, pool)?;
        }
        Ok(())
    }

    fn child_paths(&self, document: &Document) -> Vec<PropertyPath> {
        if self.relative.is_empty() {
            return slice_paths(&document.slice(&self.absolute));
        }
        self.relative.clone()
    }

    fn build(&mut self, ctx: &BuildContext<'_>, pool: &mut EditorPool) -> Result<(), EngineError> {
        let paths = self.child_paths(ctx.document);
        debug!(group = %self.absolute, children = paths.len(), "group built");
        self.children = Some(build_nodes(&self.absolute, &paths, ctx, pool)?);
        Ok(())
    }

    /// Drops built children into `pool` and rebuilds against a new layout.
    fn rebuild(&mut self, ctx: &BuildContext<'_>, pool: &mut EditorPool) -> Result<(), EngineError> {
        if let Some(children) = self.children.take() {
            detach(children, &self.absolute, pool);
            self.build(ctx, pool)?;
        }
        Ok(())
    }

    fn draw_header(&self, ctx: &RenderContext) -> Vec<Span> {
        let marker = if self.expanded { "▾" } else { "▸" };
        vec![Span::styled(format!("{marker} {}", self.label), ctx.theme.group).no_wrap()]
    }
}

/// Builds the nodes of one level. `prefix` is the absolute prefix of the
/// level; `paths` are relative to it.
pub fn build_nodes(
    prefix: &PropertyPath,
    paths: &[PropertyPath],
    ctx: &BuildContext<'_>,
    pool: &mut EditorPool,
) -> Result<Vec<FormNode>, EngineError> {
    let mut nodes = Vec::new();
    for entry in group_paths(paths) {
        match entry {
            LayoutEntry::Field(relative) => {
                let absolute = PropertyPath::join(prefix, &relative);
                let spec = ctx.inspector.field_spec(&absolute, ctx.document);
                let editor = match pool.remove(&absolute) {
                    Some(editor) if editor_matches(editor.as_ref(), &spec) => editor,
                    _ => {
                        let label = ctx.inspector.label_of(&absolute);
                        let targets: &[ReferenceTarget] = match &spec {
                            FieldSpec::Reference { target, .. } => {
                                ctx.targets.get(target).map(Vec::as_slice).unwrap_or_default()
                            }
                            _ => &[],
                        };
                        let hook = ctx.pre_delete.get(&absolute).cloned();
                        let mut editor = build_editor(relative, label, &spec, ctx.config, targets, hook)?;
                        editor.reconcile(ctx.document.get(&absolute).cloned().unwrap_or_default());
                        editor
                    }
                };
                nodes.push(FormNode::Field(editor));
            }
            LayoutEntry::Group { head, children } => {
                let absolute = PropertyPath::join(prefix, &head);
                let label = ctx.inspector.label_of(&absolute);
                let mut group = GroupRenderer::new(head, absolute.clone(), label, children);
                let expanded = (ctx.expanded)(&absolute);
                group.set_expanded(expanded, ctx, pool)?;
                nodes.push(FormNode::Group(group));
            }
        }
    }
    Ok(nodes)
}

fn editor_matches(editor: &dyn FieldEditor, spec: &FieldSpec) -> bool {
    use crate::widgets::traits::FieldKind;
    matches!(
        (editor.kind(), spec),
        (FieldKind::Text, FieldSpec::Text(_))
            | (FieldKind::Number, FieldSpec::Number(_))
            | (FieldKind::Boolean, FieldSpec::Boolean { .. })
            | (FieldKind::File, FieldSpec::File(_))
            | (FieldKind::Tags, FieldSpec::Tags(_))
            | (FieldKind::Reference, FieldSpec::Reference { .. })
    )
}

/// Moves every editor of `nodes` into `pool`.
pub fn detach(nodes: Vec<FormNode>, prefix: &PropertyPath, pool: &mut EditorPool) {
    for node in nodes {
        match node {
            FormNode::Field(editor) => {
                let absolute = PropertyPath::join(prefix, editor.base().path());
                pool.insert(absolute, editor);
            }
            FormNode::Group(mut group) => {
                if let Some(children) = group.children.take() {
                    detach(children, &group.absolute, pool);
                }
            }
        }
    }
}

/// Rebuilds the built groups of `nodes` after the document slice changed
/// under a bare marker.
pub fn rebuild_groups(nodes: &mut [FormNode], ctx: &BuildContext<'_>, pool: &mut EditorPool) -> Result<(), EngineError> {
    for node in nodes {
        let FormNode::Group(group) = node else {
            continue;
        };
        if group.relative.is_empty() {
            group.rebuild(ctx, pool)?;
        } else if let Some(children) = group.children.as_mut() {
            rebuild_groups(children, ctx, pool)?;
        }
    }
    Ok(())
}

/// Sends `input` to the editor at `relative`. The returned path is
/// relative to the level `nodes` belongs to.
pub fn route_input(
    nodes: &mut [FormNode],
    relative: &PropertyPath,
    input: FieldInput,
    now: Instant,
) -> Option<(PropertyPath, InteractionResult)> {
    let editor = find_editor_mut(nodes, relative)?;
    let result = editor.on_input(input, now);
    Some((relative.clone(), result))
}

pub fn find_editor_mut<'a>(nodes: &'a mut [FormNode], relative: &PropertyPath) -> Option<&'a mut Box<dyn FieldEditor>> {
    for node in nodes.iter_mut() {
        match node {
            FormNode::Field(editor) if editor.base().path() == relative => return Some(editor),
            FormNode::Group(group) => {
                if let Some(rest) = relative.strip_prefix(&group.head)
                    && let Some(children) = group.children.as_mut()
                {
                    return find_editor_mut(children, &rest);
                }
            }
            FormNode::Field(_) => {}
        }
    }
    None
}

pub fn find_editor<'a>(nodes: &'a [FormNode], relative: &PropertyPath) -> Option<&'a dyn FieldEditor> {
    for node in nodes {
        match node {
            FormNode::Field(editor) if editor.base().path() == relative => return Some(editor.as_ref()),
            FormNode::Group(group) => {
                if let Some(rest) = relative.strip_prefix(&group.head)
                    && let Some(children) = group.children.as_deref()
                {
                    return find_editor(children, &rest);
                }
            }
            FormNode::Field(_) => {}
        }
    }
    None
}

pub fn group_mut<'a>(nodes: &'a mut [FormNode], absolute: &PropertyPath) -> Option<&'a mut GroupRenderer> {
    for node in nodes.iter_mut() {
        let FormNode::Group(group) = node else {
            continue;
        };
        if group.absolute == *absolute {
            return Some(group);
        }
        if absolute.as_str().starts_with(group.absolute.as_str())
            && let Some(children) = group.children.as_mut()
        {
            return group_mut(children, absolute);
        }
    }
    None
}

/// Fires due debouncers. Paths are relative to the level of `nodes`.
pub fn tick_all(nodes: &mut [FormNode], now: Instant) -> Vec<(PropertyPath, InteractionResult)> {
    let mut out = Vec::new();
    for node in nodes.iter_mut() {
        match node {
            FormNode::Field(editor) => {
                let result = editor.on_tick(now);
                if !result.actions.is_empty() {
                    out.push((editor.base().path().clone(), result));
                }
            }
            FormNode::Group(group) => {
                let head = group.head.clone();
                if let Some(children) = group.children.as_mut() {
                    out.extend(
                        tick_all(children, now)
                            .into_iter()
                            .map(|(path, result)| (PropertyPath::join(&head, &path), result)),
                    );
                }
            }
        }
    }
    out
}

pub fn next_due(nodes: &[FormNode], now: Instant) -> Option<Duration> {
    nodes
        .iter()
        .filter_map(|node| match node {
            FormNode::Field(editor) => editor.base().debounce_due_in(now),
            FormNode::Group(group) => group.children.as_deref().and_then(|children| next_due(children, now)),
        })
        .min()
}

/// Visits every built editor with its absolute path.
pub fn for_each_editor(
    nodes: &mut [FormNode],
    prefix: &PropertyPath,
    visit: &mut dyn FnMut(&PropertyPath, &mut dyn FieldEditor),
) {
    for node in nodes.iter_mut() {
        match node {
            FormNode::Field(editor) => {
                let absolute = PropertyPath::join(prefix, editor.base().path());
                visit(&absolute, editor.as_mut());
            }
            FormNode::Group(group) => {
                let absolute = group.absolute.clone();
                if let Some(children) = group.children.as_mut() {
                    for_each_editor(children, &absolute, visit);
                }
            }
        }
    }
}

pub fn draw_nodes(nodes: &[FormNode], ctx: &RenderContext, depth: usize) -> DrawOutput {
    let mut out = DrawOutput::default();
    for node in nodes {
        match node {
            FormNode::Field(editor) => {
                for line in editor.draw(ctx).lines {
                    out.lines.push(indent(line, depth));
                }
            }
            FormNode::Group(group) => {
                out.lines.push(indent(group.draw_header(ctx), depth));
                if group.expanded
                    && let Some(children) = group.children.as_deref()
                {
                    out.extend(draw_nodes(children, ctx, depth + 1));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{BuildContext, EditorPool, FormNode, build_nodes, find_editor, group_mut, route_input};
    use crate::config::EngineConfig;
    use crate::core::document::Document;
    use crate::core::property_path::PropertyPath;
    use crate::core::value::Value;
    use crate::inspector::builtin::schema_inspector;
    use crate::inspector::DocumentKind;
    use crate::runtime::Instant;
    use crate::runtime::event::FieldAction;
    use crate::widgets::traits::{FieldEditor, FieldInput};
    use indexmap::IndexMap;

    fn paths(raw: &[&str]) -> Vec<PropertyPath> {
        raw.iter().map(|p| PropertyPath::from(*p)).collect()
    }

    #[test]
    fn groups_build_lazily_and_route_relative_paths() {
        let inspector = schema_inspector(DocumentKind::Project).expect("schema");
        let document = Document::new()
            .with("title", "Orbit")
            .with("players/min", 2.0)
            .with("players/max", 4.0);
        let config = EngineConfig::default();
        let targets = IndexMap::new();
        let hooks = IndexMap::new();
        let collapsed = |_: &PropertyPath| false;
        let ctx = BuildContext {
            inspector: &inspector,
            document: &document,
            config: &config,
            targets: &targets,
            pre_delete: &hooks,
            expanded: &collapsed,
        };
        let mut pool = EditorPool::new();
        let mut nodes = build_nodes(
            &PropertyPath::root(),
            &paths(&["players/min", "players/max", "title"]),
            &ctx,
            &mut pool,
        )
        .expect("nodes");

        let FormNode::Group(group) = &nodes[0] else {
            panic!("expected players group");
        };
        assert!(!group.is_built());
        assert!(find_editor(&nodes, &PropertyPath::from("players/min")).is_none());

        group_mut(&mut nodes, &PropertyPath::from("players/"))
            .expect("group")
            .set_expanded(true, &ctx, &mut pool)
            .expect("expand");
        let min = find_editor(&nodes, &PropertyPath::from("players/min")).expect("built");
        assert_eq!(min.base().path(), "min");
        assert_eq!(min.value(), Value::Number(2.0));

        let (path, result) = route_input(
            &mut nodes,
            &PropertyPath::from("players/max"),
            FieldInput::Text("6".to_string()),
            Instant::now(),
        )
        .expect("routed");
        assert_eq!(path, "players/max");
        assert!(result.actions.contains(&FieldAction::Changed(Value::Number(6.0))));
    }
}
