use crate::core::property_path::{PropertyPath, SEPARATOR};
use crate::core::search::{LabelMatch, rank_labels};
use crate::core::value::Value;
use crate::inspector::field::{OptionSpec, TagSpec};
use crate::runtime::Instant;
use crate::runtime::event::FieldAction;
use crate::ui::span::{Span, SpanLine};
use crate::ui::style::Style;
use crate::widgets::base::FieldBase;
use crate::widgets::dialog::ClosePolicy;
use crate::widgets::traits::{
    DrawOutput, Drawable, FieldEditor, FieldInput, FieldKind, InteractionResult, RenderContext,
};
use crate::widgets::validators::Validator;
use std::sync::Arc;
use tracing::trace;

const LABEL_COLUMN: usize = 18;
const DEFAULT_SEARCHABLE_THRESHOLD: usize = 8;

/// Explicit grouping for the option list. `None` leaves an option ungrouped.
pub type GroupFn = Arc<dyn Fn(&OptionSpec) -> Option<String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionGroup {
    pub name: Option<String>,
    pub options: Vec<OptionSpec>,
    /// Trailing catch-all holding action pseudo-options.
    pub actions: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    pub value: String,
    pub label: String,
    pub fixed: bool,
    /// The value matches no option.
    pub unknown: bool,
}

/// Single or multi-value picker over a list of options, with optional
/// free-form entry.
#[derive(Clone)]
pub struct AutocompleteEditor {
    base: FieldBase,
    options: Vec<OptionSpec>,
    fixed: Vec<String>,
    free_solo: bool,
    multiple: bool,
    selected: Vec<String>,
    query: String,
    open: bool,
    searchable_threshold: usize,
    group_by: Option<GroupFn>,
    mark_unknown: bool,
}

impl AutocompleteEditor {
    pub fn new(path: impl Into<PropertyPath>, label: impl Into<String>, options: Vec<OptionSpec>) -> Self {
        Self {
            base: FieldBase::new(path, label),
            options,
            fixed: Vec::new(),
            free_solo: false,
            multiple: false,
            selected: Vec::new(),
            query: String::new(),
            open: false,
            searchable_threshold: DEFAULT_SEARCHABLE_THRESHOLD,
            group_by: None,
            mark_unknown: false,
        }
    }

    pub fn from_spec(path: impl Into<PropertyPath>, label: impl Into<String>, spec: &TagSpec) -> Self {
        Self::new(path, label, spec.options.clone())
            .with_multiple(spec.multiple)
            .with_free_solo(spec.free_solo)
            .with_fixed(spec.fixed.clone())
    }

    pub fn with_multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn with_free_solo(mut self, free_solo: bool) -> Self {
        self.free_solo = free_solo;
        self
    }

    pub fn with_fixed(mut self, fixed: Vec<String>) -> Self {
        self.fixed = fixed;
        self.ensure_fixed();
        self
    }

    pub fn with_searchable_threshold(mut self, threshold: usize) -> Self {
        self.searchable_threshold = threshold;
        self
    }

    pub fn with_group_by(mut self, group_by: GroupFn) -> Self {
        self.group_by = Some(group_by);
        self
    }

    /// Render values that match no option with the "missing" style.
    pub fn with_unknown_marked(mut self, mark: bool) -> Self {
        self.mark_unknown = mark;
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.base.add_validator(validator);
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.reconcile(value);
        self
    }

    /// Copy seeded from the committed value, closed and unfocused.
    pub fn forked(&self) -> Self {
        let mut fork = self.clone();
        fork.base = self.base.forked();
        fork.open = false;
        fork.reset_draft();
        fork
    }

    pub fn set_options(&mut self, options: Vec<OptionSpec>) {
        self.options = options;
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Few options are easier to pick from a list than to search.
    pub fn is_searchable(&self) -> bool {
        self.options.len() >= self.searchable_threshold
    }

    fn find_option(&self, value: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|option| option.value == value)
    }

    fn label_for(&self, value: &str) -> String {
        self.find_option(value)
            .map_or_else(|| value.to_string(), |option| option.label().to_string())
    }

    pub fn chips(&self) -> Vec<Chip> {
        self.selected
            .iter()
            .map(|value| Chip {
                value: value.clone(),
                label: self.label_for(value),
                fixed: self.is_fixed(value),
                unknown: self.find_option(value).is_none(),
            })
            .collect()
    }

    fn is_fixed(&self, value: &str) -> bool {
        self.multiple && self.fixed.iter().any(|fixed| fixed == value)
    }

    fn ensure_fixed(&mut self) {
        if !self.multiple {
            return;
        }
        let mut merged: Vec<String> = self.fixed.clone();
        for value in self.selected.drain(..) {
            if !merged.contains(&value) {
                merged.push(value);
            }
        }
        self.selected = merged;
    }

    /// Non-action options ranked against the query, then every action.
    pub fn visible_options(&self) -> Vec<(OptionSpec, LabelMatch)> {
        let candidates: Vec<&OptionSpec> = self
            .options
            .iter()
            .filter(|option| !option.action)
            .filter(|option| !(self.multiple && self.selected.contains(&option.value)))
            .collect();
        let labels: Vec<&str> = candidates.iter().map(|option| option.label()).collect();
        let mut out: Vec<(OptionSpec, LabelMatch)> = rank_labels(&self.query, &labels)
            .into_iter()
            .map(|found| (candidates[found.index].clone(), found))
            .collect();
        out.extend(
            self.options
                .iter()
                .filter(|option| option.action)
                .enumerate()
                .map(|(index, option)| {
                    (
                        option.clone(),
                        LabelMatch {
                            index,
                            score: 0,
                            ranges: Vec::new(),
                        },
                    )
                }),
        );
        out
    }

    fn group_of(&self, option: &OptionSpec) -> Option<String> {
        if let Some(group_by) = &self.group_by {
            return group_by(option);
        }
        if let Some(group) = &option.group {
            return Some(group.clone());
        }
        option
            .label()
            .rsplit_once(SEPARATOR)
            .map(|(head, _)| head.to_string())
            .filter(|head| !head.is_empty())
    }

    /// Visible options grouped in first-seen order, actions last.
    pub fn grouped_options(&self) -> Vec<OptionGroup> {
        let mut groups: Vec<OptionGroup> = Vec::new();
        let mut actions = Vec::new();
        for (option, _) in self.visible_options() {
            if option.action {
                actions.push(option);
                continue;
            }
            let name = self.group_of(&option);
            match groups.iter_mut().find(|group| group.name == name) {
                Some(group) => group.options.push(option),
                None => groups.push(OptionGroup {
                    name,
                    options: vec![option],
                    actions: false,
                }),
            }
        }
        if !actions.is_empty() {
            groups.push(OptionGroup {
                name: None,
                options: actions,
                actions: true,
            });
        }
        groups
    }

    fn commit(&mut self, now: Instant) -> InteractionResult {
        let value = self.value();
        trace!(path = %self.base.path(), selected = self.selected.len(), "selection commit");
        self.base.schedule_debounce(value.clone(), now);
        InteractionResult::with_actions(vec![
            FieldAction::InputChanged(value.clone()),
            FieldAction::Changed(value),
        ])
    }

    fn on_focus(&mut self) -> InteractionResult {
        self.base.set_focused(true);
        self.open = !self.is_searchable();
        InteractionResult::handled()
    }

    fn on_query(&mut self, query: String) -> InteractionResult {
        self.query = query;
        self.open = !self.query.is_empty() || !self.is_searchable();
        InteractionResult::with_action(FieldAction::InputChanged(Value::Text(self.query.clone())))
    }

    fn on_select(&mut self, value: String, now: Instant) -> InteractionResult {
        let action = self.find_option(&value).map(|option| option.action);
        match action {
            Some(true) => {
                self.open = false;
                self.query.clear();
                return InteractionResult::with_action(FieldAction::OptionAction(value));
            }
            None if !self.free_solo => return InteractionResult::ignored(),
            _ => {}
        }

        self.query.clear();
        if self.multiple {
            if self.selected.contains(&value) {
                return InteractionResult::handled();
            }
            self.selected.push(value);
        } else {
            self.open = false;
            if self.selected.first() == Some(&value) {
                return InteractionResult::handled();
            }
            self.selected = vec![value];
        }
        self.commit(now)
    }

    fn on_remove(&mut self, value: &str, now: Instant) -> InteractionResult {
        if self.is_fixed(value) {
            return InteractionResult::ignored();
        }
        let before = self.selected.len();
        self.selected.retain(|selected| selected != value);
        if self.selected.len() == before {
            return InteractionResult::ignored();
        }
        self.commit(now)
    }

    fn on_clear(&mut self, now: Instant) -> InteractionResult {
        self.query.clear();
        let cleared: Vec<String> = self
            .selected
            .iter()
            .filter(|value| self.is_fixed(value))
            .cloned()
            .collect();
        if cleared == self.selected {
            return InteractionResult::handled();
        }
        self.selected = cleared;
        self.commit(now)
    }

    /// Enter in the search box: reconcile free text with the option labels.
    fn on_submit(&mut self, now: Instant) -> InteractionResult {
        let typed = self.query.trim().to_string();
        if typed.is_empty() {
            self.open = false;
            return InteractionResult::handled();
        }
        let needle = typed.to_lowercase();
        let matched = self
            .options
            .iter()
            .find(|option| !option.action && option.label().trim().to_lowercase() == needle)
            .map(|option| option.value.clone());
        match matched {
            Some(value) => self.on_select(value, now),
            None if self.free_solo => self.on_select(typed, now),
            None => InteractionResult::handled(),
        }
    }

    fn option_line(&self, option: &OptionSpec, found: Option<&LabelMatch>, ctx: &RenderContext) -> SpanLine {
        let base_style = if option.action { ctx.theme.hint } else { ctx.theme.value };
        let mut line = vec![Span::new(" ".repeat(LABEL_COLUMN + 2)).no_wrap()];
        let ranges = found.map(|found| found.ranges.as_slice()).unwrap_or_default();
        line.extend(highlight(option.label(), ranges, base_style, ctx.theme.accent));
        line
    }
}

fn highlight(label: &str, ranges: &[(usize, usize)], plain: Style, marked: Style) -> Vec<Span> {
    if ranges.is_empty() {
        return vec![Span::styled(label, plain).no_wrap()];
    }
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut current_marked = false;
    for (pos, ch) in label.chars().enumerate() {
        let is_marked = ranges.iter().any(|(start, end)| pos >= *start && pos < *end);
        if is_marked != current_marked && !current.is_empty() {
            let style = if current_marked { marked } else { plain };
            spans.push(Span::styled(std::mem::take(&mut current), style).no_wrap());
        }
        current_marked = is_marked;
        current.push(ch);
    }
    if !current.is_empty() {
        let style = if current_marked { marked } else { plain };
        spans.push(Span::styled(current, style).no_wrap());
    }
    spans
}

impl Drawable for AutocompleteEditor {
    fn label(&self) -> &str {
        self.base.label()
    }

    fn draw(&self, ctx: &RenderContext) -> DrawOutput {
        let theme = &ctx.theme;
        let mut first = vec![self.base.label_span(ctx), self.base.label_padding(LABEL_COLUMN)];

        let chips = self.chips();
        if chips.is_empty() && self.query.is_empty() {
            first.push(Span::styled("None", theme.placeholder).no_wrap());
        }
        for chip in chips {
            let style = if chip.unknown && self.mark_unknown { theme.missing } else { theme.value };
            let text = if self.multiple && !chip.fixed {
                format!("[{} ×] ", chip.label)
            } else if self.multiple {
                format!("[{}] ", chip.label)
            } else {
                format!("{} ", chip.label)
            };
            first.push(Span::styled(text, style).no_wrap());
        }
        if !self.query.is_empty() {
            first.push(Span::styled(self.query.clone(), theme.accent).no_wrap());
        }
        if let Some(error) = self.base.error_span(theme) {
            first.push(error);
        }

        let mut out = DrawOutput::single(first);
        if !self.open {
            return out;
        }
        let visible = self.visible_options();
        for group in self.grouped_options() {
            if let Some(name) = &group.name {
                out.lines.push(vec![
                    Span::new(" ".repeat(LABEL_COLUMN)).no_wrap(),
                    Span::styled(name.clone(), theme.group).no_wrap(),
                ]);
            } else if group.actions {
                out.lines.push(vec![
                    Span::new(" ".repeat(LABEL_COLUMN)).no_wrap(),
                    Span::styled("─────", theme.hint).no_wrap(),
                ]);
            }
            for option in &group.options {
                let found = visible
                    .iter()
                    .find(|(candidate, _)| candidate.value == option.value)
                    .map(|(_, found)| found);
                out.lines.push(self.option_line(option, found, ctx));
            }
        }
        out
    }
}

impl FieldEditor for AutocompleteEditor {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FieldBase {
        &mut self.base
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Tags
    }

    fn on_input(&mut self, input: FieldInput, now: Instant) -> InteractionResult {
        match input {
            FieldInput::Focus => self.on_focus(),
            FieldInput::Blur => {
                self.base.set_focused(false);
                self.open = false;
                self.query.clear();
                InteractionResult::with_action(FieldAction::Blurred)
            }
            FieldInput::Query(query) => self.on_query(query),
            FieldInput::Select(value) => self.on_select(value, now),
            FieldInput::Remove(value) => self.on_remove(&value, now),
            FieldInput::Clear => self.on_clear(now),
            FieldInput::Submit => self.on_submit(now),
            FieldInput::CloseList => {
                self.open = false;
                InteractionResult::handled()
            }
            _ => InteractionResult::ignored(),
        }
    }

    fn value(&self) -> Value {
        if self.multiple {
            return Value::List(self.selected.iter().cloned().map(Value::Text).collect());
        }
        self.selected
            .first()
            .map_or(Value::None, |value| Value::Text(value.clone()))
    }

    fn reset_draft(&mut self) {
        let committed = self.base.committed().to_text_list();
        self.selected = if self.multiple {
            committed
        } else {
            committed.into_iter().take(1).collect()
        };
        self.ensure_fixed();
        self.query.clear();
    }

    fn dialog_policy(&self) -> Option<ClosePolicy> {
        Some(ClosePolicy::ExplicitSave)
    }

    fn fork(&self) -> Box<dyn FieldEditor> {
        Box::new(self.forked())
    }
}

#[cfg(test)]
mod tests {
    use super::AutocompleteEditor;
    use crate::core::value::Value;
    use crate::inspector::field::OptionSpec;
    use crate::runtime::Instant;
    use crate::runtime::event::FieldAction;
    use crate::widgets::traits::{FieldEditor, FieldInput};
    use std::sync::Arc;

    fn tags() -> AutocompleteEditor {
        let options = ["genre/action", "genre/puzzle", "platform/web"]
            .into_iter()
            .map(OptionSpec::plain)
            .chain([OptionSpec::action("@new", "Create tag…")])
            .collect();
        AutocompleteEditor::new("tags", "Tags", options)
            .with_multiple(true)
            .with_fixed(vec!["asset".to_string()])
    }

    fn send(editor: &mut AutocompleteEditor, input: FieldInput) -> Vec<FieldAction> {
        editor.on_input(input, Instant::now()).actions
    }

    fn list(values: &[&str]) -> Value {
        Value::List(values.iter().map(|v| Value::from(*v)).collect())
    }

    #[test]
    fn fixed_values_cannot_be_removed() {
        let mut editor = tags().with_value(list(&["asset", "genre/action"]));
        assert!(send(&mut editor, FieldInput::Remove("asset".to_string())).is_empty());
        let actions = send(&mut editor, FieldInput::Remove("genre/action".to_string()));
        assert_eq!(actions[1], FieldAction::Changed(list(&["asset"])));

        send(&mut editor, FieldInput::Select("genre/puzzle".to_string()));
        send(&mut editor, FieldInput::Clear);
        assert_eq!(editor.value(), list(&["asset"]));
    }

    #[test]
    fn fixed_values_survive_external_values() {
        let editor = tags().with_value(list(&["platform/web"]));
        assert_eq!(editor.value(), list(&["asset", "platform/web"]));
    }

    #[test]
    fn free_text_matches_labels_case_insensitively() {
        let mut editor = tags();
        send(&mut editor, FieldInput::Query("  GENRE/Puzzle ".to_string()));
        let actions = send(&mut editor, FieldInput::Submit);
        assert_eq!(actions[1], FieldAction::Changed(list(&["asset", "genre/puzzle"])));
        assert_eq!(editor.query(), "");
    }

    #[test]
    fn raw_entry_needs_free_solo() {
        let mut strict = tags();
        send(&mut strict, FieldInput::Query("retro".to_string()));
        assert!(send(&mut strict, FieldInput::Submit).is_empty());
        assert_eq!(strict.value(), list(&["asset"]));

        let mut loose = tags().with_free_solo(true);
        send(&mut loose, FieldInput::Query("retro".to_string()));
        send(&mut loose, FieldInput::Submit);
        assert_eq!(loose.value(), list(&["asset", "retro"]));
    }

    #[test]
    fn action_option_never_changes_value() {
        let mut editor = tags();
        let actions = send(&mut editor, FieldInput::Select("@new".to_string()));
        assert_eq!(actions, vec![FieldAction::OptionAction("@new".to_string())]);
        assert_eq!(editor.value(), list(&["asset"]));
    }

    #[test]
    fn groups_follow_label_prefix_with_actions_last() {
        let editor = tags();
        let groups = editor.grouped_options();
        let names: Vec<Option<&str>> = groups.iter().map(|g| g.name.as_deref()).collect();
        assert_eq!(names, vec![Some("genre"), Some("platform"), None]);
        assert!(groups[2].actions);
        assert_eq!(groups[0].options.len(), 2);
    }

    #[test]
    fn explicit_group_function_wins() {
        let editor = tags().with_group_by(Arc::new(|option: &OptionSpec| {
            let group = if option.value.starts_with("platform") { "devices" } else { "styles" };
            Some(group.to_string())
        }));
        let names: Vec<Option<String>> = editor.grouped_options().into_iter().map(|g| g.name).collect();
        assert_eq!(
            names,
            vec![Some("styles".to_string()), Some("devices".to_string()), None]
        );
    }

    #[test]
    fn list_opens_on_focus_only_when_not_searchable() {
        let mut short = tags();
        send(&mut short, FieldInput::Focus);
        assert!(short.is_open());

        let mut searchable = tags().with_searchable_threshold(2);
        send(&mut searchable, FieldInput::Focus);
        assert!(!searchable.is_open());
        send(&mut searchable, FieldInput::Query("g".to_string()));
        assert!(searchable.is_open());
    }

    #[test]
    fn query_filters_by_fuzzy_label() {
        let mut editor = tags();
        send(&mut editor, FieldInput::Query("web".to_string()));
        let visible: Vec<String> = editor
            .visible_options()
            .into_iter()
            .filter(|(option, _)| !option.action)
            .map(|(option, _)| option.value)
            .collect();
        assert_eq!(visible, vec!["platform/web".to_string()]);
    }

    #[test]
    fn single_select_replaces_value() {
        let options = ["owner", "viewer"].into_iter().map(OptionSpec::plain).collect();
        let mut editor = AutocompleteEditor::new("role", "Role", options).with_value(Value::from("viewer"));
        send(&mut editor, FieldInput::Select("owner".to_string()));
        assert_eq!(editor.value(), Value::from("owner"));
        assert!(send(&mut editor, FieldInput::Select("nobody".to_string())).is_empty());
    }
}
