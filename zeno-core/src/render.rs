//! Conditional renderer.
//!
//! Picks one markup option out of an ordered list using an ordered list of
//! conditions, writes it into a [`RenderTarget`], and attaches event
//! bindings. Markup handling and event wiring belong to the target; this
//! module only owns the selection policy:
//!
//! - a single option: rendered when there are no conditions or when its
//!   condition holds, otherwise the target is cleared;
//! - otherwise: the first option whose condition holds, checking at most
//!   `options.len() - 1` conditions, falling back to the last option as the
//!   "else" branch. With no conditions at all that is the last option.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::warn;

use crate::error::RenderError;

/// Callback attached to rendered elements.
pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

/// A branch selector: a fixed flag or a check evaluated at render time.
pub enum Condition {
    Value(bool),
    Check(Box<dyn Fn() -> bool>),
}

impl Condition {
    pub fn check<F>(f: F) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        Condition::Check(Box::new(f))
    }

    pub fn evaluate(&self) -> bool {
        match self {
            Condition::Value(value) => *value,
            Condition::Check(check) => check(),
        }
    }
}

impl From<bool> for Condition {
    fn from(value: bool) -> Self {
        Condition::Value(value)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Condition::Check(_) => f.write_str("Check(..)"),
        }
    }
}

/// An event to attach to every element matching a selector.
#[derive(Clone)]
pub struct EventBinding {
    pub event_type: String,
    pub handler: EventHandler,
}

impl EventBinding {
    pub fn new<F>(event_type: impl Into<String>, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            event_type: event_type.into(),
            handler: Arc::new(handler),
        }
    }

    /// A `click` binding.
    pub fn click<F>(handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new("click", handler)
    }
}

impl fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinding")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// Selector to binding, in attachment order.
pub type EventMap = IndexMap<String, EventBinding>;

/// Where rendered markup goes.
pub trait RenderTarget {
    /// Replace the target's children with the parsed `markup`.
    fn replace_children(&mut self, markup: &str);

    /// Remove all children.
    fn clear(&mut self);

    /// Attach `handler` for `event_type` to every descendant matching
    /// `selector`.
    fn bind(&mut self, selector: &str, event_type: &str, handler: EventHandler);
}

/// Index of the option to render, or `None` when nothing should render.
pub fn select_option(option_count: usize, conditions: &[Condition]) -> Option<usize> {
    if option_count == 0 {
        return None;
    }
    if option_count == 1 {
        return conditions.first().map_or(true, Condition::evaluate).then_some(0);
    }

    let checked = conditions.len().min(option_count - 1);
    conditions[..checked]
        .iter()
        .position(Condition::evaluate)
        .or(Some(option_count - 1))
}

/// Render the selected option into `target` and attach `events`.
///
/// Returns the selected index, or `Ok(None)` when the target was cleared.
pub fn render<S: AsRef<str>>(
    target: Option<&mut dyn RenderTarget>,
    options: &[S],
    conditions: &[Condition],
    events: &EventMap,
) -> Result<Option<usize>, RenderError> {
    let Some(target) = target else {
        warn!("render target is missing");
        return Err(RenderError::MissingTarget);
    };
    if options.is_empty() {
        warn!("no render options given");
        return Err(RenderError::NoOptions);
    }

    let selected = select_option(options.len(), conditions);
    match selected {
        Some(index) => target.replace_children(options[index].as_ref()),
        None => target.clear(),
    }

    for (selector, binding) in events {
        target.bind(selector, &binding.event_type, Arc::clone(&binding.handler));
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct MockTarget {
        markup: Option<String>,
        cleared: usize,
        bound: Vec<(String, String)>,
        handlers: Vec<EventHandler>,
    }

    impl RenderTarget for MockTarget {
        fn replace_children(&mut self, markup: &str) {
            self.markup = Some(markup.to_owned());
        }

        fn clear(&mut self) {
            self.markup = None;
            self.cleared += 1;
        }

        fn bind(&mut self, selector: &str, event_type: &str, handler: EventHandler) {
            self.bound.push((selector.to_owned(), event_type.to_owned()));
            self.handlers.push(handler);
        }
    }

    fn flags(values: &[bool]) -> Vec<Condition> {
        values.iter().copied().map(Condition::from).collect()
    }

    #[test]
    fn no_conditions_selects_only_or_last_option() {
        assert_eq!(select_option(1, &[]), Some(0));
        assert_eq!(select_option(2, &[]), Some(1));
        assert_eq!(select_option(3, &[]), Some(2));
    }

    #[test]
    fn single_option_follows_its_condition() {
        assert_eq!(select_option(1, &flags(&[true])), Some(0));
        assert_eq!(select_option(1, &flags(&[false])), None);
        assert_eq!(select_option(1, &[Condition::check(|| false)]), None);
    }

    #[test]
    fn first_true_condition_wins() {
        assert_eq!(select_option(3, &flags(&[false, true])), Some(1));
        assert_eq!(select_option(3, &flags(&[true, true])), Some(0));
    }

    #[test]
    fn falls_back_to_last_option() {
        assert_eq!(select_option(3, &flags(&[false, false])), Some(2));
        assert_eq!(select_option(2, &flags(&[false])), Some(1));
    }

    #[test]
    fn conditions_beyond_else_branch_are_ignored() {
        // With two options only the first condition is consulted.
        assert_eq!(select_option(2, &flags(&[false, true])), Some(1));

        let evaluated = Rc::new(Cell::new(false));
        let seen = evaluated.clone();
        let conditions = vec![
            Condition::from(true),
            Condition::check(move || {
                seen.set(true);
                true
            }),
        ];
        assert_eq!(select_option(2, &conditions), Some(0));
        assert!(!evaluated.get());
    }

    #[test]
    fn render_writes_selected_markup_and_binds_events() {
        let mut target = MockTarget::default();
        let mut events = EventMap::new();
        events.insert("#save".into(), EventBinding::click(|| {}));
        events.insert("input".into(), EventBinding::new("change", || {}));

        let selected = render(
            Some(&mut target),
            &["<p>loading</p>", "<p>ready</p>"],
            &flags(&[false]),
            &events,
        )
        .unwrap();

        assert_eq!(selected, Some(1));
        assert_eq!(target.markup.as_deref(), Some("<p>ready</p>"));
        assert_eq!(
            target.bound,
            vec![
                ("#save".to_string(), "click".to_string()),
                ("input".to_string(), "change".to_string()),
            ]
        );
        assert!(Arc::ptr_eq(&target.handlers[0], &events["#save"].handler));
    }

    #[test]
    fn render_clears_target_when_nothing_selected() {
        let mut target = MockTarget {
            markup: Some("<p>old</p>".into()),
            ..MockTarget::default()
        };

        let selected = render(
            Some(&mut target),
            &["<p>only</p>"],
            &flags(&[false]),
            &EventMap::new(),
        )
        .unwrap();

        assert_eq!(selected, None);
        assert_eq!(target.markup, None);
        assert_eq!(target.cleared, 1);
    }

    #[test]
    fn render_rejects_missing_target_or_options() {
        let no_options: [&str; 0] = [];
        let mut target = MockTarget::default();

        assert_eq!(
            render(None, &["<p/>"], &[], &EventMap::new()),
            Err(RenderError::MissingTarget)
        );
        assert_eq!(
            render(Some(&mut target), &no_options, &[], &EventMap::new()),
            Err(RenderError::NoOptions)
        );
        assert!(target.markup.is_none());
    }
}
