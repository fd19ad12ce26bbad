//! Loader options.

use std::cell::RefCell;
use std::rc::Rc;

use crate::budget::Budget;
use crate::error::Warning;
use crate::schema::Schema;

/// Handler receiving advisory warnings while a document is loaded.
pub type WarningCallback = Rc<RefCell<dyn FnMut(&Warning) + 'static>>;

/// Options for the `load*` family.
///
/// Construct with [`load_options!`](crate::load_options!) so new fields do not break callers:
///
/// ```rust
/// let options = yaml_codec::load_options! {
///     filename: Some("settings.yaml".to_string()),
///     json: true,
/// };
/// assert!(options.json);
/// ```
#[derive(Clone)]
pub struct LoadOptions {
    /// Name reported in marks and snippets.
    pub filename: Option<String>,
    /// Types used for tag resolution. Defaults to [`Schema::default`].
    pub schema: Schema,
    /// JSON compatibility: duplicate keys are allowed (the last one wins) and quoted
    /// scalars may only contain characters JSON allows.
    pub json: bool,
    /// Warn about non-ASCII line breaks in every document, as YAML 1.1 parsers would
    /// treat them differently. Without this, only documents declaring `%YAML 1.1` warn.
    pub legacy: bool,
    /// Resource limits. `None` disables them, which leaves deeply nested input free to
    /// exhaust the stack.
    pub budget: Option<Budget>,
    /// Append a source snippet to error messages (on by default).
    pub with_snippet: bool,
    /// Horizontal crop radius for snippets, in characters. `0` disables cropping.
    pub crop_radius: usize,
    /// Warning handler. Without one, warnings are logged through `tracing` at `warn` level.
    pub on_warning: Option<WarningCallback>,
}

impl LoadOptions {
    /// Deliver warnings to `cb` instead of the log.
    pub fn with_warning_handler<F>(mut self, cb: F) -> Self
    where
        F: FnMut(&Warning) + 'static,
    {
        self.on_warning = Some(Rc::new(RefCell::new(cb)));
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            filename: None,
            schema: Schema::default(),
            json: false,
            legacy: false,
            budget: Some(Budget::default()),
            with_snippet: true,
            crop_radius: 64,
            on_warning: None,
        }
    }
}

impl std::fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadOptions")
            .field("filename", &self.filename)
            .field("schema", &self.schema)
            .field("json", &self.json)
            .field("legacy", &self.legacy)
            .field("budget", &self.budget)
            .field("with_snippet", &self.with_snippet)
            .field("crop_radius", &self.crop_radius)
            .field("on_warning", &if self.on_warning.is_some() { "set" } else { "none" })
            .finish()
    }
}
