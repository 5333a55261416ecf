//! Remote DOM queries as data.
//!
//! A [`ControlQuery`] finds one control through an ordered list of
//! strategies and either clicks it or only reports its state. A
//! [`FieldQuery`] reads several values at once. Both serialize to JSON and
//! are passed as the argument of a fixed interpreter script.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Where selectors are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Scope {
    Document,
    /// The first element matching any of `selectors`, tried in order.
    Within { selectors: Vec<String> },
}

/// How a strategy finds its element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Locator {
    /// A CSS selector, optionally rejecting elements carrying a class.
    Css {
        selector: String,
        #[serde(rename = "excludeClass", skip_serializing_if = "Option::is_none")]
        exclude_class: Option<String>,
    },
    /// An icon-sprite `<use>` element; the control is its closest button.
    Sprite { selector: String },
    /// The first or last button inside a container.
    Positional { container: String, pick: Pick },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Pick {
    First,
    Last,
}

/// How a located element maps to a boolean state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StateRule {
    /// The control reports no state.
    Unknown,
    /// Finding this element means the state is `state`.
    Implied { state: bool },
    /// `aria-pressed="true"` or a sprite href containing `sprite_token`.
    Pressed {
        #[serde(rename = "spriteToken")]
        sprite_token: String,
    },
    /// `aria-label` equal to `equals`.
    AriaLabel { equals: String },
}

/// One way of finding a control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Strategy {
    pub label: String,
    pub locator: Locator,
    pub rule: StateRule,
}

impl Strategy {
    pub fn css(label: &str, selector: &str, rule: StateRule) -> Self {
        Self {
            label: label.to_string(),
            locator: Locator::Css {
                selector: selector.to_string(),
                exclude_class: None,
            },
            rule,
        }
    }

    pub fn sprite(label: &str, selector: &str, rule: StateRule) -> Self {
        Self {
            label: label.to_string(),
            locator: Locator::Sprite {
                selector: selector.to_string(),
            },
            rule,
        }
    }

    pub fn positional(label: &str, container: &str, pick: Pick, rule: StateRule) -> Self {
        Self {
            label: label.to_string(),
            locator: Locator::Positional {
                container: container.to_string(),
                pick,
            },
            rule,
        }
    }

    /// Reject matches carrying `class`. Only meaningful for CSS locators.
    #[must_use]
    pub fn excluding_class(mut self, class: &str) -> Self {
        if let Locator::Css { exclude_class, .. } = &mut self.locator {
            *exclude_class = Some(class.to_string());
        }
        self
    }
}

/// What happens to the located control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Effect {
    Click,
    Probe,
}

/// Find one control and click or probe it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlQuery {
    pub name: String,
    pub scope: Scope,
    pub strategies: Vec<Strategy>,
    pub effect: Effect,
}

impl ControlQuery {
    /// The same strategies with a different effect.
    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    /// JavaScript expression evaluating this query in the page.
    pub fn to_expression(&self) -> String {
        expression(CONTROL_INTERPRETER, self)
    }
}

/// How a field's value is read off its element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldRead {
    /// `textContent` as is.
    Text,
    /// `textContent` with surrounding whitespace removed.
    TrimmedText,
    /// A DOM property such as `src` or `value`, stringified.
    Property { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub key: String,
    pub selector: String,
    pub read: FieldRead,
}

impl Field {
    pub fn new(key: &str, selector: &str, read: FieldRead) -> Self {
        Self {
            key: key.to_string(),
            selector: selector.to_string(),
            read,
        }
    }
}

/// Read every field inside a scope; all of them must be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldQuery {
    pub name: String,
    pub scope: Scope,
    pub fields: Vec<Field>,
}

impl FieldQuery {
    pub fn to_expression(&self) -> String {
        expression(FIELD_INTERPRETER, self)
    }
}

/// The object every interpreter script returns.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryOutcome {
    pub success: bool,
    pub message: String,
    pub strategy: Option<String>,
    pub was_previous_state: Option<bool>,
    pub not_found: bool,
    pub error: Option<String>,
    pub fields: HashMap<String, String>,
    pub missing: Vec<String>,
}

fn expression<T: Serialize>(interpreter: &str, query: &T) -> String {
    // `null` makes the interpreter answer "invalid query".
    let json = serde_json::to_string(query).unwrap_or_else(|_| "null".to_string());
    format!("({interpreter})({json})")
}

const CONTROL_INTERPRETER: &str = r#"function (q) {
  try {
    if (!q) { return { success: false, message: 'invalid query' }; }
    var root = document;
    if (q.scope.kind === 'within') {
      root = null;
      for (var i = 0; i < q.scope.selectors.length && !root; i++) {
        root = document.querySelector(q.scope.selectors[i]);
      }
      if (!root) {
        return { success: false, notFound: true, message: q.name + ': scope not found' };
      }
    }
    function locate(loc) {
      if (loc.kind === 'css') {
        var el = root.querySelector(loc.selector);
        if (el && loc.excludeClass && el.classList.contains(loc.excludeClass)) { return null; }
        return el;
      }
      if (loc.kind === 'sprite') {
        var icon = root.querySelector(loc.selector);
        return icon ? icon.closest('button') : null;
      }
      if (loc.kind === 'positional') {
        var box = root.querySelector(loc.container);
        if (!box) { return null; }
        return box.querySelector(loc.pick === 'last' ? 'button:last-of-type' : 'button:first-of-type');
      }
      return null;
    }
    function stateOf(el, rule) {
      if (rule.kind === 'implied') { return rule.state; }
      if (rule.kind === 'pressed') {
        if (el.getAttribute('aria-pressed') === 'true') { return true; }
        var use = el.querySelector('svg use');
        var href = use ? use.getAttribute('xlink:href') : null;
        return !!(href && href.indexOf(rule.spriteToken) !== -1);
      }
      if (rule.kind === 'ariaLabel') { return el.getAttribute('aria-label') === rule.equals; }
      return null;
    }
    for (var s = 0; s < q.strategies.length; s++) {
      var strategy = q.strategies[s];
      var found = locate(strategy.locator);
      if (!found) { continue; }
      var state = stateOf(found, strategy.rule);
      if (q.effect === 'click') { found.click(); }
      var out = { success: true, message: q.name + ' via ' + strategy.label, strategy: strategy.label };
      if (state !== null) { out.wasPreviousState = state; }
      return out;
    }
    return { success: false, notFound: true, message: q.name + ': no matching element' };
  } catch (err) {
    return { success: false, message: q.name + ': ' + err.message, error: String(err) };
  }
}"#;

const FIELD_INTERPRETER: &str = r#"function (q) {
  try {
    if (!q) { return { success: false, message: 'invalid query' }; }
    var root = document;
    if (q.scope.kind === 'within') {
      root = null;
      for (var i = 0; i < q.scope.selectors.length && !root; i++) {
        root = document.querySelector(q.scope.selectors[i]);
      }
      if (!root) {
        return { success: false, notFound: true, message: q.name + ': scope not found' };
      }
    }
    var fields = {};
    var missing = [];
    for (var f = 0; f < q.fields.length; f++) {
      var field = q.fields[f];
      var el = root.querySelector(field.selector);
      if (!el) { missing.push(field.key); continue; }
      var value;
      if (field.read.kind === 'trimmedText') { value = (el.textContent || '').trim(); }
      else if (field.read.kind === 'property') { value = el[field.read.name]; }
      else { value = el.textContent || ''; }
      fields[field.key] = value === undefined || value === null ? '' : String(value);
    }
    if (missing.length > 0) {
      return { success: false, notFound: true, missing: missing, message: q.name + ': missing ' + missing.join(', ') };
    }
    return { success: true, message: q.name + ' read', fields: fields };
  } catch (err) {
    return { success: false, message: q.name + ': ' + err.message, error: String(err) };
  }
}"#;
