//! Locator abstraction for element selection.
//!
//! Locators are declarative descriptors: building one never touches the page.
//! A driver resolves the descriptor every time an action or assertion runs,
//! so a mistyped selector only surfaces when it is first used.
//!
//! # Design Philosophy
//!
//! - **Lazy**: `Selector` is plain data (serde), resolved per operation
//! - **Portable**: the same descriptor compiles to a DOM query for CDP and is
//!   matched structurally by the in-memory driver
//! - **Fluent API**: `Locator::css(".gemologo-card").with_text("J3X0Z4Uizu").first()`

use crate::assertion::normalize_whitespace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// ARIA roles used by the portal's forms and navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AriaRole {
    /// Text inputs and text areas
    Textbox,
    /// Buttons and submit inputs
    Button,
    /// Anchors with an href
    Link,
    /// h1-h6
    Heading,
}

impl AriaRole {
    /// Role name as written in ARIA
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Textbox => "textbox",
            Self::Button => "button",
            Self::Link => "link",
            Self::Heading => "heading",
        }
    }

    /// CSS matching elements with this implicit or explicit role
    #[must_use]
    pub const fn css(&self) -> &'static str {
        match self {
            Self::Textbox => {
                "input:not([type]), input[type=text], input[type=email], input[type=password], \
                 input[type=search], input[type=tel], input[type=url], textarea, [role=textbox]"
            }
            Self::Button => {
                "button, input[type=submit], input[type=button], input[type=reset], [role=button]"
            }
            Self::Link => "a[href], [role=link]",
            Self::Heading => "h1, h2, h3, h4, h5, h6, [role=heading]",
        }
    }
}

impl fmt::Display for AriaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JS function computing an element's accessible name.
///
/// Covers aria-label, aria-labelledby, associated labels, placeholder, then
/// text content.
const ACCESSIBLE_NAME_JS: &str = "(el) => { \
    const aria = el.getAttribute('aria-label'); if (aria) return aria; \
    const ids = el.getAttribute('aria-labelledby'); \
    if (ids) return ids.split(/\\s+/).map(id => { const n = document.getElementById(id); return n ? n.textContent : ''; }).join(' '); \
    if (el.labels && el.labels.length) return Array.from(el.labels).map(l => l.textContent).join(' '); \
    if (el.placeholder) return el.placeholder; \
    return el.textContent || el.value || ''; }";

/// Text normalizer shared by the text-matching queries; mirrors [`text_matches`]
const NORMALIZE_TEXT_JS: &str =
    "(s) => (s || '').replace(/\\s+/g, ' ').trim().toLowerCase()";

/// Rendered text of an element; `innerText` turns `<br>` and block
/// boundaries into whitespace
const ELEMENT_TEXT_JS: &str = "(el) => el.innerText ?? el.textContent";

/// Case-insensitive substring match after collapsing whitespace, the way
/// text locators compare rendered text
pub(crate) fn text_matches(haystack: &str, needle: &str) -> bool {
    normalize_whitespace(haystack)
        .to_lowercase()
        .contains(&normalize_whitespace(needle).to_lowercase())
}

/// Quote a string as a JS literal
pub(crate) fn js_str(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g., "#gemName")
    Css {
        /// CSS expression
        css: String,
    },
    /// Smallest element whose text contains the value, ignoring case and
    /// whitespace runs
    Text {
        /// Text to find
        text: String,
    },
    /// ARIA role with an optional accessible-name filter
    Role {
        /// Role
        role: AriaRole,
        /// Case-insensitive substring of the accessible name
        name: Option<String>,
    },
    /// Form control associated with a label
    Label {
        /// Label text
        text: String,
    },
    /// Input by placeholder
    Placeholder {
        /// Placeholder text
        text: String,
    },
    /// Test ID selector (data-testid attribute)
    TestId {
        /// Test id
        id: String,
    },
    /// CSS selector filtered by contained text, compared like [`Selector::Text`]
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            css: selector.into(),
        }
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a role selector
    #[must_use]
    pub fn role(role: AriaRole, name: impl Into<String>) -> Self {
        Self::Role {
            role,
            name: Some(name.into()),
        }
    }

    /// Create a label selector
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self::Label { text: text.into() }
    }

    /// Create a placeholder selector
    #[must_use]
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::Placeholder { text: text.into() }
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId { id: id.into() }
    }

    /// JS expression evaluating to an array of every matching element
    #[must_use]
    pub fn to_query_all(&self) -> String {
        match self {
            Self::Css { css } => format!("Array.from(document.querySelectorAll({}))", js_str(css)),
            Self::Text { text } => format!(
                "(() => {{ const norm = {NORMALIZE_TEXT_JS}; const text = {ELEMENT_TEXT_JS}; \
                 const t = norm({t}); \
                 return Array.from(document.querySelectorAll('body *')).filter(el => \
                 norm(text(el)).includes(t) && \
                 !Array.from(el.children).some(c => norm(text(c)).includes(t))); }})()",
                t = js_str(text)
            ),
            Self::Role { role, name } => {
                let base = format!("Array.from(document.querySelectorAll({}))", js_str(role.css()));
                match name {
                    Some(name) => format!(
                        "{base}.filter(el => ({ACCESSIBLE_NAME_JS})(el).trim().toLowerCase()\
                         .includes({}.toLowerCase()))",
                        js_str(name)
                    ),
                    None => base,
                }
            }
            Self::Label { text } => format!(
                "Array.from(document.querySelectorAll('label')).filter(l => \
                 l.textContent.includes({t})).map(l => l.control || \
                 (l.htmlFor ? document.getElementById(l.htmlFor) : null) || \
                 l.querySelector('input, textarea, select')).filter(Boolean)\
                 .concat(Array.from(document.querySelectorAll('[aria-label]')).filter(el => \
                 el.getAttribute('aria-label').includes({t})))",
                t = js_str(text)
            ),
            Self::Placeholder { text } => format!(
                "Array.from(document.querySelectorAll('[placeholder]')).filter(el => \
                 el.getAttribute('placeholder').includes({}))",
                js_str(text)
            ),
            Self::TestId { id } => format!(
                "Array.from(document.querySelectorAll({}))",
                js_str(&format!("[data-testid=\"{id}\"]"))
            ),
            Self::CssWithText { css, text } => format!(
                "(() => {{ const norm = {NORMALIZE_TEXT_JS}; const text = {ELEMENT_TEXT_JS}; \
                 const t = norm({t}); \
                 return Array.from(document.querySelectorAll({css})).filter(el => \
                 norm(text(el)).includes(t)); }})()",
                css = js_str(css),
                t = js_str(text)
            ),
        }
    }

    /// JS expression counting matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("({}).length", self.to_query_all())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css { css } => write!(f, "{css}"),
            Self::Text { text } => write!(f, "text={text}"),
            Self::Role { role, name: Some(n) } => write!(f, "role={role}[name={n:?}]"),
            Self::Role { role, name: None } => write!(f, "role={role}"),
            Self::Label { text } => write!(f, "label={text}"),
            Self::Placeholder { text } => write!(f, "placeholder={text}"),
            Self::TestId { id } => write!(f, "data-testid={id}"),
            Self::CssWithText { css, text } => write!(f, "{css}:has-text({text:?})"),
        }
    }
}

/// A locator: a selector, an optional match index and an optional timeout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    selector: Selector,
    index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout: Option<Duration>,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::css(selector))
    }

    /// Locator for the smallest element containing `text`
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_selector(Selector::text(text))
    }

    /// Locator by ARIA role and accessible name
    #[must_use]
    pub fn role(role: AriaRole, name: impl Into<String>) -> Self {
        Self::from_selector(Selector::role(role, name))
    }

    /// Locator by label text
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self::from_selector(Selector::label(text))
    }

    /// Locator by placeholder
    #[must_use]
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::from_selector(Selector::placeholder(text))
    }

    /// Create a locator from a selector
    #[must_use]
    pub const fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            index: None,
            timeout: None,
        }
    }

    /// Filter by text content
    ///
    /// Only CSS locators can be narrowed this way; other kinds already match
    /// on text or accessible name and are returned unchanged.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        let selector = match self.selector {
            Selector::Css { css } => Selector::CssWithText {
                css,
                text: text.into(),
            },
            other => other,
        };
        Self { selector, ..self }
    }

    /// Select the first match
    #[must_use]
    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Select the nth match (zero-based)
    #[must_use]
    pub fn nth(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Set a custom timeout for waits on this locator
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Match index used by single-element operations
    #[must_use]
    pub fn index(&self) -> usize {
        self.index.unwrap_or(0)
    }

    /// The locator's own timeout, or `default`
    #[must_use]
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }

    /// JS expression evaluating to the targeted element (or `undefined`)
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("({})[{}]", self.selector.to_query_all(), self.index())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{} >> nth={i}", self.selector),
            None => write!(f, "{}", self.selector),
        }
    }
}
