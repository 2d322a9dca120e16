//! Style service
//!
//! Two halves:
//! - inline style: the declarations stored in an element's `style` attribute
//! - computed style: user-agent defaults + `<style>` sheets + inline style,
//!   resolved through the cascade with inheritance
//!
//! Values are returned as specified. There is no unit or color normalization
//! and shorthands are not expanded.

use ahash::AHashMap;

use crate::arena::DomArena;
use crate::selector::{SelectorList, Specificity};
use crate::types::{DomNode, NodeId};

/// Convert a script-style name (`animationName`, `cssFloat`, `webkitTransform`)
/// to its CSS spelling. CSS spellings pass through lower-cased; custom
/// properties (`--x`) are kept verbatim.
pub fn property_name(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("--") {
        return name.to_string();
    }
    if name == "cssFloat" {
        return "float".to_string();
    }
    if !name.chars().any(|c| c.is_ascii_uppercase()) {
        return name.to_ascii_lowercase();
    }

    let mut out = String::with_capacity(name.len() + 4);
    for prefix in ["webkit", "moz", "ms"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            if rest.starts_with(|c: char| c.is_ascii_uppercase()) {
                out.push('-');
                out.push_str(prefix);
                return camel_to_kebab(rest, out);
            }
        }
    }
    camel_to_kebab(name, out)
}

fn camel_to_kebab(name: &str, mut out: String) -> String {
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// One `property: value [!important]` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Parse a declaration block body (`a: b; c: d !important`)
pub fn parse_declarations(text: &str) -> Vec<Declaration> {
    split_top_level(text, ';')
        .into_iter()
        .filter_map(|chunk| {
            let (property, value) = chunk.split_once(':')?;
            let property = property_name(property);
            if property.is_empty() {
                return None;
            }
            let (value, important) = strip_important(value.trim());
            if value.is_empty() {
                return None;
            }
            Some(Declaration {
                property,
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

fn strip_important(value: &str) -> (&str, bool) {
    if let Some(bang) = value.rfind('!') {
        if value[bang + 1..].trim().eq_ignore_ascii_case("important") {
            return (value[..bang].trim_end(), true);
        }
    }
    (value, false)
}

/// Split on `sep` outside of quotes and parentheses
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

/// Declarations held in an element's `style` attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<Declaration>,
}

impl InlineStyle {
    pub fn parse(text: &str) -> Self {
        Self {
            declarations: parse_declarations(text),
        }
    }

    /// Inline style of an element (empty when there is no `style` attribute)
    pub fn of(node: &DomNode) -> Self {
        Self::parse(node.attr("style").unwrap_or(""))
    }

    /// Value of a property, `None` when unset
    pub fn get(&self, property: &str) -> Option<&str> {
        let property = property_name(property);
        self.declarations
            .iter()
            .find(|d| d.property == property)
            .map(|d| d.value.as_str())
    }

    /// Set a property; an empty value removes it
    pub fn set(&mut self, property: &str, value: &str) {
        let property = property_name(property);
        let value = value.trim();
        if value.is_empty() {
            self.remove(&property);
            return;
        }
        match self.declarations.iter_mut().find(|d| d.property == property) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.important = false;
            }
            None => self.declarations.push(Declaration {
                property,
                value: value.to_string(),
                important: false,
            }),
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        let property = property_name(property);
        let pos = self.declarations.iter().position(|d| d.property == property)?;
        Some(self.declarations.remove(pos).value)
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Serialized form written back to the `style` attribute
    pub fn to_css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|d| {
                if d.important {
                    format!("{}: {} !important;", d.property, d.value)
                } else {
                    format!("{}: {};", d.property, d.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Store this style in the element's `style` attribute
    pub fn write_to(&self, node: &mut DomNode) {
        node.set_attr("style", &self.to_css_text());
    }
}

/// A style rule: selector list plus declarations
#[derive(Debug, Clone)]
pub struct Rule {
    pub selectors: SelectorList,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    /// Parse a stylesheet. At-rules are skipped; rules whose selector does not
    /// parse are dropped, as a host style engine does.
    pub fn parse(css: &str) -> Self {
        let css = strip_comments(css);
        let mut rules = Vec::new();
        let mut rest = css.as_str();

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }

            if rest.starts_with('@') {
                rest = skip_at_rule(rest);
                continue;
            }

            let Some(open) = rest.find('{') else {
                break;
            };
            let prelude = rest[..open].trim();
            let body_start = open + 1;
            let close = find_block_end(rest, body_start);
            let body = &rest[body_start..close];
            rest = rest.get(close + 1..).unwrap_or("");

            match SelectorList::parse(prelude) {
                Ok(selectors) => rules.push(Rule {
                    selectors,
                    declarations: parse_declarations(body),
                }),
                Err(e) => tracing::debug!("Dropping style rule {:?}: {}", prelude, e),
            }
        }

        Self { rules }
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Index of the `}` closing the block whose body starts at `from`
/// (or the end of input when unbalanced)
fn find_block_end(text: &str, from: usize) -> usize {
    let mut depth = 1usize;
    for (i, c) in text[from..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return from + i;
                }
            }
            _ => {}
        }
    }
    text.len()
}

/// Skip `@import ...;` or `@media ... { ... }`
fn skip_at_rule(text: &str) -> &str {
    let semi = text.find(';');
    let brace = text.find('{');
    match (semi, brace) {
        (Some(s), Some(b)) if s < b => &text[s + 1..],
        (_, Some(b)) => {
            let close = find_block_end(text, b + 1);
            text.get(close + 1..).unwrap_or("")
        }
        (Some(s), None) => &text[s + 1..],
        (None, None) => "",
    }
}

/// Properties whose unspecified value comes from the parent
const INHERITED_PROPERTIES: &[&str] = &[
    "color",
    "cursor",
    "direction",
    "font",
    "font-family",
    "font-size",
    "font-style",
    "font-variant",
    "font-weight",
    "letter-spacing",
    "line-height",
    "list-style",
    "list-style-position",
    "list-style-type",
    "quotes",
    "text-align",
    "text-indent",
    "text-transform",
    "visibility",
    "white-space",
    "word-spacing",
];

const INITIAL_VALUES: &[(&str, &str)] = &[
    ("animation-delay", "0s"),
    ("animation-direction", "normal"),
    ("animation-duration", "0s"),
    ("animation-fill-mode", "none"),
    ("animation-iteration-count", "1"),
    ("animation-name", "none"),
    ("animation-timing-function", "ease"),
    ("background-color", "rgba(0, 0, 0, 0)"),
    ("border-style", "none"),
    ("bottom", "auto"),
    ("box-sizing", "content-box"),
    ("color", "rgb(0, 0, 0)"),
    ("cursor", "auto"),
    ("direction", "ltr"),
    ("display", "inline"),
    ("float", "none"),
    ("font-size", "16px"),
    ("font-style", "normal"),
    ("font-weight", "400"),
    ("height", "auto"),
    ("left", "auto"),
    ("letter-spacing", "normal"),
    ("line-height", "normal"),
    ("list-style-type", "disc"),
    ("margin-bottom", "0px"),
    ("margin-left", "0px"),
    ("margin-right", "0px"),
    ("margin-top", "0px"),
    ("opacity", "1"),
    ("overflow", "visible"),
    ("padding-bottom", "0px"),
    ("padding-left", "0px"),
    ("padding-right", "0px"),
    ("padding-top", "0px"),
    ("position", "static"),
    ("right", "auto"),
    ("text-align", "start"),
    ("text-transform", "none"),
    ("top", "auto"),
    ("transform", "none"),
    ("transition-duration", "0s"),
    ("visibility", "visible"),
    ("white-space", "normal"),
    ("width", "auto"),
    ("z-index", "auto"),
];

/// User-agent defaults
const UA_STYLESHEET: &str = r#"
html, body, div, p, ul, ol, dl, dt, dd, form, fieldset, legend, section, article,
header, footer, nav, main, aside, figure, figcaption, blockquote, pre, address, hr,
h1, h2, h3, h4, h5, h6, details, summary { display: block }
li { display: list-item }
head, script, style, title, meta, link, base, template, noscript, datalist { display: none }
[hidden] { display: none }
table { display: table }
thead { display: table-header-group }
tbody { display: table-row-group }
tfoot { display: table-footer-group }
tr { display: table-row }
td, th { display: table-cell }
input, button, select, textarea { display: inline-block }
b, strong, th { font-weight: bold }
i, em, cite, var { font-style: italic }
h1 { font-size: 2em; font-weight: bold }
h2 { font-size: 1.5em; font-weight: bold }
h3 { font-size: 1.17em; font-weight: bold }
h4, h5, h6 { font-weight: bold }
a { color: rgb(0, 0, 238); cursor: pointer }
pre { white-space: pre }
"#;

pub fn is_inherited(property: &str) -> bool {
    INHERITED_PROPERTIES.contains(&property)
}

pub fn initial_value(property: &str) -> &'static str {
    INITIAL_VALUES
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, value)| *value)
        .unwrap_or("")
}

/// Where a declaration came from; later variants win
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Origin {
    UserAgent,
    Author,
    Inline,
}

/// Sort key of a candidate declaration, compared lexicographically
type CascadeKey = (bool, Origin, Specificity, usize);

/// Style resolver - computes styles for connected elements
pub struct StyleResolver {
    /// User agent stylesheet (browser defaults)
    ua_styles: Stylesheet,
    /// Author stylesheets (page CSS)
    author_styles: Vec<Stylesheet>,
}

impl StyleResolver {
    pub fn new() -> Self {
        Self {
            ua_styles: Stylesheet::parse(UA_STYLESHEET),
            author_styles: Vec::new(),
        }
    }

    /// Resolver with one author sheet per connected `<style>` element
    pub fn from_document(arena: &DomArena) -> Self {
        let mut resolver = Self::new();
        for style_id in arena.find_by_tag("style") {
            if let Ok(css) = arena.text_content(style_id) {
                resolver.add_stylesheet(Stylesheet::parse(&css));
            }
        }
        resolver
    }

    /// Add an author stylesheet
    pub fn add_stylesheet(&mut self, stylesheet: Stylesheet) {
        self.author_styles.push(stylesheet);
    }

    /// Winning declaration value per property for one element
    pub fn cascade(&self, arena: &DomArena, node_id: NodeId) -> AHashMap<String, String> {
        let mut winners: AHashMap<String, (CascadeKey, String)> = AHashMap::new();
        let mut order = 0usize;

        let mut offer = |winners: &mut AHashMap<String, (CascadeKey, String)>,
                         decl: &Declaration,
                         origin: Origin,
                         specificity: Specificity| {
            order += 1;
            let key = (decl.important, origin, specificity, order);
            match winners.get(&decl.property) {
                Some((existing, _)) if *existing > key => {}
                _ => {
                    winners.insert(decl.property.clone(), (key, decl.value.clone()));
                }
            }
        };

        let sheets = std::iter::once((Origin::UserAgent, &self.ua_styles))
            .chain(self.author_styles.iter().map(|s| (Origin::Author, s)));
        for (origin, sheet) in sheets {
            for rule in &sheet.rules {
                if let Some(specificity) = rule.selectors.matching_specificity(arena, node_id) {
                    for decl in &rule.declarations {
                        offer(&mut winners, decl, origin, specificity);
                    }
                }
            }
        }

        if let Ok(node) = arena.get(node_id) {
            for decl in InlineStyle::of(node).declarations() {
                offer(&mut winners, decl, Origin::Inline, Specificity::default());
            }
        }

        winners
            .into_iter()
            .map(|(property, (_, value))| (property, value))
            .collect()
    }

    /// Computed value of one property (`getComputedStyle(el).getPropertyValue(p)`)
    pub fn compute(&self, arena: &DomArena, node_id: NodeId, property: &str) -> String {
        let property = property_name(property);
        let connected_element = arena
            .get(node_id)
            .map(|n| n.is_element())
            .unwrap_or(false)
            && arena.is_connected(node_id);
        if !connected_element {
            return String::new();
        }

        // Walk the element chain upward for as long as the value is inherited
        let mut current = node_id;
        loop {
            let cascaded = self.cascade(arena, current).remove(&property);
            let from_parent = match cascaded.as_deref() {
                Some("inherit") => true,
                Some("initial") => return initial_value(&property).to_string(),
                Some("unset") | None => is_inherited(&property),
                Some(value) => return value.to_string(),
            };
            if !from_parent {
                return initial_value(&property).to_string();
            }
            match parent_element(arena, current) {
                Some(parent_id) => current = parent_id,
                None => return initial_value(&property).to_string(),
            }
        }
    }
}

fn parent_element(arena: &DomArena, node_id: NodeId) -> Option<NodeId> {
    arena
        .get(node_id)
        .ok()
        .and_then(|n| n.parent_id)
        .filter(|&p| arena.get(p).map(|n| n.is_element()).unwrap_or(false))
}

impl Default for StyleResolver {
    fn default() -> Self {
        Self::new()
    }
}
