//! CSS selector parsing and matching
//!
//! Supports selector lists of complex selectors built from type, universal,
//! id, class, attribute and structural pseudo-class parts joined by the four
//! combinators. Matching runs right to left from the candidate element.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

/// Selector specificity as (ids, classes/attributes/pseudo-classes, types)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl std::ops::Add for Specificity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Specificity(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    NextSibling,
    /// `a ~ b`
    SubsequentSibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `[a=v]`
    Equals,
    /// `[a~=v]` whitespace-separated word
    Includes,
    /// `[a|=v]` exact or `v-` prefix
    DashMatch,
    /// `[a^=v]`
    Prefix,
    /// `[a$=v]`
    Suffix,
    /// `[a*=v]`
    Substring,
}

/// An+B expression for :nth-* selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthExpression {
    pub a: i32,
    pub b: i32,
}

impl NthExpression {
    /// Parse from string like "2n+1", "odd", "even", "3"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();

        match s.as_str() {
            "odd" => return Some(Self { a: 2, b: 1 }),
            "even" => return Some(Self { a: 2, b: 0 }),
            _ => {}
        }

        if let Ok(n) = s.parse::<i32>() {
            return Some(Self { a: 0, b: n });
        }

        let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let n_pos = s.find('n')?;
        let a_str = &s[..n_pos];
        let a = match a_str {
            "" | "+" => 1,
            "-" => -1,
            other => other.parse().ok()?,
        };
        let rest = &s[n_pos + 1..];
        let b = if rest.is_empty() {
            0
        } else {
            rest.trim_start_matches('+').parse().ok()?
        };
        Some(Self { a, b })
    }

    /// Check if index n (1-based) matches this expression
    pub fn matches(&self, n: i32) -> bool {
        if self.a == 0 {
            return n == self.b;
        }
        // Widened so extreme offsets cannot overflow
        let (a, diff) = (i64::from(self.a), i64::from(n) - i64::from(self.b));
        diff % a == 0 && diff / a >= 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    NthChild(NthExpression),
    NthLastChild(NthExpression),
    FirstOfType,
    LastOfType,
    Empty,
    Root,
    Checked,
    Disabled,
    Enabled,
    Not(Box<Compound>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimpleSelector {
    Universal,
    Type(String),
    Id(String),
    Class(String),
    Attribute {
        name: String,
        matcher: Option<(AttrOp, String)>,
        case_insensitive: bool,
    },
    Pseudo(PseudoClass),
}

/// A sequence of simple selectors with no combinator between them
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    pub parts: Vec<SimpleSelector>,
}

impl Compound {
    fn specificity(&self) -> Specificity {
        self.parts.iter().fold(Specificity::default(), |acc, part| {
            acc + match part {
                SimpleSelector::Universal => Specificity(0, 0, 0),
                SimpleSelector::Type(_) => Specificity(0, 0, 1),
                SimpleSelector::Id(_) => Specificity(1, 0, 0),
                SimpleSelector::Pseudo(PseudoClass::Not(inner)) => inner.specificity(),
                SimpleSelector::Class(_)
                | SimpleSelector::Attribute { .. }
                | SimpleSelector::Pseudo(_) => Specificity(0, 1, 0),
            }
        })
    }
}

/// Compounds joined by combinators; `combinators[i]` sits between
/// `compounds[i]` and `compounds[i + 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    pub compounds: Vec<Compound>,
    pub combinators: Vec<Combinator>,
    pub specificity: Specificity,
}

/// Comma-separated selector list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser::new(input);
        let list = parser.parse_list()?;
        Ok(list)
    }

    /// True when any selector in the list matches the element
    pub fn matches(&self, arena: &DomArena, node_id: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|s| matches_complex(arena, s, node_id))
    }

    /// Highest specificity among the selectors that match, if any do
    pub fn matching_specificity(&self, arena: &DomArena, node_id: NodeId) -> Option<Specificity> {
        self.selectors
            .iter()
            .filter(|s| matches_complex(arena, s, node_id))
            .map(|s| s.specificity)
            .max()
    }

    /// First matching element among the descendants of `scope`, in tree order
    pub fn query_first(&self, arena: &DomArena, scope: NodeId) -> Result<Option<NodeId>> {
        Ok(arena
            .descendants(scope)?
            .into_iter()
            .find(|&id| self.matches(arena, id)))
    }

    /// All matching elements among the descendants of `scope`, in tree order
    pub fn query_all(&self, arena: &DomArena, scope: NodeId) -> Result<Vec<NodeId>> {
        Ok(arena
            .descendants(scope)?
            .into_iter()
            .filter(|&id| self.matches(arena, id))
            .collect())
    }
}

/// `document.querySelector`
pub fn select(arena: &DomArena, selector: &str) -> Result<Option<NodeId>> {
    let list = SelectorList::parse(selector)?;
    match arena.root_id() {
        Some(root) => list.query_first(arena, root),
        None => Ok(None),
    }
}

/// `document.querySelectorAll`
pub fn select_all(arena: &DomArena, selector: &str) -> Result<Vec<NodeId>> {
    let list = SelectorList::parse(selector)?;
    match arena.root_id() {
        Some(root) => list.query_all(arena, root),
        None => Ok(Vec::new()),
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

fn matches_complex(arena: &DomArena, selector: &ComplexSelector, node_id: NodeId) -> bool {
    match selector.compounds.len() {
        0 => false,
        n => match_from(arena, selector, n - 1, node_id),
    }
}

fn match_from(arena: &DomArena, selector: &ComplexSelector, idx: usize, node_id: NodeId) -> bool {
    let Ok(node) = arena.get(node_id) else {
        return false;
    };
    if !matches_compound(arena, &selector.compounds[idx], node) {
        return false;
    }
    if idx == 0 {
        return true;
    }

    match selector.combinators[idx - 1] {
        Combinator::Child => parent_element(arena, node)
            .map(|p| match_from(arena, selector, idx - 1, p))
            .unwrap_or(false),
        Combinator::Descendant => {
            let mut current = parent_element(arena, node);
            while let Some(ancestor) = current {
                if match_from(arena, selector, idx - 1, ancestor) {
                    return true;
                }
                current = arena.get(ancestor).ok().and_then(|n| parent_element(arena, n));
            }
            false
        }
        Combinator::NextSibling => element_siblings_before(arena, node)
            .last()
            .map(|&s| match_from(arena, selector, idx - 1, s))
            .unwrap_or(false),
        Combinator::SubsequentSibling => element_siblings_before(arena, node)
            .iter()
            .any(|&s| match_from(arena, selector, idx - 1, s)),
    }
}

fn parent_element(arena: &DomArena, node: &DomNode) -> Option<NodeId> {
    let parent = arena.get(node.parent_id?).ok()?;
    parent.is_element().then_some(parent.node_id)
}

fn element_siblings_before(arena: &DomArena, node: &DomNode) -> Vec<NodeId> {
    element_siblings(arena, node)
        .into_iter()
        .take_while(|&id| id != node.node_id)
        .collect()
}

/// Element children of the node's parent (just the node itself when parentless)
fn element_siblings(arena: &DomArena, node: &DomNode) -> Vec<NodeId> {
    match node.parent_id {
        Some(parent) => arena.element_children(parent).unwrap_or_default(),
        None => vec![node.node_id],
    }
}

fn matches_compound(arena: &DomArena, compound: &Compound, node: &DomNode) -> bool {
    if !node.is_element() {
        return false;
    }
    compound.parts.iter().all(|part| match part {
        SimpleSelector::Universal => true,
        SimpleSelector::Type(tag) => node.node_name.eq_ignore_ascii_case(tag),
        SimpleSelector::Id(id) => node.attr("id") == Some(id.as_str()),
        SimpleSelector::Class(class) => node.has_class(class),
        SimpleSelector::Attribute {
            name,
            matcher,
            case_insensitive,
        } => matches_attribute(node, name, matcher.as_ref(), *case_insensitive),
        SimpleSelector::Pseudo(pseudo) => matches_pseudo(arena, pseudo, node),
    })
}

fn matches_attribute(
    node: &DomNode,
    name: &str,
    matcher: Option<&(AttrOp, String)>,
    case_insensitive: bool,
) -> bool {
    let Some(actual) = node
        .attributes
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case(name))
        .map(|a| a.value.as_str())
    else {
        return false;
    };
    let Some((op, expected)) = matcher else {
        return true;
    };

    let (actual, expected) = if case_insensitive {
        (actual.to_lowercase(), expected.to_lowercase())
    } else {
        (actual.to_string(), expected.clone())
    };

    match op {
        AttrOp::Equals => actual == expected,
        AttrOp::Includes => actual.split_ascii_whitespace().any(|w| w == expected),
        AttrOp::DashMatch => {
            actual == expected || actual.starts_with(&format!("{}-", expected))
        }
        AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

const FORM_CONTROLS: &[&str] = &[
    "button", "input", "select", "textarea", "optgroup", "option", "fieldset",
];

fn matches_pseudo(arena: &DomArena, pseudo: &PseudoClass, node: &DomNode) -> bool {
    let position = |ids: &[NodeId]| {
        ids.iter()
            .position(|&id| id == node.node_id)
            .map(|p| (p as i32 + 1, ids.len() as i32))
    };
    let of_type = || -> Vec<NodeId> {
        element_siblings(arena, node)
            .into_iter()
            .filter(|&id| {
                arena
                    .get(id)
                    .map(|n| n.node_name == node.node_name)
                    .unwrap_or(false)
            })
            .collect()
    };

    match pseudo {
        PseudoClass::FirstChild => position(&element_siblings(arena, node))
            .map(|(i, _)| i == 1)
            .unwrap_or(false),
        PseudoClass::LastChild => position(&element_siblings(arena, node))
            .map(|(i, n)| i == n)
            .unwrap_or(false),
        PseudoClass::OnlyChild => element_siblings(arena, node).len() == 1,
        PseudoClass::NthChild(nth) => position(&element_siblings(arena, node))
            .map(|(i, _)| nth.matches(i))
            .unwrap_or(false),
        PseudoClass::NthLastChild(nth) => position(&element_siblings(arena, node))
            .map(|(i, n)| nth.matches(n - i + 1))
            .unwrap_or(false),
        PseudoClass::FirstOfType => position(&of_type()).map(|(i, _)| i == 1).unwrap_or(false),
        PseudoClass::LastOfType => position(&of_type())
            .map(|(i, n)| i == n)
            .unwrap_or(false),
        PseudoClass::Empty => arena
            .children(node.node_id)
            .map(|children| {
                children
                    .iter()
                    .all(|c| !c.is_element() && !(c.is_text() && !c.node_value.is_empty()))
            })
            .unwrap_or(false),
        PseudoClass::Root => node
            .parent_id
            .and_then(|p| arena.get(p).ok())
            .map(|p| p.node_type == NodeType::Document)
            .unwrap_or(false),
        PseudoClass::Checked => match node.node_name.as_str() {
            "input" => {
                matches!(node.attr("type"), Some(t) if t.eq_ignore_ascii_case("checkbox") || t.eq_ignore_ascii_case("radio"))
                    && node.has_attr("checked")
            }
            "option" => node.has_attr("selected"),
            _ => false,
        },
        PseudoClass::Disabled => {
            FORM_CONTROLS.contains(&node.node_name.as_str()) && node.has_attr("disabled")
        }
        PseudoClass::Enabled => {
            FORM_CONTROLS.contains(&node.node_name.as_str()) && !node.has_attr("disabled")
        }
        PseudoClass::Not(inner) => !matches_compound(arena, inner, node),
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error(&self, msg: &str) -> DomError {
        let input: String = self.chars.iter().collect();
        DomError::Syntax(format!("{} at {} in {:?}", msg, self.pos, input))
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            _ => Err(self.error(&format!("expected '{}'", expected))),
        }
    }

    /// Returns true when any whitespace was skipped
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(&mut self) -> Result<SelectorList> {
        let mut selectors = Vec::new();
        loop {
            self.skip_ws();
            selectors.push(self.parse_complex()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                None => break,
                Some(_) => return Err(self.error("unexpected character")),
            }
        }
        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') | Some(')') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.error("unexpected character")),
            };
            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_ws();
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        let specificity = compounds
            .iter()
            .fold(Specificity::default(), |acc, c| acc + c.specificity());

        Ok(ComplexSelector {
            compounds,
            combinators,
            specificity,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut parts = Vec::new();

        match self.peek() {
            Some('*') => {
                self.bump();
                parts.push(SimpleSelector::Universal);
            }
            Some(c) if is_ident_start(c) => {
                parts.push(SimpleSelector::Type(self.parse_ident()?.to_ascii_lowercase()));
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    parts.push(SimpleSelector::Id(self.parse_ident()?));
                }
                Some('.') => {
                    self.bump();
                    parts.push(SimpleSelector::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.bump();
                    parts.push(self.parse_attribute()?);
                }
                Some(':') => {
                    self.bump();
                    parts.push(SimpleSelector::Pseudo(self.parse_pseudo()?));
                }
                _ => break,
            }
        }

        if parts.is_empty() {
            return Err(self.error("expected selector"));
        }
        Ok(Compound { parts })
    }

    fn parse_ident(&mut self) -> Result<String> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                match self.bump() {
                    Some(escaped) => ident.push(escaped),
                    None => return Err(self.error("dangling escape")),
                }
            } else if is_ident_char(c) {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return Err(self.error("expected identifier"));
        }
        Ok(ident)
    }

    fn parse_attribute(&mut self) -> Result<SimpleSelector> {
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();

        if self.peek() == Some(']') {
            self.bump();
            return Ok(SimpleSelector::Attribute {
                name,
                matcher: None,
                case_insensitive: false,
            });
        }

        let op = match self.bump() {
            Some('=') => AttrOp::Equals,
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                self.expect('=')?;
                match c {
                    '~' => AttrOp::Includes,
                    '|' => AttrOp::DashMatch,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Substring,
                }
            }
            _ => return Err(self.error("expected attribute operator")),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some('\\') => {
                            if let Some(c) = self.bump() {
                                value.push(c);
                            }
                        }
                        Some(c) => value.push(c),
                        None => return Err(self.error("unterminated string")),
                    }
                }
                value
            }
            _ => self.parse_ident()?,
        };

        self.skip_ws();
        let case_insensitive = match self.peek() {
            Some('i' | 'I') => {
                self.bump();
                true
            }
            Some('s' | 'S') => {
                self.bump();
                false
            }
            _ => false,
        };
        self.skip_ws();
        self.expect(']')?;

        Ok(SimpleSelector::Attribute {
            name,
            matcher: Some((op, value)),
            case_insensitive,
        })
    }

    fn parse_pseudo(&mut self) -> Result<PseudoClass> {
        if self.peek() == Some(':') {
            return Err(self.error("pseudo-elements are not supported"));
        }
        let name = self.parse_ident()?.to_ascii_lowercase();

        let pseudo = match name.as_str() {
            "first-child" => PseudoClass::FirstChild,
            "last-child" => PseudoClass::LastChild,
            "only-child" => PseudoClass::OnlyChild,
            "first-of-type" => PseudoClass::FirstOfType,
            "last-of-type" => PseudoClass::LastOfType,
            "empty" => PseudoClass::Empty,
            "root" => PseudoClass::Root,
            "checked" => PseudoClass::Checked,
            "disabled" => PseudoClass::Disabled,
            "enabled" => PseudoClass::Enabled,
            "nth-child" | "nth-last-child" => {
                let arg = self.parse_raw_argument()?;
                let nth = NthExpression::parse(&arg)
                    .ok_or_else(|| self.error("invalid An+B expression"))?;
                if name == "nth-child" {
                    PseudoClass::NthChild(nth)
                } else {
                    PseudoClass::NthLastChild(nth)
                }
            }
            "not" => {
                self.expect('(')?;
                self.skip_ws();
                let inner = self.parse_compound()?;
                self.skip_ws();
                self.expect(')')?;
                PseudoClass::Not(Box::new(inner))
            }
            _ => return Err(self.error(&format!("unsupported pseudo-class :{}", name))),
        };
        Ok(pseudo)
    }

    /// Text between `(` and the matching `)`
    fn parse_raw_argument(&mut self) -> Result<String> {
        self.expect('(')?;
        let mut arg = String::new();
        loop {
            match self.bump() {
                Some(')') => return Ok(arg),
                Some(c) => arg.push(c),
                None => return Err(self.error("unterminated argument")),
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;

    const PAGE: &str = r#"
        <div id="main" class="box big">
            <ul>
                <li class="item">a</li>
                <li class="item active" data-kind="fruit-apple">b</li>
                <li class="item">c</li>
            </ul>
            <p lang="en-US">text</p>
            <input type="checkbox" name="c" checked>
            <input type="text" disabled>
        </div>
        <span></span>
    "#;

    fn tags(arena: &DomArena, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| arena.text_content(id).unwrap())
            .collect()
    }

    #[test]
    fn test_basic_selectors() {
        let arena = markup::parse_document(PAGE);
        assert_eq!(select_all(&arena, "li").unwrap().len(), 3);
        assert_eq!(select_all(&arena, ".item.active").unwrap().len(), 1);
        assert!(select(&arena, "#main").unwrap().is_some());
        assert!(select(&arena, "#missing").unwrap().is_none());
        assert_eq!(select_all(&arena, "LI").unwrap().len(), 3);
        assert_eq!(select_all(&arena, "li, p").unwrap().len(), 4);
    }

    #[test]
    fn test_combinators() {
        let arena = markup::parse_document(PAGE);
        assert_eq!(select_all(&arena, "div li").unwrap().len(), 3);
        assert_eq!(select_all(&arena, "div > li").unwrap().len(), 0);
        assert_eq!(select_all(&arena, "ul > li").unwrap().len(), 3);

        let next = select_all(&arena, ".active + li").unwrap();
        assert_eq!(tags(&arena, &next), vec!["c"]);

        let later = select_all(&arena, "li:first-child ~ li").unwrap();
        assert_eq!(tags(&arena, &later), vec!["b", "c"]);
    }

    #[test]
    fn test_attribute_operators() {
        let arena = markup::parse_document(PAGE);
        assert_eq!(select_all(&arena, "[data-kind]").unwrap().len(), 1);
        assert_eq!(select_all(&arena, "[data-kind^=fruit]").unwrap().len(), 1);
        assert_eq!(select_all(&arena, "[data-kind$='apple']").unwrap().len(), 1);
        assert_eq!(select_all(&arena, "[data-kind*=\"t-a\"]").unwrap().len(), 1);
        assert_eq!(select_all(&arena, "[class~=big]").unwrap().len(), 1);
        assert_eq!(select_all(&arena, "[lang|=en]").unwrap().len(), 1);
        assert_eq!(select_all(&arena, "[type=CHECKBOX i]").unwrap().len(), 1);
        assert_eq!(select_all(&arena, "[type=CHECKBOX]").unwrap().len(), 0);
    }

    #[test]
    fn test_pseudo_classes() {
        let arena = markup::parse_document(PAGE);
        let first = select_all(&arena, "li:first-child").unwrap();
        assert_eq!(tags(&arena, &first), vec!["a"]);
        let last = select_all(&arena, "li:last-child").unwrap();
        assert_eq!(tags(&arena, &last), vec!["c"]);
        let odd = select_all(&arena, "li:nth-child(odd)").unwrap();
        assert_eq!(tags(&arena, &odd), vec!["a", "c"]);
        let second = select_all(&arena, "li:nth-child(2)").unwrap();
        assert_eq!(tags(&arena, &second), vec!["b"]);
        let not_active = select_all(&arena, "li:not(.active)").unwrap();
        assert_eq!(tags(&arena, &not_active), vec!["a", "c"]);

        assert_eq!(select_all(&arena, "input:checked").unwrap().len(), 1);
        assert_eq!(select_all(&arena, "input:disabled").unwrap().len(), 1);
        assert_eq!(select_all(&arena, "input:enabled").unwrap().len(), 1);
        assert_eq!(select_all(&arena, "span:empty").unwrap().len(), 1);
        assert_eq!(select_all(&arena, ":root").unwrap().len(), 1);
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["", "div >", "[x", "..a", "a::before", ":hover", "li:nth-child(x)"] {
            assert!(
                matches!(SelectorList::parse(bad), Err(DomError::Syntax(_))),
                "expected syntax error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_specificity() {
        let list = SelectorList::parse("#a .b p, div:not(#x)").unwrap();
        assert_eq!(list.selectors[0].specificity, Specificity(1, 1, 1));
        assert_eq!(list.selectors[1].specificity, Specificity(1, 0, 1));
    }

    #[test]
    fn test_nth_expression() {
        let nth = NthExpression::parse("2n+1").unwrap();
        assert!(nth.matches(1) && nth.matches(3) && !nth.matches(2));
        let neg = NthExpression::parse("-n+2").unwrap();
        assert!(neg.matches(1) && neg.matches(2) && !neg.matches(3));
        assert_eq!(NthExpression::parse("even"), Some(NthExpression { a: 2, b: 0 }));
    }

    #[test]
    fn test_nth_extreme_offsets() {
        let arena = markup::parse_document(PAGE);
        assert_eq!(select_all(&arena, "li:nth-child(n-2147483648)").unwrap().len(), 3);
        assert_eq!(select_all(&arena, "li:nth-last-child(-n+2147483647)").unwrap().len(), 3);
        assert!(select_all(&arena, "li:nth-child(2147483647n+2147483647)")
            .unwrap()
            .is_empty());

        let min = NthExpression::parse("-2147483648n-2147483648").unwrap();
        assert!(!min.matches(1) && !min.matches(i32::MAX));
    }
}
