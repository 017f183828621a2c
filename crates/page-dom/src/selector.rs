//! CSS selector subset used for element addressing
//!
//! Supported grammar:
//! - type selectors and `*`
//! - `#id`, `.class`
//! - `[attr]`, `[attr="v"]`, `[attr*="v"]`, `[attr^="v"]`, `[attr$="v"]`, `[attr~="v"]`
//! - `:nth-of-type(n)`
//! - descendant (whitespace) and child (`>`) combinators
//! - comma separated groups

use pagepilot_core_types::NodeRef;

use crate::errors::DomError;
use crate::ports::DomQuery;

/// Minimal tree view the matcher needs.
pub trait SelectorTree {
    fn tag(&self, node: NodeRef) -> Option<String>;
    fn attr(&self, node: NodeRef, name: &str) -> Option<String>;
    fn parent_of(&self, node: NodeRef) -> Option<NodeRef>;
    fn children_of(&self, node: NodeRef) -> Vec<NodeRef>;
}

/// Adapts any [`DomQuery`] implementation to the matcher.
pub struct QueryTree<'a, T: ?Sized>(pub &'a T);

impl<'a, T> SelectorTree for QueryTree<'a, T>
where
    T: DomQuery + ?Sized,
{
    fn tag(&self, node: NodeRef) -> Option<String> {
        self.0.tag_name(node)
    }

    fn attr(&self, node: NodeRef, name: &str) -> Option<String> {
        self.0.attribute(node, name)
    }

    fn parent_of(&self, node: NodeRef) -> Option<NodeRef> {
        self.0.parent(node)
    }

    fn children_of(&self, node: NodeRef) -> Vec<NodeRef> {
        self.0.children(node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Contains,
    Prefix,
    Suffix,
    Word,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
    value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    nth_of_type: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` links `compounds[i]` to `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

/// Parsed selector group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    groups: Vec<Complex>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let mut parser = Parser::new(source);
        let groups = parser.parse_group()?;
        Ok(Self {
            source: source.to_string(),
            groups,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, tree: &dyn SelectorTree, node: NodeRef) -> bool {
        self.groups
            .iter()
            .any(|complex| matches_complex(tree, complex, complex.compounds.len() - 1, node))
    }
}

fn matches_complex(tree: &dyn SelectorTree, complex: &Complex, index: usize, node: NodeRef) -> bool {
    if !matches_compound(tree, &complex.compounds[index], node) {
        return false;
    }
    if index == 0 {
        return true;
    }
    match complex.combinators[index - 1] {
        Combinator::Child => match tree.parent_of(node) {
            Some(parent) => matches_complex(tree, complex, index - 1, parent),
            None => false,
        },
        Combinator::Descendant => {
            let mut current = tree.parent_of(node);
            while let Some(ancestor) = current {
                if matches_complex(tree, complex, index - 1, ancestor) {
                    return true;
                }
                current = tree.parent_of(ancestor);
            }
            false
        }
    }
}

fn matches_compound(tree: &dyn SelectorTree, compound: &Compound, node: NodeRef) -> bool {
    let Some(tag) = tree.tag(node) else {
        return false;
    };
    if let Some(expected) = &compound.tag {
        if !expected.eq_ignore_ascii_case(&tag) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if tree.attr(node, "id").as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    if !compound.classes.is_empty() {
        let class_attr = tree.attr(node, "class").unwrap_or_default();
        let classes: Vec<&str> = class_attr.split_whitespace().collect();
        if !compound
            .classes
            .iter()
            .all(|wanted| classes.contains(&wanted.as_str()))
        {
            return false;
        }
    }
    for attr in &compound.attrs {
        let Some(actual) = tree.attr(node, &attr.name) else {
            return false;
        };
        let ok = match attr.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == attr.value,
            AttrOp::Contains => !attr.value.is_empty() && actual.contains(&attr.value),
            AttrOp::Prefix => !attr.value.is_empty() && actual.starts_with(&attr.value),
            AttrOp::Suffix => !attr.value.is_empty() && actual.ends_with(&attr.value),
            AttrOp::Word => actual.split_whitespace().any(|word| word == attr.value),
        };
        if !ok {
            return false;
        }
    }
    if let Some(position) = compound.nth_of_type {
        if nth_of_type(tree, node, &tag) != Some(position) {
            return false;
        }
    }
    true
}

/// 1-based index of `node` among its same-tag siblings.
pub fn nth_of_type(tree: &dyn SelectorTree, node: NodeRef, tag: &str) -> Option<usize> {
    let parent = tree.parent_of(node)?;
    let mut index = 0;
    for sibling in tree.children_of(parent) {
        if tree
            .tag(sibling)
            .map(|t| t.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
        {
            index += 1;
        }
        if sibling == node {
            return Some(index);
        }
    }
    None
}

/// True when `value` can be written as a bare CSS identifier.
pub fn is_plain_ident(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Quote an attribute value for use inside `[name="..."]`.
pub fn quote_attr_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// `tag[name="value"]`, or `[name="value"]` when no tag is given.
pub fn attr_selector(tag: Option<&str>, name: &str, value: &str) -> String {
    format!("{}[{}={}]", tag.unwrap_or(""), name, quote_attr_value(value))
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> DomError {
        DomError::invalid_selector(self.source, reason)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_group(&mut self) -> Result<Vec<Complex>, DomError> {
        let mut groups = Vec::new();
        loop {
            self.skip_ws();
            groups.push(self.parse_complex()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                None => break,
                Some(other) => return Err(self.error(format!("unexpected '{other}'"))),
            }
        }
        Ok(groups)
    }

    fn parse_complex(&mut self) -> Result<Complex, DomError> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_ws => combinators.push(Combinator::Descendant),
                Some(other) => return Err(self.error(format!("unexpected '{other}'"))),
            }
            compounds.push(self.parse_compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound, DomError> {
        let mut compound = Compound::default();
        let mut consumed = false;
        match self.peek() {
            Some('*') => {
                self.bump();
                consumed = true;
            }
            Some(c) if c.is_ascii_alphabetic() => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
                consumed = true;
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.parse_ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.parse_attr()?);
                }
                Some(':') => {
                    self.bump();
                    compound.nth_of_type = Some(self.parse_pseudo()?);
                }
                _ => break,
            }
            consumed = true;
        }
        if !consumed {
            return Err(self.error("expected a compound selector"));
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, DomError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                match self.bump() {
                    Some(escaped) => out.push(escaped),
                    None => return Err(self.error("dangling escape")),
                }
            } else if c.is_alphanumeric() || c == '-' || c == '_' {
                out.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(self.error("expected identifier"));
        }
        Ok(out)
    }

    fn parse_attr(&mut self) -> Result<AttrSelector, DomError> {
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();
        let op = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(AttrSelector {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                });
            }
            Some('=') => {
                self.bump();
                AttrOp::Equals
            }
            Some(prefix @ ('*' | '^' | '$' | '~')) => {
                self.bump();
                if self.bump() != Some('=') {
                    return Err(self.error("expected '=' in attribute operator"));
                }
                match prefix {
                    '*' => AttrOp::Contains,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Word,
                }
            }
            _ => return Err(self.error("bad attribute selector")),
        };
        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                self.parse_quoted(quote)?
            }
            _ => self.parse_ident()?,
        };
        self.skip_ws();
        if self.bump() != Some(']') {
            return Err(self.error("unterminated attribute selector"));
        }
        Ok(AttrSelector { name, op, value })
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String, DomError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(escaped) => out.push(escaped),
                    None => return Err(self.error("dangling escape")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn parse_pseudo(&mut self) -> Result<usize, DomError> {
        let name = self.parse_ident()?;
        if name != "nth-of-type" {
            return Err(self.error(format!("unsupported pseudo-class ':{name}'")));
        }
        if self.bump() != Some('(') {
            return Err(self.error("expected '('"));
        }
        self.skip_ws();
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        self.skip_ws();
        if self.bump() != Some(')') {
            return Err(self.error("expected ')'"));
        }
        match digits.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(self.error("nth-of-type expects a positive integer")),
        }
    }
}
