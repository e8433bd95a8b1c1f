//! Syntax parsers using tree-sitter
//!
//! Source text is parsed with the tree-sitter grammar of its language and
//! lowered into an owned [`Ast`]. Lowering keeps named, non-extra nodes only
//! and maps the constructs the signal extractors care about onto a closed
//! [`NodeKind`] set; everything else becomes [`NodeKind::Other`].
//!
//! A tree containing ERROR or MISSING nodes is rejected, as is a tree nested
//! deeper than the configured bound.

pub mod javascript;
pub mod python;

use crate::models::Language;
use std::collections::VecDeque;
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

/// Default bound on AST nesting
pub const DEFAULT_MAX_AST_DEPTH: usize = 1000;

/// Parser failures. Never surfaced to callers of the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("failed to load the {language} grammar: {message}")]
    Grammar {
        language: &'static str,
        message: String,
    },

    #[error("tree-sitter produced no tree")]
    NoTree,

    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    #[error("AST nesting exceeds {limit} levels")]
    TooDeep { limit: usize },
}

/// Parse source text into an owned AST
pub fn parse(source: &str, language: Language, max_depth: usize) -> Result<Ast, ParseError> {
    match language {
        Language::Python => python::parse(source, max_depth),
        Language::JavaScript => javascript::parse(source, max_depth),
    }
}

/// Owned syntax tree of one sample
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub language: Language,
    pub root: AstNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: NodeKind,
    /// Statement type name (`For`, `Assign`, `ReturnStatement`, ...) when the
    /// node is a statement
    pub statement: Option<&'static str>,
    /// 1-based start line
    pub line: usize,
    pub children: Vec<AstNode>,
}

/// Constructs the extractors distinguish
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Module,
    Function(FunctionInfo),
    Class { name: String },
    Loop(LoopKind),
    Try,
    If { main_guard: bool },
    Comprehension,
    /// `:=`
    NamedExpr,
    /// f-string or template literal with substitutions
    FormatString,
    /// Numeric literal; `None` when the value is not a real number
    Number(Option<f64>),
    /// Identifier in a value position
    Name(String),
    Return { has_value: bool },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: String,
    pub style: FunctionStyle,
    pub is_async: bool,
    /// Number of statements directly in the body
    pub body_len: usize,
    pub has_docstring: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionStyle {
    /// `def f():` / `function f() {}`
    Declaration,
    /// `function () {}` used as a value
    Expression,
    Arrow,
    Method,
    Lambda,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopKind {
    For,
    /// `for-in` and `for-of`
    ForIn,
    While,
    DoWhile,
}

impl AstNode {
    pub fn function(&self) -> Option<&FunctionInfo> {
        match &self.kind {
            NodeKind::Function(info) => Some(info),
            _ => None,
        }
    }
}

impl Ast {
    /// Statement type names in breadth-first order
    pub fn statements(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut queue = VecDeque::from([&self.root]);
        while let Some(node) = queue.pop_front() {
            if let Some(name) = node.statement {
                names.push(name);
            }
            queue.extend(node.children.iter());
        }
        names
    }
}

/// Callback for [`walk`]
pub trait Visitor {
    fn visit(&mut self, node: &AstNode, depth: usize);
}

impl<F: FnMut(&AstNode, usize)> Visitor for F {
    fn visit(&mut self, node: &AstNode, depth: usize) {
        self(node, depth)
    }
}

/// Pre-order depth-first walk over every node (root at depth 0)
pub fn walk<V: Visitor + ?Sized>(ast: &Ast, visitor: &mut V) {
    let mut stack = vec![(&ast.root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        visitor.visit(node, depth);
        stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
    }
}

/// Structural counts shared by both languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructureVisitor {
    pub max_depth: usize,
    pub functions: usize,
    pub loops: usize,
    pub tries: usize,
}

impl StructureVisitor {
    pub fn collect(ast: &Ast) -> Self {
        let mut visitor = Self::default();
        walk(ast, &mut visitor);
        visitor
    }
}

impl Visitor for StructureVisitor {
    fn visit(&mut self, node: &AstNode, depth: usize) {
        self.max_depth = self.max_depth.max(depth);
        match node.kind {
            NodeKind::Function(_) => self.functions += 1,
            NodeKind::Loop(_) => self.loops += 1,
            NodeKind::Try => self.tries += 1,
            _ => {}
        }
    }
}

/// Per-language mapping from CST nodes to [`NodeKind`]s.
///
/// `Scope` is lowering state inherited from the parent (for example, "inside
/// a parameter list").
pub(crate) trait NodeMapper {
    type Scope: Copy + Default;

    fn map(&self, node: Node<'_>, field: Option<&str>, scope: Self::Scope) -> Mapped<Self::Scope>;
}

pub(crate) struct Mapped<S> {
    pub kind: NodeKind,
    pub statement: Option<&'static str>,
    /// Scope handed to the children
    pub scope: S,
}

impl<S> Mapped<S> {
    pub(crate) fn new(kind: NodeKind, scope: S) -> Self {
        Self {
            kind,
            statement: None,
            scope,
        }
    }

    pub(crate) fn statement(mut self, name: &'static str) -> Self {
        self.statement = Some(name);
        self
    }
}

/// Run tree-sitter and reject trees with syntax errors
pub(crate) fn parse_tree(
    source: &str,
    grammar: tree_sitter::Language,
    language: &'static str,
) -> Result<Tree, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|e| ParseError::Grammar {
            language,
            message: e.to_string(),
        })?;
    let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;

    let root = tree.root_node();
    if root.has_error() {
        let (line, column) = first_error(root)
            .map(|n| (n.start_position().row + 1, n.start_position().column))
            .unwrap_or((1, 0));
        return Err(ParseError::Syntax { line, column });
    }
    Ok(tree)
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

/// Lower a CST node and its named descendants
pub(crate) fn lower<M: NodeMapper>(
    mapper: &M,
    node: Node<'_>,
    field: Option<&str>,
    scope: M::Scope,
    depth: usize,
    max_depth: usize,
) -> Result<AstNode, ParseError> {
    if depth > max_depth {
        return Err(ParseError::TooDeep { limit: max_depth });
    }
    let mapped = mapper.map(node, field, scope);

    let mut children = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() && !child.is_extra() {
                children.push(lower(
                    mapper,
                    child,
                    cursor.field_name(),
                    mapped.scope,
                    depth + 1,
                    max_depth,
                )?);
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    Ok(AstNode {
        kind: mapped.kind,
        statement: mapped.statement,
        line: node.start_position().row + 1,
        children,
    })
}

pub(crate) fn node_text<'a>(node: Node<'_>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Named, non-extra children (statements of a block, without comments)
pub(crate) fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !c.is_extra())
        .collect()
}

/// Numeric value of a literal: `_` separators, radix prefixes and a BigInt
/// `n` suffix are understood; anything else that does not parse as a float
/// (complex literals) yields `None`.
pub(crate) fn number_value(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let cleaned = cleaned.strip_suffix('n').unwrap_or(&cleaned);
    let lower = cleaned.to_ascii_lowercase();

    let radix = match lower.get(..2) {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&lower[2..], radix).ok().map(|v| v as f64);
    }
    lower.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: NodeKind, children: Vec<AstNode>) -> AstNode {
        AstNode {
            kind,
            statement: None,
            line: 1,
            children,
        }
    }

    #[test]
    fn test_walk_visits_every_node_with_depth() {
        let ast = Ast {
            language: Language::Python,
            root: node(
                NodeKind::Module,
                vec![
                    node(NodeKind::Loop(LoopKind::For), vec![node(NodeKind::Try, vec![])]),
                    node(NodeKind::Other, vec![]),
                ],
            ),
        };
        let mut seen = Vec::new();
        walk(&ast, &mut |n: &AstNode, depth: usize| seen.push((n.kind.clone(), depth)));
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], (NodeKind::Module, 0));
        assert_eq!(seen[2], (NodeKind::Try, 2));
        assert_eq!(seen[3], (NodeKind::Other, 1));

        let counts = StructureVisitor::collect(&ast);
        assert_eq!(counts.max_depth, 2);
        assert_eq!(counts.loops, 1);
        assert_eq!(counts.tries, 1);
        assert_eq!(counts.functions, 0);
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value("42"), Some(42.0));
        assert_eq!(number_value("1_000"), Some(1000.0));
        assert_eq!(number_value("0xFF"), Some(255.0));
        assert_eq!(number_value("0b101"), Some(5.0));
        assert_eq!(number_value("3.5e2"), Some(350.0));
        assert_eq!(number_value(".5"), Some(0.5));
        assert_eq!(number_value("10n"), Some(10.0));
        assert_eq!(number_value("2j"), None);
    }

    #[test]
    fn test_dispatch_by_language() {
        assert!(parse("x = 1\n", Language::Python, DEFAULT_MAX_AST_DEPTH).is_ok());
        assert!(parse("const x = 1;", Language::JavaScript, DEFAULT_MAX_AST_DEPTH).is_ok());
        assert!(parse("const x = 1;", Language::Python, DEFAULT_MAX_AST_DEPTH).is_err());
    }
}
