//! Python parser using tree-sitter
//!
//! Statement names follow the Python `ast` module (`FunctionDef`, `Assign`,
//! `Expr`, ...) so that statement sequences read the same way Python's own
//! parser would report them.

use super::{
    lower, named_children, node_text, number_value, parse_tree, Ast, FunctionInfo, FunctionStyle,
    LoopKind, Mapped, NodeKind, NodeMapper, ParseError,
};
use crate::models::Language;
use tree_sitter::Node;

/// Parse Python source into an owned AST
pub fn parse(source: &str, max_depth: usize) -> Result<Ast, ParseError> {
    let tree = parse_tree(source, tree_sitter_python::LANGUAGE.into(), "Python")?;
    let mapper = PythonMapper {
        source: source.as_bytes(),
    };
    let root = lower(&mapper, tree.root_node(), None, Scope::default(), 0, max_depth)?;
    Ok(Ast {
        language: Language::Python,
        root,
    })
}

struct PythonMapper<'a> {
    source: &'a [u8],
}

#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    /// Inside a parameter list, where identifiers are arguments, not names
    in_params: bool,
    /// Inside an import statement, `global` or `nonlocal`
    in_binding_list: bool,
}

impl NodeMapper for PythonMapper<'_> {
    type Scope = Scope;

    fn map(&self, node: Node<'_>, field: Option<&str>, scope: Scope) -> Mapped<Scope> {
        // Default values and annotations inside a parameter list are expressions
        let scope = match field {
            Some("value" | "type") if scope.in_params => Scope {
                in_params: false,
                ..scope
            },
            _ => scope,
        };

        match node.kind() {
            "module" => Mapped::new(NodeKind::Module, scope),
            "function_definition" => {
                let info = self.function_info(node);
                let stmt = if info.is_async {
                    "AsyncFunctionDef"
                } else {
                    "FunctionDef"
                };
                Mapped::new(NodeKind::Function(info), scope).statement(stmt)
            }
            "lambda" => Mapped::new(
                NodeKind::Function(FunctionInfo {
                    name: "<lambda>".to_string(),
                    style: FunctionStyle::Lambda,
                    is_async: false,
                    body_len: 1,
                    has_docstring: false,
                }),
                scope,
            ),
            "class_definition" => {
                let name = self.field_text(node, "name");
                Mapped::new(NodeKind::Class { name }, scope).statement("ClassDef")
            }
            "for_statement" => {
                let stmt = if has_async_keyword(node) {
                    "AsyncFor"
                } else {
                    "For"
                };
                Mapped::new(NodeKind::Loop(LoopKind::For), scope).statement(stmt)
            }
            "while_statement" => {
                Mapped::new(NodeKind::Loop(LoopKind::While), scope).statement("While")
            }
            "try_statement" => Mapped::new(NodeKind::Try, scope).statement("Try"),
            "if_statement" => {
                let main_guard = node
                    .child_by_field_name("condition")
                    .is_some_and(|c| self.is_main_guard(c));
                Mapped::new(NodeKind::If { main_guard }, scope).statement("If")
            }
            // `elif` is a nested `If` in Python's own tree
            "elif_clause" => Mapped::new(NodeKind::If { main_guard: false }, scope).statement("If"),
            "list_comprehension"
            | "dictionary_comprehension"
            | "set_comprehension"
            | "generator_expression" => Mapped::new(NodeKind::Comprehension, scope),
            "named_expression" => Mapped::new(NodeKind::NamedExpr, scope),
            "string" if self.is_f_string(node) => Mapped::new(NodeKind::FormatString, scope),
            "integer" | "float" => {
                let value = number_value(node_text(node, self.source));
                Mapped::new(NodeKind::Number(value), scope)
            }
            "identifier" => {
                let kind = if self.is_value_name(node, field, scope) {
                    NodeKind::Name(node_text(node, self.source).to_string())
                } else {
                    NodeKind::Other
                };
                Mapped::new(kind, scope)
            }
            "return_statement" => Mapped::new(
                NodeKind::Return {
                    has_value: node.named_child_count() > 0,
                },
                scope,
            )
            .statement("Return"),
            "parameters" | "lambda_parameters" => Mapped::new(
                NodeKind::Other,
                Scope {
                    in_params: true,
                    ..scope
                },
            ),
            "import_statement" | "import_from_statement" | "future_import_statement" => {
                let stmt = if node.kind() == "import_statement" {
                    "Import"
                } else {
                    "ImportFrom"
                };
                Mapped::new(
                    NodeKind::Other,
                    Scope {
                        in_binding_list: true,
                        ..scope
                    },
                )
                .statement(stmt)
            }
            "global_statement" | "nonlocal_statement" => {
                let stmt = if node.kind() == "global_statement" {
                    "Global"
                } else {
                    "Nonlocal"
                };
                Mapped::new(
                    NodeKind::Other,
                    Scope {
                        in_binding_list: true,
                        ..scope
                    },
                )
                .statement(stmt)
            }
            "expression_statement" => {
                Mapped::new(NodeKind::Other, scope).statement(expression_statement_name(node))
            }
            kind => {
                let mapped = Mapped::new(NodeKind::Other, scope);
                match simple_statement_name(kind, node) {
                    Some(stmt) => mapped.statement(stmt),
                    None => mapped,
                }
            }
        }
    }
}

impl PythonMapper<'_> {
    fn field_text(&self, node: Node<'_>, field: &str) -> String {
        node.child_by_field_name(field)
            .map(|n| node_text(n, self.source).to_string())
            .unwrap_or_default()
    }

    fn function_info(&self, node: Node<'_>) -> FunctionInfo {
        let body = node.child_by_field_name("body");
        let statements = body.map(named_children).unwrap_or_default();
        let has_docstring = statements
            .first()
            .is_some_and(|first| self.is_docstring(*first));

        FunctionInfo {
            name: self.field_text(node, "name"),
            style: FunctionStyle::Declaration,
            is_async: has_async_keyword(node),
            body_len: statements.len(),
            has_docstring,
        }
    }

    /// An expression statement holding a plain, non-blank string literal
    fn is_docstring(&self, statement: Node<'_>) -> bool {
        if statement.kind() != "expression_statement" || statement.named_child_count() != 1 {
            return false;
        }
        let Some(expr) = statement.named_child(0) else {
            return false;
        };
        expr.kind() == "string"
            && !self.is_f_string(expr)
            && !strip_quotes(node_text(expr, self.source)).trim().is_empty()
    }

    fn is_f_string(&self, node: Node<'_>) -> bool {
        string_prefix(node_text(node, self.source))
            .chars()
            .any(|c| c == 'f' || c == 'F')
    }

    /// `__name__ == "__main__"`
    fn is_main_guard(&self, condition: Node<'_>) -> bool {
        if condition.kind() != "comparison_operator" {
            return false;
        }
        let operands = named_children(condition);
        let Some(left) = operands.first() else {
            return false;
        };
        if left.kind() != "identifier" || node_text(*left, self.source) != "__name__" {
            return false;
        }

        let mut cursor = condition.walk();
        let has_eq = condition
            .children(&mut cursor)
            .any(|c| !c.is_named() && c.kind() == "==");
        has_eq
            && operands[1..].iter().any(|n| {
                n.kind() == "string"
                    && !self.is_f_string(*n)
                    && strip_quotes(node_text(*n, self.source)) == "__main__"
            })
    }

    /// Identifiers that Python's own tree reports as `Name` nodes
    fn is_value_name(&self, node: Node<'_>, field: Option<&str>, scope: Scope) -> bool {
        if scope.in_params || scope.in_binding_list {
            return false;
        }
        let Some(parent) = node.parent() else {
            return true;
        };
        !matches!(
            (parent.kind(), field),
            ("attribute", Some("attribute"))
                | ("keyword_argument", Some("name"))
                | ("function_definition", Some("name"))
                | ("class_definition", Some("name"))
                | ("dotted_name", _)
                | ("aliased_import", _)
                | ("keyword_pattern", _)
        )
    }
}

fn has_async_keyword(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == "async");
    found
}

/// `Assign`, `AugAssign`, `AnnAssign` or `Expr`
fn expression_statement_name(node: Node<'_>) -> &'static str {
    match node.named_child(0) {
        Some(expr) if expr.kind() == "augmented_assignment" => "AugAssign",
        Some(expr) if expr.kind() == "assignment" => {
            if expr.child_by_field_name("type").is_some() {
                "AnnAssign"
            } else {
                "Assign"
            }
        }
        _ => "Expr",
    }
}

fn simple_statement_name(kind: &str, node: Node<'_>) -> Option<&'static str> {
    let name = match kind {
        "pass_statement" => "Pass",
        "break_statement" => "Break",
        "continue_statement" => "Continue",
        "raise_statement" => "Raise",
        "assert_statement" => "Assert",
        "delete_statement" => "Delete",
        "match_statement" => "Match",
        "type_alias_statement" => "TypeAlias",
        "with_statement" if has_async_keyword(node) => "AsyncWith",
        "with_statement" => "With",
        _ => return None,
    };
    Some(name)
}

/// Letters before the opening quote
fn string_prefix(text: &str) -> &str {
    let end = text.find(|c| c == '\'' || c == '"').unwrap_or(0);
    &text[..end]
}

fn strip_quotes(text: &str) -> &str {
    let body = &text[string_prefix(text).len()..];
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|b| b.strip_suffix(quote))
        {
            return inner;
        }
    }
    body
}
