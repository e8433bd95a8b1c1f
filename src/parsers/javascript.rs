//! JavaScript parser using tree-sitter
//!
//! Statement names follow ESTree (`ExpressionStatement`,
//! `VariableDeclaration`, ...). The grammar accepts both scripts and ES
//! modules, and JSX.

use super::{
    lower, named_children, node_text, number_value, parse_tree, Ast, FunctionInfo, FunctionStyle,
    LoopKind, Mapped, NodeKind, NodeMapper, ParseError,
};
use crate::models::Language;
use tree_sitter::Node;

/// Parse JavaScript source into an owned AST
pub fn parse(source: &str, max_depth: usize) -> Result<Ast, ParseError> {
    let tree = parse_tree(source, tree_sitter_javascript::LANGUAGE.into(), "JavaScript")?;
    let mapper = JsMapper {
        source: source.as_bytes(),
    };
    let root = lower(&mapper, tree.root_node(), None, (), 0, max_depth)?;
    Ok(Ast {
        language: Language::JavaScript,
        root,
    })
}

struct JsMapper<'a> {
    source: &'a [u8],
}

impl NodeMapper for JsMapper<'_> {
    type Scope = ();

    fn map(&self, node: Node<'_>, _field: Option<&str>, _scope: ()) -> Mapped<()> {
        let kind = node.kind();
        let mapped = match kind {
            "program" => Mapped::new(NodeKind::Module, ()),
            "function_declaration" | "generator_function_declaration" => {
                Mapped::new(self.function(node, FunctionStyle::Declaration), ())
                    .statement("FunctionDeclaration")
            }
            "function_expression" | "function" | "generator_function" => {
                Mapped::new(self.function(node, FunctionStyle::Expression), ())
            }
            "arrow_function" => Mapped::new(self.function(node, FunctionStyle::Arrow), ()),
            "method_definition" => Mapped::new(self.function(node, FunctionStyle::Method), ()),
            "class_declaration" | "class" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| node_text(n, self.source).to_string())
                    .unwrap_or_default();
                let mapped = Mapped::new(NodeKind::Class { name }, ());
                if kind == "class_declaration" {
                    mapped.statement("ClassDeclaration")
                } else {
                    mapped
                }
            }
            "for_statement" => {
                Mapped::new(NodeKind::Loop(LoopKind::For), ()).statement("ForStatement")
            }
            "for_in_statement" => {
                let stmt = if self.is_for_of(node) {
                    "ForOfStatement"
                } else {
                    "ForInStatement"
                };
                Mapped::new(NodeKind::Loop(LoopKind::ForIn), ()).statement(stmt)
            }
            "while_statement" => {
                Mapped::new(NodeKind::Loop(LoopKind::While), ()).statement("WhileStatement")
            }
            "do_statement" => {
                Mapped::new(NodeKind::Loop(LoopKind::DoWhile), ()).statement("DoWhileStatement")
            }
            "try_statement" => Mapped::new(NodeKind::Try, ()).statement("TryStatement"),
            "if_statement" => {
                Mapped::new(NodeKind::If { main_guard: false }, ()).statement("IfStatement")
            }
            "template_string" if has_child_kind(node, "template_substitution") => {
                Mapped::new(NodeKind::FormatString, ())
            }
            "number" => Mapped::new(
                NodeKind::Number(number_value(node_text(node, self.source))),
                (),
            ),
            "identifier" => Mapped::new(
                NodeKind::Name(node_text(node, self.source).to_string()),
                (),
            ),
            "return_statement" => Mapped::new(
                NodeKind::Return {
                    has_value: node.named_child_count() > 0,
                },
                (),
            )
            .statement("ReturnStatement"),
            other => {
                let mapped = Mapped::new(NodeKind::Other, ());
                match statement_name(other) {
                    Some(stmt) => mapped.statement(stmt),
                    None => mapped,
                }
            }
        };
        mapped
    }
}

impl JsMapper<'_> {
    fn function(&self, node: Node<'_>, style: FunctionStyle) -> NodeKind {
        let name = node
            .child_by_field_name("name")
            .or_else(|| {
                // `const handler = () => {}`
                node.parent()
                    .filter(|p| p.kind() == "variable_declarator")
                    .and_then(|p| p.child_by_field_name("name"))
            })
            .map(|n| node_text(n, self.source).to_string())
            .unwrap_or_else(|| "<anonymous>".to_string());

        let body_len = match node.child_by_field_name("body") {
            Some(body) if body.kind() == "statement_block" => named_children(body).len(),
            // Expression-bodied arrow
            Some(_) => 1,
            None => 0,
        };

        NodeKind::Function(FunctionInfo {
            name,
            style,
            is_async: has_child_kind(node, "async"),
            body_len,
            has_docstring: false,
        })
    }

    fn is_for_of(&self, node: Node<'_>) -> bool {
        node.child_by_field_name("operator")
            .is_some_and(|op| node_text(op, self.source) == "of")
    }
}

fn has_child_kind(node: Node<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}

fn statement_name(kind: &str) -> Option<&'static str> {
    let name = match kind {
        "expression_statement" => "ExpressionStatement",
        "lexical_declaration" | "variable_declaration" => "VariableDeclaration",
        "throw_statement" => "ThrowStatement",
        "import_statement" => "ImportDeclaration",
        "export_statement" => "ExportNamedDeclaration",
        "break_statement" => "BreakStatement",
        "continue_statement" => "ContinueStatement",
        "switch_statement" => "SwitchStatement",
        "statement_block" => "BlockStatement",
        "empty_statement" => "EmptyStatement",
        "labeled_statement" => "LabeledStatement",
        "debugger_statement" => "DebuggerStatement",
        "with_statement" => "WithStatement",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{walk, AstNode, StructureVisitor, DEFAULT_MAX_AST_DEPTH};

    fn parse_ok(source: &str) -> Ast {
        parse(source, DEFAULT_MAX_AST_DEPTH).expect("should parse")
    }

    fn functions(ast: &Ast) -> Vec<FunctionInfo> {
        let mut out = Vec::new();
        walk(ast, &mut |n: &AstNode, _: usize| {
            if let Some(info) = n.function() {
                out.push(info.clone());
            }
        });
        out
    }

    #[test]
    fn test_function_styles() {
        let source = r#"
function add(a, b) {
  return a + b;
}
const double = (x) => x * 2;
const handler = function () { console.log("hi"); };
class Greeter {
  greet(name) {
    const text = `Hello ${name}`;
    return text;
  }
}
"#;
        let funcs = functions(&parse_ok(source));
        let styles: Vec<FunctionStyle> = funcs.iter().map(|f| f.style).collect();
        assert_eq!(
            styles,
            vec![
                FunctionStyle::Declaration,
                FunctionStyle::Arrow,
                FunctionStyle::Expression,
                FunctionStyle::Method
            ]
        );
        assert_eq!(funcs[0].name, "add");
        assert_eq!(funcs[1].name, "double");
        assert_eq!(funcs[1].body_len, 1);
        assert_eq!(funcs[3].name, "greet");
        assert_eq!(funcs[3].body_len, 2);
    }

    #[test]
    fn test_structure_counts() {
        let source = r#"
async function load(urls) {
  for (const url of urls) {
    try {
      await fetch(url);
    } catch (err) {
      console.error(err);
    }
  }
  let i = 0;
  do { i++; } while (i < 3);
  while (i > 0) { i--; }
  for (let j = 0; j < 2; j++) {}
  for (const key in urls) {}
}
"#;
        let ast = parse_ok(source);
        let counts = StructureVisitor::collect(&ast);
        assert_eq!(counts.functions, 1);
        assert_eq!(counts.loops, 5);
        assert_eq!(counts.tries, 1);
        assert!(functions(&ast)[0].is_async);
    }

    #[test]
    fn test_for_of_statement_name() {
        let ast = parse_ok("for (const x of xs) { use(x); }");
        assert_eq!(ast.statements()[0], "ForOfStatement");
    }

    #[test]
    fn test_template_with_substitution_is_format_string() {
        let ast = parse_ok("const a = `plain`; const b = `v=${v}`;");
        let mut count = 0;
        walk(&ast, &mut |n: &AstNode, _: usize| {
            if n.kind == NodeKind::FormatString {
                count += 1;
            }
        });
        assert_eq!(count, 1);
    }

    #[test]
    fn test_es_module_syntax_is_accepted() {
        let ast = parse_ok("import { readFile } from 'fs';\nexport default function main() {}\n");
        assert_eq!(ast.statements()[0], "ImportDeclaration");
    }

    #[test]
    fn test_syntax_error_is_rejected() {
        let err = parse("function (", DEFAULT_MAX_AST_DEPTH).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
        assert!(parse("def f():\n    return 1\n", DEFAULT_MAX_AST_DEPTH).is_err());
    }
}
