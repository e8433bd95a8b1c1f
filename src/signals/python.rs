//! Python signal extractors
//!
//! Names, literals and statement shapes come from the AST. Comment markers,
//! layout and placeholder vocabulary come from the raw text and survive a
//! failed parse.

use super::common::{
    ast_has_magic_numbers, capped_score, clean_line_share, example_data, has_long_lines,
    has_trailing_whitespace, indentation_consistency, majority_share, pattern_repetition,
    quote_consistency, std_dev, uniform_complexity, LineMetrics, NameStats, StructureMetrics,
    TokenMetrics,
};
use super::{ExtractionInput, Extractor};
use crate::models::{Language, SignalValue, SignalVector};
use crate::parsers::{walk, Ast, AstNode, FunctionInfo, FunctionStyle, NodeKind};
use regex::Regex;
use std::sync::OnceLock;

/// PEP 8 maximum line length
const PEP8_MAX_LINE: usize = 79;

/// Reference comment length for over-explanation
const COMMENT_REFERENCE_LEN: f64 = 80.0;

const ALLOWED_SINGLE_LETTERS: &str = "ijkxyz";
const MEANINGLESS_NAMES: &[&str] = &["tmp", "temp", "var", "val", "res", "ret", "obj", "item"];

static GENERIC_WORDS: OnceLock<Regex> = OnceLock::new();
static PLACEHOLDERS: OnceLock<Regex> = OnceLock::new();
static TODO_COMMENT: OnceLock<Regex> = OnceLock::new();
static DEBUG_PRINT: OnceLock<Regex> = OnceLock::new();
static COMMENTED_CODE: OnceLock<Regex> = OnceLock::new();
static DYNAMIC_EVAL: OnceLock<Regex> = OnceLock::new();

fn generic_words() -> &'static Regex {
    GENERIC_WORDS.get_or_init(|| {
        Regex::new(r"(?i)\b(foo|bar|baz|example|test|sample|demo)\b").expect("valid regex")
    })
}

fn placeholders() -> &'static Regex {
    PLACEHOLDERS.get_or_init(|| {
        Regex::new(r"(?i)(Your|TODO:|FIXME:|INSERT|REPLACE|your_|my_|some_)").expect("valid regex")
    })
}

fn todo_comment() -> &'static Regex {
    TODO_COMMENT.get_or_init(|| {
        Regex::new(r"(?i)#\s*(TODO|FIXME|HACK|XXX|BUG|REFACTOR)").expect("valid regex")
    })
}

fn debug_print() -> &'static Regex {
    DEBUG_PRINT.get_or_init(|| {
        Regex::new(r#"print\s*\(["']debug|console\.log|debugger"#).expect("valid regex")
    })
}

fn commented_code() -> &'static Regex {
    COMMENTED_CODE.get_or_init(|| {
        Regex::new(r"#\s*(if|for|while|def|class|import|return)\s").expect("valid regex")
    })
}

fn dynamic_eval() -> &'static Regex {
    DYNAMIC_EVAL.get_or_init(|| Regex::new(r"\b(eval|exec)\s*\(").expect("valid regex"))
}

/// Extractor set of the Python pipeline
pub fn default_extractors() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(TokenMetrics),
        Box::new(LineMetrics),
        Box::new(StructureMetrics::new(Language::Python)),
        Box::new(StructuralPatterns),
        Box::new(NamingPatterns),
        Box::new(ConsistencyMetrics),
        Box::new(StatementRepetition),
        Box::new(CodeSmells),
        Box::new(LiteralSmells),
        Box::new(AiPatterns),
    ]
}

/// Plain `def` functions (not `async def`, not lambdas)
fn plain_defs(ast: &Ast) -> Vec<FunctionInfo> {
    let mut defs = Vec::new();
    walk(ast, &mut |node: &AstNode, _: usize| {
        if let Some(info) = node.function() {
            if info.style == FunctionStyle::Declaration && !info.is_async {
                defs.push(info.clone());
            }
        }
    });
    defs
}

fn is_def(node: &AstNode) -> bool {
    node.function()
        .is_some_and(|f| f.style != FunctionStyle::Lambda)
}

/// Deepest number of `def`s enclosing another `def`
fn max_def_nesting(node: &AstNode, enclosing: usize) -> usize {
    let (inner, mut best) = if is_def(node) {
        (enclosing + 1, enclosing)
    } else {
        (enclosing, 0)
    };
    for child in &node.children {
        best = best.max(max_def_nesting(child, inner));
    }
    best
}

/// (value returns, bare returns) of a function body, nested functions excluded
fn own_returns(node: &AstNode, acc: &mut (usize, usize)) {
    for child in &node.children {
        match child.kind {
            NodeKind::Function(_) => continue,
            NodeKind::Return { has_value: true } => acc.0 += 1,
            NodeKind::Return { has_value: false } => acc.1 += 1,
            _ => {}
        }
        own_returns(child, acc);
    }
}

/// Idioms and function shape (`has_main_guard`, docstrings, comprehensions,
/// walrus, f-strings, function size distribution)
pub struct StructuralPatterns;

impl StructuralPatterns {
    fn signals(ast: Option<&Ast>) -> SignalVector {
        let mut main_guard = false;
        let mut comprehensions = false;
        let mut walrus = false;
        let mut f_strings = 0usize;
        let mut defs = Vec::new();
        let mut nesting = 0;

        if let Some(ast) = ast {
            walk(ast, &mut |node: &AstNode, _: usize| match node.kind {
                NodeKind::If { main_guard: true } => main_guard = true,
                NodeKind::Comprehension => comprehensions = true,
                NodeKind::NamedExpr => walrus = true,
                NodeKind::FormatString => f_strings += 1,
                _ => {}
            });
            defs = plain_defs(ast);
            nesting = max_def_nesting(&ast.root, 0);
        }

        let lengths: Vec<usize> = defs.iter().map(|f| f.body_len).collect();
        let as_f64: Vec<f64> = lengths.iter().map(|&n| n as f64).collect();

        let mut signals = SignalVector::new();
        signals.insert("has_main_guard", main_guard);
        signals.insert("has_docstrings", defs.iter().any(|f| f.has_docstring));
        signals.insert("function_length_variance", std_dev(&as_f64));
        signals.insert("nested_function_depth", nesting);
        signals.insert("uses_comprehensions", comprehensions);
        signals.insert("uses_walrus_operator", walrus);
        signals.insert("uses_f_strings", f_strings > 0);
        signals.insert("f_string_count", f_strings);
        signals.insert("uniform_complexity", uniform_complexity(&lengths));
        signals
    }
}

impl Extractor for StructuralPatterns {
    fn name(&self) -> &'static str {
        "python-structure"
    }

    fn defaults(&self) -> SignalVector {
        Self::signals(None)
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        Self::signals(input.ast)
    }
}

/// Identifier naming over `Name` nodes plus `def` and `class` names
pub struct NamingPatterns;

impl NamingPatterns {
    fn signals(stats: NameStats, underscore: bool) -> SignalVector {
        let mut signals = SignalVector::new();
        signals.insert("naming_consistency_score", stats.naming_consistency);
        signals.insert("uses_snake_case_ratio", stats.snake_case_ratio);
        signals.insert("meaningful_name_ratio", stats.meaningful_ratio);
        signals.insert("single_letter_var_ratio", stats.single_letter_ratio);
        signals.insert("avg_name_length", stats.avg_length);
        signals.insert("uses_underscore_prefix", underscore);
        signals
    }
}

impl Extractor for NamingPatterns {
    fn name(&self) -> &'static str {
        "python-naming"
    }

    fn defaults(&self) -> SignalVector {
        Self::signals(NameStats::default(), false)
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let Some(ast) = input.ast else {
            return self.defaults();
        };
        let mut names: Vec<String> = Vec::new();
        walk(ast, &mut |node: &AstNode, _: usize| match &node.kind {
            NodeKind::Name(name) | NodeKind::Class { name } => names.push(name.clone()),
            NodeKind::Function(info)
                if info.style == FunctionStyle::Declaration && !info.is_async =>
            {
                names.push(info.name.clone())
            }
            _ => {}
        });
        let underscore = names.iter().any(|n| n.starts_with('_'));
        Self::signals(
            NameStats::compute(&names, ALLOWED_SINGLE_LETTERS, MEANINGLESS_NAMES),
            underscore,
        )
    }
}

/// Layout consistency measured on the raw text
pub struct ConsistencyMetrics;

impl Extractor for ConsistencyMetrics {
    fn name(&self) -> &'static str {
        "python-consistency"
    }

    fn defaults(&self) -> SignalVector {
        [
            ("indentation_consistency", SignalValue::Float(0.0)),
            ("quote_consistency", SignalValue::Float(0.0)),
            ("spacing_consistency", SignalValue::Float(0.0)),
            ("import_organization_score", SignalValue::Float(0.0)),
        ]
        .into_iter()
        .collect()
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let lines = input.lines();
        let (spaced, unspaced) = operator_spacing(lines);

        let mut signals = SignalVector::new();
        signals.insert("indentation_consistency", indentation_consistency(lines));
        signals.insert("quote_consistency", quote_consistency(input.text()));
        signals.insert("spacing_consistency", majority_share(&[spaced, unspaced]));
        signals.insert("import_organization_score", import_organization(lines));
        signals
    }
}

/// Share of contiguous import groups whose lines are sorted.
/// 0 with fewer than two imports.
fn import_organization(lines: &[&str]) -> f64 {
    let imports: Vec<(usize, &str)> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| (i, l.trim()))
        .filter(|(_, l)| l.starts_with("import ") || l.starts_with("from "))
        .collect();
    if imports.len() < 2 {
        return 0.0;
    }

    let mut groups: Vec<Vec<&str>> = Vec::new();
    let mut prev_index: Option<usize> = None;
    for (index, line) in imports {
        match (groups.last_mut(), prev_index) {
            (Some(group), Some(prev)) if index == prev + 1 => group.push(line),
            _ => groups.push(vec![line]),
        }
        prev_index = Some(index);
    }

    let sorted = groups
        .iter()
        .filter(|g| g.windows(2).all(|w| w[0] <= w[1]))
        .count();
    sorted as f64 / groups.len() as f64
}

/// Counts of (spaced, unspaced) `=` and `==` operators outside strings,
/// comments and keyword arguments
fn operator_spacing(lines: &[&str]) -> (usize, usize) {
    let mut spaced = 0;
    let mut unspaced = 0;

    for line in lines {
        let chars: Vec<char> = line.chars().collect();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if let Some(q) = quote {
                if c == '\\' {
                    i += 1;
                } else if c == q {
                    quote = None;
                }
                i += 1;
                continue;
            }
            match c {
                '#' => break,
                '\'' | '"' => quote = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                '=' => {
                    let prev = i.checked_sub(1).map(|p| chars[p]);
                    let is_compound = prev.is_some_and(|p| "=!<>:+-*/%&|^@~".contains(p));
                    let width = if chars.get(i + 1) == Some(&'=') { 2 } else { 1 };
                    let keyword_arg = width == 1 && depth > 0;
                    if !is_compound && !keyword_arg {
                        let before = prev.is_some_and(char::is_whitespace);
                        let after = chars.get(i + width).is_some_and(|c| c.is_whitespace());
                        if before && after {
                            spaced += 1;
                        } else {
                            unspaced += 1;
                        }
                    }
                    i += width;
                    continue;
                }
                _ => {}
            }
            i += 1;
        }
    }
    (spaced, unspaced)
}

/// Repetition of statement-type triples, in breadth-first order
pub struct StatementRepetition;

impl Extractor for StatementRepetition {
    fn name(&self) -> &'static str {
        "python-repetition"
    }

    fn defaults(&self) -> SignalVector {
        [("pattern_repetition_score", SignalValue::Float(0.0))]
            .into_iter()
            .collect()
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let score = input
            .ast
            .map(|ast| pattern_repetition(&ast.statements()))
            .unwrap_or(0.0);
        let mut signals = SignalVector::new();
        signals.insert("pattern_repetition_score", score);
        signals
    }
}

/// Leftovers of human editing found in the text
pub struct CodeSmells;

impl Extractor for CodeSmells {
    fn name(&self) -> &'static str {
        "python-smells"
    }

    fn defaults(&self) -> SignalVector {
        [
            "has_todo_comments",
            "has_debug_prints",
            "has_commented_code",
            "has_eval",
            "has_long_lines",
            "has_trailing_whitespace",
        ]
        .into_iter()
        .map(|k| (k, SignalValue::Bool(false)))
        .collect()
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let text = input.text();
        let lines = input.lines();
        let mut signals = SignalVector::new();
        signals.insert("has_todo_comments", todo_comment().is_match(text));
        signals.insert("has_debug_prints", debug_print().is_match(text));
        signals.insert("has_commented_code", commented_code().is_match(text));
        signals.insert("has_eval", dynamic_eval().is_match(text));
        signals.insert("has_long_lines", has_long_lines(lines));
        signals.insert("has_trailing_whitespace", has_trailing_whitespace(lines));
        signals
    }
}

/// Magic numbers and mixed return styles, from the AST
pub struct LiteralSmells;

impl Extractor for LiteralSmells {
    fn name(&self) -> &'static str {
        "python-literal-smells"
    }

    fn defaults(&self) -> SignalVector {
        [
            ("has_magic_numbers", SignalValue::Bool(false)),
            ("inconsistent_returns", SignalValue::Bool(false)),
        ]
        .into_iter()
        .collect()
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let Some(ast) = input.ast else {
            return self.defaults();
        };

        let mut inconsistent = false;
        walk(ast, &mut |node: &AstNode, _: usize| {
            if is_def(node) {
                let mut returns = (0, 0);
                own_returns(node, &mut returns);
                inconsistent |= returns.0 > 0 && returns.1 > 0;
            }
        });

        let mut signals = SignalVector::new();
        signals.insert("has_magic_numbers", ast_has_magic_numbers(input));
        signals.insert("inconsistent_returns", inconsistent);
        signals
    }
}

/// Vocabulary and polish typical of generated code
pub struct AiPatterns;

impl Extractor for AiPatterns {
    fn name(&self) -> &'static str {
        "python-ai-patterns"
    }

    fn defaults(&self) -> SignalVector {
        let mut signals: SignalVector = [
            "perfect_pep8_score",
            "generic_example_score",
            "over_explanation_score",
            "placeholder_score",
        ]
        .into_iter()
        .map(|k| (k, SignalValue::Float(0.0)))
        .collect();
        signals.insert("has_example_data", false);
        signals
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let text = input.text();
        let lines = input.lines();

        let pep8 = clean_line_share(lines, PEP8_MAX_LINE, |l| {
            l.trim_end() == l && !l.starts_with('\t')
        });

        let comment_lines: Vec<&&str> = lines
            .iter()
            .filter(|l| l.trim_start().starts_with('#'))
            .collect();
        let over_explanation = if comment_lines.is_empty() {
            0.0
        } else {
            let total: usize = comment_lines.iter().map(|l| l.chars().count()).sum();
            let avg = total as f64 / comment_lines.len() as f64;
            (avg / COMMENT_REFERENCE_LEN).min(1.0)
        };

        let mut signals = SignalVector::new();
        signals.insert("perfect_pep8_score", pep8);
        signals.insert(
            "generic_example_score",
            capped_score(generic_words().find_iter(text).count(), lines.len()),
        );
        signals.insert("over_explanation_score", over_explanation);
        signals.insert(
            "placeholder_score",
            capped_score(placeholders().find_iter(text).count(), 10),
        );
        signals.insert("has_example_data", example_data().is_match(text));
        signals
    }
}
