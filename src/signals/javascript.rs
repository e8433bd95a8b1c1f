//! JavaScript signal extractors
//!
//! Almost everything here is a pattern search over the raw text, so a sample
//! that fails to parse still gets a meaningful vector. Only magic numbers and
//! function-size uniformity need the AST.

use super::common::{
    ast_has_magic_numbers, capped_score, clean_line_share, example_data, has_long_lines,
    has_trailing_whitespace, indentation_consistency, majority_share, pattern_repetition,
    quote_consistency, ratio, uniform_complexity, LineMetrics, NameStats, StructureMetrics,
    TokenMetrics,
};
use super::{ExtractionInput, Extractor};
use crate::models::{Language, SignalValue, SignalVector};
use crate::parsers::{walk, AstNode};
use regex::Regex;
use std::sync::OnceLock;

const MAX_FORMATTED_LINE: usize = 80;

const ALLOWED_SINGLE_LETTERS: &str = "ijkxy";
const MEANINGLESS_NAMES: &[&str] = &[
    "tmp", "temp", "var", "val", "res", "ret", "obj", "item", "data", "arr",
];

/// Line endings that never take a semicolon
const UNTERMINATED_ENDINGS: &[&str] = &["{", "}", ",", "//", "/*", "*/"];
const COMMENT_STARTS: &[&str] = &["//", "/*", "*"];

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid regex"))
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            cached(&RE, $re)
        }
    };
}

// Syntax idioms
pattern!(arrow, r"=>");
pattern!(async_await, r"\basync\s+|await\s+");
pattern!(destructuring, r"const\s*\{[^}]+\}\s*=|const\s*\[[^\]]+\]\s*=");
pattern!(interpolated_template, r"`[^`]*\$\{[^}]+\}[^`]*`");
pattern!(spread, r"\.\.\.");
pattern!(optional_chaining, r"\?\.");
pattern!(iife, r"\(\s*function\s*\([^)]*\)\s*\{[^}]+\}\s*\)\s*\(");
pattern!(import_export, r"(?m)^\s*(import|export)\s+");
pattern!(strict_mode, r#"["']use strict["']"#);
pattern!(named_function, r"function\s+\w+\s*\(");
pattern!(anonymous_function, r"function\s*\(");

// Names and structure
pattern!(declared_name, r"(?:var|let|const|function)\s+([a-zA-Z_$][a-zA-Z0-9_$]*)");
pattern!(any_template, r"`[^`]*`");
pattern!(structure_keyword, r"\b(if|for|while|function|const|let|var|return|class)\b");

// Smells
pattern!(console_call, r"console\.(log|debug|warn|error)");
pattern!(debugger_statement, r"\bdebugger\s*;");
pattern!(todo_comment, r"(?i)//\s*(TODO|FIXME|HACK|XXX|BUG)");
pattern!(commented_code, r"//\s*(if|for|while|function|const|let|var|return)\s");
pattern!(alert_call, r"\balert\s*\(");
pattern!(eval_call, r"\beval\s*\(");
pattern!(var_declaration, r"\bvar\s+");
pattern!(
    magic_string,
    r#"(?:===?|!==?)\s*(?:"[^"\n]*"|'[^'\n]*')|(?:"[^"\n]*"|'[^'\n]*')\s*(?:===?|!==?)"#
);
pattern!(
    nested_callback,
    r"function\s*\([^)]*\)\s*\{[^}]*function\s*\([^)]*\)\s*\{"
);

// Generated-code vocabulary
pattern!(
    generic_words,
    r"(?i)\b(foo|bar|baz|example|test|sample|demo|myFunction|myVariable)\b"
);
pattern!(placeholders, r"(?i)(Your|TODO:|FIXME:|INSERT|REPLACE|your-|my-)");

// Ecosystem
pattern!(jquery, r"\$\s*\(|jQuery\s*\(");
pattern!(react, r"(useState|useEffect|React\.|jsx|className=)");
pattern!(node, r"(require\s*\(|module\.exports|process\.|__dirname|__filename)");
pattern!(
    typescript,
    r"(@param\s*\{|@returns\s*\{|: string|: number|: boolean|interface\s+\w+)"
);
pattern!(package_json, r"package\.json");
pattern!(commonjs, r"module\.exports|exports\.");
pattern!(es_module, r"export\s+(default|const|function|class)|import\s+.*\s+from");

/// Extractor set of the JavaScript pipeline
pub fn default_extractors() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(TokenMetrics),
        Box::new(LineMetrics),
        Box::new(StructureMetrics::new(Language::JavaScript)),
        Box::new(StructuralPatterns),
        Box::new(NamingPatterns),
        Box::new(ConsistencyMetrics),
        Box::new(CodeSmells),
        Box::new(AiPatterns),
        Box::new(EcosystemPatterns),
        Box::new(AstMetrics),
    ]
}

fn bool_defaults(keys: &[&'static str]) -> SignalVector {
    keys.iter()
        .map(|&k| (k, SignalValue::Bool(false)))
        .collect()
}

pub struct StructuralPatterns;

impl Extractor for StructuralPatterns {
    fn name(&self) -> &'static str {
        "javascript-structure"
    }

    fn defaults(&self) -> SignalVector {
        let mut signals = bool_defaults(&[
            "uses_arrow_functions",
            "uses_async_await",
            "uses_destructuring",
            "uses_template_literals",
            "uses_spread_operator",
            "uses_optional_chaining",
            "has_iife",
            "import_export_usage",
            "uses_strict_mode",
        ]);
        signals.insert("function_style_consistency", 0.0);
        signals
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let text = input.text();
        let mut signals = SignalVector::new();
        signals.insert("uses_arrow_functions", arrow().is_match(text));
        signals.insert("uses_async_await", async_await().is_match(text));
        signals.insert("uses_destructuring", destructuring().is_match(text));
        signals.insert("uses_template_literals", interpolated_template().is_match(text));
        signals.insert("uses_spread_operator", spread().is_match(text));
        signals.insert("uses_optional_chaining", optional_chaining().is_match(text));
        signals.insert("has_iife", iife().is_match(text));
        signals.insert("import_export_usage", import_export().is_match(text));
        signals.insert("uses_strict_mode", strict_mode().is_match(text));
        signals.insert("function_style_consistency", function_style_consistency(text));
        signals
    }
}

/// Dominant share among named `function f(`, anonymous `function (` and
/// arrow `=>` occurrences
fn function_style_consistency(text: &str) -> f64 {
    let named = named_function().find_iter(text).count();
    let anonymous = anonymous_function().find_iter(text).count();
    let arrows = arrow().find_iter(text).count();
    majority_share(&[named, anonymous, arrows])
}

/// Naming over names introduced by `var`, `let`, `const` and `function`
pub struct NamingPatterns;

impl NamingPatterns {
    fn signals(stats: NameStats, dollar: bool, underscore: bool) -> SignalVector {
        let mut signals = SignalVector::new();
        signals.insert("uses_camelCase_ratio", stats.camel_case_ratio);
        signals.insert("uses_snake_case_ratio", stats.snake_case_ratio);
        signals.insert("meaningful_name_ratio", stats.meaningful_ratio);
        signals.insert("single_letter_var_ratio", stats.single_letter_ratio);
        signals.insert("avg_name_length", stats.avg_length);
        signals.insert("uses_dollar_sign", dollar);
        signals.insert("uses_underscore_prefix", underscore);
        signals
    }
}

impl Extractor for NamingPatterns {
    fn name(&self) -> &'static str {
        "javascript-naming"
    }

    fn defaults(&self) -> SignalVector {
        Self::signals(NameStats::default(), false, false)
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let names: Vec<&str> = declared_name()
            .captures_iter(input.text())
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect();
        let stats = NameStats::compute(&names, ALLOWED_SINGLE_LETTERS, MEANINGLESS_NAMES);
        Self::signals(
            stats,
            names.iter().any(|n| n.contains('$')),
            names.iter().any(|n| n.starts_with('_')),
        )
    }
}

pub struct ConsistencyMetrics;

impl Extractor for ConsistencyMetrics {
    fn name(&self) -> &'static str {
        "javascript-consistency"
    }

    fn defaults(&self) -> SignalVector {
        [
            ("semicolon_consistency", SignalValue::Float(0.0)),
            ("quote_consistency", SignalValue::Float(0.0)),
            ("indentation_consistency", SignalValue::Float(0.0)),
            ("bracket_style_consistency", SignalValue::Float(0.0)),
            ("pattern_repetition_score", SignalValue::Float(0.0)),
            ("template_literal_count", SignalValue::Int(0)),
        ]
        .into_iter()
        .collect()
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let text = input.text();
        let lines = input.lines();
        let keywords: Vec<&str> = lines
            .iter()
            .flat_map(|l| structure_keyword().find_iter(l).map(|m| m.as_str()))
            .collect();

        let mut signals = SignalVector::new();
        signals.insert("semicolon_consistency", semicolon_consistency(lines));
        signals.insert("quote_consistency", quote_consistency(text));
        signals.insert("indentation_consistency", indentation_consistency(lines));
        signals.insert("bracket_style_consistency", bracket_style_consistency(lines));
        signals.insert("pattern_repetition_score", pattern_repetition(&keywords));
        signals.insert("template_literal_count", any_template().find_iter(text).count());
        signals
    }
}

/// Majority share of terminated vs unterminated lines among lines that could
/// take a semicolon
fn semicolon_consistency(lines: &[&str]) -> f64 {
    let eligible: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .filter(|l| !UNTERMINATED_ENDINGS.iter().any(|e| l.ends_with(e)))
        .filter(|l| !COMMENT_STARTS.iter().any(|s| l.starts_with(s)))
        .collect();
    let terminated = eligible.iter().filter(|l| l.ends_with(';')).count();
    majority_share(&[terminated, eligible.len() - terminated])
}

/// Majority share of same-line (`if (x) {`) vs own-line (`{`) opening braces
fn bracket_style_consistency(lines: &[&str]) -> f64 {
    let mut same_line = 0;
    let mut own_line = 0;
    for line in lines {
        let trimmed = line.trim();
        if trimmed == "{" {
            own_line += 1;
        } else if trimmed.ends_with('{') {
            same_line += 1;
        }
    }
    majority_share(&[same_line, own_line])
}

pub struct CodeSmells;

impl Extractor for CodeSmells {
    fn name(&self) -> &'static str {
        "javascript-smells"
    }

    fn defaults(&self) -> SignalVector {
        bool_defaults(&[
            "has_console_log",
            "has_debugger",
            "has_todo_comments",
            "has_commented_code",
            "has_alert",
            "has_eval",
            "has_var_declarations",
            "has_magic_strings",
            "has_long_lines",
            "has_trailing_whitespace",
            "has_callback_hell",
        ])
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let text = input.text();
        let lines = input.lines();
        let mut signals = SignalVector::new();
        signals.insert("has_console_log", console_call().is_match(text));
        signals.insert("has_debugger", debugger_statement().is_match(text));
        signals.insert("has_todo_comments", todo_comment().is_match(text));
        signals.insert("has_commented_code", commented_code().is_match(text));
        signals.insert("has_alert", alert_call().is_match(text));
        signals.insert("has_eval", eval_call().is_match(text));
        signals.insert("has_var_declarations", var_declaration().is_match(text));
        signals.insert("has_magic_strings", magic_string().is_match(text));
        signals.insert("has_long_lines", has_long_lines(lines));
        signals.insert("has_trailing_whitespace", has_trailing_whitespace(lines));
        signals.insert("has_callback_hell", nested_callback().is_match(text));
        signals
    }
}

pub struct AiPatterns;

impl Extractor for AiPatterns {
    fn name(&self) -> &'static str {
        "javascript-ai-patterns"
    }

    fn defaults(&self) -> SignalVector {
        [
            ("perfect_formatting_score", SignalValue::Float(0.0)),
            ("generic_example_score", SignalValue::Float(0.0)),
            ("placeholder_score", SignalValue::Float(0.0)),
            ("has_example_data", SignalValue::Bool(false)),
            ("excessive_comments_ratio", SignalValue::Float(0.0)),
        ]
        .into_iter()
        .collect()
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let text = input.text();
        let lines = input.lines();
        let comment_lines = lines
            .iter()
            .filter(|l| l.trim_start().starts_with("//"))
            .count();

        let mut signals = SignalVector::new();
        signals.insert(
            "perfect_formatting_score",
            clean_line_share(lines, MAX_FORMATTED_LINE, |l| l.trim_end() == l),
        );
        signals.insert(
            "generic_example_score",
            capped_score(generic_words().find_iter(text).count(), lines.len()),
        );
        signals.insert(
            "placeholder_score",
            capped_score(placeholders().find_iter(text).count(), 10),
        );
        signals.insert("has_example_data", example_data().is_match(text));
        signals.insert("excessive_comments_ratio", ratio(comment_lines, lines.len()));
        signals
    }
}

/// Library and module-system fingerprints
pub struct EcosystemPatterns;

impl EcosystemPatterns {
    fn module_pattern(text: &str) -> &'static str {
        if commonjs().is_match(text) {
            "commonjs"
        } else if es_module().is_match(text) {
            "es6"
        } else {
            "none"
        }
    }
}

impl Extractor for EcosystemPatterns {
    fn name(&self) -> &'static str {
        "javascript-ecosystem"
    }

    fn defaults(&self) -> SignalVector {
        let mut signals = bool_defaults(&[
            "uses_jquery",
            "uses_react_patterns",
            "uses_node_patterns",
            "uses_typescript_patterns",
            "has_package_json_refs",
        ]);
        signals.insert("module_pattern", "none");
        signals
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let text = input.text();
        let mut signals = SignalVector::new();
        signals.insert("uses_jquery", jquery().is_match(text));
        signals.insert("uses_react_patterns", react().is_match(text));
        signals.insert("uses_node_patterns", node().is_match(text));
        signals.insert("uses_typescript_patterns", typescript().is_match(text));
        signals.insert("has_package_json_refs", package_json().is_match(text));
        signals.insert("module_pattern", Self::module_pattern(text));
        signals
    }
}

/// Numeric literals and function sizes, from the AST
pub struct AstMetrics;

impl Extractor for AstMetrics {
    fn name(&self) -> &'static str {
        "javascript-ast"
    }

    fn defaults(&self) -> SignalVector {
        [
            ("has_magic_numbers", SignalValue::Bool(false)),
            ("uniform_complexity", SignalValue::Float(0.0)),
        ]
        .into_iter()
        .collect()
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let Some(ast) = input.ast else {
            return self.defaults();
        };
        let mut lengths = Vec::new();
        walk(ast, &mut |node: &AstNode, _: usize| {
            if let Some(info) = node.function() {
                lengths.push(info.body_len);
            }
        });

        let mut signals = SignalVector::new();
        signals.insert("has_magic_numbers", ast_has_magic_numbers(input));
        signals.insert("uniform_complexity", uniform_complexity(&lengths));
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;
    use crate::parsers::{self, DEFAULT_MAX_AST_DEPTH};
    use crate::signals::{Pipeline, SourceSample};

    fn extract(source: &str) -> SignalVector {
        let sample = SourceSample::new(source);
        let tokens = lexer::tokenize(source, Language::JavaScript).unwrap_or_default();
        let ast = parsers::parse(source, Language::JavaScript, DEFAULT_MAX_AST_DEPTH).ok();
        let input = ExtractionInput {
            language: Language::JavaScript,
            sample: &sample,
            tokens: &tokens,
            ast: ast.as_ref(),
        };
        Pipeline::for_language(Language::JavaScript).run(&input)
    }

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("signal present");
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn test_modern_syntax_idioms() {
        let source = r#"'use strict';
import { load } from './load.js';

const { id, ...rest } = await load(user?.id);
const label = `user ${id}`;
const run = async () => [...rest];
"#;
        let signals = extract(source);
        for key in [
            "uses_strict_mode",
            "import_export_usage",
            "uses_destructuring",
            "uses_spread_operator",
            "uses_optional_chaining",
            "uses_template_literals",
            "uses_async_await",
            "uses_arrow_functions",
        ] {
            assert_eq!(signals.flag(key), Some(true), "{key}");
        }
        assert_eq!(signals.flag("has_iife"), Some(false));
        assert_eq!(signals.get("module_pattern"), Some(&SignalValue::Label("es6")));
    }

    #[test]
    fn test_function_style_consistency() {
        approx(Some(function_style_consistency("")), 0.0);
        let mixed = "function a() {}\nfunction b() {}\nconst c = () => 1;\n";
        approx(Some(function_style_consistency(mixed)), 2.0 / 3.0);
        let anonymous = "setTimeout(function () {}, 0);\nlist.map(function (x) { return x; });";
        approx(Some(function_style_consistency(anonymous)), 1.0);
    }

    #[test]
    fn test_naming_patterns() {
        let source = "const userName = 1;\nlet x = 2;\nvar q = 3;\nfunction get_data() {}\n";
        let signals = extract(source);
        approx(signals.number("uses_camelCase_ratio"), 0.75);
        approx(signals.number("uses_snake_case_ratio"), 0.75);
        approx(signals.number("single_letter_var_ratio"), 0.25);
        approx(signals.number("meaningful_name_ratio"), 0.5);
        approx(signals.number("avg_name_length"), 4.5);
        assert_eq!(signals.flag("uses_dollar_sign"), Some(false));

        let special = extract("const $el = $('#app');\nlet _cache = {};\n");
        assert_eq!(special.flag("uses_dollar_sign"), Some(true));
        assert_eq!(special.flag("uses_underscore_prefix"), Some(true));
        assert_eq!(special.flag("uses_jquery"), Some(true));
    }

    #[test]
    fn test_semicolon_consistency() {
        let lines = ["const a = 1;", "const b = 2", "const c = 3;", "if (a) {", "}", "// note"];
        approx(Some(semicolon_consistency(&lines)), 2.0 / 3.0);
        approx(Some(semicolon_consistency(&["{", "}"])), 0.0);
    }

    #[test]
    fn test_bracket_style_consistency() {
        let lines = ["function f()", "{", "  if (x) {", "  }", "}"];
        approx(Some(bracket_style_consistency(&lines)), 0.5);
        approx(Some(bracket_style_consistency(&["if (x) {", "while (y) {"])), 1.0);
    }

    #[test]
    fn test_code_smells() {
        let source = r#"// TODO: remove
// return early
var answer = 42;
console.log(answer);
debugger;
if (mode === "legacy") { alert(eval("1 + 1")); }
"#;
        let signals = extract(source);
        for key in [
            "has_todo_comments",
            "has_commented_code",
            "has_var_declarations",
            "has_console_log",
            "has_debugger",
            "has_magic_strings",
            "has_alert",
            "has_eval",
            "has_magic_numbers",
        ] {
            assert_eq!(signals.flag(key), Some(true), "{key}");
        }
        assert_eq!(signals.flag("has_callback_hell"), Some(false));
    }

    #[test]
    fn test_callback_hell() {
        let source = "load(function (a) { parse(a, function (b) { save(b); }); });";
        assert_eq!(extract(source).flag("has_callback_hell"), Some(true));
    }

    #[test]
    fn test_ai_patterns() {
        let source = "// Example user\nconst user = { name: 'John Doe' };\n";
        let signals = extract(source);
        assert_eq!(signals.flag("has_example_data"), Some(true));
        approx(signals.number("excessive_comments_ratio"), 0.5);
        approx(signals.number("generic_example_score"), 0.5);
        approx(signals.number("perfect_formatting_score"), 1.0);
    }

    #[test]
    fn test_module_pattern_prefers_commonjs() {
        let source = "import fs from 'fs';\nmodule.exports = { fs };\n";
        let signals = extract(source);
        assert_eq!(signals.get("module_pattern"), Some(&SignalValue::Label("commonjs")));
        assert_eq!(signals.flag("uses_node_patterns"), Some(true));
        assert_eq!(
            extract("const a = 1;").get("module_pattern"),
            Some(&SignalValue::Label("none"))
        );
    }

    #[test]
    fn test_template_literal_count() {
        let signals = extract("const a = `x`;\nconst b = `y ${a}`;\n");
        assert_eq!(signals.number("template_literal_count"), Some(2.0));
    }

    #[test]
    fn test_keyword_repetition() {
        let repetitive = "const a = 1;\nconst b = 2;\nconst c = 3;\nconst d = 4;\nconst e = 5;\n";
        approx(extract(repetitive).number("pattern_repetition_score"), 1.0);
        approx(extract("const a = 1;").number("pattern_repetition_score"), 0.0);
    }

    #[test]
    fn test_uniform_complexity_from_ast() {
        let source = "function a() { f(); g(); }\nfunction b() { f(); g(); }\n";
        approx(extract(source).number("uniform_complexity"), 1.0);
        approx(extract("function (").number("uniform_complexity"), 0.0);
    }
}
