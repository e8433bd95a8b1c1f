//! Signals and text metrics shared by both languages

use super::{ExtractionInput, Extractor};
use crate::lexer::TokenFrequency;
use crate::models::{Language, SignalValue, SignalVector};
use crate::parsers::{walk, AstNode, NodeKind, StructureVisitor};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Numeric literals that are never "magic"
pub const ACCEPTABLE_NUMBERS: [f64; 7] = [0.0, 1.0, 2.0, -1.0, 10.0, 100.0, 1000.0];

/// Lines longer than this are "long"
pub const LONG_LINE_CHARS: usize = 100;

static SINGLE_QUOTED: OnceLock<Regex> = OnceLock::new();
static DOUBLE_QUOTED: OnceLock<Regex> = OnceLock::new();
static SNAKE_CASE: OnceLock<Regex> = OnceLock::new();
static CAMEL_CASE: OnceLock<Regex> = OnceLock::new();
static JS_LINE_COMMENT: OnceLock<Regex> = OnceLock::new();
static JS_BLOCK_COMMENT: OnceLock<Regex> = OnceLock::new();
static EXAMPLE_DATA: OnceLock<Regex> = OnceLock::new();

fn single_quoted() -> &'static Regex {
    SINGLE_QUOTED.get_or_init(|| Regex::new(r"'[^']*'").expect("valid regex"))
}

fn double_quoted() -> &'static Regex {
    DOUBLE_QUOTED.get_or_init(|| Regex::new(r#""[^"]*""#).expect("valid regex"))
}

pub(crate) fn snake_case() -> &'static Regex {
    SNAKE_CASE.get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("valid regex"))
}

/// Lower-camel names with at least one hump
fn camel_case() -> &'static Regex {
    CAMEL_CASE.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9]*[A-Z][a-zA-Z0-9]*$").expect("valid regex")
    })
}

fn js_line_comment() -> &'static Regex {
    JS_LINE_COMMENT.get_or_init(|| Regex::new(r"//.*").expect("valid regex"))
}

fn js_block_comment() -> &'static Regex {
    JS_BLOCK_COMMENT.get_or_init(|| Regex::new(r"/\*[\s\S]*?\*/").expect("valid regex"))
}

/// Canonical filler data: placeholder people, emails, addresses, lorem ipsum
pub(crate) fn example_data() -> &'static Regex {
    EXAMPLE_DATA.get_or_init(|| {
        Regex::new(r"(John Doe|jane@example\.com|Lorem ipsum|example\.com|123 Main St)")
            .expect("valid regex")
    })
}

/// Token entropy
pub struct TokenMetrics;

impl Extractor for TokenMetrics {
    fn name(&self) -> &'static str {
        "token-metrics"
    }

    fn defaults(&self) -> SignalVector {
        [("token_entropy", SignalValue::Float(0.0))].into_iter().collect()
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let frequency = TokenFrequency::from_tokens(input.tokens);
        debug!(
            "{} tokens, {} distinct",
            frequency.total(),
            frequency.distinct()
        );
        let mut signals = SignalVector::new();
        signals.insert("token_entropy", frequency.entropy());
        signals
    }
}

/// Line count and comment density
pub struct LineMetrics;

impl Extractor for LineMetrics {
    fn name(&self) -> &'static str {
        "line-metrics"
    }

    fn defaults(&self) -> SignalVector {
        [
            ("comment_ratio", SignalValue::Float(0.0)),
            ("total_lines", SignalValue::Int(0)),
        ]
        .into_iter()
        .collect()
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let total = input.lines().len();
        let comments = match input.language {
            Language::Python => input
                .lines()
                .iter()
                .filter(|l| l.trim_start().starts_with('#'))
                .count(),
            Language::JavaScript => js_comment_lines(input.text()),
        };

        let mut signals = SignalVector::new();
        signals.insert("comment_ratio", ratio(comments, total).min(1.0));
        signals.insert("total_lines", total);
        signals
    }
}

/// `//` comments plus every line spanned by a block comment
fn js_comment_lines(text: &str) -> usize {
    let single = js_line_comment().find_iter(text).count();
    let block: usize = js_block_comment()
        .find_iter(text)
        .map(|m| m.as_str().matches('\n').count() + 1)
        .sum();
    single + block
}

/// Function, loop and try counts plus the maximum AST depth
pub struct StructureMetrics {
    language: Language,
}

impl StructureMetrics {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    fn try_key(&self) -> &'static str {
        match self.language {
            Language::Python => "try_except_count",
            Language::JavaScript => "try_catch_count",
        }
    }

    fn signals(&self, counts: StructureVisitor) -> SignalVector {
        let mut signals = SignalVector::new();
        signals.insert("function_count", counts.functions);
        signals.insert("loop_count", counts.loops);
        signals.insert(self.try_key(), counts.tries);
        signals.insert("max_ast_depth", counts.max_depth);
        signals
    }
}

impl Extractor for StructureMetrics {
    fn name(&self) -> &'static str {
        "structure-metrics"
    }

    fn defaults(&self) -> SignalVector {
        self.signals(StructureVisitor::default())
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector {
        match input.ast {
            Some(ast) => self.signals(StructureVisitor::collect(ast)),
            None => self.defaults(),
        }
    }
}

/// `part / whole`, or 0 when `whole` is 0
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Share of the largest bucket, or 0 when all buckets are empty
pub fn majority_share(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    let max = counts.iter().copied().max().unwrap_or(0);
    ratio(max, total)
}

/// Population standard deviation (0 for fewer than two values)
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// `1 - coefficient of variation` of function body sizes, clamped to [0,1].
/// 0 with fewer than two functions.
pub fn uniform_complexity(body_lengths: &[usize]) -> f64 {
    if body_lengths.len() < 2 {
        return 0.0;
    }
    let values: Vec<f64> = body_lengths.iter().map(|&n| n as f64).collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    (1.0 - std_dev(&values) / mean).clamp(0.0, 1.0)
}

/// Width of the leading whitespace of a line, in chars
pub fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// 1.0 when every non-zero indent is a multiple of the inferred unit, 0.5
/// otherwise, 0.0 when nothing is indented. The unit is 2 when some indent
/// is even but not a multiple of 4, else 4.
pub fn indentation_consistency(lines: &[&str]) -> f64 {
    let indents: Vec<usize> = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_width(l))
        .filter(|&i| i > 0)
        .collect();
    if indents.is_empty() {
        return 0.0;
    }
    let unit = if indents.iter().any(|i| i % 2 == 0 && i % 4 != 0) {
        2
    } else {
        4
    };
    if indents.iter().all(|i| i % unit == 0) {
        1.0
    } else {
        0.5
    }
}

/// Majority share of single- vs double-quoted literals
pub fn quote_consistency(text: &str) -> f64 {
    let single = single_quoted().find_iter(text).count();
    let double = double_quoted().find_iter(text).count();
    majority_share(&[single, double])
}

/// Count of the most frequent window of three consecutive items divided by
/// the number of windows. 0 for fewer than five items.
pub fn pattern_repetition<T: AsRef<str>>(items: &[T]) -> f64 {
    if items.len() < 5 {
        return 0.0;
    }
    let mut counts: HashMap<(&str, &str, &str), usize> = HashMap::new();
    for w in items.windows(3) {
        *counts
            .entry((w[0].as_ref(), w[1].as_ref(), w[2].as_ref()))
            .or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    ratio(max, items.len() - 2).min(1.0)
}

pub fn has_long_lines(lines: &[&str]) -> bool {
    lines.iter().any(|l| l.chars().count() > LONG_LINE_CHARS)
}

pub fn has_trailing_whitespace(lines: &[&str]) -> bool {
    lines.iter().any(|l| l.trim_end() != *l)
}

/// Share of non-blank lines that fit `max_len` and satisfy `clean`
pub fn clean_line_share(lines: &[&str], max_len: usize, clean: impl Fn(&str) -> bool) -> f64 {
    let non_blank: Vec<&&str> = lines.iter().filter(|l| !l.trim().is_empty()).collect();
    let good = non_blank
        .iter()
        .filter(|l| l.chars().count() <= max_len && clean(l))
        .count();
    ratio(good, non_blank.len())
}

/// Regex match count normalized by `divisor`, capped at 1
pub fn capped_score(count: usize, divisor: usize) -> f64 {
    ratio(count, divisor.max(1)).min(1.0)
}

pub fn is_magic_number(value: f64) -> bool {
    !ACCEPTABLE_NUMBERS.contains(&value)
}

/// Whether any numeric literal in the tree is outside the allow-list
pub fn ast_has_magic_numbers(input: &ExtractionInput<'_>) -> bool {
    let Some(ast) = input.ast else {
        return false;
    };
    let mut found = false;
    walk(ast, &mut |node: &AstNode, _: usize| {
        if let NodeKind::Number(Some(v)) = node.kind {
            found |= is_magic_number(v);
        }
    });
    found
}

/// Ratios over a list of identifier names
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NameStats {
    pub snake_case_ratio: f64,
    pub camel_case_ratio: f64,
    pub single_letter_ratio: f64,
    pub meaningful_ratio: f64,
    pub avg_length: f64,
    /// Share of the dominant convention among snake_case and camelCase names
    pub naming_consistency: f64,
}

impl NameStats {
    /// `allowed_single` are single-letter names that do not count against
    /// the code; `meaningless` is a lowercase stoplist.
    pub fn compute<S: AsRef<str>>(names: &[S], allowed_single: &str, meaningless: &[&str]) -> Self {
        if names.is_empty() {
            return Self::default();
        }
        let total = names.len();
        let mut snake = 0;
        let mut camel = 0;
        let mut lower_camel = 0;
        let mut single = 0;
        let mut meaningful = 0;
        let mut length = 0;

        for name in names {
            let name = name.as_ref();
            let chars = name.chars().count();
            length += chars;
            if snake_case().is_match(name) {
                snake += 1;
            }
            if camel_case().is_match(name) {
                camel += 1;
            }
            if name.starts_with(|c: char| c.is_ascii_lowercase())
                && name.chars().all(|c| c.is_ascii_alphanumeric())
            {
                lower_camel += 1;
            }
            if chars == 1 && !allowed_single.contains(name) {
                single += 1;
            }
            if chars > 3 && !meaningless.contains(&name.to_lowercase().as_str()) {
                meaningful += 1;
            }
        }

        Self {
            snake_case_ratio: ratio(snake, total),
            camel_case_ratio: ratio(lower_camel, total),
            single_letter_ratio: ratio(single, total),
            meaningful_ratio: ratio(meaningful, total),
            avg_length: length as f64 / total as f64,
            naming_consistency: majority_share(&[snake, camel]),
        }
    }
}
