//! Per-language signal weights
//!
//! Positive weights push toward "AI-generated", negative weights toward
//! "human-written". Signals without a weight do not contribute.

use crate::models::Language;
use serde::Serialize;
use std::collections::BTreeMap;

const PYTHON_WEIGHTS: &[(&str, f64)] = &[
    // Consistency and polish
    ("import_organization_score", 2.5),
    ("indentation_consistency", 2.0),
    ("quote_consistency", 1.5),
    ("pattern_repetition_score", 3.0),
    ("generic_example_score", 3.5),
    ("perfect_pep8_score", 2.0),
    ("uniform_complexity", 2.5),
    // Traces of human editing
    ("has_todo_comments", -3.0),
    ("has_debug_prints", -2.5),
    ("has_commented_code", -2.0),
    ("has_magic_numbers", -1.5),
    ("has_long_lines", -1.0),
    ("has_trailing_whitespace", -2.0),
    ("single_letter_var_ratio", -1.0),
    ("function_length_variance", -1.5),
    // Weak idiom hints
    ("has_main_guard", -0.5),
    ("has_docstrings", 0.5),
    ("uses_comprehensions", -0.5),
    ("uses_f_strings", 0.0),
    ("meaningful_name_ratio", -0.3),
];

const JAVASCRIPT_WEIGHTS: &[(&str, f64)] = &[
    ("function_style_consistency", 2.0),
    ("semicolon_consistency", 1.5),
    ("quote_consistency", 1.5),
    ("indentation_consistency", 2.0),
    ("pattern_repetition_score", 3.0),
    ("generic_example_score", 3.5),
    ("placeholder_score", 3.0),
    ("has_example_data", 2.5),
    ("excessive_comments_ratio", 2.0),
    ("has_console_log", -2.5),
    ("has_debugger", -3.0),
    ("has_todo_comments", -3.0),
    ("has_commented_code", -2.0),
    ("has_alert", -2.0),
    ("has_eval", -1.5),
    ("has_var_declarations", -1.0),
    ("has_long_lines", -1.0),
    ("has_callback_hell", -1.5),
    ("single_letter_var_ratio", -1.0),
    ("uses_arrow_functions", 0.3),
    ("uses_async_await", 0.3),
    ("uses_destructuring", 0.2),
    ("uses_template_literals", 0.2),
    ("uses_jquery", -0.5),
    ("meaningful_name_ratio", -0.5),
];

/// Immutable map from signal name to weight
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WeightTable {
    weights: BTreeMap<String, f64>,
}

impl WeightTable {
    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self {
            weights: pairs.into_iter().map(|(k, w)| (k.into(), w)).collect(),
        }
    }

    pub fn python() -> Self {
        Self::from_pairs(PYTHON_WEIGHTS.iter().copied())
    }

    pub fn javascript() -> Self {
        Self::from_pairs(JAVASCRIPT_WEIGHTS.iter().copied())
    }

    /// Built-in table of a language
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Python => Self::python(),
            Language::JavaScript => Self::javascript(),
        }
    }

    /// Copy of this table with `overrides` replacing or adding entries
    pub fn with_overrides<'a>(
        &self,
        overrides: impl IntoIterator<Item = (&'a String, &'a f64)>,
    ) -> Self {
        let mut weights = self.weights.clone();
        for (name, weight) in overrides {
            weights.insert(name.clone(), *weight);
        }
        Self { weights }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.weights.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.weights.iter().map(|(k, w)| (k.as_str(), *w))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_builtin_tables() {
        let python = WeightTable::python();
        assert_eq!(python.len(), 20);
        assert_eq!(python.get("generic_example_score"), Some(3.5));
        assert_eq!(python.get("has_todo_comments"), Some(-3.0));
        assert_eq!(python.get("uses_arrow_functions"), None);

        let js = WeightTable::javascript();
        assert_eq!(js.len(), 25);
        assert_eq!(js.get("has_debugger"), Some(-3.0));
        assert_eq!(js.get("uses_destructuring"), Some(0.2));
    }

    #[test]
    fn test_overrides_replace_and_add() {
        let overrides: HashMap<String, f64> = [
            ("has_todo_comments".to_string(), -5.0),
            ("uses_walrus_operator".to_string(), 1.0),
        ]
        .into_iter()
        .collect();
        let table = WeightTable::python().with_overrides(&overrides);
        assert_eq!(table.get("has_todo_comments"), Some(-5.0));
        assert_eq!(table.get("uses_walrus_operator"), Some(1.0));
        assert_eq!(table.len(), 21);
        // Base table unchanged
        assert_eq!(WeightTable::python().get("has_todo_comments"), Some(-3.0));
    }

    #[test]
    fn test_iteration_is_sorted() {
        let table = WeightTable::from_pairs([("b", 1.0), ("a", 2.0)]);
        let names: Vec<&str> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
