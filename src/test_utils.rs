//! Test doubles: a tiny grammar engine on top of onig, a grammar source counting its
//! loads and sample themes.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{BridgeResult, Error};
use crate::regex::RegexLib;
use crate::registry::{GrammarCompiler, GrammarDefinition, GrammarSource};
use crate::themes::ThemeInput;
use crate::tokenizer::{Grammar, LineTokens, RawToken, StateStack};

/// A TypeScript-ish grammar: enough for a function declaration, strings and comments
pub(crate) const TS_GRAMMAR: &str = r#"{
    "scopeName": "source.ts",
    "patterns": [
        {"begin": "/\\*", "end": "\\*/", "name": "comment.block.ts"},
        {"match": "//.*$", "name": "comment.line.double-slash.ts"},
        {"match": "\\bfunction\\b", "name": "meta.function.ts storage.type.function.ts"},
        {"match": "\\breturn\\b", "name": "keyword.control.flow.ts"},
        {"match": "\"[^\"]*\"", "name": "string.quoted.double.ts"},
        {"match": "[(){}]", "name": "meta.brace.ts"},
        {"match": "[A-Za-z_$][\\w$]*", "name": "variable.other.readwrite.ts"}
    ]
}"#;

pub(crate) const JSON_GRAMMAR: &str = r#"{
    "scopeName": "source.json",
    "patterns": [
        {"match": "\"[^\"]*\"", "name": "string.quoted.double.json"},
        {"match": "-?\\d+", "name": "constant.numeric.json"}
    ]
}"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FakeGrammarJson {
    scope_name: String,
    patterns: Vec<FakePattern>,
}

#[derive(Debug, Deserialize)]
struct FakePattern {
    #[serde(rename = "match")]
    match_: Option<String>,
    begin: Option<String>,
    end: Option<String>,
    name: String,
}

#[derive(Debug)]
struct FakeRule {
    scopes: Vec<String>,
    // Only set for begin/end rules
    end: Option<String>,
}

/// Continuation state: inside the begin/end rule at that index
#[derive(Debug)]
struct InsideBlock(usize);

/// Tokenizes with a flat list of match rules and single-line or multi-line begin/end
/// rules. Rule names can hold several space-separated scopes.
pub(crate) struct FakeGrammar {
    scope_name: String,
    patterns: Vec<String>,
    rules: Vec<FakeRule>,
    regex: Arc<dyn RegexLib>,
}

impl FakeGrammar {
    pub(crate) fn from_json(json: &str, regex: Arc<dyn RegexLib>) -> BridgeResult<Self> {
        Self::from_value(serde_json::from_str(json)?, regex)
    }

    pub(crate) fn from_value(
        value: serde_json::Value,
        regex: Arc<dyn RegexLib>,
    ) -> BridgeResult<Self> {
        let raw: FakeGrammarJson = serde_json::from_value(value)?;
        let mut patterns = Vec::with_capacity(raw.patterns.len());
        let mut rules = Vec::with_capacity(raw.patterns.len());
        for pattern in raw.patterns {
            let regex = match (pattern.match_, pattern.begin) {
                (Some(m), None) => m,
                (None, Some(begin)) if pattern.end.is_some() => begin,
                _ => {
                    return Err(Error::GrammarCompile {
                        scope_name: raw.scope_name,
                        reason: format!("rule {} needs either match or begin/end", pattern.name),
                    });
                }
            };
            patterns.push(regex);
            rules.push(FakeRule {
                scopes: pattern.name.split_whitespace().map(str::to_string).collect(),
                end: pattern.end,
            });
        }

        let grammar = Self {
            scope_name: raw.scope_name,
            patterns,
            rules,
            regex,
        };
        // Compile everything once so invalid patterns fail now
        grammar.regex.create_scanner(&grammar.pattern_refs())?;
        for rule in &grammar.rules {
            if let Some(end) = &rule.end {
                grammar.regex.create_scanner(&[end.as_str()])?;
            }
        }
        Ok(grammar)
    }

    fn pattern_refs(&self) -> Vec<&str> {
        self.patterns.iter().map(String::as_str).collect()
    }

    fn scopes_of(&self, rule: &FakeRule) -> Vec<String> {
        let mut scopes = Vec::with_capacity(rule.scopes.len() + 1);
        scopes.push(self.scope_name.clone());
        scopes.extend(rule.scopes.iter().cloned());
        scopes
    }
}

impl Grammar for FakeGrammar {
    fn scope_name(&self) -> &str {
        &self.scope_name
    }

    fn tokenize_line(&self, line: &str, state: &StateStack) -> BridgeResult<LineTokens> {
        let start_block = state.engine_state::<InsideBlock>()?.map(|b| b.0);
        let mut inside = start_block;
        let mut tokens = Vec::new();
        let mut pos = 0;
        let scanner = self.regex.create_scanner(&self.pattern_refs())?;

        while pos < line.len() {
            if let Some(index) = inside {
                let rule = &self.rules[index];
                let end = rule.end.as_deref().unwrap_or_default();
                let end_scanner = self.regex.create_scanner(&[end])?;
                tokens.push(RawToken {
                    start_index: pos,
                    scopes: self.scopes_of(rule),
                });
                match end_scanner.find_next_match(line, pos) {
                    Some(m) => {
                        pos = m.range().end;
                        inside = None;
                    }
                    None => pos = line.len(),
                }
                continue;
            }

            let Some(m) = scanner.find_next_match(line, pos) else {
                tokens.push(RawToken {
                    start_index: pos,
                    scopes: vec![self.scope_name.clone()],
                });
                break;
            };
            let range = m.range();
            if range.is_empty() {
                return Err(Error::Tokenize(format!(
                    "empty match for rule {} at {}",
                    m.index, range.start
                )));
            }
            if range.start > pos {
                tokens.push(RawToken {
                    start_index: pos,
                    scopes: vec![self.scope_name.clone()],
                });
            }
            let rule = &self.rules[m.index];
            tokens.push(RawToken {
                start_index: range.start,
                scopes: self.scopes_of(rule),
            });
            pos = range.end;
            if rule.end.is_some() {
                inside = Some(m.index);
            }
        }

        let end_state = match inside {
            None => StateStack::INITIAL,
            Some(index) if start_block == Some(index) => state.clone(),
            Some(index) => StateStack::new(InsideBlock(index)),
        };
        Ok(LineTokens { tokens, end_state })
    }
}

/// Compiles [`FakeGrammar`]s
#[derive(Debug, Default)]
pub(crate) struct FakeCompiler {
    pub(crate) compiled: AtomicUsize,
}

impl GrammarCompiler for FakeCompiler {
    fn compile(
        &self,
        definition: GrammarDefinition,
        regex: Arc<dyn RegexLib>,
    ) -> BridgeResult<Arc<dyn Grammar>> {
        self.compiled.fetch_add(1, Ordering::Relaxed);
        let scope_name = definition.scope_name().to_string();
        let grammar =
            FakeGrammar::from_value(definition.into_raw(), regex).map_err(|e| match e {
                e @ Error::GrammarCompile { .. } => e,
                other => Error::GrammarCompile {
                    scope_name,
                    reason: other.to_string(),
                },
            })?;
        Ok(Arc::new(grammar))
    }
}

/// An in-memory grammar source counting how many times it was asked for a grammar
#[derive(Debug, Default)]
pub(crate) struct CountingSource {
    grammars: HashMap<String, String>,
    delay: Duration,
    failures_left: AtomicUsize,
    loads: AtomicUsize,
}

impl CountingSource {
    pub(crate) fn new() -> Self {
        Self::default()
            .with_grammar("source.ts", TS_GRAMMAR)
            .with_grammar("source.json", JSON_GRAMMAR)
    }

    pub(crate) fn with_grammar(mut self, scope_name: &str, json: &str) -> Self {
        self.grammars
            .insert(scope_name.to_string(), json.to_string());
        self
    }

    /// Every load sleeps that long before answering
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// The next `count` loads fail with an I/O error
    pub(crate) fn failing(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::Relaxed);
        self
    }

    pub(crate) fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

impl GrammarSource for CountingSource {
    async fn load_grammar(&self, scope_name: &str) -> BridgeResult<GrammarDefinition> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let fail = self
            .failures_left
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(io::Error::other("network unreachable").into());
        }
        let json = self
            .grammars
            .get(scope_name)
            .ok_or_else(|| Error::GrammarNotFound(scope_name.to_string()))?;
        GrammarDefinition::from_json_str(scope_name, json)
    }
}

/// A cut-down Dark+ with a default rule
pub(crate) fn dark_plus_theme() -> ThemeInput {
    ThemeInput::from_json_str(
        r##"{
            "name": "Dark+ (sample)",
            "type": "dark",
            "colors": {"editor.foreground": "#D4D4D4", "editor.background": "#1E1E1E"},
            "tokenColors": [
                {"settings": {"foreground": "#D4D4D4", "background": "#1E1E1E"}},
                {"scope": "comment", "settings": {"foreground": "#6A9955", "fontStyle": "italic"}},
                {"scope": "string", "settings": {"foreground": "#CE9178"}},
                {"scope": "keyword.control", "settings": {"foreground": "#C586C0"}},
                {"scope": "storage.type.function", "settings": {"foreground": "#569CD6"}},
                {"scope": "storage.type", "settings": {"foreground": "#569CD6"}},
                {"scope": "variable.parameter", "settings": {"foreground": "#9CDCFE"}},
                {"scope": "variable", "settings": {"foreground": "#9CDCFE"}},
                {"scope": "entity.name.function", "settings": {"foreground": "#DCDCAA"}},
                {"scope": "constant.numeric", "settings": {"foreground": "#B5CEA8"}}
            ]
        }"##,
    )
    .unwrap()
}

/// A theme with a single rule, coloring strings
pub(crate) fn theme_with_string_color(color: &str) -> ThemeInput {
    ThemeInput::from_value(serde_json::json!({
        "name": "strings only",
        "tokenColors": [{"scope": "string", "settings": {"foreground": color}}]
    }))
    .unwrap()
}
