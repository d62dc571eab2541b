//! Row search rules.
//!
//! A rule written as `/…/` (optionally followed by flags, e.g. `/abc/i`) is a
//! regular expression; anything else is compared literally. Rules are
//! classified once, when the [`Search`] is built.

use crate::error::{Error, Result};
use crate::xlsx::{CellExtractor, RowFragment, RowMatcher, SharedStringTable};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// One search rule.
#[derive(Debug, Clone)]
pub enum MatchRule {
    /// Exact string equality
    Literal(String),
    /// Regular expression search anywhere in the value
    Pattern(Regex),
}

impl MatchRule {
    /// Classify and compile a rule.
    ///
    /// Fails with `InvalidPattern` when a delimited rule does not compile.
    pub fn parse(rule: &str) -> Result<Self> {
        let Some((body, flags)) = split_delimited(rule) else {
            return Ok(MatchRule::Literal(rule.to_string()));
        };

        let mut builder = RegexBuilder::new(body);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                'u' => {
                    builder.unicode(true);
                }
                _ => {}
            }
        }

        builder
            .build()
            .map(MatchRule::Pattern)
            .map_err(|source| Error::InvalidPattern {
                rule: rule.to_string(),
                source,
            })
    }

    /// Whether `value` satisfies this rule.
    pub fn is_match(&self, value: &str) -> bool {
        match self {
            MatchRule::Literal(literal) => value == literal,
            MatchRule::Pattern(regex) => regex.is_match(value),
        }
    }
}

/// Split `/body/flags` into body and flags, if `rule` is delimited.
fn split_delimited(rule: &str) -> Option<(&str, &str)> {
    if rule.len() <= 2 || !rule.starts_with('/') {
        return None;
    }
    let last = rule.rfind('/').filter(|&idx| idx > 0)?;
    let flags = &rule[last + 1..];
    if !flags.chars().all(|c| matches!(c, 'i' | 'm' | 's' | 'x' | 'u')) {
        return None;
    }
    Some((&rule[1..last], flags))
}

/// Return the row's values when any (value, rule) pair matches.
///
/// Empty rows never match.
pub fn match_row(values: Vec<String>, rules: &[MatchRule]) -> Option<Vec<String>> {
    let hit = values
        .iter()
        .any(|value| rules.iter().any(|rule| rule.is_match(value)));
    hit.then_some(values)
}

/// Like [`match_row`], but a matching row that contains any excluded value
/// yields `None`.
pub fn match_row_excluding(
    values: Vec<String>,
    rules: &[MatchRule],
    excluded: &HashSet<String>,
) -> Option<Vec<String>> {
    match_row(values, rules).filter(|values| !values.iter().any(|v| excluded.contains(v)))
}

/// Compiled rules plus an optional exclusion set.
#[derive(Debug, Clone, Default)]
pub struct Search {
    rules: Vec<MatchRule>,
    excluded: HashSet<String>,
}

impl Search {
    /// Compile a set of rules.
    ///
    /// # Example
    ///
    /// ```
    /// use sheetseek::Search;
    ///
    /// let search = Search::new(["xlsx--300000-3", "/^total/i"])?;
    /// assert!(search.apply(vec!["Total: 12".to_string()]).is_some());
    /// # Ok::<(), sheetseek::Error>(())
    /// ```
    pub fn new<I, S>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = rules
            .into_iter()
            .map(|rule| MatchRule::parse(rule.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_rules(rules))
    }

    /// Build a search from already-compiled rules.
    pub fn from_rules(rules: Vec<MatchRule>) -> Self {
        Self {
            rules,
            excluded: HashSet::new(),
        }
    }

    /// Suppress rows containing any of `values`.
    pub fn excluding<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(values.into_iter().map(Into::into));
        self
    }

    /// The compiled rules.
    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    /// The exclusion set.
    pub fn excluded(&self) -> &HashSet<String> {
        &self.excluded
    }

    /// Apply the rules (and exclusions, if any) to one row's values.
    pub fn apply(&self, values: Vec<String>) -> Option<Vec<String>> {
        if self.excluded.is_empty() {
            match_row(values, &self.rules)
        } else {
            match_row_excluding(values, &self.rules, &self.excluded)
        }
    }

    /// Row matcher resolving cells with `extractor` and `strings`.
    pub fn matcher<'a, E>(
        &'a self,
        extractor: &'a E,
        strings: &'a SharedStringTable,
    ) -> SearchMatcher<'a, E>
    where
        E: CellExtractor + ?Sized,
    {
        SearchMatcher {
            search: self,
            extractor,
            strings,
        }
    }
}

/// Adapter running a [`Search`] against row fragments.
pub struct SearchMatcher<'a, E: CellExtractor + ?Sized> {
    search: &'a Search,
    extractor: &'a E,
    strings: &'a SharedStringTable,
}

impl<E: CellExtractor + ?Sized> RowMatcher<Vec<String>> for SearchMatcher<'_, E> {
    fn match_row(&mut self, fragment: &RowFragment) -> Option<Vec<String>> {
        let values = self.extractor.extract(fragment, self.strings);
        self.search.apply(values)
    }
}
