//! Path rewriter
//!
//! Rules run in declared order against the record's path:
//!
//! - `copy = false`: the path is replaced in place, later rules see the new path
//! - `copy = true`: a copy with the new path is appended, the original is kept
//!
//! Copies are never rewritten further. The output always starts with the
//! (possibly rewritten) original, followed by copies in the order they were
//! produced.

use regex::Regex;
use relay_config::RewritesConfig;
use relay_protocol::Record;

use crate::error::RewriteError;

/// One compiled rewrite rule
#[derive(Debug, Clone)]
pub struct Rewrite {
    from: Regex,
    to: String,
    copy: bool,
}

impl Rewrite {
    /// Compile a rule
    pub fn new(from: &str, to: impl Into<String>, copy: bool) -> Result<Self, RewriteError> {
        let regex = Regex::new(from).map_err(|e| RewriteError::invalid_regex(0, from, e))?;
        Ok(Self {
            from: regex,
            to: to.into(),
            copy,
        })
    }

    /// New path if the rule matches `path`
    #[inline]
    fn rewrite(&self, path: &str) -> Option<String> {
        if !self.from.is_match(path) {
            return None;
        }
        Some(self.from.replace_all(path, self.to.as_str()).into_owned())
    }

    #[inline]
    pub fn is_copy(&self) -> bool {
        self.copy
    }

    #[inline]
    pub fn pattern(&self) -> &str {
        self.from.as_str()
    }
}

/// Ordered set of compiled rewrite rules
///
/// Immutable after construction and shared by all workers.
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    rules: Vec<Rewrite>,
}

impl Rewriter {
    /// Rewriter with no rules (identity)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from already compiled rules
    pub fn new(rules: Vec<Rewrite>) -> Self {
        Self { rules }
    }

    /// Compile every rule of a rewrites file
    ///
    /// Fails on the first pattern that does not compile, so a bad regex is
    /// caught at startup instead of on the record path.
    pub fn from_config(config: &RewritesConfig) -> Result<Self, RewriteError> {
        let mut rules = Vec::with_capacity(config.rewrites.len());

        for (index, rewrite) in config.rewrites.iter().enumerate() {
            let from = rewrite
                .from
                .as_deref()
                .ok_or_else(|| RewriteError::missing_field(index, "from"))?;
            let to = rewrite
                .to
                .as_deref()
                .ok_or_else(|| RewriteError::missing_field(index, "to"))?;

            let regex =
                Regex::new(from).map_err(|e| RewriteError::invalid_regex(index, from, e))?;
            rules.push(Rewrite {
                from: regex,
                to: to.to_owned(),
                copy: rewrite.copy,
            });
        }

        tracing::debug!(rules = rules.len(), "rewriter compiled");
        Ok(Self { rules })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Rewrite `record`, appending the results to `out`
    ///
    /// Workers reuse `out` across records to avoid an allocation per line.
    /// Returns the number of records appended (at least 1).
    pub fn apply_into(&self, mut record: Record, out: &mut Vec<Record>) -> usize {
        let first = out.len();

        for rule in &self.rules {
            let Some(path) = rule.rewrite(record.path()) else {
                continue;
            };
            if rule.copy {
                out.push(record.with_path(path));
            } else {
                record.set_path(path);
            }
        }

        // Original goes ahead of its copies; a plain push when there are none
        out.insert(first, record);
        out.len() - first
    }

    /// Rewrite `record` into a fresh vector
    pub fn apply(&self, record: Record) -> Vec<Record> {
        let mut out = Vec::with_capacity(1);
        self.apply_into(record, &mut out);
        out
    }
}
