use std::fmt;

use crate::{Grammar, TerminalCategory};

/// Coverage summary of a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarAudit {
    pub rule_count: usize,
    pub clause_count: usize,
    /// `(rule, token)` for constructor arguments that resolve to no rule.
    pub unresolved: Vec<(String, String)>,
}

impl GrammarAudit {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

impl Grammar {
    /// List constructor arguments whose symbol matches no rule.
    ///
    /// Terminal categories and capitalised tokens (enum constants written
    /// inline) are not expected to have rules and are skipped.
    #[must_use]
    pub fn audit(&self) -> GrammarAudit {
        let mut unresolved = Vec::new();
        for rule in self.rules() {
            for clause in &rule.clauses {
                for arg in clause.args() {
                    if TerminalCategory::from_token(&arg.token).is_some()
                        || starts_uppercase(&arg.token)
                    {
                        continue;
                    }
                    if self.resolve(&arg.token).is_empty() {
                        unresolved.push((rule.name.clone(), arg.token.clone()));
                    }
                }
            }
        }

        GrammarAudit {
            rule_count: self.len(),
            clause_count: self.clause_count(),
            unresolved,
        }
    }
}

fn starts_uppercase(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}

impl fmt::Display for GrammarAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rule, token) in &self.unresolved {
            writeln!(f, "no rule for {token} (in {rule})")?;
        }
        write!(
            f,
            "{} rules with {} clauses",
            self.rule_count, self.clause_count
        )
    }
}
