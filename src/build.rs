use std::collections::HashMap;

use crate::{Clause, Grammar, GrammarError, GrammarRule};

pub(crate) fn build(rules: Vec<GrammarRule>) -> Result<Grammar, GrammarError> {
    check_rules(&rules)?;
    let by_name = index_names(&rules)?;
    Ok(Grammar { rules, by_name })
}

fn check_rules(rules: &[GrammarRule]) -> Result<(), GrammarError> {
    for rule in rules {
        if rule.name.is_empty() {
            return Err(GrammarError::EmptyName);
        }
        if rule.clauses.is_empty() {
            return Err(GrammarError::NoClauses {
                rule: rule.name.clone(),
            });
        }
        for clause in &rule.clauses {
            if let Clause::Constructor { head, .. } = clause {
                if head.is_empty() {
                    return Err(GrammarError::EmptyHead {
                        rule: rule.name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn index_names(rules: &[GrammarRule]) -> Result<HashMap<String, usize>, GrammarError> {
    let mut by_name = HashMap::with_capacity(rules.len());
    for (idx, rule) in rules.iter().enumerate() {
        if by_name.insert(rule.name.clone(), idx).is_some() {
            return Err(GrammarError::DuplicateRule {
                name: rule.name.clone(),
            });
        }
    }
    Ok(by_name)
}
