use winnow::ascii::till_line_ending;
use winnow::combinator::{alt, cut_err, opt, preceded, repeat, separated, terminated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::take_while;

use crate::{Clause, ClauseArg, GrammarRule};

use super::parser::ParsedGrammar;

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_whitespace()).void(),
            ("//", till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Symbols ----------------------------------------------------------------

fn name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '.').parse_next(input)
}

/// `<name>`, delimiters included.
fn delimited_name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    ('<', name, '>').take().parse_next(input)
}

fn symbol<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt((delimited_name, name)).parse_next(input)
}

fn terminal_word<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| {
        !c.is_whitespace() && !matches!(c, '|' | '(' | ')' | '[' | ']' | '{' | '}')
    })
    .parse_next(input)
}

fn head<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| !c.is_whitespace() && c != '(' && c != ')').parse_next(input)
}

// -- Constructor arguments --------------------------------------------------

/// A parsed constructor item before or-group ids are assigned.
enum Item {
    Arg(ClauseArg),
    Group(Vec<ClauseArg>),
}

impl Item {
    fn from_members(mut members: Vec<ClauseArg>) -> Self {
        if members.len() == 1 {
            Item::Arg(members.remove(0))
        } else {
            Item::Group(members)
        }
    }
}

/// Token wrapped in zero or more `{ }` pairs.
fn nested_token<'i>(input: &mut &'i str) -> ModalResult<(u8, &'i str)> {
    let mut nesting = 0u8;
    while opt('{').parse_next(input)?.is_some() {
        ws.parse_next(input)?;
        nesting = nesting.saturating_add(1);
    }

    let token = if nesting == 0 {
        symbol.parse_next(input)?
    } else {
        cut_err(symbol)
            .context(StrContext::Expected(StrContextValue::Description(
                "argument symbol",
            )))
            .parse_next(input)?
    };

    for _ in 0..nesting {
        ws.parse_next(input)?;
        cut_err('}')
            .context(StrContext::Expected(StrContextValue::CharLiteral('}')))
            .parse_next(input)?;
    }
    Ok((nesting, token))
}

fn arg(input: &mut &str) -> ModalResult<ClauseArg> {
    let label = opt(terminated(name, ':')).parse_next(input)?;
    let (nesting, token) = nested_token.parse_next(input)?;

    let mut arg = ClauseArg::new(token).nesting(nesting);
    if let Some(label) = label {
        arg = arg.label(label);
    }
    Ok(arg)
}

fn members(input: &mut &str) -> ModalResult<Vec<ClauseArg>> {
    separated(1.., preceded(ws, arg), (ws, '|')).parse_next(input)
}

/// `[item]` or `[a | b | ...]`.
fn optional_item(input: &mut &str) -> ModalResult<Item> {
    '['.parse_next(input)?;
    let members = cut_err(members)
        .context(StrContext::Expected(StrContextValue::Description(
            "optional argument",
        )))
        .parse_next(input)?;
    ws.parse_next(input)?;
    cut_err(']')
        .context(StrContext::Expected(StrContextValue::CharLiteral(']')))
        .parse_next(input)?;
    Ok(Item::from_members(
        members.into_iter().map(ClauseArg::optional).collect(),
    ))
}

/// `(a | b | ...)`.
fn required_group(input: &mut &str) -> ModalResult<Item> {
    '('.parse_next(input)?;
    let members = cut_err(members)
        .context(StrContext::Expected(StrContextValue::Description(
            "argument alternatives",
        )))
        .parse_next(input)?;
    ws.parse_next(input)?;
    cut_err(')')
        .context(StrContext::Expected(StrContextValue::CharLiteral(')')))
        .parse_next(input)?;
    Ok(Item::from_members(members))
}

fn item(input: &mut &str) -> ModalResult<Item> {
    alt((optional_item, required_group, arg.map(Item::Arg))).parse_next(input)
}

// -- Alternatives -----------------------------------------------------------

fn constructor(input: &mut &str) -> ModalResult<Clause> {
    '('.parse_next(input)?;
    ws.parse_next(input)?;
    let head = cut_err(head)
        .context(StrContext::Expected(StrContextValue::Description(
            "constructor head",
        )))
        .parse_next(input)?;

    let items: Vec<Item> = repeat(0.., preceded(ws, item)).parse_next(input)?;
    ws.parse_next(input)?;
    cut_err(')')
        .context(StrContext::Expected(StrContextValue::CharLiteral(')')))
        .parse_next(input)?;

    let mut args = Vec::new();
    let mut next_group = 1;
    for item in items {
        match item {
            Item::Arg(arg) => args.push(arg),
            Item::Group(members) => {
                args.extend(members.into_iter().map(|a| a.or_group(next_group)));
                next_group += 1;
            }
        }
    }

    Ok(Clause::Constructor {
        head: head.to_owned(),
        args,
    })
}

fn alternative(input: &mut &str) -> ModalResult<Clause> {
    ws.parse_next(input)?;
    alt((
        constructor,
        delimited_name.map(|n: &str| Clause::RuleRef(n.to_owned())),
        terminal_word.map(|w: &str| Clause::Terminal(w.to_owned())),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "alternative",
    )))
    .parse_next(input)
}

// -- Rule definitions -------------------------------------------------------

fn rule_def(input: &mut &str) -> ModalResult<GrammarRule> {
    ws.parse_next(input)?;
    let lhs = symbol.parse_next(input)?;

    ws.parse_next(input)?;
    cut_err("::=")
        .context(StrContext::Expected(StrContextValue::StringLiteral("::=")))
        .parse_next(input)?;

    let first = cut_err(alternative).parse_next(input)?;
    let rest: Vec<Clause> =
        repeat(0.., preceded((ws, '|'), cut_err(alternative))).parse_next(input)?;

    let mut clauses = Vec::with_capacity(rest.len() + 1);
    clauses.push(first);
    clauses.extend(rest);

    Ok(GrammarRule {
        name: lhs.to_owned(),
        clauses,
    })
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_grammar(input: &mut &str) -> ModalResult<ParsedGrammar> {
    let rules: Vec<GrammarRule> = repeat(0.., rule_def).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(ParsedGrammar { rules })
}

#[cfg(test)]
mod tests {
    use crate::parse::parse;

    use super::*;

    fn single_rule(input: &str) -> GrammarRule {
        let mut parsed = parse(input).unwrap();
        assert_eq!(parsed.rules.len(), 1);
        parsed.rules.remove(0)
    }

    #[test]
    fn parse_terminal_alternatives() {
        let rule = single_rule("<result> ::= Win | Loss | Draw");
        assert_eq!(rule.name, "<result>");
        assert_eq!(
            rule.clauses,
            vec![
                Clause::Terminal("Win".into()),
                Clause::Terminal("Loss".into()),
                Clause::Terminal("Draw".into()),
            ]
        );
    }

    #[test]
    fn parse_rule_reference() {
        let rule = single_rule("<move> ::= <step> | <slide>");
        assert_eq!(rule.clauses[0], Clause::RuleRef("<step>".into()));
        assert_eq!(rule.clauses[1], Clause::RuleRef("<slide>".into()));
    }

    #[test]
    fn parse_operator_terminal() {
        let rule = single_rule("<cmp> ::= <= | >=");
        assert_eq!(rule.clauses[0], Clause::Terminal("<=".into()));
    }

    #[test]
    fn parse_constructor_args() {
        let rule = single_rule("<game> ::= (game string <players> [<mode>] <rules>)");
        match &rule.clauses[0] {
            Clause::Constructor { head, args } => {
                assert_eq!(head, "game");
                let tokens: Vec<&str> = args.iter().map(|a| a.token.as_str()).collect();
                assert_eq!(tokens, vec!["string", "<players>", "<mode>", "<rules>"]);
                assert!(args[2].optional);
                assert!(!args[1].optional);
            }
            other => panic!("expected Constructor, got {other:?}"),
        }
    }

    #[test]
    fn parse_labels_and_nesting() {
        let rule = single_rule("<poly> ::= (poly name:<string> {<float>} {{<float>}} {{{<x>}}})");
        let args = rule.clauses[0].args();
        assert_eq!(args[0].label.as_deref(), Some("name"));
        assert_eq!(args[0].nesting, 0);
        assert_eq!(args[1].nesting, 1);
        assert_eq!(args[2].nesting, 2);
        assert_eq!(args[3].nesting, 3);
        assert_eq!(args[3].token, "<x>");
    }

    #[test]
    fn parse_labelled_collection() {
        let rule = single_rule("<r> ::= (regions sites:{<site>})");
        let arg = &rule.clauses[0].args()[0];
        assert_eq!(arg.label.as_deref(), Some("sites"));
        assert_eq!(arg.nesting, 1);
    }

    #[test]
    fn parse_or_groups() {
        let rule = single_rule("<step> ::= (step (<dir> | dirn:<absDir>) [to:<to> | from:<from>] <int>)");
        let args = rule.clauses[0].args();
        let groups: Vec<u32> = args.iter().map(|a| a.or_group).collect();
        assert_eq!(groups, vec![1, 1, 2, 2, 0]);
        assert!(!args[0].optional && !args[1].optional);
        assert!(args[2].optional && args[3].optional);
        assert_eq!(args[1].label.as_deref(), Some("dirn"));
    }

    #[test]
    fn single_member_brackets_are_plain_optional() {
        let rule = single_rule("<x> ::= (x [<a>] (<b>))");
        let args = rule.clauses[0].args();
        assert_eq!(args[0].or_group, 0);
        assert!(args[0].optional);
        assert_eq!(args[1].or_group, 0);
        assert!(!args[1].optional);
    }

    #[test]
    fn parse_multiline_listing_with_comments() {
        let input = "// header\n<game> ::= (game string <end>)\n  // inline\n<end> ::=\n    (end <result>)\n  | (end {<result>})\n<result> ::= Win\n";
        let parsed = parse(input).unwrap();
        assert_eq!(parsed.rules.len(), 3);
        assert_eq!(parsed.rules[1].clauses.len(), 2);
    }

    #[test]
    fn parse_bare_lhs() {
        let rule = single_rule("shapeType ::= Square | Hexagon");
        assert_eq!(rule.name, "shapeType");
        assert_eq!(rule.clauses.len(), 2);
    }

    #[test]
    fn parse_empty_listing() {
        assert!(parse("  // nothing here\n").unwrap().rules.is_empty());
    }

    #[test]
    fn missing_definition_operator_is_an_error() {
        assert!(parse("<a> Win").is_err());
    }

    #[test]
    fn unclosed_constructor_is_an_error() {
        assert!(parse("<a> ::= (a <b>").is_err());
    }

    #[test]
    fn unclosed_nesting_is_an_error() {
        assert!(parse("<a> ::= (a {<b>)").is_err());
    }

    #[test]
    fn dangling_alternative_is_an_error() {
        assert!(parse("<a> ::= Win |").is_err());
    }
}
