//! Parser for rendered RQL query strings.
//!
//! Splits `select(a,b)&and(eq(x,1),in(y,(p,q)))&ordering(-a)` back into
//! terms. Rendering a parsed query reproduces the input byte-for-byte.

use std::fmt;

use crate::errors::RqlError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// `name(arg,...)`
    Call { name: String, args: Vec<Term> },
    /// `(item,...)`, the list argument of `in`/`out`
    Group(Vec<Term>),
    Atom(String),
}

impl Term {
    pub fn name(&self) -> Option<&str> {
        match self {
            Term::Call { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Call { name, args } => write!(f, "{}({})", name, join(args)),
            Term::Group(items) => write!(f, "({})", join(items)),
            Term::Atom(text) => f.write_str(text),
        }
    }
}

fn join(terms: &[Term]) -> String {
    terms
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders top-level terms joined with `&`.
pub fn render_query(terms: &[Term]) -> String {
    terms
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join("&")
}

struct Parser {
    input: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn error(&self, message: impl Into<String>) -> RqlError {
        RqlError::Parse {
            position: self.pos,
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), RqlError> {
        match self.advance() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => {
                self.pos -= 1;
                Err(self.error(format!("expected '{}', found '{}'", expected, ch)))
            }
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn read_atom(&mut self) -> String {
        let mut atom = String::new();
        while let Some(ch) = self.peek() {
            if matches!(ch, '(' | ')' | ',' | '&') {
                break;
            }
            atom.push(ch);
            self.advance();
        }
        atom
    }

    fn parse_term(&mut self) -> Result<Term, RqlError> {
        if self.peek() == Some('(') {
            self.advance();
            let items = self.parse_args()?;
            return Ok(Term::Group(items));
        }
        let atom = self.read_atom();
        if self.peek() == Some('(') {
            if atom.is_empty() {
                return Err(self.error("call without a name"));
            }
            self.advance();
            let args = self.parse_args()?;
            return Ok(Term::Call { name: atom, args });
        }
        Ok(Term::Atom(atom))
    }

    // Called after the opening parenthesis; consumes the closing one.
    fn parse_args(&mut self) -> Result<Vec<Term>, RqlError> {
        let mut args = Vec::new();
        if self.peek() == Some(')') {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_term()?);
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                _ => break,
            }
        }
        self.expect(')')?;
        Ok(args)
    }

    fn parse_query(&mut self) -> Result<Vec<Term>, RqlError> {
        let mut terms = Vec::new();
        if self.input.is_empty() {
            return Ok(terms);
        }
        loop {
            let term = self.parse_term()?;
            if term == Term::Atom(String::new()) {
                return Err(self.error("empty query fragment"));
            }
            terms.push(term);
            match self.advance() {
                Some('&') => continue,
                None => break,
                Some(ch) => {
                    self.pos -= 1;
                    return Err(self.error(format!("unexpected '{}'", ch)));
                }
            }
        }
        Ok(terms)
    }
}

/// Parses an `&`-joined RQL query string into its top-level terms.
pub fn parse_query(input: &str) -> Result<Vec<Term>, RqlError> {
    Parser::new(input).parse_query()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_call() {
        let terms = parse_query("eq(name,x)").unwrap();
        assert_eq!(
            terms,
            vec![Term::Call {
                name: "eq".to_string(),
                args: vec![Term::Atom("name".to_string()), Term::Atom("x".to_string())],
            }]
        );
    }

    #[test]
    fn test_parse_group_and_nullary_call() {
        let terms = parse_query("and(in(s,(a,b)),eq(f,null()))").unwrap();
        assert_eq!(terms.len(), 1);
        let Term::Call { name, args } = &terms[0] else {
            panic!("expected call");
        };
        assert_eq!(name, "and");
        assert_eq!(args.len(), 2);
        assert_eq!(
            args[1],
            Term::Call {
                name: "eq".to_string(),
                args: vec![
                    Term::Atom("f".to_string()),
                    Term::Call {
                        name: "null".to_string(),
                        args: vec![]
                    }
                ],
            }
        );
    }

    #[test]
    fn test_round_trip_is_byte_exact() {
        let inputs = [
            "select(a,-b)&and(eq(x,1),not(or(lt(y,2),gt(y,9))))&ordering(-a,b)",
            "in(status,(a,b))",
            "eq(created,2024-03-09T14:05:30+00:00)",
            "like(name,*foo bar*)",
        ];
        for input in inputs {
            let terms = parse_query(input).unwrap();
            assert_eq!(render_query(&terms), input);
        }
    }

    #[test]
    fn test_top_level_names_in_order() {
        let terms = parse_query("select(a)&eq(x,1)&ordering(a)").unwrap();
        let names: Vec<_> = terms.iter().filter_map(Term::name).collect();
        assert_eq!(names, vec!["select", "eq", "ordering"]);
    }

    #[test]
    fn test_empty_query() {
        assert!(parse_query("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_query("eq(a,1"), Err(RqlError::Parse { .. })));
        assert!(matches!(parse_query("eq(a,1))"), Err(RqlError::Parse { .. })));
        assert!(matches!(parse_query("eq(a,1)&&x"), Err(RqlError::Parse { .. })));
        assert!(matches!(parse_query("(a)(b)"), Err(RqlError::Parse { .. })));
    }
}
