use nom::{IResult, Parser};
use nom::branch::alt;
use nom::bytes::complete::{take_till, take_while1};
use nom::character::complete::char;
use nom::combinator::{map, value};
use nom::sequence::{delimited, terminated};
use crate::core::error::{Error, ErrorKind, Result};
use crate::query::ast::{BoolQuery, BooleanClause, Occur, PhraseQuery, Query, TermQuery};
use crate::schema::schema::Schema;

/// Deepest parenthesis nesting accepted in a query expression
pub const MAX_NESTING: usize = 128;

/// Query parser for converting string queries to AST
///
/// Syntax:
/// - `ingegneria dati`      -> SHOULD clauses
/// - `+ingegneria -laurea`  -> MUST / MUST_NOT
/// - `a AND b`, `a OR b`, `NOT a`
/// - `"data scientist"`     -> phrase
/// - `titolo:Ingegneria`    -> field-qualified clause
/// - `(a b) +c`             -> grouping
///
/// Free text is analyzed with the target field's analyzer: a word that
/// analyzes to nothing (a stop word) is dropped, a word that analyzes to
/// several tokens becomes a phrase.
pub struct QueryParser<'s> {
    pub default_field: String,
    schema: &'s Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme<'i> {
    Open,
    Close,
    Plus,
    Minus,
    Quoted(&'i str),
    Field(&'i str),
    Word(&'i str),
}

/// A lexeme and the input remaining where it starts, for error messages
struct Located<'i> {
    lexeme: Lexeme<'i>,
    at: &'i str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conjunction {
    None,
    And,
    Or,
}

fn is_field_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn is_term_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '"' | '(' | ')')
}

fn lexeme(input: &str) -> IResult<&str, Lexeme<'_>> {
    alt((
        value(Lexeme::Open, char('(')),
        value(Lexeme::Close, char(')')),
        value(Lexeme::Plus, char('+')),
        value(Lexeme::Minus, char('-')),
        map(delimited(char('"'), take_till(|c: char| c == '"'), char('"')), Lexeme::Quoted),
        map(terminated(take_while1(is_field_char), char(':')), Lexeme::Field),
        map(take_while1(is_term_char), Lexeme::Word),
    ))
    .parse(input)
}

fn lex(input: &str) -> Result<Vec<Located<'_>>> {
    let mut rest = input.trim_start();
    let mut lexemes = Vec::new();

    while !rest.is_empty() {
        match lexeme(rest) {
            Ok((remaining, lexeme)) => {
                lexemes.push(Located { lexeme, at: rest });
                rest = remaining.trim_start();
            }
            Err(_) => {
                let message = if rest.starts_with('"') { "unbalanced quote" } else { "unexpected input" };
                return Err(Error::query_syntax(message, rest, input));
            }
        }
    }

    Ok(lexemes)
}

impl<'s> QueryParser<'s> {
    pub fn new(default_field: &str, schema: &'s Schema) -> Self {
        QueryParser {
            default_field: default_field.to_string(),
            schema,
        }
    }

    /// Parse a query string into Query AST
    pub fn parse(&self, input: &str) -> Result<Query> {
        self.parse_for_field(&self.default_field, input)
    }

    /// Parse the same expression once per field and union the results.
    /// Each per-field tree is boosted by its weight.
    pub fn parse_multi_field(&self, fields: &[(&str, f32)], input: &str) -> Result<Query> {
        if fields.is_empty() {
            return Err(Error::new(ErrorKind::InvalidArgument, "multi-field query needs at least one field".to_string()));
        }

        let mut union = BoolQuery::new();
        for &(field, weight) in fields {
            let query = self.parse_for_field(field, input)?;
            let query = if weight == 1.0 { query } else { query.boosted(weight) };
            union.add(query, Occur::Should);
        }

        let query = Query::Bool(union);
        tracing::debug!(input, query = %query, "parsed multi-field query");
        Ok(query)
    }

    fn parse_for_field(&self, field: &str, input: &str) -> Result<Query> {
        if input.trim().is_empty() {
            return Err(Error::query_syntax("empty query expression", input, input));
        }

        let mut builder = ClauseBuilder {
            schema: self.schema,
            input,
            lexemes: lex(input)?,
            pos: 0,
        };
        let mut clauses = builder.clauses(field, 0)?;

        let query = if clauses.len() == 1 && clauses[0].occur != Occur::MustNot {
            clauses.remove(0).query
        } else {
            Query::Bool(BoolQuery { clauses, boost: None })
        };
        tracing::debug!(input, query = %query, "parsed query");
        Ok(query)
    }
}

struct ClauseBuilder<'s, 'i> {
    schema: &'s Schema,
    input: &'i str,
    lexemes: Vec<Located<'i>>,
    pos: usize,
}

impl<'s, 'i> ClauseBuilder<'s, 'i> {
    fn peek(&self) -> Option<&Located<'i>> {
        self.lexemes.get(self.pos)
    }

    fn error(&self, message: &str, fragment: &str) -> Error {
        Error::query_syntax(message, fragment, self.input)
    }

    fn clauses(&mut self, field: &str, depth: usize) -> Result<Vec<BooleanClause>> {
        let mut clauses: Vec<BooleanClause> = Vec::new();
        let mut conjunction = Conjunction::None;
        let mut operator_at: Option<&'i str> = None;
        let mut seen_operand = false;

        while let Some(current) = self.peek() {
            let at = current.at;
            match current.lexeme {
                Lexeme::Close if depth == 0 => {
                    return Err(self.error("unbalanced parenthesis", at));
                }
                Lexeme::Close => break,
                Lexeme::Word("AND") | Lexeme::Word("OR") => {
                    if operator_at.is_some() || !seen_operand {
                        return Err(self.error("operator without a left operand", at));
                    }
                    conjunction = if current.lexeme == Lexeme::Word("AND") { Conjunction::And } else { Conjunction::Or };
                    operator_at = Some(at);
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            let modifier = self.modifier();
            let query = self.atom(field, depth, at)?;
            add_clause(&mut clauses, conjunction, modifier, query);
            seen_operand = true;
            conjunction = Conjunction::None;
            operator_at = None;
        }

        if let Some(at) = operator_at {
            return Err(self.error("operator without a right operand", at));
        }
        Ok(clauses)
    }

    fn modifier(&mut self) -> Option<Occur> {
        let occur = match self.peek()?.lexeme {
            Lexeme::Plus => Occur::Must,
            Lexeme::Minus | Lexeme::Word("NOT") => Occur::MustNot,
            _ => return None,
        };
        self.pos += 1;
        Some(occur)
    }

    /// One term, phrase or group. `Ok(None)` when analysis removed every token.
    fn atom(&mut self, field: &str, depth: usize, start: &'i str) -> Result<Option<Query>> {
        let Some(current) = self.peek() else {
            return Err(self.error("missing term after modifier", start));
        };
        let at = current.at;
        let lexeme = current.lexeme;
        self.pos += 1;

        match lexeme {
            Lexeme::Word(word) => {
                if matches!(word, "AND" | "OR" | "NOT") {
                    return Err(self.error("operator where a term was expected", at));
                }
                Ok(self.analyzed(field, word))
            }
            Lexeme::Quoted(text) => {
                if text.trim().is_empty() {
                    return Err(self.error("empty phrase", at));
                }
                Ok(self.analyzed(field, text))
            }
            Lexeme::Field(name) => {
                match self.peek().map(|l| l.lexeme) {
                    Some(Lexeme::Word(_)) | Some(Lexeme::Quoted(_)) | Some(Lexeme::Open) => self.atom(name, depth, at),
                    _ => Err(self.error(&format!("missing value for field '{}'", name), at)),
                }
            }
            Lexeme::Open => {
                if self.peek().map(|l| l.lexeme) == Some(Lexeme::Close) {
                    return Err(self.error("empty group", at));
                }
                if depth >= MAX_NESTING {
                    return Err(self.error("query nested too deeply", at));
                }
                let clauses = self.clauses(field, depth + 1)?;
                match self.peek().map(|l| l.lexeme) {
                    Some(Lexeme::Close) => self.pos += 1,
                    _ => return Err(self.error("unbalanced parenthesis", at)),
                }
                if clauses.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Query::Bool(BoolQuery { clauses, boost: None })))
                }
            }
            Lexeme::Close | Lexeme::Plus | Lexeme::Minus => {
                Err(self.error("unexpected token", at))
            }
        }
    }

    fn analyzed(&self, field: &str, text: &str) -> Option<Query> {
        let mut terms = self.schema.analyzer_for(field).terms(text);
        match terms.len() {
            0 => None,
            1 => Some(Query::Term(TermQuery {
                field: field.to_string(),
                value: terms.remove(0),
                boost: None,
            })),
            _ => Some(Query::Phrase(PhraseQuery {
                field: field.to_string(),
                phrase: terms,
                boost: None,
            })),
        }
    }
}

/// Classic conjunction rules with OR as the default operator
fn add_clause(clauses: &mut Vec<BooleanClause>, conjunction: Conjunction, modifier: Option<Occur>, query: Option<Query>) {
    if conjunction == Conjunction::And {
        if let Some(previous) = clauses.last_mut() {
            if previous.occur != Occur::MustNot {
                previous.occur = Occur::Must;
            }
        }
    }

    let Some(query) = query else {
        return;
    };
    let occur = match modifier {
        Some(occur) => occur,
        None if conjunction == Conjunction::And => Occur::Must,
        None => Occur::Should,
    };
    clauses.push(BooleanClause { query, occur });
}
