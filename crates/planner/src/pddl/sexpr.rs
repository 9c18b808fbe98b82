//! Minimal s-expression reader for planning text.
//!
//! Atoms are lowercased on read since planning text is case-insensitive.
//! `;` starts a comment that runs to the end of the line.

use super::ParseError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SExpr {
    Atom(String),
    List(Vec<SExpr>),
}

impl SExpr {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(atom) => Some(atom),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExpr]> {
        match self {
            Self::List(items) => Some(items),
            Self::Atom(_) => None,
        }
    }

    /// Head keyword of a list, e.g. `and` for `(and ...)`.
    pub fn head(&self) -> Option<&str> {
        self.as_list()?.first()?.as_atom()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Atom(String),
}

fn tokenize(input: &str) -> Vec<(usize, Token)> {
    let mut tokens = Vec::new();
    for (number, line) in input.lines().enumerate() {
        let line_no = number + 1;
        let code = line.split(';').next().unwrap_or_default();
        let mut atom = String::new();
        for c in code.chars() {
            match c {
                '(' | ')' => {
                    if !atom.is_empty() {
                        tokens.push((line_no, Token::Atom(std::mem::take(&mut atom))));
                    }
                    tokens.push((line_no, if c == '(' { Token::Open } else { Token::Close }));
                }
                c if c.is_whitespace() => {
                    if !atom.is_empty() {
                        tokens.push((line_no, Token::Atom(std::mem::take(&mut atom))));
                    }
                }
                c => atom.push(c.to_ascii_lowercase()),
            }
        }
        if !atom.is_empty() {
            tokens.push((line_no, Token::Atom(atom)));
        }
    }
    tokens
}

/// Reads every top-level expression in `input`.
pub fn read_all(input: &str) -> Result<Vec<SExpr>, ParseError> {
    let mut stack: Vec<(usize, Vec<SExpr>)> = Vec::new();
    let mut top = Vec::new();

    for (line, token) in tokenize(input) {
        match token {
            Token::Open => stack.push((line, Vec::new())),
            Token::Close => {
                let (_, items) = stack.pop().ok_or(ParseError::UnbalancedClose { line })?;
                let list = SExpr::List(items);
                match stack.last_mut() {
                    Some((_, parent)) => parent.push(list),
                    None => top.push(list),
                }
            }
            Token::Atom(atom) => match stack.last_mut() {
                Some((_, parent)) => parent.push(SExpr::Atom(atom)),
                None => top.push(SExpr::Atom(atom)),
            },
        }
    }

    if let Some((line, _)) = stack.first() {
        return Err(ParseError::Unterminated { line: *line });
    }
    Ok(top)
}

/// Reads exactly one top-level expression.
pub fn read_one(input: &str) -> Result<SExpr, ParseError> {
    let mut all = read_all(input)?;
    match all.len() {
        1 => Ok(all.remove(0)),
        0 => Err(ParseError::Empty),
        found => Err(ParseError::TrailingInput { found }),
    }
}
