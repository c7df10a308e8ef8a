//! Formula evaluation over a single sheet.
//!
//! Covers the formulas the layout engine writes: numbers (including
//! `1e9`), cell references with optional `$`, `+ - * / ^`, unary minus,
//! parentheses, `ABS(x)` and `SUM(...)` over values and ranges.
//!
//! Empty cells evaluate to 0. Text used in arithmetic, error cells,
//! unknown functions, division by zero and circular references are
//! [`CbqaError::Formula`] errors naming the cell being evaluated.

use std::collections::{HashMap, HashSet};

use crate::cell_ref::{col_to_letter, parse_cell_ref};
use crate::error::{CbqaError, Result};
use crate::types::{CellValue, Sheet};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    /// 0-indexed `(col, row)`.
    Cell(u32, u32),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Colon,
    Comma,
    LParen,
    RParen,
}

fn tokenize(text: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while let Some(&c) = chars.get(i) {
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            _ => None,
        };
        if let Some(token) = single {
            tokens.push(token);
            i += 1;
            continue;
        }
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = i;
            while chars.get(i).is_some_and(|c| c.is_ascii_digit() || *c == '.') {
                i += 1;
            }
            // exponent: 1e9, 2.5E-3
            if chars.get(i).is_some_and(|c| *c == 'e' || *c == 'E') {
                let sign = usize::from(chars.get(i + 1).is_some_and(|c| *c == '+' || *c == '-'));
                if chars.get(i + 1 + sign).is_some_and(char::is_ascii_digit) {
                    i += 1 + sign;
                    while chars.get(i).is_some_and(char::is_ascii_digit) {
                        i += 1;
                    }
                }
            }
            let literal: String = chars.get(start..i).unwrap_or_default().iter().collect();
            let n = literal
                .parse::<f64>()
                .map_err(|_| format!("bad number `{literal}`"))?;
            tokens.push(Token::Number(n));
        } else if c.is_ascii_alphabetic() || c == '$' || c == '_' {
            let start = i;
            while chars
                .get(i)
                .is_some_and(|c| c.is_ascii_alphanumeric() || *c == '$' || *c == '_' || *c == '.')
            {
                i += 1;
            }
            let word: String = chars.get(start..i).unwrap_or_default().iter().collect();
            let is_call = chars.get(i) == Some(&'(');
            match parse_cell_ref(&word.replace('$', "")) {
                Some((col, row)) if !is_call => tokens.push(Token::Cell(col, row)),
                _ => tokens.push(Token::Ident(word.to_ascii_uppercase())),
            }
        } else {
            return Err(format!("unexpected character `{c}`"));
        }
    }
    Ok(tokens)
}

/// Evaluates formulas of one sheet, caching every cell it computes.
#[derive(Debug)]
pub struct Evaluator<'a> {
    sheet: &'a Sheet,
    cache: HashMap<(u32, u32), f64>,
    in_progress: HashSet<(u32, u32)>,
}

impl<'a> Evaluator<'a> {
    #[must_use]
    pub fn new(sheet: &'a Sheet) -> Self {
        Self {
            sheet,
            cache: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Value of an A1-style reference such as `B30`.
    ///
    /// # Errors
    /// [`CbqaError::Formula`] for a malformed reference or a failing formula.
    pub fn evaluate_at(&mut self, reference: &str) -> Result<f64> {
        let (col, row) = parse_cell_ref(reference).ok_or_else(|| CbqaError::Formula {
            cell: reference.to_string(),
            message: "not a cell reference".to_string(),
        })?;
        self.evaluate_cell(row, col)
    }

    /// Value of the cell at 0-indexed `(row, col)`.
    ///
    /// # Errors
    /// [`CbqaError::Formula`].
    pub fn evaluate_cell(&mut self, row: u32, col: u32) -> Result<f64> {
        if let Some(&v) = self.cache.get(&(row, col)) {
            return Ok(v);
        }
        let label = cell_label(row, col);
        let value = match self.sheet.cell(row, col) {
            None => 0.0,
            Some(CellValue::Number(n)) => *n,
            Some(CellValue::Text(_)) => return Err(formula_error(&label, "text used as a number")),
            Some(CellValue::Error(e)) => return Err(formula_error(&label, &format!("error value {e}"))),
            Some(CellValue::Formula(f)) => {
                if !self.in_progress.insert((row, col)) {
                    return Err(formula_error(&label, "circular reference"));
                }
                let result = self.evaluate_formula_at(&label, f);
                self.in_progress.remove(&(row, col));
                result?
            }
        };
        self.cache.insert((row, col), value);
        Ok(value)
    }

    /// Evaluate formula text (with or without the leading `=`) against the sheet.
    ///
    /// # Errors
    /// [`CbqaError::Formula`].
    pub fn evaluate_formula(&mut self, text: &str) -> Result<f64> {
        self.evaluate_formula_at("<formula>", text)
    }

    fn evaluate_formula_at(&mut self, label: &str, text: &str) -> Result<f64> {
        let body = text.strip_prefix('=').unwrap_or(text);
        let tokens = tokenize(body).map_err(|m| formula_error(label, &m))?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            label,
            eval: self,
        };
        let value = parser.expr()?;
        if parser.pos != tokens.len() {
            return Err(formula_error(label, "unexpected trailing input"));
        }
        Ok(value)
    }

    /// Sum of a rectangle. Text cells are skipped.
    fn sum_range(&mut self, from: (u32, u32), to: (u32, u32)) -> Result<f64> {
        let (c1, c2) = (from.0.min(to.0), from.0.max(to.0));
        let (r1, r2) = (from.1.min(to.1), from.1.max(to.1));
        let mut total = 0.0;
        for row in r1..=r2 {
            for col in c1..=c2 {
                if !matches!(self.sheet.cell(row, col), Some(CellValue::Text(_))) {
                    total += self.evaluate_cell(row, col)?;
                }
            }
        }
        Ok(total)
    }
}

fn cell_label(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letter(col), row.saturating_add(1))
}

fn formula_error(cell: &str, message: &str) -> CbqaError {
    CbqaError::Formula {
        cell: cell.to_string(),
        message: message.to_string(),
    }
}

/// Recursive descent with Excel precedence: `^` binds tighter than `* /`,
/// which bind tighter than `+ -`; all left-associative. Unary minus binds
/// tighter than `^`, so `-2^2` is 4.
struct Parser<'t, 'e, 's> {
    tokens: &'t [Token],
    pos: usize,
    label: &'t str,
    eval: &'e mut Evaluator<'s>,
}

impl Parser<'_, '_, '_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos = self.pos.saturating_add(1);
        token
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        match self.next() {
            Some(ref t) if t == token => Ok(()),
            other => Err(self.error(&format!("expected {token:?}, found {other:?}"))),
        }
    }

    fn error(&self, message: &str) -> CbqaError {
        formula_error(self.label, message)
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.power()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.power()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.power()?;
                    if divisor == 0.0 {
                        return Err(self.error("division by zero"));
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn power(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        while self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            value = value.powf(self.unary()?);
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Cell(col, row)) => {
                if self.peek() == Some(&Token::Colon) {
                    return Err(self.error("range outside SUM"));
                }
                self.eval.evaluate_cell(row, col)
            }
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => self.call(&name),
            other => Err(self.error(&format!("unexpected {other:?}"))),
        }
    }

    fn call(&mut self, name: &str) -> Result<f64> {
        self.expect(&Token::LParen)?;
        match name {
            "ABS" => {
                let value = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(value.abs())
            }
            "SUM" => {
                let mut total = 0.0;
                if self.peek() == Some(&Token::RParen) {
                    self.pos += 1;
                    return Ok(total);
                }
                loop {
                    total += self.sum_argument()?;
                    match self.next() {
                        Some(Token::Comma) => {}
                        Some(Token::RParen) => return Ok(total),
                        other => return Err(self.error(&format!("unexpected {other:?} in SUM"))),
                    }
                }
            }
            _ => Err(self.error(&format!("unknown function {name}"))),
        }
    }

    fn sum_argument(&mut self) -> Result<f64> {
        if let (Some(Token::Cell(c1, r1)), Some(Token::Colon), Some(Token::Cell(c2, r2))) = (
            self.tokens.get(self.pos),
            self.tokens.get(self.pos + 1),
            self.tokens.get(self.pos + 2),
        ) {
            let (from, to) = ((*c1, *r1), (*c2, *r2));
            self.pos += 3;
            return self.eval.sum_range(from, to);
        }
        self.expr()
    }
}
