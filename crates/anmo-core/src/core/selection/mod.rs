//! Atom selection expressions.
//!
//! A selection is a boolean expression over atom properties:
//!
//! ```text
//! name == 'CA' && resid >= 10 && resid <= 50
//! !(resname == "HOH") || index < 5
//! ```
//!
//! Keywords are `name`, `resname` (string-valued, `==`/`!=` only) and
//! `resid`, `id` (serial), `index` (zero-based position), which compare with
//! `== != < <= > >=`. `all` and `none` match every and no atom; `!`, `&&`,
//! `||` and parentheses combine terms, with `&&` binding tighter than `||`.

mod parser;

use crate::core::models::atom::Atom;
use crate::core::models::structure::Structure;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SelectionError {
    #[error("Malformed selection at position {position}: {message}")]
    Syntax { position: usize, message: String },
    #[error("Selection '{0}' matched no atoms")]
    NoAtomsSelected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Name,
    Resname,
    Resid,
    Id,
    Index,
}

impl Key {
    fn is_numeric(self) -> bool {
        matches!(self, Key::Resid | Key::Id | Key::Index)
    }
}

impl FromStr for Key {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Key::Name),
            "resname" => Ok(Key::Resname),
            "resid" => Ok(Key::Resid),
            "id" => Ok(Key::Id),
            "index" => Ok(Key::Index),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    fn test<T: PartialOrd + ?Sized>(self, lhs: &T, rhs: &T) -> bool {
        match self {
            Op::Eq => lhs == rhs,
            Op::Ne => lhs != rhs,
            Op::Lt => lhs < rhs,
            Op::Le => lhs <= rhs,
            Op::Gt => lhs > rhs,
            Op::Ge => lhs >= rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub key: Key,
    pub op: Op,
    pub value: Value,
}

impl Comparison {
    fn matches(&self, atom: &Atom) -> bool {
        match (&self.value, self.key) {
            (Value::Text(s), Key::Name) => self.op.test(atom.name.as_str(), s.as_str()),
            (Value::Text(s), Key::Resname) => self.op.test(atom.resname.as_str(), s.as_str()),
            (Value::Int(v), Key::Resid) => self.op.test(&(atom.resid as i64), v),
            (Value::Int(v), Key::Id) => self.op.test(&(atom.serial as i64), v),
            (Value::Int(v), Key::Index) => self.op.test(&(atom.index as i64), v),
            // The parser rejects the remaining key/value combinations.
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    All,
    None,
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(Comparison),
}

impl Expr {
    pub fn matches(&self, atom: &Atom) -> bool {
        match self {
            Expr::All => true,
            Expr::None => false,
            Expr::Not(e) => !e.matches(atom),
            Expr::And(a, b) => a.matches(atom) && b.matches(atom),
            Expr::Or(a, b) => a.matches(atom) || b.matches(atom),
            Expr::Compare(c) => c.matches(atom),
        }
    }
}

/// A parsed selection expression together with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    source: String,
    expr: Expr,
}

impl Selection {
    /// Parses a selection expression.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::Syntax`] with the byte offset of the problem
    /// when the expression is malformed.
    pub fn parse(source: &str) -> Result<Self, SelectionError> {
        Ok(Self {
            source: source.to_string(),
            expr: parser::parse(source)?,
        })
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn matches(&self, atom: &Atom) -> bool {
        self.expr.matches(atom)
    }

    /// Returns the positions of matching atoms, in structure order.
    pub fn positions(&self, structure: &Structure) -> Vec<usize> {
        structure
            .atoms()
            .iter()
            .enumerate()
            .filter(|(_, a)| self.matches(a))
            .map(|(i, _)| i)
            .collect()
    }

    /// Copies the matching atoms into a new structure.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::NoAtomsSelected`] when nothing matches.
    pub fn apply(&self, structure: &Structure) -> Result<Structure, SelectionError> {
        let positions = self.positions(structure);
        if positions.is_empty() {
            return Err(SelectionError::NoAtomsSelected(self.source.clone()));
        }
        Ok(structure.subset(&positions))
    }
}

impl FromStr for Selection {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selection::parse(s)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
