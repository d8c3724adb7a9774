use strum_macros::{AsRefStr, Display, EnumString};

use crate::errors::RqlError;
use crate::expr::Expr;
use crate::value::Value;

/// Comparison operators understood by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    Ilike,
    In,
    Out,
    Null,
    Empty,
}

/// Dotted field path awaiting a comparison.
///
/// Every comparison consumes the path, so a path that has become a leaf can
/// no longer be extended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    segments: Vec<String>,
}

/// Starts a field path; `name` may already contain `.`-separated segments.
pub fn field(name: &str) -> Field {
    Field::default().field(name)
}

impl Field {
    pub fn field(mut self, name: &str) -> Self {
        self.segments
            .extend(name.split('.').map(|segment| segment.to_string()));
        self
    }

    pub fn path(&self) -> String {
        self.segments.join(".")
    }

    fn checked_path(&self) -> Result<String, RqlError> {
        if self.segments.is_empty()
            || self
                .segments
                .iter()
                .any(|s| s.is_empty() || s.contains(|c: char| c.is_whitespace()))
        {
            return Err(RqlError::InvalidField(self.path()));
        }
        Ok(self.path())
    }

    /// Applies `op` with `value`, dispatching on the operator family.
    pub fn compare(self, op: Operator, value: impl Into<Value>) -> Result<Expr, RqlError> {
        let value = value.into();
        match op {
            Operator::In | Operator::Out => self.list(op, value),
            Operator::Null | Operator::Empty => self.presence(op, value),
            _ => self.binary(op, value),
        }
    }

    fn binary(self, op: Operator, value: Value) -> Result<Expr, RqlError> {
        let path = self.checked_path()?;
        let text = value.to_wire().ok_or_else(|| RqlError::TypeKind {
            operator: op.to_string(),
            kind: value.kind(),
        })?;
        Ok(Expr::raw(format!("{}({},{})", op, path, text)))
    }

    fn list(self, op: Operator, value: Value) -> Result<Expr, RqlError> {
        let path = self.checked_path()?;
        let Value::List(items) = value else {
            return Err(RqlError::TypeKind {
                operator: op.to_string(),
                kind: value.kind(),
            });
        };
        Ok(Expr::raw(format!("{}({},({}))", op, path, items.join(","))))
    }

    fn presence(self, op: Operator, value: Value) -> Result<Expr, RqlError> {
        let path = self.checked_path()?;
        let Value::Bool(present) = value else {
            return Err(RqlError::TypeKind {
                operator: op.to_string(),
                kind: value.kind(),
            });
        };
        let cmp = if present { Operator::Eq } else { Operator::Ne };
        Ok(Expr::raw(format!("{}({},{}())", cmp, path, op)))
    }

    pub fn eq(self, value: impl Into<Value>) -> Result<Expr, RqlError> {
        self.compare(Operator::Eq, value)
    }

    pub fn ne(self, value: impl Into<Value>) -> Result<Expr, RqlError> {
        self.compare(Operator::Ne, value)
    }

    pub fn lt(self, value: impl Into<Value>) -> Result<Expr, RqlError> {
        self.compare(Operator::Lt, value)
    }

    pub fn le(self, value: impl Into<Value>) -> Result<Expr, RqlError> {
        self.compare(Operator::Le, value)
    }

    pub fn gt(self, value: impl Into<Value>) -> Result<Expr, RqlError> {
        self.compare(Operator::Gt, value)
    }

    pub fn ge(self, value: impl Into<Value>) -> Result<Expr, RqlError> {
        self.compare(Operator::Ge, value)
    }

    /// Pattern match; the pattern is passed through without escaping.
    pub fn like(self, pattern: &str) -> Result<Expr, RqlError> {
        self.compare(Operator::Like, pattern)
    }

    pub fn ilike(self, pattern: &str) -> Result<Expr, RqlError> {
        self.compare(Operator::Ilike, pattern)
    }

    pub fn in_(self, values: impl Into<Value>) -> Result<Expr, RqlError> {
        self.compare(Operator::In, values)
    }

    pub fn out(self, values: impl Into<Value>) -> Result<Expr, RqlError> {
        self.compare(Operator::Out, values)
    }

    /// `eq(field,null())` when `is_null`, otherwise `ne(field,null())`.
    pub fn null(self, is_null: bool) -> Result<Expr, RqlError> {
        self.compare(Operator::Null, is_null)
    }

    pub fn empty(self, is_empty: bool) -> Result<Expr, RqlError> {
        self.compare(Operator::Empty, is_empty)
    }
}
