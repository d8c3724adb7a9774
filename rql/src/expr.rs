//! Boolean filter expressions and their RQL rendering.
//!
//! An [`Expr`] is either a leaf holding a pre-rendered comparison such as
//! `eq(status,active)` or a composite joining children under `and`/`or`.
//! Combining two expressions never mutates either operand.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use strum_macros::{AsRefStr, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Node {
    Leaf(String),
    Composite {
        op: Combinator,
        children: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expr {
    negated: bool,
    node: Node,
}

impl Default for Expr {
    fn default() -> Self {
        Self::empty()
    }
}

impl Expr {
    /// The empty expression: matches everything and renders as `""`.
    pub fn empty() -> Self {
        Self::composite(Combinator::And)
    }

    /// Leaf from an already-rendered fragment, e.g. `eq(a,1)`.
    ///
    /// The text is emitted verbatim; an empty string yields the empty expression.
    pub fn raw(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::empty();
        }
        Self {
            negated: false,
            node: Node::Leaf(text),
        }
    }

    fn composite(op: Combinator) -> Self {
        Self {
            negated: false,
            node: Node::Composite {
                op,
                children: Vec::new(),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.node, Node::Composite { children, .. } if children.is_empty())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.node, Node::Leaf(_))
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Combinator of a composite node, `None` for leaves.
    pub fn combinator(&self) -> Option<Combinator> {
        match &self.node {
            Node::Leaf(_) => None,
            Node::Composite { op, .. } => Some(*op),
        }
    }

    pub fn children(&self) -> &[Expr] {
        match &self.node {
            Node::Leaf(_) => &[],
            Node::Composite { children, .. } => children,
        }
    }

    pub fn and(&self, other: &Expr) -> Expr {
        self.combine(other, Combinator::And)
    }

    pub fn or(&self, other: &Expr) -> Expr {
        self.combine(other, Combinator::Or)
    }

    /// Copy of this expression with the negation flag flipped.
    pub fn negate(&self) -> Expr {
        let mut negated = self.clone();
        negated.negated = !negated.negated;
        negated
    }

    pub fn combine(&self, other: &Expr, op: Combinator) -> Expr {
        if self == other || other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut combined = Self::composite(op);
        combined.append(self.clone());
        combined.append(other.clone());
        combined
    }

    // Skips children already present and splices non-negated children that
    // share this node's combinator (or wrap a single child) instead of nesting.
    fn append(&mut self, child: Expr) {
        let Node::Composite { op, children } = &mut self.node else {
            return;
        };
        if children.contains(&child) {
            return;
        }
        let flatten = !child.negated
            && match &child.node {
                Node::Leaf(_) => false,
                Node::Composite {
                    op: child_op,
                    children: grandchildren,
                } => *child_op == *op || grandchildren.len() == 1,
            };
        if !flatten {
            children.push(child);
            return;
        }
        if let Node::Composite {
            children: grandchildren,
            ..
        } = child.node
        {
            for grandchild in grandchildren {
                self.append(grandchild);
            }
        }
    }

    pub fn render(&self) -> String {
        let body = match &self.node {
            Node::Leaf(text) => text.clone(),
            Node::Composite { children, .. } if children.is_empty() => return String::new(),
            Node::Composite { op, children } => {
                let parts: Vec<String> = children.iter().map(Expr::render).collect();
                format!("{}({})", op, parts.join(","))
            }
        };
        if self.negated {
            format!("not({})", body)
        } else {
            body
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Expr {
        self.and(&rhs)
    }
}

impl BitAnd for &Expr {
    type Output = Expr;

    fn bitand(self, rhs: &Expr) -> Expr {
        self.and(rhs)
    }
}

impl BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Expr {
        self.or(&rhs)
    }
}

impl BitOr for &Expr {
    type Output = Expr;

    fn bitor(self, rhs: &Expr) -> Expr {
        self.or(rhs)
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        self.negate()
    }
}

impl Not for &Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        self.negate()
    }
}
