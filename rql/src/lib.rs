//! RQL filter expressions.
//!
//! ```
//! use rql::{field, Expr};
//!
//! let active = field("status").eq("active").unwrap();
//! let recent = field("created").gt("2024-01-01").unwrap();
//! assert_eq!(
//!     (active & !recent).render(),
//!     "and(eq(status,active),not(gt(created,2024-01-01)))"
//! );
//! assert!(Expr::empty().render().is_empty());
//! ```

mod errors;
mod expr;
mod field;
mod lookup;
mod parser;
mod value;

pub use errors::RqlError;
pub use expr::{Combinator, Expr};
pub use field::{field, Field, Operator};
pub use lookup::parse_lookup;
pub use parser::{parse_query, render_query, Term};
pub use value::Value;

#[cfg(test)]
mod tests;
