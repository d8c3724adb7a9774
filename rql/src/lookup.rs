use crate::errors::RqlError;
use crate::expr::Expr;
use crate::field::{Field, Operator};
use crate::value::Value;

const LOOKUP_SEPARATOR: &str = "__";

/// Splits a lookup name such as `author__name__in` into its dotted field path
/// and operator. A trailing segment that is not an operator is part of the path.
pub fn parse_lookup(name: &str) -> (String, Operator) {
    let mut segments: Vec<&str> = name.split(LOOKUP_SEPARATOR).collect();
    let operator = match segments.last().map(|s| s.parse::<Operator>()) {
        Some(Ok(op)) if segments.len() > 1 => {
            segments.pop();
            op
        }
        _ => Operator::Eq,
    };
    (segments.join("."), operator)
}

impl Expr {
    /// Builds an expression from ordered `(lookup, value)` pairs, AND-ing
    /// the resulting leaves.
    pub fn from_lookups<K, V, I>(lookups: I) -> Result<Expr, RqlError>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut combined = Expr::empty();
        for (name, value) in lookups {
            let (path, operator) = parse_lookup(name.as_ref());
            let leaf = Field::default().field(&path).compare(operator, value)?;
            combined = combined.and(&leaf);
        }
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lookup_suffixes() {
        assert_eq!(parse_lookup("status"), ("status".to_string(), Operator::Eq));
        assert_eq!(parse_lookup("status__in"), ("status".to_string(), Operator::In));
        assert_eq!(
            parse_lookup("author__name__ilike"),
            ("author.name".to_string(), Operator::Ilike)
        );
        assert_eq!(
            parse_lookup("author__name"),
            ("author.name".to_string(), Operator::Eq)
        );
        // A bare operator name is a field, not an operator
        assert_eq!(parse_lookup("null"), ("null".to_string(), Operator::Eq));
    }

    #[test]
    fn test_in_lookup() {
        let expr = Expr::from_lookups([("status__in", vec!["a", "b"])]).unwrap();
        assert_eq!(expr.render(), "in(status,(a,b))");
    }

    #[test]
    fn test_null_lookup() {
        let expr = Expr::from_lookups([("field__null", true)]).unwrap();
        assert_eq!(expr.render(), "eq(field,null())");
        let expr = Expr::from_lookups([("field__null", false)]).unwrap();
        assert_eq!(expr.render(), "ne(field,null())");
    }

    #[test]
    fn test_multiple_lookups_combine_with_and() {
        let expr = Expr::from_lookups([("x", "1"), ("y__gt", "2")]).unwrap();
        assert_eq!(expr.render(), "and(eq(x,1),gt(y,2))");
    }

    #[test]
    fn test_mixed_value_kinds() {
        let expr = Expr::from_lookups::<&str, Value, _>([
            ("age__ge", 18.into()),
            ("tags__out", vec!["spam"].into()),
            ("active", true.into()),
        ])
        .unwrap();
        assert_eq!(
            expr.render(),
            "and(ge(age,18),out(tags,(spam)),eq(active,true))"
        );
    }

    #[test]
    fn test_bad_lookup_value_fails() {
        let err = Expr::from_lookups([("status__in", "a")]).unwrap_err();
        assert!(matches!(err, RqlError::TypeKind { .. }));
    }

    #[test]
    fn test_no_lookups_is_empty() {
        let expr = Expr::from_lookups(Vec::<(&str, &str)>::new()).unwrap();
        assert!(expr.is_empty());
    }
}
