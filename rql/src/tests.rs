use super::{field, parse_query, render_query, Expr, RqlError, Term};

fn r(name: &str, value: &str) -> Expr {
    Expr::from_lookups([(name, value)]).unwrap()
}

#[test]
fn test_negated_lookup() {
    assert_eq!((!r("field", "x")).render(), "not(eq(field,x))");
}

#[test]
fn test_negated_conjunction() {
    let expr = !(r("a", "1") & r("b", "2"));
    assert_eq!(expr.render(), "not(and(eq(a,1),eq(b,2)))");
}

#[test]
fn test_identity_over_varied_shapes() {
    let shapes = vec![
        r("a", "1"),
        r("a", "1") & r("b", "2"),
        r("a", "1") | r("b", "2"),
        !(r("a", "1") | r("b", "2")),
    ];
    for a in shapes {
        assert_eq!(&a & &a, a);
        assert_eq!(&a | &a, a);
        assert_eq!(&a & &Expr::empty(), a);
        assert_eq!(&a | &Expr::empty(), a);
    }
}

#[test]
fn test_or_flattening() {
    let expr = (r("a", "1") | r("b", "2")) | (r("c", "3") | r("d", "4"));
    assert_eq!(expr.render(), "or(eq(a,1),eq(b,2),eq(c,3),eq(d,4))");
}

#[test]
fn test_field_builder_and_lookup_agree() {
    let built = field("author.name").ilike("jo*").unwrap();
    let looked_up = Expr::from_lookups([("author__name__ilike", "jo*")]).unwrap();
    assert_eq!(built, looked_up);
}

#[test]
fn test_rendered_expression_parses() {
    let expr = (field("status").in_(["new", "open"]).unwrap()
        | field("owner").null(true).unwrap())
        & !field("priority").lt(3).unwrap();
    let text = expr.render();
    assert_eq!(
        text,
        "and(or(in(status,(new,open)),eq(owner,null())),not(lt(priority,3)))"
    );

    let terms = parse_query(&text).unwrap();
    assert_eq!(terms.len(), 1);
    assert_eq!(terms[0].name(), Some("and"));
    assert_eq!(render_query(&terms), text);
}

#[test]
fn test_group_term_round_trip() {
    let terms = parse_query("out(tags,(a,b,c))").unwrap();
    let Term::Call { args, .. } = &terms[0] else {
        panic!("expected call");
    };
    assert!(matches!(&args[1], Term::Group(items) if items.len() == 3));
}

#[test]
fn test_error_messages() {
    let err = field("x").in_(5).unwrap_err();
    assert_eq!(err.to_string(), "Operator in does not accept integer values");
    let err = field("").eq("a").unwrap_err();
    assert!(matches!(err, RqlError::InvalidField(_)));
}
