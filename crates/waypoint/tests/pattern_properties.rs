//! Property tests for pattern comparison and matching.

use proptest::prelude::*;
use waypoint::{PathParams, Pattern};

#[derive(Debug, Clone)]
enum Part {
    Literal(String),
    Var,
    Digits,
}

fn part() -> impl Strategy<Value = Part> {
    prop_oneof![
        "[a-c]{1,3}".prop_map(Part::Literal),
        Just(Part::Var),
        Just(Part::Digits),
    ]
}

fn parts() -> impl Strategy<Value = Vec<Part>> {
    prop::collection::vec(part(), 0..5)
}

/// Renders parts as a pattern, naming variables `{prefix}{index}`.
fn render(parts: &[Part], prefix: &str) -> String {
    let rendered: Vec<String> = parts
        .iter()
        .enumerate()
        .map(|(i, part)| match part {
            Part::Literal(text) => text.clone(),
            Part::Var => format!("{{{prefix}{i}}}"),
            Part::Digits => format!("{{{prefix}{i}>\\d+}}"),
        })
        .collect();
    format!("/{}", rendered.join("/"))
}

/// Renders parts with no separators, so literals and variables share path
/// segments (`/a{v0}b`).
fn render_packed(parts: &[Part]) -> String {
    let rendered: String = parts
        .iter()
        .enumerate()
        .map(|(i, part)| match part {
            Part::Literal(text) => text.clone(),
            Part::Var => format!("{{v{i}}}"),
            Part::Digits => format!("{{v{i}>\\d+}}"),
        })
        .collect();
    format!("/{rendered}")
}

fn packed_parts() -> impl Strategy<Value = Vec<Part>> {
    prop::collection::vec(
        prop_oneof![
            "[ab/]{1,2}".prop_map(Part::Literal),
            Just(Part::Var),
            Just(Part::Digits),
        ],
        0..5,
    )
}

fn pattern(parts: &[Part], prefix: &str) -> Pattern {
    Pattern::parse(&render(parts, prefix)).unwrap()
}

proptest! {
    #[test]
    fn prop_equals_is_reflexive(parts in parts()) {
        let p = pattern(&parts, "v");
        prop_assert!(p.equals(&p));
    }

    #[test]
    fn prop_equals_ignores_variable_names(parts in parts()) {
        let p = pattern(&parts, "v");
        let q = pattern(&parts, "w");
        prop_assert!(p.equals(&q));
        prop_assert!(q.equals(&p));
    }

    #[test]
    fn prop_equals_is_symmetric(a in parts(), b in parts()) {
        let p = pattern(&a, "v");
        let q = pattern(&b, "v");
        prop_assert_eq!(p.equals(&q), q.equals(&p));
    }

    #[test]
    fn prop_specificity_is_irreflexive(parts in parts()) {
        let p = pattern(&parts, "v");
        prop_assert!(!p.is_more_specific_than(&p));
        prop_assert!(!p.is_more_specific_than(&pattern(&parts, "w")));
    }

    #[test]
    fn prop_specificity_is_asymmetric(a in parts(), b in parts()) {
        let p = pattern(&a, "v");
        let q = pattern(&b, "v");
        prop_assert_eq!(p.specificity(&q), q.specificity(&p).map(|o| o.reverse()));
        prop_assert!(!(p.is_more_specific_than(&q) && q.is_more_specific_than(&p)));
    }

    #[test]
    fn prop_specificity_is_transitive(
        a in packed_parts(),
        b in packed_parts(),
        c in packed_parts(),
    ) {
        let p = Pattern::parse(&render_packed(&a)).unwrap();
        let q = Pattern::parse(&render_packed(&b)).unwrap();
        let r = Pattern::parse(&render_packed(&c)).unwrap();
        let orders = [
            (&p, &q, &r),
            (&q, &r, &p),
            (&r, &p, &q),
            (&p, &r, &q),
            (&q, &p, &r),
            (&r, &q, &p),
        ];
        for (x, y, z) in orders {
            if x.is_more_specific_than(y) && y.is_more_specific_than(z) {
                prop_assert!(
                    x.is_more_specific_than(z),
                    "{} < {} < {} but not {} < {}", x, y, z, x, z
                );
            }
        }
    }

    #[test]
    fn prop_transitivity_holds_for_separated_parts(a in parts(), b in parts(), c in parts()) {
        let (p, q, r) = (pattern(&a, "v"), pattern(&b, "v"), pattern(&c, "v"));
        if p.is_more_specific_than(&q) && q.is_more_specific_than(&r) {
            prop_assert!(p.is_more_specific_than(&r));
        }
    }

    #[test]
    fn prop_generate_then_match_recovers_values(
        prefix in "[a-z]{1,4}",
        values in prop::collection::vec("[A-Za-z0-9_.~-]{1,8}", 1..4),
    ) {
        let template: Vec<String> = (0..values.len()).map(|i| format!("{{v{i}}}")).collect();
        let p = Pattern::parse(&format!("/{prefix}/{}", template.join("/"))).unwrap();

        let params: PathParams = values
            .iter()
            .enumerate()
            .map(|(i, value)| (format!("v{i}"), value.clone()))
            .collect();
        let path = p.generate(&params).unwrap();
        let matched = p.match_path(&path).unwrap();
        prop_assert_eq!(matched, params);
    }

    #[test]
    fn prop_digit_variables_round_trip(n in any::<u32>()) {
        let p = Pattern::parse("/items/{id>\\d+}").unwrap();
        let params: PathParams = [("id", n.to_string())].into_iter().collect();
        let path = p.generate(&params).unwrap();
        prop_assert_eq!(path.clone(), format!("/items/{n}"));
        let matched = p.match_path(&path).unwrap();
        prop_assert_eq!(matched, params);
    }
}
