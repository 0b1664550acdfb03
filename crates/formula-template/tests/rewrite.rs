use std::collections::BTreeSet;

use formula_ptg::{
    render_ptgs, AreaPtg, AttrPtg, FuncVarPtg, OperandClass, Operator, Ptg, Ref3dPtg, RefPtg,
    SheetScope, FUNCTION_ID_SUM,
};
use formula_template::{
    resolve_rows, rewrite_formula, rewrite_formulas, ExpansionCount, RewriteError,
    RewriteOptions, Row, RowExpansionMap,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn r(row: u32, col: u32) -> Ptg {
    Ptg::Ref(RefPtg::new(row, col))
}

fn rows(nums: &[u32]) -> Vec<Row> {
    nums.iter().copied().map(Row::new).collect()
}

fn watch(rows: &[u32]) -> BTreeSet<u32> {
    rows.iter().copied().collect()
}

fn map(entries: &[(u32, &[u32])]) -> RowExpansionMap {
    entries
        .iter()
        .map(|&(template, targets)| (template, rows(targets)))
        .collect()
}

fn sum(n: u8) -> Ptg {
    Ptg::FuncVar(FuncVarPtg {
        id: FUNCTION_ID_SUM,
        arg_count: n,
        class: OperandClass::Value,
    })
}

#[test]
fn single_target_moves_the_reference() {
    let mut cell = RefPtg::new(5, 2);
    cell.col_relative = false;
    let out = rewrite_formula(
        &[Ptg::Ref(cell)],
        &watch(&[5]),
        &[&map(&[(5, &[7])])],
        &RewriteOptions::default(),
    )
    .expect("rewrite");

    assert_eq!(out.ptgs, vec![Ptg::Ref(RefPtg { row: 7, ..cell })]);
    assert_eq!(out.expansion_count, ExpansionCount::Rewritten(1));
    assert!(out.changed);
}

#[test]
fn parenthesized_reference_becomes_a_list() {
    // (A1)+A2 with row 0 materialized as rows 0..=2.
    let ptgs = vec![r(0, 0), Ptg::Paren, r(1, 0), Ptg::Op(Operator::Add)];
    let out = rewrite_formula(
        &ptgs,
        &watch(&[0]),
        &[&map(&[(0, &[0, 1, 2])])],
        &RewriteOptions::default(),
    )
    .expect("rewrite");

    assert_eq!(
        out.ptgs,
        vec![
            r(0, 0),
            Ptg::Paren,
            r(1, 0),
            Ptg::Paren,
            r(2, 0),
            Ptg::Paren,
            r(1, 0),
            Ptg::Op(Operator::Add),
        ]
    );
}

#[test]
fn sum_shorthand_takes_the_expanded_operands() {
    let ptgs = vec![r(0, 0), Ptg::Paren, Ptg::Attr(AttrPtg::Sum)];
    let out = rewrite_formula(
        &ptgs,
        &watch(&[0]),
        &[&map(&[(0, &[0, 1, 2])])],
        &RewriteOptions::default(),
    )
    .expect("rewrite");

    assert_eq!(out.ptgs.last(), Some(&sum(3)));
    assert_eq!(
        render_ptgs(&out.ptgs).expect("render"),
        "SUM((A1),(A2),(A3))"
    );
}

#[test]
fn ranges_expand_inside_sum() {
    let ptgs = vec![
        Ptg::Area(AreaPtg::new(0, 0, 0, 1)),
        Ptg::Paren,
        Ptg::Attr(AttrPtg::Sum),
    ];
    let out = rewrite_formula(
        &ptgs,
        &watch(&[0]),
        &[&map(&[(0, &[0, 1])])],
        &RewriteOptions::default(),
    )
    .expect("rewrite");

    assert_eq!(
        out.ptgs,
        vec![
            Ptg::Area(AreaPtg::new(0, 0, 0, 1)),
            Ptg::Paren,
            Ptg::Area(AreaPtg::new(1, 0, 1, 1)),
            Ptg::Paren,
            sum(2),
        ]
    );
    assert_eq!(
        render_ptgs(&out.ptgs).expect("render"),
        "SUM((A1:B1),(A2:B2))"
    );
}

#[test]
fn cross_sheet_references_pass_through() {
    let ptgs = vec![
        Ptg::Ref3d(Ref3dPtg {
            sheet: SheetScope::named("Data"),
            cell: RefPtg::new(5, 0),
        }),
        Ptg::Paren,
        Ptg::Attr(AttrPtg::Sum),
    ];
    let out = rewrite_formula(
        &ptgs,
        &watch(&[5]),
        &[&map(&[(5, &[5, 6, 7])])],
        &RewriteOptions::strict(),
    )
    .expect("rewrite");

    assert_eq!(out.ptgs, ptgs);
    assert_eq!(out.expansion_count, ExpansionCount::Initial);
    assert!(!out.changed);
}

#[test]
fn watched_row_without_entries_is_left_alone() {
    let ptgs = vec![r(5, 0), Ptg::Paren, Ptg::Attr(AttrPtg::Sum)];
    let out = rewrite_formula(
        &ptgs,
        &watch(&[5]),
        &[&map(&[(4, &[8, 9])])],
        &RewriteOptions::default(),
    )
    .expect("rewrite");

    assert_eq!(out.ptgs, ptgs);
    assert_eq!(out.expansion_count, ExpansionCount::Unchanged);
    assert!(!out.changed);
}

#[test]
fn variadic_function_count_is_replaced() {
    // MAX((A1)) where the parser recorded one operand.
    let ptgs = vec![
        r(0, 0),
        Ptg::Paren,
        Ptg::FuncVar(FuncVarPtg::create("MAX", 1).expect("MAX")),
    ];
    let out = rewrite_formula(
        &ptgs,
        &watch(&[0]),
        &[&map(&[(0, &[0, 1, 2, 3])])],
        &RewriteOptions::default(),
    )
    .expect("rewrite");

    assert_eq!(
        render_ptgs(&out.ptgs).expect("render"),
        "MAX((A1),(A2),(A3),(A4))"
    );
}

#[test]
fn unparenthesized_reference_is_narrowed_by_default() {
    let ptgs = vec![r(0, 0), r(0, 1), Ptg::Op(Operator::Add)];
    let maps = map(&[(0, &[3, 4, 5])]);

    let out = rewrite_formula(&ptgs, &watch(&[0]), &[&maps], &RewriteOptions::default())
        .expect("rewrite");
    assert_eq!(out.ptgs, vec![r(3, 0), r(3, 1), Ptg::Op(Operator::Add)]);
    assert_eq!(out.expansion_count, ExpansionCount::Rewritten(1));

    let err =
        rewrite_formula(&ptgs, &watch(&[0]), &[&maps], &RewriteOptions::strict()).unwrap_err();
    assert_eq!(
        err,
        RewriteError::ParenthesisConventionViolated {
            position: 0,
            template_row: 0,
            targets: 3,
        }
    );
}

#[test]
fn operator_chain_sums_each_reference_in_place() {
    let ptgs = vec![r(0, 0), r(0, 1), Ptg::Op(Operator::Add)];
    let options = RewriteOptions {
        operator_chain: true,
        ..RewriteOptions::strict()
    };
    let out = rewrite_formula(&ptgs, &watch(&[0]), &[&map(&[(0, &[0, 1, 2])])], &options)
        .expect("rewrite");

    assert_eq!(out.ptgs.len(), 11);
    assert_eq!(
        render_ptgs(&out.ptgs).expect("render"),
        "A1+A2+A3+B1+B2+B3"
    );
}

#[test]
fn operator_chain_does_not_apply_to_ranges() {
    let ptgs = vec![
        Ptg::Area(AreaPtg::new(0, 0, 0, 1)),
        Ptg::Int(1),
        Ptg::Op(Operator::Add),
    ];
    let options = RewriteOptions {
        operator_chain: true,
        ..RewriteOptions::strict()
    };
    let err = rewrite_formula(&ptgs, &watch(&[0]), &[&map(&[(0, &[0, 1])])], &options)
        .unwrap_err();
    assert_eq!(err.position(), Some(0));
}

#[test]
fn rows_from_several_maps_are_merged() {
    let outer = map(&[(2, &[2, 3])]);
    let inner = map(&[(2, &[3, 4])]);
    let ptgs = vec![r(2, 0), Ptg::Paren, Ptg::Attr(AttrPtg::Sum)];

    let out = rewrite_formula(
        &ptgs,
        &watch(&[2]),
        &[&outer, &inner],
        &RewriteOptions::default(),
    )
    .expect("rewrite");
    assert_eq!(
        render_ptgs(&out.ptgs).expect("render"),
        "SUM((A3),(A4),(A5))"
    );
}

#[test]
fn batch_keeps_input_order() {
    let maps = map(&[(0, &[0, 1]), (3, &[6])]);
    let formulas: Vec<Vec<Ptg>> = (0..64)
        .map(|i| match i % 3 {
            0 => vec![r(0, i), Ptg::Paren, Ptg::Attr(AttrPtg::Sum)],
            1 => vec![r(3, i)],
            _ => vec![r(9, i), Ptg::Int(1), Ptg::Op(Operator::Add)],
        })
        .collect();
    let watch = watch(&[0, 3]);
    let options = RewriteOptions::default();

    let batch = rewrite_formulas(&formulas, &watch, &[&maps], &options).expect("batch");
    let one_by_one: Vec<_> = formulas
        .iter()
        .map(|ptgs| rewrite_formula(ptgs, &watch, &[&maps], &options).expect("rewrite"))
        .collect();
    assert_eq!(batch, one_by_one);
    assert_eq!(batch.iter().filter(|o| o.changed).count(), 43);
}

fn reference() -> impl Strategy<Value = Ptg> {
    (0u32..32, 0u32..8).prop_map(|(row, col)| r(row, col))
}

fn formula_ptg() -> impl Strategy<Value = Ptg> {
    prop_oneof![
        reference(),
        (0u32..32, 0u32..8, 0u32..4).prop_map(|(row, col, height)| {
            Ptg::Area(AreaPtg::new(row, col, row + height, col))
        }),
        Just(Ptg::Paren),
        Just(Ptg::Op(Operator::Add)),
        Just(Ptg::Op(Operator::Mul)),
        Just(Ptg::Attr(AttrPtg::Sum)),
        (1u8..4).prop_map(|n| Ptg::FuncVar(FuncVarPtg::create("MAX", n).expect("MAX"))),
        any::<u16>().prop_map(Ptg::Int),
    ]
}

fn class() -> impl Strategy<Value = OperandClass> {
    prop_oneof![
        Just(OperandClass::Reference),
        Just(OperandClass::Value),
        Just(OperandClass::Array),
    ]
}

fn targets() -> impl Strategy<Value = Vec<Row>> {
    proptest::collection::btree_set(0u32..10_000, 2..24)
        .prop_map(|set| set.into_iter().map(Row::new).collect())
}

proptest! {
    #![proptest_config(ProptestConfig {
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn unwatched_formulas_are_untouched(
        ptgs in proptest::collection::vec(formula_ptg(), 0..24),
    ) {
        // Only rows 100.. are watched; the generated references stay below that.
        let maps = map(&[(100, &[100, 101, 102])]);
        let out = rewrite_formula(&ptgs, &watch(&[100]), &[&maps], &RewriteOptions::strict())
            .expect("rewrite");
        prop_assert_eq!(out.ptgs, ptgs);
        prop_assert!(!out.changed);
        prop_assert_eq!(out.expansion_count, ExpansionCount::Initial);
    }

    #[test]
    fn parenthesized_expansion_shape(targets in targets(), class in class(), col in 0u32..16) {
        let cell = RefPtg { class, ..RefPtg::new(0, col) };
        let ptgs = vec![Ptg::Ref(cell), Ptg::Paren, Ptg::Attr(AttrPtg::Sum)];
        let mut maps = RowExpansionMap::new();
        maps.insert(0, targets.clone());

        let out = rewrite_formula(&ptgs, &watch(&[0]), &[&maps], &RewriteOptions::default())
            .expect("rewrite");
        let n = targets.len();
        prop_assert_eq!(out.ptgs.len(), 2 * n - 1 + 2);
        prop_assert_eq!(out.expansion_count, ExpansionCount::Rewritten(n as u32));
        prop_assert_eq!(out.ptgs.last(), Some(&sum(n as u8)));

        let produced: Vec<&Ptg> = out.ptgs.iter().filter(|p| p.is_reference()).collect();
        prop_assert_eq!(produced.len(), n);
        for (ptg, target) in produced.into_iter().zip(&targets) {
            prop_assert_eq!(ptg, &Ptg::Ref(RefPtg { row: target.row_num(), ..cell }));
        }
    }

    #[test]
    fn ranges_keep_their_height(
        first in 0u32..1000,
        height in 0u32..50,
        targets in targets(),
    ) {
        let area = AreaPtg::new(first, 0, first + height, 3);
        let ptgs = vec![Ptg::Area(area), Ptg::Paren];
        let mut maps = RowExpansionMap::new();
        maps.insert(first, targets.clone());

        let out = rewrite_formula(&ptgs, &watch(&[first]), &[&maps], &RewriteOptions::default())
            .expect("rewrite");
        for (ptg, target) in out.ptgs.iter().filter(|p| p.is_reference()).zip(&targets) {
            let Ptg::Area(moved) = ptg else {
                return Err(TestCaseError::fail(format!("expected an area, got {ptg:?}")));
            };
            prop_assert_eq!(moved.first_row, target.row_num());
            prop_assert_eq!(moved.height(), area.height());
            prop_assert_eq!((moved.first_col, moved.last_col), (0, 3));
        }
    }

    #[test]
    fn merged_rows_start_with_first_list_and_never_repeat_later_rows(
        lists in proptest::collection::vec(proptest::collection::vec(0u32..20, 1..6), 1..5),
    ) {
        let maps: Vec<RowExpansionMap> = lists
            .iter()
            .map(|list| [(1, rows(list))].into_iter().collect())
            .collect();
        let refs: Vec<&RowExpansionMap> = maps.iter().collect();

        let merged = resolve_rows(1, &refs);
        let first = rows(&lists[0]);
        prop_assert_eq!(&merged[..first.len()], first.as_slice());
        for row in lists.iter().flatten() {
            prop_assert!(merged.contains(&Row::new(*row)));
        }
        let tail = &merged[first.len()..];
        for (i, row) in tail.iter().enumerate() {
            prop_assert!(!first.contains(row));
            prop_assert!(!tail[..i].contains(row));
        }
        prop_assert_eq!(resolve_rows(1, &refs), merged);
    }
}
