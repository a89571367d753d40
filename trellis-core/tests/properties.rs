//! Property Tests for List Reconciliation
//!
//! Random mutation sequences are applied incrementally and compared against
//! a fresh render of the resulting data.

use proptest::prelude::*;
use serde_json::{json, Value};

use trellis_core::render::{Fragment, FragmentId};
use trellis_core::template::{Descriptor, SectionDescriptor};
use trellis_core::{Mutation, RenderOptions, Reorder, Template, View};

/// Rows followed by a static footer, so insertions have a sibling to respect.
fn template() -> Template {
    Template::new(vec![Descriptor::element(
        "ul",
        vec![
            SectionDescriptor::new("items")
                .index_ref("i")
                .children(vec![Descriptor::element(
                    "li",
                    vec![
                        Descriptor::interpolator("i"),
                        Descriptor::text(":"),
                        Descriptor::interpolator("."),
                    ],
                )])
                .into(),
            Descriptor::element("li", vec![Descriptor::text("end")]),
        ],
    )])
}

fn fragment_ids(view: &View) -> Vec<FragmentId> {
    let id = view.sections_bound_to("items")[0];
    view.section(id)
        .map(|section| section.fragments().iter().map(Fragment::id).collect())
        .unwrap_or_default()
}

fn item() -> impl Strategy<Value = Value> {
    "[a-z]{1,3}".prop_map(Value::from)
}

fn items() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(item(), 0..4)
}

fn mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        items().prop_map(Mutation::Append),
        Just(Mutation::RemoveLast),
        Just(Mutation::RemoveFirst),
        items().prop_map(Mutation::Prepend),
        (-8i64..8, prop::option::of(0usize..5), items()).prop_map(
            |(start, delete_count, items)| Mutation::Splice {
                start,
                delete_count,
                items,
            }
        ),
        Just(Mutation::Reorder(Reorder::Sort)),
        Just(Mutation::Reorder(Reorder::Reverse)),
    ]
}

proptest! {
    /// Incremental updates produce the same output as rendering from scratch,
    /// and only the fragments a splice covers are created or destroyed.
    #[test]
    fn incremental_matches_fresh_render(
        initial in prop::collection::vec(item(), 0..6),
        mutations in prop::collection::vec(mutation(), 1..12),
    ) {
        let mut view = View::new(
            template(),
            json!({ "items": initial }),
            RenderOptions::default().verified(),
        )
        .unwrap();

        for mutation in mutations {
            let len = view.data()["items"].as_array().map_or(0, Vec::len);
            let before = fragment_ids(&view);
            let splice = mutation.to_splice(len);

            view.mutate("items", mutation).unwrap();

            let after = fragment_ids(&view);
            let data_len = view.data()["items"].as_array().map_or(0, Vec::len);
            prop_assert_eq!(after.len(), data_len);

            match splice {
                Some(splice) if splice.balance() != 0 => {
                    let pivot = splice.start + splice.added.min(splice.removed);
                    prop_assert_eq!(&after[..pivot], &before[..pivot]);
                    prop_assert_eq!(
                        &after[splice.start + splice.added..],
                        &before[splice.start + splice.removed..]
                    );
                }
                _ => prop_assert_eq!(&after, &before),
            }

            let fresh = View::new(template(), view.data().clone(), RenderOptions::default()).unwrap();
            prop_assert_eq!(view.html(), fresh.html());
            prop_assert_eq!(view.to_html(), view.html());
            prop_assert!(view.verify().is_ok());
        }
    }

    /// Every insertion reaches the tree in at most one operation.
    #[test]
    fn at_most_one_commit_per_mutation(
        initial in prop::collection::vec(item(), 0..6),
        mutation in mutation(),
    ) {
        let mut view = View::new(template(), json!({ "items": initial }), RenderOptions::default()).unwrap();
        view.mutate("items", mutation).unwrap();
        prop_assert!(view.take_stats().commits <= 1);
    }
}
