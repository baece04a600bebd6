//! Property tests for reaction counters and fetch reconciliation.

#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]

use bulletin_app::slices::notifications::reconcile_fetched;
use bulletin_app::{
    Notification, NotificationPatch, PostsAction, PostsState, ReactionKind, Slice,
};
use bulletin_core::EntityCollection;
use bulletin_testkit::{notification, post};
use proptest::prelude::*;
use std::sync::Arc;

fn kind_strategy() -> impl Strategy<Value = ReactionKind> {
    prop::sample::select(ReactionKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn test_reactions_increase_by_exactly_the_number_added(
        clicks in prop::collection::vec((0usize..3, kind_strategy()), 0..60)
    ) {
        let ids = ["p0", "p1", "p2"];
        let mut state = Arc::new(PostsState::with_posts(
            ids.iter().map(|id| post(id, "u1", "2024-01-01T00:00:00Z")),
        ));
        let mut expected = [[0u32; 5]; 3];

        for (target, kind) in &clicks {
            let action = PostsAction::reaction_added(ids[*target], kind.name()).unwrap();
            state = PostsState::reduce(&state, action).unwrap();
            let slot = ReactionKind::ALL.iter().position(|k| k == kind).unwrap();
            expected[*target][slot] += 1;
        }

        for (index, id) in ids.iter().enumerate() {
            let reactions = state.posts().get(&(*id).into()).unwrap().reactions;
            for (slot, kind) in ReactionKind::ALL.iter().enumerate() {
                prop_assert_eq!(reactions.count(*kind), expected[index][slot]);
            }
        }
        prop_assert!(state.posts().is_ordered());
    }

    #[test]
    fn test_reconciliation_marks_read_as_not_new(
        held in prop::collection::vec((any::<bool>(), any::<bool>()), 0..10),
        incoming in prop::collection::vec(0usize..15, 0..5),
    ) {
        let mut collection = EntityCollection::sorted_by(Notification::newest_first);
        collection.set_all(held.iter().enumerate().map(|(i, (read, is_new))| {
            let date = format!("2024-01-01T00:00:{i:02}Z");
            notification(&format!("n{i}"), "u1", &date, *read, *is_new)
        }));

        let batch: Vec<NotificationPatch> = incoming
            .iter()
            .map(|i| NotificationPatch::from(notification(
                &format!("n{i}"), "u2", &format!("2024-02-01T00:00:{i:02}Z"), false, true,
            )))
            .collect();
        let touched: std::collections::HashSet<String> =
            incoming.iter().map(|i| format!("n{i}")).collect();

        reconcile_fetched(&mut collection, batch).unwrap();

        for n in collection.iter() {
            if touched.contains(n.id.as_str()) {
                prop_assert!(!n.read && n.is_new);
            } else {
                prop_assert_eq!(n.is_new, !n.read);
            }
        }
        prop_assert!(collection.is_ordered());
    }
}
