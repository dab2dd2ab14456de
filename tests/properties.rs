//! Property tests for facade invariants.

use proptest::prelude::*;
use record_facade::{
    ErrorKind, FieldSchema, LifecycleState, MemoryStore, RecordFacade, SchemaCatalog, TableSchema,
};

fn test_store() -> MemoryStore {
    MemoryStore::new(
        SchemaCatalog::new().with_table(
            TableSchema::new("task")
                .with_field(FieldSchema::new("name", "string"))
                .with_field(FieldSchema::new("priority", "integer")),
        ),
    )
}

#[derive(Clone, Debug)]
enum Step {
    Set(String),
    Insert,
    Update,
    Delete,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        "[a-z ]{0,12}".prop_map(Step::Set),
        Just(Step::Insert),
        Just(Step::Update),
        Just(Step::Delete),
    ]
}

proptest! {
    #[test]
    fn prop_lifecycle_never_moves_backwards(steps in prop::collection::vec(step(), 1..24)) {
        let store = test_store();
        let mut task = RecordFacade::new_for_table(&store, "task", false).unwrap();
        let mut expected = LifecycleState::Uncommitted;

        for step in steps {
            let result = match &step {
                Step::Set(text) => task.set_value("name", text.as_str()).map(|_| ()),
                Step::Insert => task.insert().map(|_| ()),
                Step::Update => task.update().map(|_| ()),
                Step::Delete => task.delete_record().map(|_| ()),
            };

            let legal = match (expected, &step) {
                (LifecycleState::Deleted, _) => false,
                (LifecycleState::Uncommitted, Step::Update | Step::Delete) => false,
                (LifecycleState::Committed, Step::Insert) => false,
                _ => true,
            };
            prop_assert_eq!(result.is_ok(), legal);
            if let Err(err) = result {
                prop_assert_eq!(err.kind(), ErrorKind::State);
            }

            expected = match (expected, &step) {
                (LifecycleState::Uncommitted, Step::Insert) => LifecycleState::Committed,
                (LifecycleState::Committed, Step::Delete) => LifecycleState::Deleted,
                (state, _) => state,
            };
            prop_assert_eq!(task.state(), expected);
        }

        let rows = if expected == LifecycleState::Committed { 1 } else { 0 };
        prop_assert_eq!(store.row_count("task"), rows);
    }

    #[test]
    fn prop_malformed_identifiers_never_reach_the_store(id in "\\PC{0,40}") {
        prop_assume!(!(id.len() == 32 && id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))));

        let store = test_store();
        let err = RecordFacade::fetch_for_table(&store, "task", &id, false).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Construction);
        prop_assert_eq!(store.stats().fetches, 0);
    }

    #[test]
    fn prop_well_formed_identifiers_are_fetched(id in "[0-9a-f]{32}") {
        let store = test_store();
        let task = RecordFacade::fetch_for_table(&store, "task", &id, false).unwrap();
        prop_assert!(!task.is_valid_record());
        prop_assert_eq!(store.stats().fetches, 1);
    }

    #[test]
    fn prop_field_validity_matches_accessors(field in "[ a-z_]{0,10}") {
        let store = test_store();
        let task = RecordFacade::new_for_table(&store, "task", false).unwrap();
        prop_assert_eq!(task.is_valid_field(&field), task.value(&field).is_ok());
        prop_assert_eq!(task.is_valid_field(&field), task.label(field.as_str()).is_ok());
    }
}
