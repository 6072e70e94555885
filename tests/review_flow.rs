use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use recall_scheduler::scheduler::config::{MasteryConfig, PriorityPolicy};
use recall_scheduler::scheduler::ReviewPlanner;
use recall_scheduler::store::operations::items::{ItemFilter, KnowledgeItem};
use recall_scheduler::store::operations::reviews::ReviewInput;
use recall_scheduler::store::{Store, StoreError};

struct TestStore {
    store: Store,
    _temp_dir: TempDir,
}

fn open_store() -> TestStore {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let path = temp_dir.path().join("recall-test.sled");
    let store = Store::open(&path.to_string_lossy()).expect("open store");
    TestStore {
        store,
        _temp_dir: temp_dir,
    }
}

fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap() + Duration::days(n)
}

fn add(store: &Store, id: &str, at: DateTime<Utc>) {
    store
        .create_item(&KnowledgeItem::new(id, id, None, at))
        .expect("create item");
}

#[test]
fn create_get_and_conflict() {
    let t = open_store();
    add(&t.store, "borrowck", day(0));

    let item = t.store.get_item("borrowck").unwrap().expect("item exists");
    assert_eq!(item.retention.ease_factor, 2.5);
    assert_eq!(item.retention.next_review_date, day(0));

    let err = t
        .store
        .create_item(&KnowledgeItem::new("borrowck", "again", None, day(0)))
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));
    assert!(t.store.get_item("missing").unwrap().is_none());
}

#[test]
fn review_updates_item_and_history() {
    let t = open_store();
    let mastery = MasteryConfig::default();
    add(&t.store, "lifetimes", day(0));

    let input = ReviewInput {
        time_spent_seconds: Some(40),
        notes: Some("first pass".to_string()),
    };
    let first = t
        .store
        .record_review("lifetimes", 4, &input, day(0), &mastery)
        .unwrap();
    assert_eq!(first.interval_before, 0);
    assert_eq!(first.interval_after, 1);
    assert_eq!(first.time_spent_seconds, Some(40));

    let second = t
        .store
        .record_review("lifetimes", 4, &ReviewInput::default(), day(1), &mastery)
        .unwrap();
    assert_eq!(second.interval_after, 6);

    let item = t.store.get_item("lifetimes").unwrap().unwrap();
    assert_eq!(item.retention.repetitions, 2);
    assert_eq!(item.retention.next_review_date, day(7));
    assert_eq!(item.updated_at, day(1));

    let history = t.store.review_history("lifetimes", 10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id);
    assert_eq!(history[1].id, first.id);
    assert_eq!(t.store.review_history("lifetimes", 1).unwrap().len(), 1);
}

#[test]
fn review_of_missing_item_is_not_found() {
    let t = open_store();
    let err = t
        .store
        .record_review("ghost", 5, &ReviewInput::default(), day(0), &MasteryConfig::default())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn due_items_follow_the_due_index() {
    let t = open_store();
    let mastery = MasteryConfig::default();
    add(&t.store, "a", day(0));
    add(&t.store, "b", day(0));
    add(&t.store, "c", day(3));

    // a moves one day out, b lapses and also moves one day out but harder
    t.store
        .record_review("a", 4, &ReviewInput::default(), day(0), &mastery)
        .unwrap();
    t.store
        .record_review("b", 0, &ReviewInput::default(), day(0), &mastery)
        .unwrap();

    assert!(t.store.due_items(day(0), None).unwrap().is_empty());

    let due: Vec<String> = t
        .store
        .due_items(day(1), None)
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(due, vec!["b", "a"]);

    assert_eq!(t.store.due_items(day(5), Some(2)).unwrap().len(), 2);
    assert_eq!(t.store.due_items(day(5), None).unwrap().len(), 3);
}

#[test]
fn mastered_items_leave_the_plan() {
    let t = open_store();
    let mastery = MasteryConfig::default();
    add(&t.store, "traits", day(0));

    let mut at = day(0);
    for _ in 0..5 {
        t.store
            .record_review("traits", 5, &ReviewInput::default(), at, &mastery)
            .unwrap();
        at = t
            .store
            .get_item("traits")
            .unwrap()
            .unwrap()
            .retention
            .next_review_date;
    }

    let item = t.store.get_item("traits").unwrap().unwrap();
    assert_eq!(item.retention.repetitions, 5);
    assert!(item.retention.is_mastered);
    assert!(t.store.due_items(at, None).unwrap().is_empty());
    assert!(t.store.item_due_index.is_empty());

    // further reviews keep it out of the index
    t.store
        .record_review("traits", 1, &ReviewInput::default(), at, &mastery)
        .unwrap();
    assert!(t.store.item_due_index.is_empty());
    assert!(t.store.due_items(at + Duration::days(3650), None).unwrap().is_empty());
}

#[test]
fn review_refuses_invalid_stored_state() {
    let t = open_store();
    let mut item = KnowledgeItem::new("corrupt", "corrupt", None, day(0));
    item.retention.ease_factor = 1.0;
    t.store
        .items
        .insert("corrupt", serde_json::to_vec(&item).unwrap())
        .unwrap();

    let err = t
        .store
        .record_review("corrupt", 5, &ReviewInput::default(), day(0), &MasteryConfig::default())
        .unwrap_err();
    assert!(matches!(err, StoreError::Scheduler(_)));

    let stored = t.store.get_item("corrupt").unwrap().unwrap();
    assert_eq!(stored.retention.ease_factor, 1.0);
    assert_eq!(stored.retention.repetitions, 0);
    assert!(t.store.review_history("corrupt", 10).unwrap().is_empty());
}

#[test]
fn daily_plan_and_stats() {
    let t = open_store();
    let mastery = MasteryConfig::default();
    add(&t.store, "x", day(0));
    add(&t.store, "y", day(0));
    add(&t.store, "z", day(10));

    t.store
        .record_review("x", 2, &ReviewInput::default(), day(0), &mastery)
        .unwrap();

    let plan = t.store.daily_plan(day(0), &ReviewPlanner::default()).unwrap();
    assert_eq!(plan.date, day(0));
    assert_eq!(plan.total_reviews, 1);
    assert_eq!(plan.reviews_by_priority.high, vec!["y"]);
    // fresh item: round(5 - 0 + 1.0) = 6
    assert_eq!(plan.estimated_time_minutes, 6);

    let reference = ReviewPlanner::new(PriorityPolicy::ReferenceWindow);
    let plan = t.store.daily_plan(day(1), &reference).unwrap();
    assert_eq!(plan.total_reviews, 2);
    assert_eq!(plan.reviews_by_priority.high.len(), 2);

    let stats = t.store.review_stats(day(0)).unwrap();
    assert_eq!(stats.due_reviews, 1);
    assert_eq!(stats.reviewed_today, 1);
    assert_eq!(stats.average_quality, 2.0);
}

#[test]
fn delete_removes_item_and_history() {
    let t = open_store();
    add(&t.store, "gone", day(0));
    t.store
        .record_review("gone", 3, &ReviewInput::default(), day(0), &MasteryConfig::default())
        .unwrap();

    assert!(t.store.delete_item("gone").unwrap());
    assert!(!t.store.delete_item("gone").unwrap());
    assert!(t.store.get_item("gone").unwrap().is_none());
    assert!(t.store.review_history("gone", 10).unwrap().is_empty());
    assert!(t.store.due_items(day(30), None).unwrap().is_empty());
    assert!(t.store.list_items(&ItemFilter::default()).unwrap().is_empty());
    assert!(t.store.reviews.is_empty());
    assert!(t.store.item_due_index.is_empty());
}

#[test]
fn delete_leaves_other_histories_alone() {
    let t = open_store();
    let mastery = MasteryConfig::default();
    add(&t.store, "keep", day(0));
    add(&t.store, "drop", day(0));
    for id in ["keep", "drop", "drop"] {
        t.store
            .record_review(id, 4, &ReviewInput::default(), day(0), &mastery)
            .unwrap();
    }

    assert!(t.store.delete_item("drop").unwrap());
    assert_eq!(t.store.reviews.len(), 1);
    assert_eq!(t.store.review_history("keep", 10).unwrap().len(), 1);

    let err = t
        .store
        .record_review("drop", 4, &ReviewInput::default(), day(1), &mastery)
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert_eq!(t.store.reviews.len(), 1);
}

#[test]
fn list_items_filters_and_pages() {
    let t = open_store();
    let rust = |id: &str, at| {
        KnowledgeItem::new(id, id, Some("rust".to_string()), at)
            .with_content(format!("notes on {id}"))
            .with_tags(["lang", id])
    };
    t.store.create_item(&rust("ownership", day(0))).unwrap();
    t.store.create_item(&rust("traits", day(1))).unwrap();
    t.store.create_item(&rust("macros", day(2))).unwrap();
    add(&t.store, "sql", day(3));

    let mut mastered = rust("closures", day(4));
    mastered.retention.is_mastered = true;
    t.store.create_item(&mastered).unwrap();
    // mastered items never enter the due index
    assert_eq!(t.store.item_due_index.len(), 4);

    let ids = |filter: ItemFilter| -> Vec<String> {
        t.store
            .list_items(&filter)
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect()
    };

    assert_eq!(
        ids(ItemFilter::default()),
        vec!["closures", "sql", "macros", "traits", "ownership"]
    );
    assert_eq!(
        ids(ItemFilter {
            category: Some("rust".to_string()),
            is_mastered: Some(false),
            ..ItemFilter::default()
        }),
        vec!["macros", "traits", "ownership"]
    );
    assert_eq!(
        ids(ItemFilter {
            tag: Some("traits".to_string()),
            ..ItemFilter::default()
        }),
        vec!["traits"]
    );
    assert_eq!(
        ids(ItemFilter {
            is_mastered: Some(true),
            ..ItemFilter::default()
        }),
        vec!["closures"]
    );
    assert_eq!(
        ids(ItemFilter {
            skip: 1,
            limit: 2,
            ..ItemFilter::default()
        }),
        vec!["sql", "macros"]
    );

    let stored = t.store.get_item("macros").unwrap().unwrap();
    assert_eq!(stored.content, "notes on macros");
    assert_eq!(stored.tags, vec!["lang", "macros"]);
}

#[test]
fn ids_with_separator_are_rejected() {
    let t = open_store();
    let err = t
        .store
        .create_item(&KnowledgeItem::new("a:b", "bad", None, day(0)))
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}
