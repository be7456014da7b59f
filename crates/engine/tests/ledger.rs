use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::{Duration, Instant},
};

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, TransactionTrait};

use engine::{
    ActivityEntry, CategorizedFilter, EditCategorizedCmd, EditFlowCmd, Engine, EngineError,
    FaultHook, FaultPoint, Money, RecordCategorizedCmd, RecordFlowCmd, RegisterMemberCmd,
    RoomStatus,
};
use migration::MigratorTrait;

async fn memory_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = memory_db().await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// A fresh SQLite file under `target/test_dbs`; returns its URL and path.
fn file_db_url() -> (String, std::path::PathBuf) {
    static NEXT: AtomicU32 = AtomicU32::new(0);
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();
    let path = root.join(format!(
        "ledger_{}_{}.db",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::SeqCst)
    ));
    let _ = std::fs::remove_file(&path);
    (format!("sqlite:{}?mode=rwc", path.display()), path)
}

async fn engine_with_file_db() -> (Engine, std::path::PathBuf) {
    let (url, path) = file_db_url();
    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    (engine, path)
}

/// Creates a room with one member and returns `(room_id, user_id)`.
async fn seed_room(engine: &Engine, email: &str) -> (i32, i32) {
    let room = engine.create_room("Flat 4B").await.unwrap();
    let member = engine
        .register_member(RegisterMemberCmd {
            full_name: " Alice Rossi ".to_string(),
            email: email.to_string(),
            password: "s3cret".to_string(),
            confirm_password: "s3cret".to_string(),
            room_id: room.id,
        })
        .await
        .unwrap();
    (room.id, member.id)
}

async fn balance(engine: &Engine, room_id: i32) -> Option<i64> {
    engine
        .room_balance(room_id)
        .await
        .unwrap()
        .map(|balance| balance.total.minor())
}

fn income(room_id: i32, user_id: i32, amount: i64) -> RecordCategorizedCmd {
    RecordCategorizedCmd::new(room_id, user_id, "Income", "Other", amount)
}

fn expense(room_id: i32, user_id: i32, amount: i64) -> RecordCategorizedCmd {
    RecordCategorizedCmd::new(room_id, user_id, "Expense", "Food", amount)
}

#[tokio::test]
async fn overdraft_is_rejected_and_balance_kept() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    let receipt = engine
        .record_categorized(income(room_id, user_id, 100))
        .await
        .unwrap();
    assert_eq!(receipt.new_total, Money::from_minor(100));

    let err = engine
        .record_categorized(expense(room_id, user_id, 150))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&engine, room_id).await, Some(100));

    let page = engine
        .list_categorized(&CategorizedFilter {
            room_id: Some(room_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn expense_on_a_fresh_room_is_an_overdraft() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    let err = engine
        .record_categorized(expense(room_id, user_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    // The lazily created balance row is rolled back with the rejection.
    assert_eq!(balance(&engine, room_id).await, None);
}

#[tokio::test]
async fn expense_equal_to_balance_is_allowed() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    engine
        .record_categorized(income(room_id, user_id, 100))
        .await
        .unwrap();
    let receipt = engine
        .record_categorized(expense(room_id, user_id, 100))
        .await
        .unwrap();
    assert_eq!(receipt.new_total, Money::ZERO);
    assert_eq!(receipt.record.net_contribution(), Money::from_minor(-100));
}

#[tokio::test]
async fn deleting_a_flow_subtracts_it_from_the_balance() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    let receipt = engine
        .record_income(RecordFlowCmd {
            room_id,
            user_id,
            amount_minor: 50,
        })
        .await
        .unwrap();
    // Flow writes never reach the balance.
    assert_eq!(balance(&engine, room_id).await, None);

    let outcome = engine.delete_flow(receipt.record.id).await.unwrap();
    assert_eq!(outcome.adjustment, Money::from_minor(50));
    assert_eq!(outcome.room_total, Money::from_minor(-50));
    assert_eq!(balance(&engine, room_id).await, Some(-50));

    let err = engine.delete_flow(receipt.record.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn editing_a_categorized_amount_applies_the_signed_delta() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    let receipt = engine
        .record_categorized(income(room_id, user_id, 100))
        .await
        .unwrap();
    let outcome = engine
        .edit_categorized(EditCategorizedCmd {
            id: receipt.record.id,
            amount_minor: 30,
        })
        .await
        .unwrap();
    assert_eq!(outcome.old.amount, Money::from_minor(100));
    assert_eq!(outcome.new.amount, Money::from_minor(30));
    assert_eq!(outcome.delta, Money::from_minor(-70));
    assert_eq!(outcome.room_total, Some(Money::from_minor(30)));
    assert_eq!(balance(&engine, room_id).await, Some(30));
}

#[tokio::test]
async fn editing_an_expense_flips_the_delta_sign() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    engine
        .record_categorized(income(room_id, user_id, 500))
        .await
        .unwrap();
    let spent = engine
        .record_categorized(expense(room_id, user_id, 200))
        .await
        .unwrap();
    let outcome = engine
        .edit_categorized(EditCategorizedCmd {
            id: spent.record.id,
            amount_minor: 50,
        })
        .await
        .unwrap();
    assert_eq!(outcome.delta, Money::from_minor(150));
    assert_eq!(balance(&engine, room_id).await, Some(450));
}

#[tokio::test]
async fn concurrent_writers_do_not_lose_updates() {
    let (engine, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    let mut handles = Vec::new();
    for i in 1..=16 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            loop {
                match engine.record_categorized(income(room_id, user_id, i)).await {
                    Ok(receipt) => break receipt,
                    Err(err) if err.is_retryable() => {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                    }
                    Err(err) => panic!("unexpected error: {err}"),
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let expected: i64 = (1..=16).sum();
    assert_eq!(balance(&engine, room_id).await, Some(expected));
    let audit = engine.audit_room_balance(room_id).await.unwrap();
    assert!(audit.drift.is_zero());

    drop(engine);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn balance_equals_signed_sum_of_categorized_records() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    let a = engine
        .record_categorized(income(room_id, user_id, 1_000))
        .await
        .unwrap();
    let b = engine
        .record_categorized(expense(room_id, user_id, 250))
        .await
        .unwrap();
    engine
        .record_categorized(income(room_id, user_id, 75))
        .await
        .unwrap();
    engine
        .edit_categorized(EditCategorizedCmd {
            id: a.record.id,
            amount_minor: 900,
        })
        .await
        .unwrap();
    engine
        .edit_categorized(EditCategorizedCmd {
            id: b.record.id,
            amount_minor: 300,
        })
        .await
        .unwrap();

    let page = engine
        .list_categorized(&CategorizedFilter {
            room_id: Some(room_id),
            ..Default::default()
        })
        .await
        .unwrap();
    let sum = Money::try_sum(page.items.iter().map(|r| r.net_contribution())).unwrap();
    assert_eq!(sum, Money::from_minor(675));
    assert_eq!(balance(&engine, room_id).await, Some(sum.minor()));

    let audit = engine.audit_room_balance(room_id).await.unwrap();
    assert_eq!(audit.stored, Some(sum));
    assert_eq!(audit.recomputed, sum);
    assert!(audit.drift.is_zero());
}

#[tokio::test]
async fn deleting_a_categorized_record_reverses_it() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    engine
        .record_categorized(income(room_id, user_id, 400))
        .await
        .unwrap();
    let spent = engine
        .record_categorized(expense(room_id, user_id, 100))
        .await
        .unwrap();

    let outcome = engine.delete_categorized(spent.record.id).await.unwrap();
    assert_eq!(outcome.adjustment, Money::from_minor(-100));
    assert_eq!(outcome.room_total, Money::from_minor(400));
    assert!(
        engine
            .audit_room_balance(room_id)
            .await
            .unwrap()
            .drift
            .is_zero()
    );
}

#[tokio::test]
async fn injected_failure_rolls_back_the_whole_unit() {
    let db = memory_db().await;
    let armed = Arc::new(AtomicBool::new(false));
    let hook: FaultHook = {
        let armed = Arc::clone(&armed);
        Arc::new(move |point| match point {
            FaultPoint::AfterLedgerWrite { .. } if armed.load(Ordering::SeqCst) => {
                Err(EngineError::Validation("injected".to_string()))
            }
            _ => Ok(()),
        })
    };
    let engine = Engine::builder()
        .database(db)
        .fault_hook(hook)
        .build()
        .await
        .unwrap();
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    let kept = engine
        .record_categorized(income(room_id, user_id, 100))
        .await
        .unwrap();
    let flow = engine
        .record_expense(RecordFlowCmd {
            room_id,
            user_id,
            amount_minor: 20,
        })
        .await
        .unwrap();
    armed.store(true, Ordering::SeqCst);

    let err = engine
        .record_categorized(income(room_id, user_id, 40))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Validation("injected".to_string()));
    assert!(
        engine
            .edit_categorized(EditCategorizedCmd {
                id: kept.record.id,
                amount_minor: 10,
            })
            .await
            .is_err()
    );
    assert!(engine.delete_categorized(kept.record.id).await.is_err());
    assert!(engine.delete_flow(flow.record.id).await.is_err());

    assert_eq!(balance(&engine, room_id).await, Some(100));
    let page = engine
        .list_categorized(&CategorizedFilter {
            room_id: Some(room_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].amount, Money::from_minor(100));
    assert_eq!(engine.list_room_activity(room_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn amounts_past_i64_are_rejected_and_rolled_back() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    engine
        .record_categorized(income(room_id, user_id, i64::MAX))
        .await
        .unwrap();
    let err = engine
        .record_categorized(income(room_id, user_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)), "got {err:?}");
    assert_eq!(balance(&engine, room_id).await, Some(i64::MAX));
    let page = engine
        .list_categorized(&CategorizedFilter {
            room_id: Some(room_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);

    let flow = |amount_minor| RecordFlowCmd {
        room_id,
        user_id,
        amount_minor,
    };
    engine.record_income(flow(i64::MAX)).await.unwrap();
    let err = engine.record_income(flow(1)).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)), "got {err:?}");
    let totals = engine.room_summary(room_id).await.unwrap();
    assert_eq!(totals.income, Money::from_minor(i64::MAX));

    // An edit that would push the expense total past i64 is refused too.
    let small = engine.record_expense(flow(5)).await.unwrap();
    engine.record_expense(flow(10)).await.unwrap();
    let err = engine
        .edit_flow(EditFlowCmd {
            id: small.record.id,
            income_minor: None,
            expense_minor: Some(i64::MAX),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)), "got {err:?}");
    let totals = engine.room_summary(room_id).await.unwrap();
    assert_eq!(totals.expense, Money::from_minor(15));

    // Deleting an expense adds it back to a balance already at i64::MAX.
    let err = engine.delete_flow(small.record.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)), "got {err:?}");
    assert_eq!(balance(&engine, room_id).await, Some(i64::MAX));
    assert_eq!(engine.list_room_activity(room_id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn schema_rejects_out_of_range_rows() {
    let (engine, db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;
    let stamp = "'2026-01-01 00:00:00+00:00'";

    let rejected = [
        format!(
            "INSERT INTO user_transactions (user_id, room_id, income, expense, updated_at) \
             VALUES ({user_id}, {room_id}, -1, 0, {stamp})"
        ),
        format!(
            "INSERT INTO other_transaction (user_id, room_id, kind, category, amount, note, updated_at) \
             VALUES ({user_id}, {room_id}, 'Income', 'Food', 0, '', {stamp})"
        ),
        format!(
            "INSERT INTO other_transaction (user_id, room_id, kind, category, amount, note, updated_at) \
             VALUES ({user_id}, {room_id}, 'Refund', 'Food', 5, '', {stamp})"
        ),
        format!(
            "INSERT INTO other_transaction (user_id, room_id, kind, category, amount, note, updated_at) \
             VALUES ({user_id}, {room_id}, 'Income', 'Travel', 5, '', {stamp})"
        ),
    ];
    for sql in &rejected {
        assert!(db.execute_unprepared(sql).await.is_err(), "{sql}");
    }

    db.execute_unprepared(&format!(
        "INSERT INTO other_transaction (user_id, room_id, kind, category, amount, note, updated_at) \
         VALUES ({user_id}, {room_id}, 'Income', 'Food', 5, '', {stamp})"
    ))
    .await
    .unwrap();
    assert_eq!(engine.list_room_activity(room_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn expired_transaction_is_rolled_back_as_timeout() {
    let (url, path) = file_db_url();
    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let setup = Engine::builder().database(db.clone()).build().await.unwrap();
    let (room_id, user_id) = seed_room(&setup, "alice@example.com").await;
    setup
        .record_categorized(income(room_id, user_id, 100))
        .await
        .unwrap();

    // Another pool takes the database write lock and keeps it past the
    // engine timeout, so the unit stays parked in SQLite's busy wait.
    let other = Database::connect(&url).await.unwrap();
    let blocker = other.begin().await.unwrap();
    blocker
        .execute_unprepared(&format!(
            "UPDATE room_balance SET total = total WHERE room_id = {room_id}"
        ))
        .await
        .unwrap();

    let engine = Engine::builder()
        .database(db)
        .tx_timeout(Duration::from_millis(200))
        .build()
        .await
        .unwrap();
    let started = Instant::now();
    let err = engine
        .record_categorized(income(room_id, user_id, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Timeout(_)), "got {err:?}");
    assert!(err.is_retryable());
    assert!(started.elapsed() < Duration::from_secs(3));

    blocker.rollback().await.unwrap();
    assert_eq!(balance(&setup, room_id).await, Some(100));
    let page = setup
        .list_categorized(&CategorizedFilter {
            room_id: Some(room_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);

    drop((engine, setup, other));
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn zero_timeout_is_rejected_by_the_builder() {
    let db = memory_db().await;
    let err = Engine::builder()
        .database(db)
        .tx_timeout(Duration::ZERO)
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn summaries_are_stable_and_ignore_the_balance() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, alice) = seed_room(&engine, "alice@example.com").await;
    let bob = engine
        .register_member(RegisterMemberCmd {
            full_name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "pw".to_string(),
            confirm_password: "pw".to_string(),
            room_id,
        })
        .await
        .unwrap()
        .id;

    let empty = engine.user_summary(room_id, alice).await.unwrap();
    assert!(empty.income.is_zero());
    assert!(empty.last_updated.is_none());

    let flow = |user_id, amount_minor| RecordFlowCmd {
        room_id,
        user_id,
        amount_minor,
    };
    engine.record_income(flow(alice, 1_000)).await.unwrap();
    engine.record_expense(flow(alice, 300)).await.unwrap();
    let receipt = engine.record_expense(flow(bob, 200)).await.unwrap();
    assert_eq!(receipt.summary.room.net, Money::from_minor(500));
    assert_eq!(receipt.summary.user.expense, Money::from_minor(200));
    engine
        .record_categorized(income(room_id, alice, 70))
        .await
        .unwrap();

    let first = engine.user_summary(room_id, alice).await.unwrap();
    let second = engine.user_summary(room_id, alice).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.income, Money::from_minor(1_000));
    assert_eq!(first.expense, Money::from_minor(300));
    assert_eq!(first.net, Money::from_minor(700));
    assert!(first.last_updated.is_some());

    let room = engine.room_summary(room_id).await.unwrap();
    assert_eq!(room.net, Money::from_minor(500));
    // The two views are maintained independently.
    assert_eq!(balance(&engine, room_id).await, Some(70));

    let both = engine.ledger_summary(room_id, bob).await.unwrap();
    assert_eq!(both.room, room);
    assert_eq!(both.user.net, Money::from_minor(-200));
}

#[tokio::test]
async fn flow_edits_need_exactly_one_previously_set_field() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;
    let record = engine
        .record_income(RecordFlowCmd {
            room_id,
            user_id,
            amount_minor: 80,
        })
        .await
        .unwrap()
        .record;

    let both = EditFlowCmd {
        id: record.id,
        income_minor: Some(10),
        expense_minor: Some(10),
    };
    assert!(matches!(
        engine.edit_flow(both).await,
        Err(EngineError::Validation(_))
    ));
    let none = EditFlowCmd {
        id: record.id,
        ..Default::default()
    };
    assert!(matches!(
        engine.edit_flow(none).await,
        Err(EngineError::Validation(_))
    ));
    let unset = EditFlowCmd {
        id: record.id,
        expense_minor: Some(10),
        ..Default::default()
    };
    assert!(matches!(
        engine.edit_flow(unset).await,
        Err(EngineError::Validation(_))
    ));
    let missing = EditFlowCmd {
        id: record.id + 100,
        income_minor: Some(10),
        ..Default::default()
    };
    assert!(matches!(
        engine.edit_flow(missing).await,
        Err(EngineError::NotFound(_))
    ));

    let outcome = engine
        .edit_flow(EditFlowCmd {
            id: record.id,
            income_minor: Some(120),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(outcome.delta, Money::from_minor(40));
    assert_eq!(outcome.new.income, Money::from_minor(120));
    assert_eq!(outcome.room_total, None);
    assert_eq!(balance(&engine, room_id).await, None);
    assert_eq!(
        engine.user_summary(room_id, user_id).await.unwrap().income,
        Money::from_minor(120)
    );
}

#[tokio::test]
async fn malformed_input_is_rejected_before_any_write() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    for cmd in [
        income(room_id, user_id, 0),
        income(room_id, user_id, -5),
        RecordCategorizedCmd::new(room_id, user_id, "Transfer", "Food", 10),
        RecordCategorizedCmd::new(room_id, user_id, "Income", "Travel", 10),
        income(0, user_id, 10),
    ] {
        let err = engine.record_categorized(cmd).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)), "{err:?}");
    }
    assert!(matches!(
        engine
            .record_income(RecordFlowCmd {
                room_id,
                user_id,
                amount_minor: 0,
            })
            .await,
        Err(EngineError::Validation(_))
    ));
    assert_eq!(balance(&engine, room_id).await, None);
}

#[tokio::test]
async fn tags_are_normalized_on_write() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    let receipt = engine
        .record_categorized(
            RecordCategorizedCmd::new(room_id, user_id, "  income ", "BILLS", 900).note("  rent "),
        )
        .await
        .unwrap();
    assert_eq!(receipt.record.kind, engine::EntryKind::Income);
    assert_eq!(receipt.record.category, engine::Category::Bills);
    assert_eq!(receipt.record.note, "rent");
}

#[tokio::test]
async fn unknown_references_are_not_found() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    let err = engine
        .record_categorized(income(room_id + 1, user_id, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)), "{err:?}");
    let err = engine
        .record_categorized(income(room_id, user_id + 1, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)), "{err:?}");
    let err = engine
        .record_income(RecordFlowCmd {
            room_id: room_id + 1,
            user_id,
            amount_minor: 10,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)), "{err:?}");
    assert!(matches!(
        engine
            .edit_categorized(EditCategorizedCmd {
                id: 42,
                amount_minor: 1
            })
            .await,
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.delete_categorized(42).await,
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.room_summary(room_id + 1).await,
        Err(EngineError::NotFound(_))
    ));
}

#[tokio::test]
async fn registration_enforces_capacity_and_unique_email() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, _) = seed_room(&engine, "Alice@Example.com").await;
    let cmd = |email: &str, confirm: &str| RegisterMemberCmd {
        full_name: "Someone".to_string(),
        email: email.to_string(),
        password: "pw".to_string(),
        confirm_password: confirm.to_string(),
        room_id,
    };

    let members = engine.room_members(room_id).await.unwrap();
    assert_eq!(members[0].email, "alice@example.com");
    assert_eq!(members[0].full_name, "Alice Rossi");

    assert!(matches!(
        engine.register_member(cmd("bob@example.com", "other")).await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        engine.register_member(cmd("ALICE@example.com", "pw")).await,
        Err(EngineError::Validation(_))
    ));
    let listing = engine.list_rooms().await.unwrap();
    assert_eq!(listing[0].user_count, 1);
    assert_eq!(listing[0].status, RoomStatus::Empty);

    engine
        .register_member(cmd("bob@example.com", "pw"))
        .await
        .unwrap();
    assert!(matches!(
        engine.register_member(cmd("carol@example.com", "pw")).await,
        Err(EngineError::Validation(_))
    ));
    let listing = engine.list_rooms().await.unwrap();
    assert_eq!(listing[0].user_count, 2);
    assert_eq!(listing[0].status, RoomStatus::Max);

    let mut missing_room = cmd("dave@example.com", "pw");
    missing_room.room_id = room_id + 1;
    assert!(matches!(
        engine.register_member(missing_room).await,
        Err(EngineError::NotFound(_))
    ));
}

#[tokio::test]
async fn categorized_listing_pages_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;
    let (other_room, other_user) = seed_room(&engine, "bob@example.com").await;

    let mut ids = Vec::new();
    for amount in 1..=5 {
        let receipt = engine
            .record_categorized(income(room_id, user_id, amount))
            .await
            .unwrap();
        ids.push(receipt.record.id);
    }
    engine
        .record_categorized(income(other_room, other_user, 9))
        .await
        .unwrap();

    let mut filter = CategorizedFilter {
        room_id: Some(room_id),
        limit: Some(2),
        ..Default::default()
    };
    let mut seen = Vec::new();
    loop {
        let page = engine.list_categorized(&filter).await.unwrap();
        seen.extend(page.items.iter().map(|r| r.id));
        match page.next_cursor {
            Some(cursor) => filter.cursor = Some(cursor),
            None => break,
        }
    }
    ids.reverse();
    assert_eq!(seen, ids);

    let by_user = engine
        .list_categorized(&CategorizedFilter {
            user_id: Some(other_user),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_user.items.len(), 1);
    assert_eq!(by_user.items[0].room_id, other_room);

    let err = engine
        .list_categorized(&CategorizedFilter {
            cursor: Some("not a cursor".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn room_activity_merges_both_logs() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    engine
        .record_income(RecordFlowCmd {
            room_id,
            user_id,
            amount_minor: 10,
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    engine
        .record_categorized(income(room_id, user_id, 20))
        .await
        .unwrap();

    let feed = engine.list_room_activity(room_id).await.unwrap();
    assert_eq!(feed.len(), 2);
    assert!(matches!(feed[0], ActivityEntry::Categorized(_)));
    assert!(matches!(feed[1], ActivityEntry::Flow(_)));
    assert!(feed[0].updated_at() >= feed[1].updated_at());
}

#[tokio::test]
async fn overview_merges_daily_series_from_both_logs() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    engine
        .record_income(RecordFlowCmd {
            room_id,
            user_id,
            amount_minor: 1_000,
        })
        .await
        .unwrap();
    engine
        .record_expense(RecordFlowCmd {
            room_id,
            user_id,
            amount_minor: 100,
        })
        .await
        .unwrap();
    engine
        .record_categorized(income(room_id, user_id, 500))
        .await
        .unwrap();
    engine
        .record_categorized(expense(room_id, user_id, 200))
        .await
        .unwrap();

    let overview = engine.room_overview(room_id, user_id).await.unwrap();
    assert_eq!(overview.room.name, "Flat 4B");
    assert_eq!(overview.members, vec!["Alice Rossi".to_string()]);
    assert_eq!(overview.balance, Money::from_minor(300));
    assert_eq!(overview.flow_totals.net, Money::from_minor(900));

    let income_total = Money::try_sum(overview.daily_income.iter().map(|d| d.amount)).unwrap();
    let expense_total = Money::try_sum(overview.daily_expense.iter().map(|d| d.amount)).unwrap();
    assert_eq!(income_total, Money::from_minor(1_500));
    assert_eq!(expense_total, Money::from_minor(300));
    assert!(
        overview
            .daily_income
            .windows(2)
            .all(|pair| pair[0].day < pair[1].day)
    );

    assert!(matches!(
        engine.room_overview(room_id, user_id + 7).await,
        Err(EngineError::NotFound(_))
    ));
}

#[tokio::test]
async fn rebuild_clears_drift_left_by_flow_deletes() {
    let (engine, _db) = engine_with_db().await;
    let (room_id, user_id) = seed_room(&engine, "alice@example.com").await;

    engine
        .record_categorized(income(room_id, user_id, 300))
        .await
        .unwrap();
    let flow = engine
        .record_income(RecordFlowCmd {
            room_id,
            user_id,
            amount_minor: 50,
        })
        .await
        .unwrap();
    engine.delete_flow(flow.record.id).await.unwrap();

    let audit = engine.audit_room_balance(room_id).await.unwrap();
    assert_eq!(audit.stored, Some(Money::from_minor(250)));
    assert_eq!(audit.recomputed, Money::from_minor(300));
    assert_eq!(audit.drift, Money::from_minor(-50));

    let rebuilt = engine.rebuild_room_balance(room_id).await.unwrap();
    assert_eq!(rebuilt.drift, Money::from_minor(-50));
    assert_eq!(balance(&engine, room_id).await, Some(300));
    assert!(
        engine
            .audit_room_balance(room_id)
            .await
            .unwrap()
            .drift
            .is_zero()
    );
}
