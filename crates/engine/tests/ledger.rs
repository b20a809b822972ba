use std::sync::Arc;

use proptest::prelude::*;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    CreditCmd, DebitCmd, Engine, EngineError, EntryKind, TransferCmd, TransferStatus,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use migration::MigratorTrait;

async fn connect(url: &str) -> DatabaseConnection {
    // A single pooled connection keeps every operation on the same sqlite
    // handle; transactions then serialize instead of fighting over the file.
    let mut options = ConnectOptions::new(url);
    options.max_connections(1);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = connect("sqlite::memory:").await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("ledger_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = connect(&url).await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db, path)
}

async fn entry_count_for(db: &DatabaseConnection, account_id: Uuid) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT COUNT(*) AS n FROM entries WHERE account_id = ?",
            vec![account_id.to_string().into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

async fn signed_entry_sum(db: &DatabaseConnection, account_id: Uuid) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(CASE WHEN kind IN ('credit', 'transfer_in') \
             THEN amount_minor ELSE -amount_minor END), 0) AS sum \
             FROM entries WHERE account_id = ?",
            vec![account_id.to_string().into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "sum").unwrap()
}

async fn assert_balance_matches_entries(
    engine: &Engine,
    db: &DatabaseConnection,
    account_id: Uuid,
) {
    let account = engine.account(account_id).await.unwrap();
    let sum = signed_entry_sum(db, account_id).await;
    assert_eq!(
        account.balance_minor, sum,
        "balance diverged from the entry log for account {account_id}"
    );
}

#[tokio::test]
async fn create_account_records_opening_balance_as_entry() {
    let (engine, db) = engine_with_db().await;

    let account = engine.create_account(25_050).await.unwrap();
    assert_eq!(account.balance_minor, 25_050);
    assert_eq!(entry_count_for(&db, account.id).await, 1);
    assert_balance_matches_entries(&engine, &db, account.id).await;

    let empty = engine.create_account(0).await.unwrap();
    assert_eq!(empty.balance_minor, 0);
    assert_eq!(entry_count_for(&db, empty.id).await, 0);
}

#[tokio::test]
async fn create_account_rejects_negative_opening_balance() {
    let (engine, _db) = engine_with_db().await;

    let result = engine.create_account(-1).await;
    assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
}

#[tokio::test]
async fn credit_then_debit_returns_to_original_balance() {
    let (engine, db) = engine_with_db().await;
    let account = engine.create_account(5_000).await.unwrap();

    let credited = engine
        .credit(CreditCmd::new(account.id, 1_234).description("top-up"))
        .await
        .unwrap();
    assert_eq!(credited.kind, EntryKind::Credit);
    assert_eq!(credited.new_balance_minor, 6_234);

    let debited = engine
        .debit(DebitCmd::new(account.id, 1_234))
        .await
        .unwrap();
    assert_eq!(debited.kind, EntryKind::Debit);
    assert_eq!(debited.new_balance_minor, 5_000);

    let after = engine.account(account.id).await.unwrap();
    assert_eq!(after.balance_minor, 5_000);
    assert_balance_matches_entries(&engine, &db, account.id).await;
}

#[tokio::test]
async fn debit_insufficient_balance_reports_both_amounts() {
    let (engine, db) = engine_with_db().await;
    let account = engine.create_account(25_050).await.unwrap();

    let debited = engine
        .debit(DebitCmd::new(account.id, 5_000).description("groceries"))
        .await
        .unwrap();
    assert_eq!(debited.kind, EntryKind::Debit);
    assert_eq!(debited.new_balance_minor, 20_050);

    let result = engine.debit(DebitCmd::new(account.id, 50_000)).await;
    assert_eq!(
        result,
        Err(EngineError::InsufficientBalance {
            current_minor: 20_050,
            requested_minor: 50_000,
        })
    );

    // The failed debit left no trace.
    let after = engine.account(account.id).await.unwrap();
    assert_eq!(after.balance_minor, 20_050);
    assert_eq!(entry_count_for(&db, account.id).await, 2);
}

#[tokio::test]
async fn credit_overflowing_the_balance_is_rejected() {
    let (engine, db) = engine_with_db().await;
    let account = engine.create_account(i64::MAX).await.unwrap();

    let result = engine.credit(CreditCmd::new(account.id, 1)).await;
    assert_eq!(
        result,
        Err(EngineError::InvalidAmount("balance overflow".to_string()))
    );

    let after = engine.account(account.id).await.unwrap();
    assert_eq!(after.balance_minor, i64::MAX);
    assert_eq!(entry_count_for(&db, account.id).await, 1);
}

#[tokio::test]
async fn mutations_reject_non_positive_amounts() {
    let (engine, db) = engine_with_db().await;
    let account = engine.create_account(1_000).await.unwrap();
    let other = engine.create_account(0).await.unwrap();

    for amount in [0, -500] {
        assert!(matches!(
            engine.credit(CreditCmd::new(account.id, amount)).await,
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.debit(DebitCmd::new(account.id, amount)).await,
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine
                .transfer(TransferCmd::new(account.id, other.id, amount))
                .await,
            Err(EngineError::InvalidAmount(_))
        ));
    }

    assert_eq!(entry_count_for(&db, account.id).await, 1);
    assert_eq!(entry_count_for(&db, other.id).await, 0);
}

#[tokio::test]
async fn mutations_on_missing_account_are_not_found() {
    let (engine, _db) = engine_with_db().await;
    let ghost = Uuid::new_v4();

    let not_found = || EngineError::KeyNotFound("account not exists".to_string());
    assert_eq!(
        engine.credit(CreditCmd::new(ghost, 100)).await,
        Err(not_found())
    );
    assert_eq!(
        engine.debit(DebitCmd::new(ghost, 100)).await,
        Err(not_found())
    );
    assert_eq!(engine.account(ghost).await, Err(not_found()));
}

#[tokio::test]
async fn transfer_moves_funds_and_links_legs() {
    let (engine, db) = engine_with_db().await;
    let sender = engine.create_account(12_550).await.unwrap();
    let recipient = engine.create_account(7_500).await.unwrap();

    let receipt = engine
        .transfer(TransferCmd::new(sender.id, recipient.id, 2_500).description("rent share"))
        .await
        .unwrap();

    assert_eq!(receipt.transfer_id, receipt.sender_entry_id);
    assert_eq!(receipt.sender_new_balance_minor, 10_050);
    assert_eq!(receipt.recipient_new_balance_minor, 10_000);

    let out_leg = engine.entry(receipt.sender_entry_id).await.unwrap();
    assert_eq!(out_leg.kind, EntryKind::TransferOut);
    assert_eq!(out_leg.account_id, sender.id);
    assert_eq!(out_leg.amount_minor, 2_500);
    assert_eq!(out_leg.counterparty_account_id, Some(recipient.id));
    assert_eq!(out_leg.reference_entry_id, None);

    let in_leg = engine.entry(receipt.recipient_entry_id).await.unwrap();
    assert_eq!(in_leg.kind, EntryKind::TransferIn);
    assert_eq!(in_leg.account_id, recipient.id);
    assert_eq!(in_leg.amount_minor, 2_500);
    assert_eq!(in_leg.counterparty_account_id, Some(sender.id));
    assert_eq!(in_leg.reference_entry_id, Some(out_leg.id));

    // The in-leg is reachable from the transfer id.
    let by_reference = engine.find_by_reference(receipt.transfer_id).await.unwrap();
    assert_eq!(by_reference.id, in_leg.id);

    let view = engine.transfer_view(receipt.transfer_id).await.unwrap();
    assert_eq!(view.status, TransferStatus::Completed);
    assert_eq!(view.sender_id, sender.id);
    assert_eq!(view.recipient_id, recipient.id);
    assert_eq!(view.amount_minor, 2_500);
    assert_eq!(view.description.as_deref(), Some("rent share"));

    assert_balance_matches_entries(&engine, &db, sender.id).await;
    assert_balance_matches_entries(&engine, &db, recipient.id).await;
}

#[tokio::test]
async fn transfer_to_same_account_is_rejected() {
    let (engine, db) = engine_with_db().await;
    let account = engine.create_account(10_000).await.unwrap();

    let result = engine
        .transfer(TransferCmd::new(account.id, account.id, 1_000))
        .await;
    assert_eq!(result, Err(EngineError::SameAccountTransfer));
    assert_eq!(entry_count_for(&db, account.id).await, 1);
}

#[tokio::test]
async fn failed_transfer_writes_nothing() {
    let (engine, db) = engine_with_db().await;
    let sender = engine.create_account(1_000).await.unwrap();
    let recipient = engine.create_account(0).await.unwrap();

    // Insufficient funds.
    let result = engine
        .transfer(TransferCmd::new(sender.id, recipient.id, 5_000))
        .await;
    assert_eq!(
        result,
        Err(EngineError::InsufficientBalance {
            current_minor: 1_000,
            requested_minor: 5_000,
        })
    );

    // Missing recipient.
    let result = engine
        .transfer(TransferCmd::new(sender.id, Uuid::new_v4(), 500))
        .await;
    assert_eq!(
        result,
        Err(EngineError::KeyNotFound("account not exists".to_string()))
    );

    // No leg was written, no balance moved.
    assert_eq!(entry_count_for(&db, sender.id).await, 1);
    assert_eq!(entry_count_for(&db, recipient.id).await, 0);
    assert_eq!(engine.account(sender.id).await.unwrap().balance_minor, 1_000);
    assert_eq!(engine.account(recipient.id).await.unwrap().balance_minor, 0);
}

#[tokio::test]
async fn balance_always_equals_signed_entry_sum() {
    let (engine, db) = engine_with_db().await;
    let a = engine.create_account(10_000).await.unwrap();
    let b = engine.create_account(2_500).await.unwrap();

    // A varied sequence of operations, including ones that must fail.
    engine.credit(CreditCmd::new(a.id, 3_300)).await.unwrap();
    engine.debit(DebitCmd::new(a.id, 1_250)).await.unwrap();
    engine
        .transfer(TransferCmd::new(a.id, b.id, 4_000))
        .await
        .unwrap();
    let _ = engine.debit(DebitCmd::new(b.id, 99_999)).await;
    engine.credit(CreditCmd::new(b.id, 775)).await.unwrap();
    engine
        .transfer(TransferCmd::new(b.id, a.id, 6_000))
        .await
        .unwrap();
    let _ = engine.transfer(TransferCmd::new(a.id, a.id, 100)).await;
    engine.debit(DebitCmd::new(b.id, 1_275)).await.unwrap();

    assert_balance_matches_entries(&engine, &db, a.id).await;
    assert_balance_matches_entries(&engine, &db, b.id).await;

    let a_balance = engine.account(a.id).await.unwrap().balance_minor;
    let b_balance = engine.account(b.id).await.unwrap().balance_minor;
    assert_eq!(a_balance, 10_000 + 3_300 - 1_250 - 4_000 + 6_000);
    assert_eq!(b_balance, 2_500 + 4_000 + 775 - 6_000 - 1_275);
}

#[derive(Clone, Debug)]
enum LedgerOp {
    Credit { account: usize, amount_minor: i64 },
    Debit { account: usize, amount_minor: i64 },
    Transfer { sender: usize, recipient: usize, amount_minor: i64 },
}

fn ledger_op(accounts: usize) -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        (0..accounts, 1..5_000i64).prop_map(|(account, amount_minor)| LedgerOp::Credit {
            account,
            amount_minor
        }),
        (0..accounts, 1..5_000i64).prop_map(|(account, amount_minor)| LedgerOp::Debit {
            account,
            amount_minor
        }),
        // sender == recipient is allowed here so sequences also exercise the
        // self-transfer rejection.
        (0..accounts, 0..accounts, 1..5_000i64).prop_map(
            |(sender, recipient, amount_minor)| LedgerOp::Transfer {
                sender,
                recipient,
                amount_minor
            }
        ),
    ]
}

/// Applies a generated operation sequence and returns, per account, the
/// final balance next to the signed SQL sum of its entries.
async fn apply_sequence(opening: Vec<i64>, ops: Vec<LedgerOp>) -> Vec<(i64, i64)> {
    let (engine, db) = engine_with_db().await;

    let mut ids = Vec::with_capacity(opening.len());
    for balance in opening {
        ids.push(engine.create_account(balance).await.unwrap().id);
    }

    for op in ops {
        let result = match op {
            LedgerOp::Credit {
                account,
                amount_minor,
            } => engine
                .credit(CreditCmd::new(ids[account], amount_minor))
                .await
                .map(|_| ()),
            LedgerOp::Debit {
                account,
                amount_minor,
            } => engine
                .debit(DebitCmd::new(ids[account], amount_minor))
                .await
                .map(|_| ()),
            LedgerOp::Transfer {
                sender,
                recipient,
                amount_minor,
            } => engine
                .transfer(TransferCmd::new(ids[sender], ids[recipient], amount_minor))
                .await
                .map(|_| ()),
        };
        match result {
            Ok(())
            | Err(EngineError::InsufficientBalance { .. })
            | Err(EngineError::SameAccountTransfer) => {}
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    let mut outcome = Vec::with_capacity(ids.len());
    for id in ids {
        let balance = engine.account(id).await.unwrap().balance_minor;
        let entry_sum = signed_entry_sum(&db, id).await;
        outcome.push((balance, entry_sum));
    }
    outcome
}

proptest! {
    // Every case runs against its own fresh database.
    #![proptest_config(ProptestConfig::with_cases(24))]
    #[test]
    fn random_operation_sequences_preserve_the_invariant(
        opening in proptest::collection::vec(0..10_000i64, 3),
        ops in proptest::collection::vec(ledger_op(3), 1..60),
    ) {
        let outcome = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(apply_sequence(opening, ops));
        for (balance, entry_sum) in outcome {
            prop_assert!(balance >= 0);
            prop_assert_eq!(balance, entry_sum);
        }
    }
}

#[tokio::test]
async fn entries_are_paginated_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let account = engine.create_account(0).await.unwrap();

    for i in 1..=12 {
        engine
            .credit(CreditCmd::new(account.id, i * 100))
            .await
            .unwrap();
    }

    let first = engine.list_entries(account.id, 1, None).await.unwrap();
    assert_eq!(first.total, 12);
    assert_eq!(first.page, 1);
    assert_eq!(first.page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(first.entries.len(), 10);
    // Newest first: the last credit leads the page.
    assert_eq!(first.entries[0].amount_minor, 1_200);
    assert!(
        first
            .entries
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at)
    );

    let second = engine.list_entries(account.id, 2, None).await.unwrap();
    assert_eq!(second.total, 12);
    assert_eq!(second.entries.len(), 2);
    assert_eq!(second.entries[1].amount_minor, 100);

    let third = engine.list_entries(account.id, 3, None).await.unwrap();
    assert!(third.entries.is_empty());
}

#[tokio::test]
async fn pagination_limits_are_enforced() {
    let (engine, _db) = engine_with_db().await;
    let account = engine.create_account(0).await.unwrap();

    let capped = engine
        .list_entries(account.id, 1, Some(1_000))
        .await
        .unwrap();
    assert_eq!(capped.page_size, MAX_PAGE_SIZE);

    assert!(matches!(
        engine.list_entries(account.id, 0, None).await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine.list_entries(account.id, 1, Some(0)).await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert_eq!(
        engine.list_entries(Uuid::new_v4(), 1, None).await.err(),
        Some(EngineError::KeyNotFound("account not exists".to_string()))
    );
}

#[tokio::test]
async fn entry_lookups_on_missing_ids_are_not_found() {
    let (engine, _db) = engine_with_db().await;

    assert_eq!(
        engine.entry(Uuid::new_v4()).await,
        Err(EngineError::KeyNotFound("entry not exists".to_string()))
    );
    assert_eq!(
        engine.find_by_reference(Uuid::new_v4()).await,
        Err(EngineError::KeyNotFound("entry not exists".to_string()))
    );
}

#[tokio::test]
async fn transfer_view_requires_a_transfer_out_entry() {
    let (engine, _db) = engine_with_db().await;
    let account = engine.create_account(0).await.unwrap();

    let posted = engine
        .credit(CreditCmd::new(account.id, 500))
        .await
        .unwrap();

    let not_found = || EngineError::KeyNotFound("transfer not exists".to_string());
    assert_eq!(engine.transfer_view(Uuid::new_v4()).await, Err(not_found()));
    // A real entry id that is not a transfer_out leg is not a transfer.
    assert_eq!(engine.transfer_view(posted.entry_id).await, Err(not_found()));
}

#[tokio::test]
async fn transfer_view_flags_missing_in_leg_as_inconsistent() {
    let (engine, db) = engine_with_db().await;
    let sender = engine.create_account(5_000).await.unwrap();
    let recipient = engine.create_account(0).await.unwrap();

    // Plant a lone transfer_out leg, the partial write a naive
    // multiple-commit transfer could leave behind.
    let orphan_id = Uuid::new_v4();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO entries \
         (id, account_id, kind, amount_minor, description, \
          counterparty_account_id, reference_entry_id, created_at) \
         VALUES (?, ?, 'transfer_out', 500, NULL, ?, NULL, ?)",
        vec![
            orphan_id.to_string().into(),
            sender.id.to_string().into(),
            recipient.id.to_string().into(),
            "2026-01-01T10:00:00Z".into(),
        ],
    ))
    .await
    .unwrap();

    let view = engine.transfer_view(orphan_id).await.unwrap();
    assert_eq!(view.status, TransferStatus::Inconsistent);
    assert_eq!(view.sender_id, sender.id);
    assert_eq!(view.recipient_id, recipient.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_debits_never_overdraw() {
    let (engine, db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);

    let account = engine.create_account(10_000).await.unwrap();

    // 8 debits of 30.00 against 100.00: only 3 can fit.
    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        let account_id = account.id;
        tasks.spawn(async move { engine.debit(DebitCmd::new(account_id, 3_000)).await });
    }

    let mut successes = 0;
    let mut rejections = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(posted) => {
                assert!(posted.new_balance_minor >= 0);
                successes += 1;
            }
            Err(EngineError::InsufficientBalance { .. }) => rejections += 1,
            Err(other) => panic!("unexpected debit failure: {other}"),
        }
    }

    assert_eq!(successes, 3);
    assert_eq!(rejections, 5);

    let after = engine.account(account.id).await.unwrap();
    assert_eq!(after.balance_minor, 1_000);
    assert_balance_matches_entries(&engine, &db, account.id).await;

    drop(db);
    let _ = std::fs::remove_file(path);
}
