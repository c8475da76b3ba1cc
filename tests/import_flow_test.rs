// ==========================================
// 导入流程集成测试
// ==========================================
// 测试目标: 解析 → 校验 → 预览 → 写入 的端到端行为
// - 必填校验与"无有效记录"
// - 插入跳过重复的幂等性 / 揽收重复导入
// - 会话状态机的失败回退路径
// ==========================================

mod helpers;

use helpers::failing_store::{FailingStore, REJECTION_MESSAGE};
use helpers::recording_notifier::RecordingNotifier;
use logistics_import::config::{config_keys, ConfigManager};
use logistics_import::domain::{CollectionStatus, ImportKind, Owner, RecordBatch};
use logistics_import::events::{NotificationLevel, RecordingInvalidator};
use logistics_import::importer::{ImportError, ImportSession, ImportStage, SourceFile};
use logistics_import::logging;
use logistics_import::repository::{LogisticsStore, StoreTable};
use std::sync::Arc;
use test_helpers::{
    create_default_session, create_session, create_test_db, create_test_store, fixture,
};

fn owner() -> Owner {
    Owner::new("user-42")
}

/// 选择种类与文件，解析并写入
async fn run_import(session: &mut ImportSession, kind: ImportKind, file: SourceFile) -> usize {
    session.select_kind(kind);
    session.select_file(file);
    session.parse().await.expect("解析失败");
    let report = session.import(Some(&owner())).await.expect("写入失败");
    assert_eq!(session.stage(), ImportStage::Done);
    report.submitted
}

// ==========================================
// 必填校验
// ==========================================

#[tokio::test]
async fn test_all_invalid_rows_yield_no_valid_records() {
    logging::init_test();
    let (_temp_file, store) = create_test_store().unwrap();
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = create_default_session(store.clone(), notifier.clone());

    let cases = [
        (ImportKind::Collections, "parceiro,endereco_origem,data\nACME,,2025-01-01\n"),
        (ImportKind::Products, "codigo,descricao\n,Bomba\n  ,Motor\n"),
        (ImportKind::Clients, "nome,telefone\n,1199\n"),
        (ImportKind::Technicians, "nome,telefone\n,1199\n"),
        (ImportKind::Supervisors, "sobrenome,telefone\nLima,1199\n"),
    ];

    for (kind, content) in cases {
        session.select_kind(kind);
        session.select_file(SourceFile::new("dados.csv", content.as_bytes().to_vec()));

        match session.parse().await {
            Err(ImportError::NoValidRecords { kind: reported }) => assert_eq!(reported, kind),
            other => panic!("{}: 应为 NoValidRecords, 实际 {:?}", kind, other.map(|p| p.valid_count())),
        }
        assert_eq!(session.stage(), ImportStage::Upload);
        assert_eq!(session.last_failure(), Some(ImportStage::ParseError));
        assert!(session.preview().is_none());
    }

    assert_eq!(notifier.messages(NotificationLevel::Error).len(), 5);
    assert_eq!(store.count_rows(StoreTable::Clients, &owner()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_rows_are_excluded_from_preview() {
    let (_temp_file, store) = create_test_store().unwrap();
    let mut session = create_default_session(store, Arc::new(RecordingNotifier::new()));

    session.select_kind(ImportKind::Technicians);
    session.select_file(fixture("technicians.csv"));
    let preview = session.parse().await.unwrap();
    assert_eq!(preview.valid_count(), 3);

    session.select_kind(ImportKind::Collections);
    session.select_file(SourceFile::new(
        "coletas.csv",
        "parceiro,endereco_origem,data\nACME,Rua A,2025-01-01\nBeta,,2025-01-02\n,Rua C,\n"
            .as_bytes()
            .to_vec(),
    ));
    let preview = session.parse().await.unwrap();
    assert_eq!(preview.valid_count(), 1);
    assert_eq!(preview.discarded_count(), 2);
    assert_eq!(preview.discarded[0].missing_fields, vec!["origin_address"]);
    assert_eq!(
        preview.discarded[1].missing_fields,
        vec!["parceiro", "requested_date"]
    );
}

// ==========================================
// 幂等性
// ==========================================

#[tokio::test]
async fn test_insert_if_absent_kinds_are_idempotent() {
    let cases = [
        (ImportKind::Products, "products.csv", StoreTable::Products, 3),
        (ImportKind::Clients, "clients.csv", StoreTable::Clients, 2),
        (ImportKind::Technicians, "technicians.csv", StoreTable::Profiles, 3),
        (ImportKind::Supervisors, "supervisors.csv", StoreTable::Profiles, 2),
    ];

    for (kind, name, table, expected) in cases {
        let (_temp_file, store) = create_test_store().unwrap();
        let mut session = create_default_session(store.clone(), Arc::new(RecordingNotifier::new()));

        run_import(&mut session, kind, fixture(name)).await;
        let once = store.count_rows(table, &owner()).await.unwrap();
        assert_eq!(once, expected, "{}", name);

        // 第二次导入: 提交数不变，实际不新增
        let submitted = run_import(&mut session, kind, fixture(name)).await;
        assert_eq!(submitted, expected);
        assert_eq!(store.count_rows(table, &owner()).await.unwrap(), once, "{}", name);
    }
}

#[tokio::test]
async fn test_collections_import_duplicates_rows() {
    let (_temp_file, store) = create_test_store().unwrap();
    let mut session = create_default_session(store.clone(), Arc::new(RecordingNotifier::new()));

    run_import(&mut session, ImportKind::Collections, fixture("collections.csv")).await;
    assert_eq!(store.count_rows(StoreTable::Collections, &owner()).await.unwrap(), 3);

    run_import(&mut session, ImportKind::Collections, fixture("collections.csv")).await;
    assert_eq!(store.count_rows(StoreTable::Collections, &owner()).await.unwrap(), 6);
    assert_eq!(store.count_rows(StoreTable::Items, &owner()).await.unwrap(), 2);
}

#[tokio::test]
async fn test_rows_are_scoped_by_owner() {
    let (_temp_file, store) = create_test_store().unwrap();
    let mut session = create_default_session(store.clone(), Arc::new(RecordingNotifier::new()));
    let other = Owner::new("user-7");

    run_import(&mut session, ImportKind::Products, fixture("products.csv")).await;

    session.select_kind(ImportKind::Products);
    session.select_file(fixture("products.csv"));
    session.parse().await.unwrap();
    session.import(Some(&other)).await.unwrap();

    assert_eq!(store.count_rows(StoreTable::Products, &owner()).await.unwrap(), 3);
    assert_eq!(store.count_rows(StoreTable::Products, &other).await.unwrap(), 3);
}

// ==========================================
// 端到端场景
// ==========================================

#[tokio::test]
async fn test_scenario_clients_with_blank_name() {
    let (_temp_file, store) = create_test_store().unwrap();
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = create_default_session(store.clone(), notifier.clone());

    session.select_kind(ImportKind::Clients);
    session.select_file(fixture("clients.csv"));
    let preview = session.parse().await.unwrap();
    assert_eq!(preview.total_rows(), 3);
    assert_eq!(preview.valid_count(), 2);
    assert!(matches!(preview.batch, RecordBatch::Clients(_)));

    let report = session.import(Some(&owner())).await.unwrap();
    assert_eq!(report.submitted, 2);

    let successes = notifier.messages(NotificationLevel::Success);
    assert_eq!(successes.len(), 1);
    assert!(successes[0].contains('2'));
    assert_eq!(notifier.completed(), vec![(ImportKind::Clients, 2)]);

    let aurora = store
        .find_client_by_name(&owner(), "Transportes Aurora")
        .await
        .unwrap()
        .expect("客户应已写入");
    assert_eq!(aurora.row.tax_id.as_deref(), Some("12.345.678/0001-90"));

    let batches = store.list_recent_batches(&owner(), 10).await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].kind, ImportKind::Clients);
    assert_eq!(batches[0].submitted_rows, 2);
    assert_eq!(batches[0].file_name.as_deref(), Some("clients.csv"));
}

#[tokio::test]
async fn test_scenario_zero_quantity_creates_no_item() {
    let (_temp_file, store) = create_test_store().unwrap();
    let mut session = create_default_session(store.clone(), Arc::new(RecordingNotifier::new()));

    session.select_kind(ImportKind::Collections);
    session.select_file(fixture("collections.csv"));
    session.parse().await.unwrap();
    let report = session.import(Some(&owner())).await.unwrap();
    assert_eq!(report.submitted, 3);
    assert_eq!(report.items_inserted, 1);
    assert!(report.item_error.is_none());

    let collections = store.list_collections(&owner()).await.unwrap();
    assert_eq!(collections.len(), 3);

    let zero_qty = collections
        .iter()
        .find(|c| c.row.parceiro == "Logística Boa Vista")
        .expect("父行应已写入");
    assert_eq!(zero_qty.row.status, CollectionStatus::InTransit);
    assert!(store
        .list_items_by_collection(&owner(), &zero_qty.id)
        .await
        .unwrap()
        .is_empty());

    let with_item = collections
        .iter()
        .find(|c| c.row.parceiro == "Transportes Aurora")
        .unwrap();
    let items = store
        .list_items_by_collection(&owner(), &with_item.id)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].row.name, "PRD-001");
    assert_eq!(items[0].row.quantity, 5);
    assert_eq!(items[0].row.status, with_item.row.status);
}

#[tokio::test]
async fn test_scenario_switching_kind_clears_file_and_preview() {
    let (_temp_file, store) = create_test_store().unwrap();
    let mut session = create_default_session(store, Arc::new(RecordingNotifier::new()));

    session.select_kind(ImportKind::Technicians);
    session.select_file(fixture("technicians.csv"));
    assert!(session.file().is_some());

    session.select_kind(ImportKind::Clients);
    assert!(session.file().is_none());
    assert!(session.preview().is_none());
    assert_eq!(session.stage(), ImportStage::Upload);

    // 已解析后切换同样清空
    session.select_file(fixture("clients.csv"));
    session.parse().await.unwrap();
    session.select_kind(ImportKind::Products);
    assert!(session.file().is_none());
    assert!(session.preview().is_none());
    assert_eq!(session.kind(), ImportKind::Products);
}

#[tokio::test]
async fn test_scenario_store_rejection_keeps_preview() {
    let (_temp_file, inner) = create_test_store().unwrap();
    let store = Arc::new(FailingStore::new(inner.clone()));
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = create_default_session(store.clone(), notifier.clone());

    session.select_kind(ImportKind::Products);
    session.select_file(fixture("products.csv"));
    session.parse().await.unwrap();

    store.fail_products(true);
    match session.import(Some(&owner())).await {
        Err(ImportError::Persistence(message)) => assert_eq!(message, REJECTION_MESSAGE),
        other => panic!("应为 Persistence, 实际 {:?}", other),
    }

    assert_eq!(session.stage(), ImportStage::Preview);
    assert_eq!(session.last_failure(), Some(ImportStage::ImportError));
    assert_eq!(session.preview().map(|p| p.valid_count()), Some(3));
    assert!(session.file().is_some());
    assert!(session.last_error().unwrap().contains(REJECTION_MESSAGE));
    assert!(notifier.completed().is_empty());

    let errors = notifier.messages(NotificationLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains(REJECTION_MESSAGE));
    assert_eq!(inner.count_rows(StoreTable::Products, &owner()).await.unwrap(), 0);

    // 直接重试
    store.fail_products(false);
    let report = session.import(Some(&owner())).await.unwrap();
    assert_eq!(report.submitted, 3);
    assert_eq!(session.stage(), ImportStage::Done);
    assert_eq!(inner.count_rows(StoreTable::Products, &owner()).await.unwrap(), 3);
}

// ==========================================
// 写入细节
// ==========================================

#[tokio::test]
async fn test_item_failure_is_not_reported_to_user() {
    let (_temp_file, inner) = create_test_store().unwrap();
    let store = Arc::new(FailingStore::new(inner.clone()));
    store.fail_items(true);
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = create_default_session(store.clone(), notifier.clone());

    session.select_kind(ImportKind::Collections);
    session.select_file(fixture("collections.csv"));
    session.parse().await.unwrap();
    let report = session.import(Some(&owner())).await.unwrap();

    assert_eq!(report.items_inserted, 0);
    assert_eq!(report.item_error.as_deref(), Some(REJECTION_MESSAGE));
    assert_eq!(session.stage(), ImportStage::Done);
    assert_eq!(inner.count_rows(StoreTable::Collections, &owner()).await.unwrap(), 3);
    assert_eq!(inner.count_rows(StoreTable::Items, &owner()).await.unwrap(), 0);

    assert!(notifier.messages(NotificationLevel::Error).is_empty());
    assert_eq!(notifier.messages(NotificationLevel::Success).len(), 1);
}

#[tokio::test]
async fn test_missing_owner_writes_nothing() {
    let (_temp_file, store) = create_test_store().unwrap();
    let mut session = create_default_session(store.clone(), Arc::new(RecordingNotifier::new()));

    session.select_kind(ImportKind::Clients);
    session.select_file(fixture("clients.csv"));
    session.parse().await.unwrap();

    let result = session.import(None).await;
    assert!(matches!(result, Err(ImportError::NotAuthenticated)));
    let blank = Owner::new("  ");
    let result = session.import(Some(&blank)).await;
    assert!(matches!(result, Err(ImportError::NotAuthenticated)));

    assert_eq!(session.stage(), ImportStage::Preview);
    assert_eq!(store.count_rows(StoreTable::Clients, &owner()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_collections_invalidate_report_caches() {
    let (_temp_file, store) = create_test_store().unwrap();
    let invalidator = Arc::new(RecordingInvalidator::new());
    let mut session = create_session(store, invalidator.clone(), Arc::new(RecordingNotifier::new()));

    run_import(&mut session, ImportKind::Collections, fixture("collections.csv")).await;

    let keys: Vec<String> = invalidator.take().iter().map(|k| k.to_string()).collect();
    assert_eq!(keys.len(), 5);
    assert!(keys.contains(&"collections/user-42".to_string()));
    assert!(keys.contains(&"items/user-42".to_string()));
    assert!(keys.contains(&"collections/user-42/status-chart".to_string()));
    assert!(keys.contains(&"collections/user-42/metrics".to_string()));
    assert!(keys.contains(&"collections/user-42/donut-chart".to_string()));

    run_import(&mut session, ImportKind::Technicians, fixture("technicians.csv")).await;
    let keys: Vec<String> = invalidator.take().iter().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["technicians/user-42", "profiles/user-42"]);
}

#[tokio::test]
async fn test_session_reads_stored_configuration() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let store = Arc::new(logistics_import::SqliteLogisticsStore::new(&db_path).unwrap());
    let config = ConfigManager::new(&db_path).unwrap();
    config
        .set_global_config_value(config_keys::CSV_DELIMITER, ";")
        .unwrap();
    config
        .set_global_config_value(config_keys::DEFAULT_COLLECTION_STATUS, "completed")
        .unwrap();

    let mut session = create_default_session(store.clone(), Arc::new(RecordingNotifier::new()))
        .with_config(Arc::new(config));

    session.select_kind(ImportKind::Collections);
    session.select_file(SourceFile::new(
        "entregas.csv",
        "parceiro;endereco_origem;data;status\nACME;Rua A;2025-03-01;\nBeta;Rua B;2025-03-02;pendente\n"
            .as_bytes()
            .to_vec(),
    ));
    session.parse().await.unwrap();
    session.import(Some(&owner())).await.unwrap();

    let collections = store.list_collections(&owner()).await.unwrap();
    assert_eq!(collections.len(), 2);
    assert_eq!(collections[0].row.status, CollectionStatus::Completed);
    assert_eq!(collections[1].row.status, CollectionStatus::Pending);
}
