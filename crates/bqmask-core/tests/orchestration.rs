//! End-to-end masking runs against the in-memory warehouse.

use std::time::Duration;

use bqmask_core::memory::{MemoryWarehouse, Value, fingerprint};
use bqmask_core::{
    DatasetOrchestrator, MaskError, MultiDatasetRunner, RunOptions, WarehouseError, hash_datasets,
};
use bqmask_model::{
    ColumnSchema, ColumnType, DatasetRef, FailureStage, FailureTarget, OverwritePolicy, ProjectId,
    TableId, TableKind, TableSchema,
};

fn project(name: &str) -> ProjectId {
    ProjectId::new(name).unwrap()
}

fn table_id(id: &str) -> TableId {
    TableId::parse(id).unwrap()
}

fn options() -> RunOptions {
    RunOptions::default().with_poll_interval(Duration::from_millis(1))
}

fn add_table(warehouse: &MemoryWarehouse, id: &str, rows: Vec<Vec<Value>>) {
    let schema = TableSchema::new(
        table_id(id),
        TableKind::Table,
        Some("EU".to_string()),
        vec![
            ColumnSchema::new("id", ColumnType::Integer),
            ColumnSchema::new("email", ColumnType::String),
            ColumnSchema::new("signup_date", ColumnType::from_type_name("DATE")),
        ],
    )
    .unwrap();
    warehouse.add_table(schema, rows);
}

fn customer_rows() -> Vec<Vec<Value>> {
    vec![
        vec![
            Value::Integer(1),
            Value::from("ada@example.com"),
            Value::Other("2024-01-02".to_string()),
        ],
        vec![Value::Integer(2), Value::Null, Value::Null],
    ]
}

fn add_view(warehouse: &MemoryWarehouse, id: &str) {
    let schema = TableSchema::new(
        table_id(id),
        TableKind::View,
        None,
        vec![ColumnSchema::new("id", ColumnType::Integer)],
    )
    .unwrap();
    warehouse.add_table(schema, vec![]);
}

/// Dataset `prod.sales` with tables a, b, c and a view.
fn sales_warehouse() -> MemoryWarehouse {
    let warehouse = MemoryWarehouse::new();
    add_table(&warehouse, "prod.sales.a", customer_rows());
    add_table(&warehouse, "prod.sales.b", customer_rows());
    add_table(&warehouse, "prod.sales.c", customer_rows());
    add_view(&warehouse, "prod.sales.recent");
    warehouse
}

fn datasets(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

fn sorted_targets(error: &MaskError) -> Vec<String> {
    let mut targets = error.failures().expect("run failure").targets();
    targets.sort();
    targets
}

#[tokio::test]
async fn test_masks_every_table_into_target_project() {
    let warehouse = sales_warehouse();

    let summary = MultiDatasetRunner::new(&warehouse, options())
        .run(
            &project("prod"),
            &project("masked"),
            &datasets(&["sales"]),
            OverwritePolicy::Truncate,
        )
        .await
        .expect("run succeeds");

    assert_eq!(summary.datasets, 1);
    assert_eq!(summary.tables_masked, 3);
    assert_eq!(summary.tables_skipped, 1);
    assert_eq!(summary.passthrough_columns, 3);

    let masked = warehouse.table(&table_id("masked.sales.a")).expect("masked table");
    let names: Vec<&str> = masked.schema.column_names().collect();
    assert_eq!(names, vec!["id", "email", "signup_date"]);
    assert_eq!(masked.schema.location.as_deref(), Some("EU"));

    let first = &masked.rows[0];
    assert_eq!(first[0], Value::Integer(fingerprint("1")));
    assert_ne!(first[1], Value::from("ada@example.com"));
    assert_eq!(first[2], Value::Other("2024-01-02".to_string()));
    assert_eq!(masked.rows[1], vec![Value::Integer(fingerprint("2")), Value::Null, Value::Null]);

    // Source tables are left untouched and views are never materialized.
    assert_eq!(warehouse.rows(&table_id("prod.sales.a")), Some(customer_rows()));
    assert!(warehouse.table(&table_id("masked.sales.recent")).is_none());
}

#[tokio::test]
async fn test_equal_keys_stay_joinable_across_tables() {
    let warehouse = sales_warehouse();

    MultiDatasetRunner::new(&warehouse, options())
        .run(
            &project("prod"),
            &project("masked"),
            &datasets(&["sales"]),
            OverwritePolicy::Truncate,
        )
        .await
        .expect("run succeeds");

    let a = warehouse.rows(&table_id("masked.sales.a")).unwrap();
    let c = warehouse.rows(&table_id("masked.sales.c")).unwrap();
    assert_eq!(a, c);
}

#[tokio::test]
async fn test_schema_failure_is_isolated_to_its_table() {
    let warehouse = sales_warehouse();
    warehouse.fail_schema(
        table_id("prod.sales.b"),
        WarehouseError::Transport("connection reset".to_string()),
    );

    let report = DatasetOrchestrator::new(&warehouse, options())
        .run(
            &DatasetRef::new(project("prod"), "sales").unwrap(),
            &project("masked"),
            OverwritePolicy::Truncate,
        )
        .await;

    assert_eq!(report.failures.targets(), vec!["masked.sales.b"]);
    let failure = report.failures.iter().next().unwrap();
    assert_eq!(failure.stage, FailureStage::SchemaFetch);
    assert!(failure.cause.contains("connection reset"));
    assert_eq!(report.tables_masked, 2);

    let mut submitted: Vec<String> = warehouse
        .submitted_destinations()
        .iter()
        .map(ToString::to_string)
        .collect();
    submitted.sort();
    assert_eq!(submitted, vec!["masked.sales.a", "masked.sales.c"]);
    assert!(warehouse.table(&table_id("masked.sales.a")).is_some());
    assert!(warehouse.table(&table_id("masked.sales.c")).is_some());
}

#[tokio::test]
async fn test_submission_and_job_failures_are_reported_after_all_tables_ran() {
    let warehouse = sales_warehouse();
    warehouse.reject_submission(
        table_id("prod.sales.a"),
        WarehouseError::Rejected("Access Denied".to_string()),
    );
    warehouse.fail_job(table_id("prod.sales.c"), "Resources exceeded during query execution");

    let error = MultiDatasetRunner::new(&warehouse, options())
        .run(
            &project("prod"),
            &project("masked"),
            &datasets(&["sales"]),
            OverwritePolicy::Truncate,
        )
        .await
        .unwrap_err();

    assert_eq!(sorted_targets(&error), vec!["masked.sales.a", "masked.sales.c"]);
    let failures = error.failures().unwrap();
    let stages: Vec<FailureStage> = {
        let mut stages: Vec<_> = failures.iter().map(|f| f.stage).collect();
        stages.sort_by_key(|stage| stage.as_str());
        stages
    };
    assert_eq!(stages, vec![FailureStage::Execution, FailureStage::Submission]);
    assert!(
        failures
            .iter()
            .any(|f| f.cause == "Resources exceeded during query execution")
    );

    // The healthy sibling was still masked.
    assert!(warehouse.table(&table_id("masked.sales.b")).is_some());

    let message = error.to_string();
    assert!(message.contains("masked.sales.a"));
    assert!(message.contains("masked.sales.c"));
}

#[tokio::test]
async fn test_same_project_is_refused_before_listing() {
    let warehouse = sales_warehouse();

    let error = hash_datasets(
        &warehouse,
        &project("prod"),
        &project("prod"),
        &datasets(&["sales", "hr"]),
        OverwritePolicy::Truncate,
        options(),
    )
    .await
    .unwrap_err();

    assert!(matches!(error, MaskError::Configuration { .. }));
    assert!(warehouse.listed_datasets().is_empty());
    assert!(warehouse.submitted_destinations().is_empty());
}

#[tokio::test]
async fn test_zero_datasets_is_a_successful_run() {
    let warehouse = MemoryWarehouse::new();

    let summary = hash_datasets(
        &warehouse,
        &project("prod"),
        &project("masked"),
        &[],
        OverwritePolicy::Truncate,
        options(),
    )
    .await
    .expect("empty run succeeds");

    assert_eq!(summary.datasets, 0);
    assert_eq!(summary.tables_masked, 0);
}

#[tokio::test]
async fn test_failures_are_merged_across_datasets() {
    let warehouse = sales_warehouse();
    add_table(&warehouse, "prod.hr.people", customer_rows());
    add_table(&warehouse, "prod.hr.payroll", customer_rows());
    warehouse.fail_job(table_id("prod.sales.a"), "Syntax error");
    warehouse.fail_schema(
        table_id("prod.hr.payroll"),
        WarehouseError::NotFound("Table prod.hr.payroll".to_string()),
    );
    warehouse.fail_listing(
        DatasetRef::new(project("prod"), "ops").unwrap(),
        WarehouseError::Rejected("Access Denied".to_string()),
    );

    let error = MultiDatasetRunner::new(&warehouse, options())
        .run(
            &project("prod"),
            &project("masked"),
            &datasets(&["sales", "ops", "hr"]),
            OverwritePolicy::Truncate,
        )
        .await
        .unwrap_err();

    assert_eq!(
        sorted_targets(&error),
        vec!["masked.hr.payroll", "masked.ops", "masked.sales.a"]
    );
    let listing = error
        .failures()
        .unwrap()
        .iter()
        .find(|f| f.stage == FailureStage::ListTables)
        .unwrap();
    assert!(matches!(listing.target, FailureTarget::Dataset(_)));

    // Every dataset was attempted despite earlier failures.
    let listed: Vec<String> = warehouse
        .listed_datasets()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(listed, vec!["prod.sales", "prod.ops", "prod.hr"]);
    assert!(warehouse.table(&table_id("masked.hr.people")).is_some());
}

#[tokio::test]
async fn test_pending_jobs_are_polled_until_done() {
    let warehouse = sales_warehouse().with_pending_polls(3);

    let summary = MultiDatasetRunner::new(&warehouse, options().with_table_concurrency(2))
        .run(
            &project("prod"),
            &project("masked"),
            &datasets(&["sales"]),
            OverwritePolicy::Truncate,
        )
        .await
        .expect("run succeeds");

    assert_eq!(summary.tables_masked, 3);
}

#[tokio::test]
async fn test_overwrite_policies_control_existing_destinations() {
    let warehouse = MemoryWarehouse::new();
    add_table(&warehouse, "prod.sales.a", customer_rows());
    let source = project("prod");
    let target = project("masked");
    let names = datasets(&["sales"]);
    let runner = MultiDatasetRunner::new(&warehouse, options());
    let run = |policy| runner.run(&source, &target, &names, policy);
    let destination = table_id("masked.sales.a");

    run(OverwritePolicy::FailIfExists).await.expect("first run creates");
    assert_eq!(warehouse.rows(&destination).unwrap().len(), 2);

    let error = run(OverwritePolicy::FailIfExists).await.unwrap_err();
    assert_eq!(sorted_targets(&error), vec!["masked.sales.a"]);

    run(OverwritePolicy::Append).await.expect("append succeeds");
    assert_eq!(warehouse.rows(&destination).unwrap().len(), 4);

    run(OverwritePolicy::Truncate).await.expect("truncate succeeds");
    assert_eq!(warehouse.rows(&destination).unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_dataset_name_is_refused() {
    let warehouse = sales_warehouse();

    let error = MultiDatasetRunner::new(&warehouse, options())
        .run(
            &project("prod"),
            &project("masked"),
            &datasets(&["sales", "bad name"]),
            OverwritePolicy::Truncate,
        )
        .await
        .unwrap_err();

    assert!(matches!(error, MaskError::InvalidDataset { .. }));
    assert!(warehouse.listed_datasets().is_empty());
}

#[tokio::test]
async fn test_plan_builds_specs_without_submitting() {
    let warehouse = sales_warehouse();
    warehouse.fail_schema(
        table_id("prod.sales.c"),
        WarehouseError::Rejected("Access Denied".to_string()),
    );

    let plan = MultiDatasetRunner::new(&warehouse, options())
        .plan(
            &project("prod"),
            &project("masked"),
            &datasets(&["sales"]),
            OverwritePolicy::Append,
        )
        .await
        .expect("plan succeeds");

    let destinations: Vec<String> = plan
        .specs
        .iter()
        .map(|spec| spec.destination.to_string())
        .collect();
    assert_eq!(destinations, vec!["masked.sales.a", "masked.sales.b"]);
    assert!(plan.specs.iter().all(|spec| spec.overwrite == OverwritePolicy::Append));
    assert_eq!(plan.failures.targets(), vec!["masked.sales.c"]);
    assert_eq!(plan.tables_skipped, 1);
    assert!(warehouse.submitted_destinations().is_empty());
}

#[tokio::test]
async fn test_plan_refuses_same_project() {
    let warehouse = sales_warehouse();

    let error = MultiDatasetRunner::new(&warehouse, options())
        .plan(
            &project("prod"),
            &project("prod"),
            &datasets(&["sales"]),
            OverwritePolicy::Truncate,
        )
        .await
        .unwrap_err();

    assert!(matches!(error, MaskError::Configuration { .. }));
}

#[tokio::test]
async fn test_transient_poll_errors_are_retried() {
    let warehouse = sales_warehouse();
    warehouse.fail_polls(
        table_id("prod.sales.a"),
        vec![
            WarehouseError::Transport("503 Service Unavailable".to_string()),
            WarehouseError::Transport("connection reset".to_string()),
        ],
    );

    let summary = MultiDatasetRunner::new(&warehouse, options())
        .run(
            &project("prod"),
            &project("masked"),
            &datasets(&["sales"]),
            OverwritePolicy::Truncate,
        )
        .await
        .expect("run succeeds once polling recovers");

    assert_eq!(summary.tables_masked, 3);
    assert!(warehouse.table(&table_id("masked.sales.a")).is_some());
}

#[tokio::test]
async fn test_lost_job_fails_its_table() {
    let warehouse = sales_warehouse();
    warehouse.fail_polls(
        table_id("prod.sales.b"),
        vec![WarehouseError::NotFound("Job memory_job_2".to_string())],
    );

    let report = DatasetOrchestrator::new(&warehouse, options())
        .run(
            &DatasetRef::new(project("prod"), "sales").unwrap(),
            &project("masked"),
            OverwritePolicy::Truncate,
        )
        .await;

    assert_eq!(report.failures.targets(), vec!["masked.sales.b"]);
    let failure = report.failures.iter().next().unwrap();
    assert_eq!(failure.stage, FailureStage::Execution);
    assert!(failure.cause.starts_with("failed to poll job"));
    assert_eq!(report.tables_masked, 2);
}

#[tokio::test]
async fn test_table_without_columns_fails_at_submission() {
    let warehouse = sales_warehouse();
    let empty = TableSchema::new(
        table_id("prod.sales.empty"),
        TableKind::Table,
        None,
        vec![],
    )
    .unwrap();
    warehouse.add_table(empty, vec![]);

    let report = DatasetOrchestrator::new(&warehouse, options())
        .run(
            &DatasetRef::new(project("prod"), "sales").unwrap(),
            &project("masked"),
            OverwritePolicy::Truncate,
        )
        .await;

    assert_eq!(report.failures.targets(), vec!["masked.sales.empty"]);
    let failure = report.failures.iter().next().unwrap();
    assert_eq!(failure.stage, FailureStage::Submission);
    assert!(failure.cause.contains("no columns"));
    assert_eq!(report.tables_masked, 3);

    let submitted = warehouse.submitted_destinations();
    assert_eq!(submitted.len(), 3);
    assert!(!submitted.contains(&table_id("masked.sales.empty")));
    assert!(warehouse.table(&table_id("masked.sales.empty")).is_none());
}

#[tokio::test]
async fn test_qualified_dataset_name_is_refused() {
    let warehouse = sales_warehouse();

    let error = MultiDatasetRunner::new(&warehouse, options())
        .run(
            &project("prod"),
            &project("masked"),
            &datasets(&["masked.sales"]),
            OverwritePolicy::Truncate,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        MaskError::InvalidDataset { ref dataset, .. } if dataset == "masked.sales"
    ));
    assert!(warehouse.listed_datasets().is_empty());
}
