use std::time::Duration;

use serde_json::{
  Value,
  json
};
use taskboard_core::StoreError;
use taskboard_core::remote::{
  HttpStoreConfig,
  HttpTaskStore,
  TaskStore
};
use taskboard_shared::{
  PageQuery,
  Severity,
  SortOrder,
  TaskCreate,
  TaskId,
  TaskPatch,
  TaskStatus
};
use wiremock::matchers::{
  body_json,
  method,
  path,
  query_param
};
use wiremock::{
  Mock,
  MockServer,
  ResponseTemplate
};

async fn store(server: &MockServer) -> HttpTaskStore {
  HttpTaskStore::new(&HttpStoreConfig {
    base_url: format!("{}/api/", server.uri()),
    timeout:  Duration::from_secs(2)
  })
  .expect("valid store config")
}

fn task_json(id: &str, status: &str) -> Value {
  json!({
    "_id": id,
    "title": format!("task {id}"),
    "priority": "high",
    "status": status,
    "dueDate": "2026-10-08T00:00:00.000Z",
    "category": "ops",
    "tags": ["release"],
    "assignedTo": [{"_id": "u1", "name": "Ada"}, "u2"],
    "createdAt": "2026-10-01T08:00:00Z",
    "updatedAt": "2026-10-02T08:00:00Z",
    "overdueMetadata": {
      "isOverdue": true,
      "daysPastDue": 8,
      "severity": "critical"
    }
  })
}

fn query() -> PageQuery {
  PageQuery {
    page:         2,
    limit:        10,
    sort_by:      "updatedAt".to_string(),
    sort_order:   SortOrder::Desc,
    overdue_only: false
  }
}

#[tokio::test]
async fn lists_a_status_page_with_query_parameters() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/tasks/status/in_progress"))
    .and(query_param("page", "2"))
    .and(query_param("limit", "10"))
    .and(query_param("sortBy", "updatedAt"))
    .and(query_param("sortOrder", "desc"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "tasks": [task_json("t1", "in_progress")],
      "pagination": {
        "currentPage": 2,
        "totalPages": 3,
        "totalTasks": 21,
        "hasNextPage": true,
        "hasPrevPage": true
      },
      "statusMetadata": {"count": 21, "overdueCount": 4},
      "overdueMetadata": {
        "totalOverdue": 4,
        "severityBreakdown": {"critical": 1, "high": 3}
      }
    })))
    .expect(1)
    .mount(&server)
    .await;

  let page = store(&server)
    .await
    .list_tasks_by_status(TaskStatus::InProgress, &query())
    .await
    .expect("page");

  assert_eq!(page.tasks.len(), 1);
  let task = &page.tasks[0];
  assert_eq!(task.id, TaskId::from("t1"));
  assert_eq!(task.assignees.len(), 2);
  assert_eq!(task.assignees[0].name.as_deref(), Some("Ada"));
  assert_eq!(task.assignees[1].id, "u2");
  assert_eq!(
    task.overdue.as_ref().and_then(|o| o.severity),
    Some(Severity::Critical)
  );
  assert!(page.pagination.has_next_page);
  assert_eq!(page.pagination.total_tasks, 21);
  assert_eq!(page.status_metadata.map(|s| s.overdue), Some(4));
  assert_eq!(
    page
      .overdue_metadata
      .map(|o| o.by_severity.high),
    Some(3)
  );
}

#[tokio::test]
async fn overdue_listing_hits_its_own_route() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/tasks/status/todo/overdue"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "tasks": [],
      "pagination": {"currentPage": 1, "totalPages": 0, "totalTasks": 0}
    })))
    .expect(1)
    .mount(&server)
    .await;

  let page = store(&server)
    .await
    .list_overdue_tasks_by_status(TaskStatus::Todo, &query())
    .await
    .expect("page");
  assert!(page.tasks.is_empty());
  assert!(page.status_metadata.is_none());
}

#[tokio::test]
async fn create_posts_payload_and_unwraps_task() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/api/tasks"))
    .and(body_json(json!({
      "title": "Ship release",
      "status": "todo",
      "tags": [],
      "assignedTo": []
    })))
    .respond_with(
      ResponseTemplate::new(201)
        .set_body_json(json!({"task": task_json("new", "todo")}))
    )
    .expect(1)
    .mount(&server)
    .await;

  let mut payload = TaskCreate::titled("Ship release");
  payload.status = Some(TaskStatus::Todo);
  let task = store(&server)
    .await
    .create_task(&payload)
    .await
    .expect("created");
  assert_eq!(task.id.as_str(), "new");
  assert_eq!(task.status, TaskStatus::Todo);
}

#[tokio::test]
async fn update_sends_explicit_nulls_for_cleared_fields() {
  let server = MockServer::start().await;
  Mock::given(method("PUT"))
    .and(path("/api/tasks/t1"))
    .and(body_json(json!({
      "title": "Renamed",
      "dueDate": null
    })))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_json(json!({"task": task_json("t1", "todo")}))
    )
    .expect(1)
    .mount(&server)
    .await;

  let patch = TaskPatch {
    title: Some("Renamed".to_string()),
    due_date: Some(None),
    ..TaskPatch::default()
  };
  store(&server)
    .await
    .update_task(&TaskId::from("t1"), &patch)
    .await
    .expect("updated");
}

#[tokio::test]
async fn status_change_uses_patch_route() {
  let server = MockServer::start().await;
  Mock::given(method("PATCH"))
    .and(path("/api/tasks/t1/status"))
    .and(body_json(json!({"status": "done"})))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_json(json!({"task": task_json("t1", "done")}))
    )
    .expect(1)
    .mount(&server)
    .await;

  let task = store(&server)
    .await
    .update_task_status(&TaskId::from("t1"), TaskStatus::Done)
    .await
    .expect("moved");
  assert_eq!(task.status, TaskStatus::Done);
}

#[tokio::test]
async fn delete_maps_missing_task_to_not_found() {
  let server = MockServer::start().await;
  Mock::given(method("DELETE"))
    .and(path("/api/tasks/gone"))
    .respond_with(ResponseTemplate::new(404))
    .mount(&server)
    .await;
  Mock::given(method("DELETE"))
    .and(path("/api/tasks/t1"))
    .respond_with(ResponseTemplate::new(204))
    .mount(&server)
    .await;

  let store = store(&server).await;
  store
    .delete_task(&TaskId::from("t1"))
    .await
    .expect("deleted");
  let err = store
    .delete_task(&TaskId::from("gone"))
    .await
    .expect_err("missing");
  assert!(matches!(err, StoreError::NotFound(id) if id.as_str() == "gone"));
}

#[tokio::test]
async fn server_errors_carry_the_body_message() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/api/tasks"))
    .respond_with(
      ResponseTemplate::new(422)
        .set_body_json(json!({"message": "Title is too long"}))
    )
    .mount(&server)
    .await;

  let err = store(&server)
    .await
    .create_task(&TaskCreate::titled("x"))
    .await
    .expect_err("rejected");
  match err {
    | StoreError::Status {
      status,
      message
    } => {
      assert_eq!(status, 422);
      assert_eq!(message, "Title is too long");
    }
    | other => panic!("unexpected error: {other:?}")
  }
}

#[tokio::test]
async fn malformed_bodies_are_decode_errors() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/tasks/statistics"))
    .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
    .mount(&server)
    .await;

  let err = store(&server)
    .await
    .task_statistics()
    .await
    .expect_err("not json");
  assert!(matches!(err, StoreError::Decode(_)));
}

#[tokio::test]
async fn statistics_decode_breakdowns() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/tasks/statistics"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "totalTasks": 9,
      "overdueBreakdown": {"low": 0, "medium": 1, "high": 2, "critical": 0},
      "normalBreakdown": {"todo": 4, "in_progress": 3, "done": 2},
      "completionRate": 22
    })))
    .mount(&server)
    .await;

  let stats = store(&server)
    .await
    .task_statistics()
    .await
    .expect("stats");
  assert_eq!(stats.total_tasks, 9);
  assert_eq!(stats.overdue_breakdown.total(), 3);
  assert_eq!(stats.normal_breakdown.in_progress, 3);
  assert!(stats.extra.contains_key("completionRate"));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
  let server = MockServer::builder().start().await;
  let uri = server.uri();
  drop(server);

  let store = HttpTaskStore::new(&HttpStoreConfig {
    base_url: format!("{uri}/api"),
    timeout:  Duration::from_secs(1)
  })
  .expect("valid config");
  let err = store
    .task_statistics()
    .await
    .expect_err("nothing listening");
  assert!(matches!(err, StoreError::Transport(_)));
}
