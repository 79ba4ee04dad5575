//! HTTP tests for the REST client and remote sync against a mock server.

use std::collections::BTreeSet;

use chrono::Utc;
use mockito::{Matcher, Server};
use serde_json::json;

use pomoflow_core::api::{NewSubtask, NewTask, PomodoroQuery, TaskPatch, TaskQuery};
use pomoflow_core::{
    ApiClient, ApiError, ApiResponse, DistractionReport, LocalCache, MemoryStore, RemoteSync,
    SessionIdentity, TaskCategory, TimerMode, WorkCompletion, ANONYMOUS_USER_ID,
};

const USER: &str = "user-123";
const TOKEN: &str = "secret-token";

fn signed_in(server: &Server) -> ApiClient {
    ApiClient::new(&server.url(), &SessionIdentity::authenticated(TOKEN, USER)).unwrap()
}

fn user_query() -> Matcher {
    Matcher::UrlEncoded("user_id".into(), USER.into())
}

fn task_json(id: i64, title: &str) -> serde_json::Value {
    json!({
        "id": id, "title": title, "completed": false, "category": "laboral",
        "custom_category": null, "time_spent": 0, "user_id": USER,
        "created_at": "2024-05-01T10:00:00", "updated_at": "2024-05-01T10:00:00",
        "subtasks": []
    })
}

fn pomodoro_json(id: i64, completed: bool) -> serde_json::Value {
    json!({
        "id": id, "mode": "pomodoro", "objective": "write", "task_id": 7,
        "subtask_ids": [8, 9], "duration": 1500, "user_id": USER,
        "completed": completed, "started_at": null, "completed_at": null,
        "created_at": "2024-05-01T10:00:00", "updated_at": "2024-05-01T10:00:00"
    })
}

fn completion(credited_secs: u64) -> WorkCompletion {
    WorkCompletion {
        objective: "write".into(),
        task_id: Some(7),
        subtask_ids: BTreeSet::from([8, 9]),
        credited_secs,
        at: Utc::now(),
    }
}

#[tokio::test]
async fn test_list_tasks_sends_user_search_and_bearer() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/tasks")
        .match_query(Matcher::AllOf(vec![
            user_query(),
            Matcher::UrlEncoded("search".into(), "auth".into()),
        ]))
        .match_header("authorization", format!("Bearer {TOKEN}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([task_json(1, "Implement auth")]).to_string())
        .create_async()
        .await;

    let client = signed_in(&server);
    let tasks = client
        .tasks()
        .list(&TaskQuery {
            search: Some("auth".into()),
        })
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].category, TaskCategory::Laboral);
}

#[tokio::test]
async fn test_anonymous_requests_carry_no_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/statistics")
        .match_query(Matcher::UrlEncoded("user_id".into(), ANONYMOUS_USER_ID.into()))
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(
            json!({
                "total_pomodoros": 0, "total_time_spent": 0, "tasks_stats": [],
                "category_stats": [], "distractions_count": 0, "phone_usage_count": 0
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), &SessionIdentity::anonymous()).unwrap();
    let stats = client.statistics().get().await.unwrap();

    mock.assert_async().await;
    assert_eq!(stats.total_pomodoros, 0);
}

#[tokio::test]
async fn test_create_task_puts_user_in_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/tasks")
        .match_body(Matcher::PartialJson(json!({
            "title": "Plan sprint",
            "category": "otro",
            "user_id": USER
        })))
        .with_status(201)
        .with_body(task_json(5, "Plan sprint").to_string())
        .create_async()
        .await;

    let client = signed_in(&server);
    let mut task = NewTask::new("Plan sprint");
    task.category = TaskCategory::Other;
    let created = client.tasks().create(task).await.unwrap();

    mock.assert_async().await;
    assert_eq!(created.id, 5);
}

#[tokio::test]
async fn test_update_and_delete_carry_user_query() {
    let mut server = Server::new_async().await;
    let update = server
        .mock("PUT", "/api/v1/tasks/5")
        .match_query(user_query())
        .match_body(Matcher::Json(json!({"completed": true})))
        .with_status(200)
        .with_body(task_json(5, "Plan sprint").to_string())
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/api/v1/tasks/5")
        .match_query(user_query())
        .with_status(204)
        .create_async()
        .await;

    let client = signed_in(&server);
    let patch = TaskPatch {
        completed: Some(true),
        ..TaskPatch::default()
    };
    client.tasks().update(5, &patch).await.unwrap();
    let deleted = client.tasks().delete(5).await.unwrap();

    update.assert_async().await;
    delete.assert_async().await;
    assert!(deleted.is_no_content());
}

#[tokio::test]
async fn test_delete_with_body_is_data() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/api/v1/subtasks/9")
        .match_query(user_query())
        .with_status(200)
        .with_body(r#"{"message":"deleted"}"#)
        .create_async()
        .await;

    let client = signed_in(&server);
    let response = client.subtasks().delete(9).await.unwrap();
    assert_eq!(response, ApiResponse::Data(json!({"message": "deleted"})));
}

#[tokio::test]
async fn test_subtasks_by_task_and_create() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/api/v1/subtasks/task/7")
        .with_status(200)
        .with_body(
            json!([{"id": 8, "task_id": 7, "title": "JWT", "completed": false, "time_spent": 0}])
                .to_string(),
        )
        .create_async()
        .await;
    let create = server
        .mock("POST", "/api/v1/subtasks")
        .match_query(user_query())
        .match_body(Matcher::PartialJson(json!({"task_id": 7, "title": "Tests"})))
        .with_status(200)
        .with_body(json!({"id": 10, "task_id": 7, "title": "Tests"}).to_string())
        .create_async()
        .await;

    let client = signed_in(&server);
    let subtasks = client.subtasks().list_for_task(7).await.unwrap();
    let created = client
        .subtasks()
        .create(&NewSubtask::new(7, "Tests"))
        .await
        .unwrap();

    list.assert_async().await;
    create.assert_async().await;
    assert_eq!(subtasks[0].title, "JWT");
    assert_eq!(created.id, 10);
}

#[tokio::test]
async fn test_pomodoro_list_count_and_filters() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/api/v1/pomodoros")
        .match_query(Matcher::AllOf(vec![
            user_query(),
            Matcher::UrlEncoded("task_id".into(), "7".into()),
            Matcher::UrlEncoded("completed".into(), "true".into()),
        ]))
        .with_status(200)
        .with_body(json!([pomodoro_json(1, true)]).to_string())
        .create_async()
        .await;
    let count = server
        .mock("GET", "/api/v1/pomodoros/count")
        .match_query(user_query())
        .with_status(200)
        .with_body(r#"{"count": 12}"#)
        .create_async()
        .await;

    let client = signed_in(&server);
    let pomodoros = client
        .pomodoros()
        .list(&PomodoroQuery {
            task_id: Some(7),
            completed: Some(true),
        })
        .await
        .unwrap();
    let total = client.pomodoros().count().await.unwrap();

    list.assert_async().await;
    count.assert_async().await;
    assert_eq!(pomodoros[0].mode, TimerMode::Work);
    assert_eq!(pomodoros[0].subtask_ids, Some(vec![8, 9]));
    assert_eq!(total, 12);
}

#[tokio::test]
async fn test_error_detail_is_surfaced() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/tasks/99")
        .with_status(404)
        .with_body(r#"{"detail":"Tarea no encontrada"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/api/v1/tasks/98")
        .with_status(500)
        .with_body(r#"{"error":"boom"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/api/v1/tasks/97")
        .with_status(502)
        .with_body("Bad Gateway")
        .create_async()
        .await;

    let client = signed_in(&server);
    let detail = |err: ApiError| match err {
        ApiError::Status { status, detail } => (status, detail),
        other => panic!("expected status error, got {other:?}"),
    };

    assert_eq!(
        detail(client.tasks().get(99).await.unwrap_err()),
        (404, "Tarea no encontrada".to_string())
    );
    assert_eq!(
        detail(client.tasks().get(98).await.unwrap_err()),
        (500, "HTTP error! status: 500".to_string())
    );
    assert_eq!(
        detail(client.tasks().get(97).await.unwrap_err()),
        (502, "unknown error".to_string())
    );
}

#[tokio::test]
async fn test_no_content_where_body_expected() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/distractions/3")
        .with_status(204)
        .create_async()
        .await;

    let client = signed_in(&server);
    let err = client.distractions().get(3).await.unwrap_err();
    assert!(matches!(err, ApiError::UnexpectedNoContent));
}

#[tokio::test]
async fn test_record_completion_creates_then_completes() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/api/v1/pomodoros")
        .match_body(Matcher::PartialJson(json!({
            "mode": "pomodoro",
            "objective": "write",
            "task_id": 7,
            "subtask_ids": [8, 9],
            "duration": 1500,
            "user_id": USER
        })))
        .with_status(200)
        .with_body(pomodoro_json(41, false).to_string())
        .create_async()
        .await;
    let complete = server
        .mock("POST", "/api/v1/pomodoros/complete")
        .match_query(user_query())
        .match_body(Matcher::Json(json!({"pomodoro_id": 41, "actual_duration": 1500})))
        .with_status(200)
        .with_body(pomodoro_json(41, true).to_string())
        .create_async()
        .await;

    let sync = RemoteSync::new(signed_in(&server));
    let record = sync
        .record_completion(&completion(1500), TimerMode::Work)
        .await
        .unwrap();

    create.assert_async().await;
    complete.assert_async().await;
    assert!(record.completed);
}

#[tokio::test]
async fn test_submit_distraction_and_pull_tasks() {
    let mut server = Server::new_async().await;
    let distraction = server
        .mock("POST", "/api/v1/distractions")
        .match_body(Matcher::Json(json!({
            "pomodoro_id": 41,
            "had_distractions": true,
            "used_phone": false,
            "user_id": USER
        })))
        .with_status(200)
        .with_body(
            json!({"id": 1, "pomodoro_id": 41, "had_distractions": true,
                   "used_phone": false, "user_id": USER, "created_at": "2024-05-01T10:00:00"})
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/api/v1/tasks")
        .match_query(user_query())
        .with_status(200)
        .with_body(json!([task_json(1, "Remote task")]).to_string())
        .create_async()
        .await;

    let sync = RemoteSync::new(signed_in(&server));
    sync.submit_distraction(41, &DistractionReport::new(3, true, false))
        .await
        .unwrap();
    let tasks = sync.pull_tasks().await.unwrap();

    distraction.assert_async().await;
    assert_eq!(tasks[0].title, "Remote task");
    assert!(tasks[0].custom_category.is_empty());
}

#[tokio::test]
async fn test_report_goes_to_the_pomodoro_it_answers() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/v1/pomodoros")
        .with_status(200)
        .with_body(pomodoro_json(41, false).to_string())
        .create_async()
        .await;
    server
        .mock("POST", "/api/v1/pomodoros/complete")
        .match_query(user_query())
        .with_status(200)
        .with_body(pomodoro_json(41, true).to_string())
        .create_async()
        .await;
    let for_third = server
        .mock("POST", "/api/v1/distractions")
        .match_body(Matcher::PartialJson(json!({"pomodoro_id": 41})))
        .with_status(200)
        .with_body(
            json!({"id": 1, "pomodoro_id": 41, "had_distractions": true, "used_phone": false})
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let cache = LocalCache::new(MemoryStore::new());
    let sync = RemoteSync::new(signed_in(&server));
    sync.push_completion(&cache, 3, &completion(1500)).await.unwrap();
    assert_eq!(cache.remote_pomodoro_id(3), Some(41));

    let sent = sync
        .push_report(&cache, &DistractionReport::new(3, true, false))
        .await
        .unwrap();
    assert!(sent);

    let unsynced = sync
        .push_report(&cache, &DistractionReport::new(5, true, false))
        .await
        .unwrap();
    assert!(!unsynced);

    for_third.assert_async().await;
}

#[tokio::test]
async fn test_failed_completion_forgets_stale_remote_id() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/v1/pomodoros")
        .with_status(500)
        .with_body(r#"{"detail":"db down"}"#)
        .create_async()
        .await;
    let distractions = server
        .mock("POST", "/api/v1/distractions")
        .expect(0)
        .create_async()
        .await;

    let cache = LocalCache::new(MemoryStore::new());
    cache.save_remote_pomodoro(4, 12);
    cache.save_remote_pomodoro(3, 11);

    let sync = RemoteSync::new(signed_in(&server));
    let err = sync
        .push_completion(&cache, 4, &completion(1500))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(cache.remote_pomodoro_id(4), None);
    assert_eq!(cache.remote_pomodoro_id(3), Some(11));

    let sent = sync
        .push_report(&cache, &DistractionReport::new(4, false, true))
        .await
        .unwrap();
    assert!(!sent);
    distractions.assert_async().await;
}
