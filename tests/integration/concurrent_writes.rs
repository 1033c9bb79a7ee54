//! Concurrent request tests against a file-backed store.
//!
//! Many clients hit the shared connection at once; every write must land
//! exactly once with its own id.
//!
//! Verification command: `cargo test --test concurrent_writes`

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tasklist_proto::task::{CreateTaskResponse, Task};
use tasklist_server::api::{ApiState, start_server};
use tasklist_server::repository::TaskRepository;
use tasklist_server::store::RecordStore;

const CLIENTS: usize = 64;

async fn start_file_server(dir: &tempfile::TempDir) -> SocketAddr {
    let store =
        RecordStore::open_file(&dir.path().join("tasks.db"), Duration::from_secs(5)).unwrap();
    let state = Arc::new(ApiState::new(TaskRepository::new(Arc::new(store))));
    let (addr, _handle) = start_server("127.0.0.1:0", state)
        .await
        .expect("failed to start test server");
    addr
}

async fn list(client: &reqwest::Client, addr: SocketAddr) -> Vec<Task> {
    client
        .get(format!("http://{addr}/api/tasks"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_creates_yield_distinct_ids_and_no_lost_writes() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_file_server(&dir).await;
    let client = reqwest::Client::new();

    let mut handles = Vec::with_capacity(CLIENTS);
    for i in 0..CLIENTS {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let title = format!("task #{i}");
            let response = client
                .post(format!("http://{addr}/api/tasks"))
                .json(&serde_json::json!({ "title": title }))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            let id = response.json::<CreateTaskResponse>().await.unwrap().id;
            (id, title)
        }));
    }

    let mut created = Vec::with_capacity(CLIENTS);
    for handle in handles {
        created.push(handle.await.unwrap());
    }

    let ids: HashSet<i64> = created.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids.len(), CLIENTS, "ids must be distinct");

    let tasks = list(&client, addr).await;
    assert_eq!(tasks.len(), CLIENTS, "no write may be lost");
    for (id, title) in &created {
        let task = tasks.iter().find(|t| t.id == *id).unwrap();
        assert_eq!(&task.title, title);
        assert!(!task.done);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_updates_and_deletes_touch_only_their_rows() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_file_server(&dir).await;
    let client = reqwest::Client::new();

    let mut ids = Vec::with_capacity(CLIENTS);
    for i in 0..CLIENTS {
        let response = client
            .post(format!("http://{addr}/api/tasks"))
            .json(&serde_json::json!({ "title": format!("t{i}") }))
            .send()
            .await
            .unwrap();
        ids.push(response.json::<CreateTaskResponse>().await.unwrap().id);
    }

    // Even positions are marked done, odd positions deleted, all at once.
    let mut handles = Vec::with_capacity(CLIENTS);
    for (pos, id) in ids.iter().copied().enumerate() {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let url = format!("http://{addr}/api/tasks/{id}");
            let response = if pos % 2 == 0 {
                client
                    .put(url)
                    .json(&serde_json::json!({ "done": true }))
                    .send()
                    .await
            } else {
                client.delete(url).send().await
            };
            assert_eq!(response.unwrap().status(), StatusCode::OK);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let tasks = list(&client, addr).await;
    assert_eq!(tasks.len(), CLIENTS / 2);
    let expected: Vec<i64> = ids.iter().copied().step_by(2).collect();
    let actual: Vec<i64> = tasks.iter().map(|t| t.id).collect();
    assert_eq!(actual, expected);
    assert!(tasks.iter().all(|t| t.done));
}
