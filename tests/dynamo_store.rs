//! Drives `DynamoTodoStore` through the real SDK against an in-process
//! stand-in for the DynamoDB JSON protocol.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_dynamodb::Client;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use chrono::Utc;
use serde_json::{json, Map, Value};
use todo_api::{
    domain::{
        repository::{StoreError, TodoStore},
        todo::{CreateTodo, Priority, Todo, TodoId, UpdateTodo},
    },
    infrastructure::dynamo_store::DynamoTodoStore,
};

const TABLE: &str = "todos-test";
const CONDITION_FAILED: &str = "ConditionalCheckFailedException";

#[derive(Default)]
struct FakeTable {
    items: BTreeMap<String, Map<String, Value>>,
    page_size: usize,
    scans: usize,
}

type Shared = Arc<Mutex<FakeTable>>;
type Outcome = Result<Value, &'static str>;

impl FakeTable {
    fn scan(&mut self, req: &Value) -> Outcome {
        self.scans += 1;
        let after = req["ExclusiveStartKey"]["id"]["S"].as_str().map(str::to_string);
        let remaining: Vec<_> = self
            .items
            .iter()
            .filter(|(id, _)| after.as_ref().is_none_or(|start| *id > start))
            .collect();
        let page: Vec<_> = remaining.iter().take(self.page_size).collect();
        let mut out = json!({
            "Items": page.iter().map(|(_, item)| Value::Object((*item).clone())).collect::<Vec<_>>(),
            "Count": page.len(),
        });
        if remaining.len() > page.len() {
            if let Some((id, _)) = page.last() {
                out["LastEvaluatedKey"] = json!({ "id": { "S": id } });
            }
        }
        Ok(out)
    }

    fn put(&mut self, req: &Value) -> Outcome {
        let item = req["Item"].as_object().cloned().unwrap_or_default();
        let id = item["id"]["S"].as_str().unwrap_or_default().to_string();
        if guarded(req, "attribute_not_exists(#pk)") && self.items.contains_key(&id) {
            return Err(CONDITION_FAILED);
        }
        self.items.insert(id, item);
        Ok(json!({}))
    }

    fn update(&mut self, req: &Value) -> Outcome {
        let id = req["Key"]["id"]["S"].as_str().unwrap_or_default();
        let exists = self.items.contains_key(id);
        if guarded(req, "attribute_exists(#pk)") && !exists {
            return Err(CONDITION_FAILED);
        }
        let item = self.items.entry(id.to_string()).or_default();
        let clauses = req["UpdateExpression"].as_str().and_then(|e| e.strip_prefix("SET ")).unwrap_or_default();
        for clause in clauses.split(", ") {
            let (name, value) = clause.split_once(" = ").unwrap_or_default();
            let attribute = req["ExpressionAttributeNames"][name].as_str().unwrap_or_default();
            item.insert(attribute.to_string(), req["ExpressionAttributeValues"][value].clone());
        }
        Ok(match req["ReturnValues"].as_str() {
            Some("ALL_NEW") => json!({ "Attributes": item }),
            _ => json!({}),
        })
    }

    fn delete(&mut self, req: &Value) -> Outcome {
        let id = req["Key"]["id"]["S"].as_str().unwrap_or_default();
        if guarded(req, "attribute_exists(#pk)") && !self.items.contains_key(id) {
            return Err(CONDITION_FAILED);
        }
        let old = self.items.remove(id);
        Ok(match (req["ReturnValues"].as_str(), old) {
            (Some("ALL_OLD"), Some(item)) => json!({ "Attributes": item }),
            _ => json!({}),
        })
    }
}

fn guarded(req: &Value, condition: &str) -> bool {
    req["ConditionExpression"] == condition && req["ExpressionAttributeNames"]["#pk"] == "id"
}

async fn dynamodb(State(table): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    let target = headers.get("x-amz-target").and_then(|v| v.to_str().ok()).unwrap_or_default();
    let req: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    assert_eq!(req["TableName"], TABLE);
    let outcome = {
        let mut table = table.lock().unwrap();
        match target.rsplit('.').next() {
            Some("Scan") => table.scan(&req),
            Some("PutItem") => table.put(&req),
            Some("UpdateItem") => table.update(&req),
            Some("DeleteItem") => table.delete(&req),
            _ => Err("UnknownOperationException"),
        }
    };
    let (status, body) = match outcome {
        Ok(body) => (StatusCode::OK, body),
        Err(kind) => (
            StatusCode::BAD_REQUEST,
            json!({ "__type": format!("com.amazonaws.dynamodb.v20120810#{kind}"), "message": "The conditional request failed" }),
        ),
    };
    (status, [(header::CONTENT_TYPE, "application/x-amz-json-1.0")], body.to_string()).into_response()
}

async fn store(page_size: usize) -> (DynamoTodoStore, Shared) {
    let table: Shared = Arc::new(Mutex::new(FakeTable { page_size, ..Default::default() }));
    let app = Router::new().route("/", post(dynamodb)).with_state(Arc::clone(&table));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let config = aws_sdk_dynamodb::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("eu-west-1"))
        .credentials_provider(Credentials::new("test", "test", None, None, "static"))
        .endpoint_url(format!("http://{addr}"))
        .build();
    (DynamoTodoStore::new(Client::from_conf(config), TABLE), table)
}

fn todo(text: &str, priority: Priority) -> Todo {
    Todo::new(CreateTodo { text: text.into(), priority }, Utc::now())
}

#[tokio::test]
async fn scan_follows_every_page() {
    let (store, table) = store(2).await;
    for text in ["one", "two", "three", "four", "five"] {
        store.create_if_absent(&todo(text, Priority::Medium)).await.unwrap();
    }

    let listing = store.list_all().await.unwrap();
    assert_eq!(listing.count, 5);
    let mut texts: Vec<_> = listing.items.iter().map(|t| t.text.as_str()).collect();
    texts.sort();
    assert_eq!(texts, ["five", "four", "one", "three", "two"]);
    assert_eq!(table.lock().unwrap().scans, 3);
}

#[tokio::test]
async fn duplicate_put_is_already_exists() {
    let (store, _) = store(10).await;
    let todo = todo("once", Priority::Low);
    store.create_if_absent(&todo).await.unwrap();
    match store.create_if_absent(&todo).await {
        Err(StoreError::AlreadyExists(id)) => assert_eq!(id, todo.id),
        other => panic!("expected AlreadyExists, got {other:?}"),
    }
}

#[tokio::test]
async fn update_returns_the_new_item() {
    let (store, _) = store(10).await;
    let todo = todo("walk dog", Priority::High);
    store.create_if_absent(&todo).await.unwrap();

    let patch = UpdateTodo { completed: Some(true), ..Default::default() };
    let updated = store.update_if_present(&todo.id, &patch).await.unwrap();
    assert!(updated.completed);
    assert_eq!(updated.text, "walk dog");
    assert_eq!(updated.priority, Priority::High);
    assert!(updated.updated_at >= todo.updated_at);
}

#[tokio::test]
async fn update_and_delete_of_missing_ids_are_not_found() {
    let (store, table) = store(10).await;
    let id = TodoId::from("does-not-exist");

    let patch = UpdateTodo { text: Some("x".into()), ..Default::default() };
    assert!(matches!(store.update_if_present(&id, &patch).await, Err(StoreError::NotFound(_))));
    assert!(matches!(store.delete_if_present(&id).await, Err(StoreError::NotFound(_))));
    assert!(table.lock().unwrap().items.is_empty());
}

#[tokio::test]
async fn delete_returns_the_old_item() {
    let (store, table) = store(10).await;
    let todo = todo("archive", Priority::Low);
    store.create_if_absent(&todo).await.unwrap();

    let removed = store.delete_if_present(&todo.id).await.unwrap();
    assert_eq!(removed.id, todo.id);
    assert_eq!(removed.priority, Priority::Low);
    assert!(table.lock().unwrap().items.is_empty());
}

#[tokio::test]
async fn legacy_items_list_with_defaults() {
    let (store, table) = store(10).await;
    let item = json!({
        "id": { "S": "1700000000000" },
        "text": { "S": "Test todo" },
        "completed": { "BOOL": true },
        "createdAt": { "S": "2024-01-02T03:04:05.000Z" },
    });
    table.lock().unwrap().items.insert("1700000000000".into(), item.as_object().cloned().unwrap());

    let listing = store.list_all().await.unwrap();
    assert_eq!(listing.count, 1);
    let todo = &listing.items[0];
    assert_eq!(todo.priority, Priority::Medium);
    assert!(todo.completed);
    assert_eq!(todo.updated_at, todo.created_at);
}
