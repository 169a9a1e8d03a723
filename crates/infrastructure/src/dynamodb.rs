use crate::models::{item_to_todo, todo_key, todo_to_item, PARTITION_KEY};
use crate::repository::{RepositoryError, TodoRepository};
use crate::retry::{retry_store_operation, RetryConfig};
use async_trait::async_trait;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use domain::{NewTodo, Todo, TodoFilter, TodoId};
use shared::Config;
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, info};

// 再試行で回復しうるサービスエラー
const TRANSIENT_ERROR_CODES: &[&str] = &[
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "ThrottlingException",
    "InternalServerError",
];

#[derive(Clone)]
pub struct DynamoDbClient {
    client: Client,
    table_name: String,
}

impl DynamoDbClient {
    pub async fn new(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        Self {
            client: Client::new(&aws_config),
            table_name: config.dynamodb_table.clone(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// DynamoDB 上の ToDo ストア
///
/// 1 ToDo = 1 アイテム（`PK = TODO#<id>`）。一覧はスキャンで取得し、
/// owner / body / category の完全一致は FilterExpression に載せ、残りはメモリ上で評価する。
pub struct DynamoTodoRepository {
    db: DynamoDbClient,
    retry: RetryConfig,
}

impl DynamoTodoRepository {
    pub fn new(db: DynamoDbClient) -> Self {
        Self {
            db,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn scan_page(
        &self,
        filter: &TodoFilter,
        start_key: Option<HashMap<String, AttributeValue>>,
    ) -> Result<(Vec<Todo>, Option<HashMap<String, AttributeValue>>), RepositoryError> {
        let mut request = self
            .db
            .client()
            .scan()
            .table_name(self.db.table_name())
            .set_exclusive_start_key(start_key);

        let conditions = exact_conditions(filter);
        if !conditions.is_empty() {
            let mut expression = Vec::with_capacity(conditions.len());
            for (name, value) in conditions {
                expression.push(format!("#{name} = :{name}"));
                request = request
                    .expression_attribute_names(format!("#{name}"), name)
                    .expression_attribute_values(format!(":{name}"), AttributeValue::S(value.to_string()));
            }
            request = request.filter_expression(expression.join(" AND "));
        }

        let output = request.send().await.map_err(map_sdk_error)?;
        let todos = output
            .items()
            .iter()
            .map(item_to_todo)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((todos, output.last_evaluated_key().cloned()))
    }
}

#[async_trait]
impl TodoRepository for DynamoTodoRepository {
    async fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>, RepositoryError> {
        let mut todos = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let start = start_key.take();
            let (page, next) = retry_store_operation(
                move || self.scan_page(filter, start.clone()),
                &self.retry,
            )
            .await?;
            todos.extend(page);

            if next.is_none() {
                break;
            }
            start_key = next;
        }

        // ULID は時刻順に並ぶので ID 順 = 作成順
        todos.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(count = todos.len(), "scanned todos");
        Ok(filter.apply(todos))
    }

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, RepositoryError> {
        let db = &self.db;
        let output = retry_store_operation(
            move || async move {
                db.client()
                    .get_item()
                    .table_name(db.table_name())
                    .key(PARTITION_KEY, AttributeValue::S(todo_key(id)))
                    .send()
                    .await
                    .map_err(map_sdk_error)
            },
            &self.retry,
        )
        .await?;

        output.item().map(item_to_todo).transpose()
    }

    async fn insert(&self, new_todo: NewTodo) -> Result<Todo, RepositoryError> {
        let todo = new_todo.into_todo(TodoId::new());
        self.put_todo(&todo).await?;

        info!(todo_id = %todo.id, owner = %todo.owner, "todo stored in DynamoDB");
        Ok(todo)
    }
}

impl DynamoTodoRepository {
    /// 採番済みの ToDo を `attribute_not_exists` 条件付きで書き込む
    ///
    /// 500 応答でも書き込みが確定している場合があり、その再試行は条件チェックで
    /// 弾かれる。保存済みの内容が同一なら書き込み済みとして扱う。
    pub async fn put_todo(&self, todo: &Todo) -> Result<(), RepositoryError> {
        let item = todo_to_item(todo);
        let item = &item;
        let db = &self.db;

        let outcome = retry_store_operation(
            move || async move {
                db.client()
                    .put_item()
                    .table_name(db.table_name())
                    .set_item(Some(item.clone()))
                    .condition_expression(format!("attribute_not_exists({PARTITION_KEY})"))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(map_sdk_error)
            },
            &self.retry,
        )
        .await;

        confirm_put(outcome, todo, || self.get(&todo.id)).await
    }
}

async fn confirm_put<F, Fut>(
    outcome: Result<(), RepositoryError>,
    todo: &Todo,
    lookup: F,
) -> Result<(), RepositoryError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<Todo>, RepositoryError>>,
{
    let message = match outcome {
        Err(RepositoryError::Conflict(message)) => message,
        other => return other,
    };

    match lookup().await? {
        Some(stored) if stored == *todo => {
            debug!(todo_id = %todo.id, "conditional put was already applied");
            Ok(())
        }
        _ => Err(RepositoryError::Conflict(message)),
    }
}

// content は部分一致、status は旧データの真偽値を含むためメモリ上で評価する
fn exact_conditions(filter: &TodoFilter) -> Vec<(&'static str, &str)> {
    filter
        .predicates()
        .into_iter()
        .filter(|(name, _)| !matches!(*name, "content" | "status"))
        .collect()
}

fn map_sdk_error<E, R>(err: SdkError<E, R>) -> RepositoryError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    let transient = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => true,
        SdkError::ServiceError(service) => service
            .err()
            .code()
            .is_some_and(|code| TRANSIENT_ERROR_CODES.contains(&code)),
        _ => false,
    };

    let conflict = matches!(
        &err,
        SdkError::ServiceError(service) if service.err().code() == Some("ConditionalCheckFailedException")
    );

    if transient {
        RepositoryError::Transient(message)
    } else if conflict {
        RepositoryError::Conflict(message)
    } else {
        RepositoryError::DynamoDb(message)
    }
}
