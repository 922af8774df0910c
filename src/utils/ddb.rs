use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeDefinition, AttributeValue, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection, ProjectionType, ProvisionedThroughput, ScalarAttributeType, TableStatus};
use chrono::NaiveDateTime;
use serde_json::Value;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::RepositoryStore;
use crate::utils::date::{DATE_FMT, format_date};

const LOCAL_ENDPOINT: &str = "http://localhost:8000";

pub(crate) async fn create_table(client: &Client,
                                 table_name: &str, pk: &str,
                                 gsi_pk: &str, gsi_sk: &str) -> LibraryResult<()> {
    let gsi = GlobalSecondaryIndex::builder()
        .index_name(format!("{}_ndx", table_name))
        .key_schema(KeySchemaElement::builder()
            .attribute_name(gsi_pk)
            .key_type(KeyType::Hash).build())
        .key_schema(KeySchemaElement::builder()
            .attribute_name(gsi_sk)
            .key_type(KeyType::Range).build())
        .projection(Projection::builder().projection_type(ProjectionType::All).build())
        .provisioned_throughput(
            ProvisionedThroughput::builder().read_capacity_units(10).write_capacity_units(10).build())
        .build();

    let mut request = client
        .create_table()
        .table_name(table_name)
        .global_secondary_indexes(gsi)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(pk)
                .key_type(KeyType::Hash)
                .build(),
        )
        .provisioned_throughput(
            ProvisionedThroughput::builder()
                .read_capacity_units(10)
                .write_capacity_units(10)
                .build(),
        );
    for attr in [pk, gsi_pk, gsi_sk] {
        request = request.attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(attr)
                .attribute_type(ScalarAttributeType::S)
                .build());
    }

    match request.send().await {
        Ok(_k) => {
            wait_until_table_status_is_not(client, table_name, TableStatus::Creating).await;
            Ok(())
        }
        Err(err) => {
            Err(LibraryError::database_or_unavailable(format!("failed to create {} table due to {}",
                                                              table_name, err).as_str(), None, false))
        }
    }
}

#[allow(dead_code)]
pub(crate) async fn delete_table(client: &Client, table_name: &str) -> LibraryResult<()> {
    match client.delete_table().table_name(table_name).send().await {
        Ok(_k) => {
            wait_until_table_status_is_not(client, table_name, TableStatus::Deleting).await;
            Ok(())
        }
        Err(err) => {
            Err(LibraryError::database_or_unavailable(format!("failed to delete {} table due to {}",
                                                              table_name, err).as_str(), None, false))
        }
    }
}

async fn wait_until_table_status_is_not(client: &Client, table_name: &str, other_status: TableStatus) {
    for _i in 0..30 {
        if let Ok(status) = describe_table(client, table_name).await {
            if status != other_status {
                return;
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

async fn describe_table(client: &Client, table_name: &str) -> LibraryResult<TableStatus> {
    match client
        .describe_table()
        .table_name(table_name)
        .send()
        .await
    {
        Ok(out) => {
            if let Some(status) = out.table().and_then(|t| t.table_status()) {
                return Ok(status.clone());
            }
            Err(LibraryError::runtime(format!("failed to describe {} table",
                                              table_name).as_str(), None))
        }
        Err(err) => {
            Err(LibraryError::database_or_unavailable(format!("failed to describe {} table due to {}",
                                                              table_name, err).as_str(), None, false))
        }
    }
}

pub(crate) fn parse_item(value: Value) -> Result<HashMap<String, AttributeValue>, String> {
    match value_to_item(value) {
        AttributeValue::M(map) => Ok(map),
        other => Err(format!("failed to parse{:?}", other)),
    }
}

pub(crate) fn parse_string_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> Option<String> {
    if let Some(AttributeValue::S(str)) = map.get(name) {
        return Some(str.clone());
    }
    None
}

pub(crate) fn parse_bool_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> bool {
    if let Some(AttributeValue::Bool(b)) = map.get(name) {
        return *b;
    }
    false
}

pub(crate) fn parse_date_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> Option<NaiveDateTime> {
    if let Some(AttributeValue::S(str)) = map.get(name) {
        // e.g. 2022-09-24T04:40:35.726029
        if let Ok(date) = NaiveDateTime::parse_from_str(str, DATE_FMT) {
            return Some(date);
        }
    }
    None
}

pub(crate) fn parse_opt_number_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> Option<i64> {
    if let Some(AttributeValue::N(str)) = map.get(name) {
        return str.parse::<i64>().ok();
    }
    None
}

pub(crate) fn parse_number_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> i64 {
    parse_opt_number_attribute(name, map).unwrap_or(0)
}

pub(crate) fn opt_string_date(opt_date: Option<NaiveDateTime>) -> AttributeValue {
    match opt_date {
        Some(date) => string_date(date),
        None => AttributeValue::Null(true),
    }
}

pub(crate) fn opt_string(opt: Option<&str>) -> AttributeValue {
    match opt {
        Some(s) => AttributeValue::S(s.to_string()),
        None => AttributeValue::Null(true),
    }
}

pub(crate) fn string_date(date: NaiveDateTime) -> AttributeValue {
    AttributeValue::S(format_date(date))
}

// FilterExpr collects a DynamoDB filter expression from a predicate. Attribute names are
// always aliased (`#name`) since words like `role` are reserved.
#[derive(Debug, Default)]
pub(crate) struct FilterExpr {
    pub expr: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

impl FilterExpr {
    pub(crate) fn from_predicate(predicate: &HashMap<String, String>, skip: &[&str]) -> FilterExpr {
        let mut filter = FilterExpr::default();
        for (k, v) in predicate {
            if skip.contains(&k.as_str()) {
                continue;
            }
            let ks = add_filter_expr(k.as_str(), &mut filter.expr);
            filter.names.insert(format!("#{}", ks), ks.clone());
            filter.values.insert(format!(":{}", ks), predicate_value(ks.as_str(), v));
        }
        filter
    }
}

// adds `#attr op :attr` to the expression; keys look like `due_date:<` or `title:contains`
pub(crate) fn add_filter_expr(k: &str, filter_expr: &mut String) -> String {
    let mut op = "=";
    let mut ks = k;
    let parts = k.split(':').collect::<Vec<&str>>();
    if parts.len() > 1 {
        ks = parts[0];
        op = parts[1];
    }
    let cond = if op == "contains" {
        format!("contains(#{}, :{})", ks, ks)
    } else {
        format!("#{} {} :{}", ks, op, ks)
    };
    if !filter_expr.is_empty() {
        filter_expr.push_str(" AND ");
    }
    filter_expr.push_str(cond.as_str());
    ks.to_string()
}

// attributes stored as BOOL; everything else that is filtered on is a string
const BOOL_ATTRS: [&str; 1] = ["available"];

pub(crate) fn predicate_value(attr: &str, v: &str) -> AttributeValue {
    match v.parse::<bool>() {
        Ok(b) if BOOL_ATTRS.contains(&attr) => AttributeValue::Bool(b),
        _ => AttributeValue::S(v.to_string()),
    }
}

pub(crate) fn to_ddb_page(page: Option<&str>) -> Option<HashMap<String, AttributeValue>> {
    if let Some(page) = page {
        if let Ok(str_map) = serde_json::from_str::<HashMap<String, String>>(page) {
            let mut attr_map = HashMap::new();
            for (k, v) in str_map {
                attr_map.insert(k, AttributeValue::S(v));
            }
            return Some(attr_map);
        }
    }
    None
}

pub(crate) fn from_ddb<T>(page: Option<&str>, page_size: usize,
                          last_evaluated_key: Option<&HashMap<String, AttributeValue>>,
                          records: Vec<T>) -> PaginatedResult<T> {
    let mut next_page: Option<String> = None;
    if let Some(attr_map) = last_evaluated_key {
        let mut str_map = HashMap::new();
        for (k, v) in attr_map {
            if let AttributeValue::S(val) = v {
                str_map.insert(k.clone(), val.to_string());
            }
        }
        if let Ok(j) = serde_json::to_string(&str_map) {
            next_page = Some(j);
        }
    }
    PaginatedResult::new(page, page_size, next_page, records)
}

fn value_to_item(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(a) => AttributeValue::L(a.into_iter().map(value_to_item).collect()),
        Value::Object(o) => {
            AttributeValue::M(o.into_iter().map(|(k, v)| (k, value_to_item(v))).collect())
        }
    }
}

// helper method to build db-client with tracing enabled
pub(crate) async fn build_db_client(store: RepositoryStore) -> Client {
    match store {
        RepositoryStore::LocalDynamoDB => {
            // See https://docs.aws.amazon.com/sdk-for-rust/latest/dg/dynamodb-local.html
            let dynamodb_local_config = aws_sdk_dynamodb::Config::builder()
                .region(Region::new("local"))
                .credentials_provider(
                    Credentials::new("AKIDLOCALSTACK", "localstacksecret", None, None, "faked"))
                .endpoint_url(LOCAL_ENDPOINT)
                .build();
            Client::from_conf(dynamodb_local_config)
        }
        RepositoryStore::DynamoDB | RepositoryStore::Memory => {
            //Get config from environment.
            let config = aws_config::load_from_env().await;
            Client::new(&config)
        }
    }
}

// required to enable CloudWatch error logging by the runtime
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // disable printing the name of the module in every log line.
        .with_target(false)
        // this needs to be set to false, otherwise ANSI color codes will
        // show up in a confusing manner in CloudWatch logs.
        .with_ansi(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .json()
        .init();
}

impl From<SdkError<UpdateItemError>> for LibraryError {
    fn from(err: SdkError<UpdateItemError>) -> Self {
        sdk_to_library_error(&err)
    }
}

impl From<SdkError<PutItemError>> for LibraryError {
    fn from(err: SdkError<PutItemError>) -> Self {
        sdk_to_library_error(&err)
    }
}

impl From<SdkError<DeleteItemError>> for LibraryError {
    fn from(err: SdkError<DeleteItemError>) -> Self {
        sdk_to_library_error(&err)
    }
}

impl From<SdkError<QueryError>> for LibraryError {
    fn from(err: SdkError<QueryError>) -> Self {
        sdk_to_library_error(&err)
    }
}

impl From<SdkError<ScanError>> for LibraryError {
    fn from(err: SdkError<ScanError>) -> Self {
        sdk_to_library_error(&err)
    }
}

impl From<SdkError<TransactWriteItemsError>> for LibraryError {
    fn from(err: SdkError<TransactWriteItemsError>) -> Self {
        sdk_to_library_error(&err)
    }
}

fn sdk_to_library_error<T: Debug>(err: &SdkError<T>) -> LibraryError {
    let message = format!("{:?}", err);
    let (retryable, reason) = retryable_sdk_error(err);
    // a failed condition inside a single write or a transaction means the record moved on
    let reason = if is_conditional_failure(message.as_str()) {
        Some("ConditionalCheckFailed".to_string())
    } else {
        reason
    };
    LibraryError::database_or_unavailable(message.as_str(), reason, retryable)
}

fn is_conditional_failure(message: &str) -> bool {
    message.contains("ConditionalCheckFailed") || message.contains("TransactionCanceledException")
}

fn retryable_sdk_error<T>(err: &SdkError<T>) -> (bool, Option<String>) {
    match err {
        SdkError::ConstructionFailure(_) => { (false, Some("ConstructionFailure".to_string())) }
        SdkError::TimeoutError(_) => { (true, Some("TimeoutError".to_string())) }
        SdkError::DispatchFailure(_) => { (true, Some("DispatchFailure".to_string())) }
        SdkError::ResponseError { .. } => { (true, Some("ResponseError".to_string())) }
        SdkError::ServiceError(ctx) => {
            (ctx.raw().http().status().is_server_error() || has_exceeded_limit(ctx.raw().http().body().bytes()), Some(ctx.raw().http().status().to_string()))
        }
        _ => { (true, Some("Unknown".to_string())) }
    }
}

fn has_exceeded_limit(opts: Option<&[u8]>) -> bool {
    opts.map(|b| b.windows(6).any(|w| w == b"ceeded")).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use aws_sdk_dynamodb::types::AttributeValue;
    use crate::utils::ddb::{add_filter_expr, FilterExpr, has_exceeded_limit, is_conditional_failure};

    #[tokio::test]
    async fn test_should_build_filter_expr() {
        let mut expr = String::new();
        assert_eq!("loan_status", add_filter_expr("loan_status", &mut expr).as_str());
        assert_eq!("due_date", add_filter_expr("due_date:<", &mut expr).as_str());
        assert_eq!("title_lc", add_filter_expr("title_lc:contains", &mut expr).as_str());
        assert_eq!("#loan_status = :loan_status AND #due_date < :due_date AND contains(#title_lc, :title_lc)", expr.as_str());
    }

    #[tokio::test]
    async fn test_should_build_filter_from_predicate() {
        let predicate = HashMap::from([
            ("available".to_string(), "true".to_string()),
            ("user_id".to_string(), "u1".to_string()),
        ]);
        let filter = FilterExpr::from_predicate(&predicate, &["user_id"]);
        assert_eq!("#available = :available", filter.expr.as_str());
        assert_eq!(Some(&"available".to_string()), filter.names.get("#available"));
        assert_eq!(Some(&AttributeValue::Bool(true)), filter.values.get(":available"));
    }

    #[tokio::test]
    async fn test_should_keep_text_searches_as_strings() {
        let predicate = HashMap::from([
            ("title_lc:contains".to_string(), "true".to_string()),
            ("available".to_string(), "false".to_string()),
        ]);
        let filter = FilterExpr::from_predicate(&predicate, &[]);
        assert_eq!(Some(&AttributeValue::S("true".to_string())), filter.values.get(":title_lc"));
        assert_eq!(Some(&AttributeValue::Bool(false)), filter.values.get(":available"));
    }

    #[tokio::test]
    async fn test_should_detect_throttling_and_conflicts() {
        assert!(has_exceeded_limit(Some(b"ProvisionedThroughputExceededException")));
        assert!(!has_exceeded_limit(Some(b"bad")));
        assert!(!has_exceeded_limit(None));
        assert!(is_conditional_failure("ServiceError { ConditionalCheckFailedException }"));
        assert!(!is_conditional_failure("ValidationException"));
    }
}
