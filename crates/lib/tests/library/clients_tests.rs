//! Runtime clients agree with what synthesis wrote into the template.

use std::sync::Arc;

use nimbus_lib::client::local::{LocalFunctionBackend, LocalKeyValueBackend, LocalQueueBackend};
use nimbus_lib::client::{BasicFunctionClient, KeyValueClient, QueueClient, StaticEnvironment};
use nimbus_lib::config::ProjectConfig;
use nimbus_lib::declaration::Declarations;
use nimbus_lib::diagnostic::Diagnostics;
use nimbus_lib::resource::{Resource, ResourceKind};
use nimbus_lib::synth::BuildContext;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::common::TIMESTAMP;

const PROJECT: &str = r#"{
  "key_value_stores": [{ "type_name": "Order", "key_name": "id", "key_type": "number" }],
  "functions": [
    {
      "handler": { "class_name": "Mailer", "method_name": "send" },
      "trigger": { "kind": "basic" }
    },
    {
      "handler": { "class_name": "Worker", "method_name": "consume" },
      "trigger": { "kind": "queue", "id": "jobs" }
    },
    {
      "handler": { "class_name": "Checkout", "method_name": "submit" },
      "trigger": { "kind": "http", "method": "POST", "path": "orders" },
      "uses": [
        { "kind": "basic_function", "target": { "class_name": "Mailer", "method_name": "send" } },
        { "kind": "queue", "id": "jobs" },
        { "kind": "key_value_store", "store": "Order" }
      ]
    }
  ]
}"#;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Order {
  total: i64,
}

fn generated() -> (BuildContext, Declarations) {
  let config = ProjectConfig::new("shop").with_stages(["dev"]);
  let declarations = Declarations::from_json(PROJECT).unwrap();
  let mut ctx = BuildContext::new(&config, TIMESTAMP);
  let mut diagnostics = Diagnostics::new();
  let summary = ctx.generate(&declarations, &mut diagnostics);
  assert_eq!(summary.errors, 0, "{:?}", diagnostics.all());
  (ctx, declarations)
}

#[test]
fn caller_environment_names_match_clients() {
  let (ctx, _) = generated();
  let docs = ctx.documents.get("dev").unwrap();
  let checkout = docs
    .update_resources
    .of_kind(ResourceKind::Function)
    .filter_map(Resource::as_function)
    .find(|f| f.method().class_name == "Checkout")
    .unwrap();

  for name in ["NIMBUS_PROJECT_NAME", "FUNCTION_STAGE", "NIMBUS_QUEUE_URL_ID_JOBS", "NIMBUS_STAGE"] {
    assert!(checkout.env_variable(name).is_some(), "missing {}", name);
  }
}

#[test]
fn function_client_targets_synthesized_name() {
  let (ctx, _) = generated();
  let docs = ctx.documents.get("dev").unwrap();
  let mailer = docs.update_resources.invokable_function("Mailer", "send").unwrap();

  let backend = Arc::new(LocalFunctionBackend::new());
  backend.register(mailer.function_name(), |input| Ok(json!({ "sent": input })));
  let env = StaticEnvironment::new()
    .with("NIMBUS_PROJECT_NAME", "shop")
    .with("FUNCTION_STAGE", "dev");
  let client = BasicFunctionClient::new("Mailer", "send", backend.clone(), Arc::new(env));

  assert_eq!(client.function_name(), mailer.function_name());
  let response: Option<serde_json::Value> = client.invoke_for(&"receipt").unwrap();
  assert_eq!(response, Some(json!({ "sent": "receipt" })));
}

#[test]
fn store_client_uses_synthesized_table() {
  let (ctx, declarations) = generated();
  let docs = ctx.documents.get("dev").unwrap();
  let table = docs
    .update_resources
    .of_kind(ResourceKind::KeyValueTable)
    .find_map(Resource::as_table)
    .unwrap();

  let declaration = declarations.resolve_store("Order", "dev").unwrap();
  let orders: KeyValueClient<u64, Order> =
    KeyValueClient::for_store(declaration, "dev", Arc::new(LocalKeyValueBackend::new()));
  assert_eq!(orders.table(), table.table_name());
  assert_eq!(orders.key_name(), table.key_name());

  orders.put(&1, &Order { total: 30 }).unwrap();
  orders.increment(&1, "total", 5, None).unwrap();
  assert_eq!(orders.get(&1).unwrap(), Some(Order { total: 35 }));
}

#[test]
fn queue_client_reaches_consumer_queue() {
  let backend = Arc::new(LocalQueueBackend::new());
  let env = StaticEnvironment::new().with("NIMBUS_QUEUE_URL_ID_JOBS", "local://jobs");
  let jobs = QueueClient::new("jobs", backend.clone(), Arc::new(env));
  jobs.send_message_as_json(&json!({ "order": 1 })).unwrap();
  assert_eq!(backend.receive("local://jobs").as_deref(), Some("{\"order\":1}"));
}
