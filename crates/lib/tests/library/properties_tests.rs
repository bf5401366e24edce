//! Properties every generation run must uphold.

use std::collections::BTreeSet;

use nimbus_lib::declaration::Declarations;
use nimbus_lib::resource::{CloudResource, Resource, ResourceKind};
use nimbus_lib::stage::StageResolver;
use nimbus_lib::synth::BuildContext;

use super::common::{context, function};

fn count(ctx: &BuildContext, stage: &str, kind: ResourceKind) -> usize {
  ctx.documents.get(stage).map(|docs| docs.update_resources.count_of(kind)).unwrap_or_default()
}

#[test]
fn stage_resolution() {
  let resolver = StageResolver::new(["dev", "prod"]);
  let all: BTreeSet<String> = ["dev", "prod"].iter().map(|s| s.to_string()).collect();
  assert_eq!(resolver.determine_stages(&BTreeSet::new()), all);

  let only_prod: BTreeSet<String> = ["prod".to_string()].into_iter().collect();
  assert_eq!(resolver.determine_stages(&only_prod), only_prod);
}

#[test]
fn same_key_synthesis_keeps_one_entry() {
  let mut ctx = context(&["dev"]);
  function(&mut ctx, "Items", "get", "dev", 10);
  function(&mut ctx, "Items", "get", "dev", 10);
  assert_eq!(count(&ctx, "dev", ResourceKind::Function), 1);

  function(&mut ctx, "Items", "put", "dev", 10);
  assert_eq!(count(&ctx, "dev", ResourceKind::Function), 2);
}

#[test]
fn http_singletons_and_shared_path_nodes() {
  let mut ctx = context(&["dev"]);
  let b = function(&mut ctx, "Tree", "b", "dev", 10);
  let c = function(&mut ctx, "Tree", "c", "dev", 10);
  ctx.new_http_method("GET", "/a/b", &b).unwrap();
  ctx.new_http_method("GET", "/a/c", &c).unwrap();

  assert_eq!(count(&ctx, "dev", ResourceKind::RestApi), 1);
  assert_eq!(count(&ctx, "dev", ResourceKind::ApiGatewayDeployment), 1);
  assert_eq!(count(&ctx, "dev", ResourceKind::RestResource), 3);
  assert_eq!(count(&ctx, "dev", ResourceKind::RestMethod), 2);
}

#[test]
fn same_path_and_verb_is_one_method() {
  let mut ctx = context(&["dev"]);
  let id = function(&mut ctx, "Items", "get", "dev", 10);
  ctx.new_http_method("GET", "items", &id).unwrap();
  ctx.new_http_method("GET", "items", &id).unwrap();
  assert_eq!(count(&ctx, "dev", ResourceKind::RestMethod), 1);
}

#[test]
fn queue_visibility_and_statements() {
  let mut ctx = context(&["dev"]);
  let id = function(&mut ctx, "Jobs", "consume", "dev", 7);
  let queue_name = ctx.new_queue("jobs", 10, &id).unwrap();

  let docs = ctx.documents.get("dev").unwrap();
  let queue = docs.update_resources.get(&queue_name).and_then(Resource::as_queue).unwrap();
  assert_eq!(queue.visibility_timeout(), 42);

  let function = ctx.function(&id).unwrap();
  let role = docs.update_resources.get(function.role_name()).and_then(Resource::as_role).unwrap();
  assert_eq!(role.statements().len(), 5);
  let queue_actions: Vec<&str> = role.statements()[2..].iter().map(|s| s.action.as_str()).collect();
  assert_eq!(
    queue_actions,
    vec!["sqs:ReceiveMessage", "sqs:DeleteMessage", "sqs:GetQueueAttributes"]
  );
}

#[test]
fn store_stream_mapping() {
  let mut ctx = context(&["dev"]);
  let declarations = Declarations::from_json(
    r#"{ "key_value_stores": [{ "type_name": "User", "key_name": "id", "key_type": "number" }] }"#,
  )
  .unwrap();
  assert_eq!(ctx.create_key_value_stores(&declarations), 1);

  let id = function(&mut ctx, "Audit", "onUser", "dev", 10);
  let table_name = declarations.resolve_store("User", "dev").unwrap().table_name_for("dev");
  ctx.new_store_trigger("User", &table_name, &id).unwrap();
  ctx.new_store_trigger("User", &table_name, &id).unwrap();

  let docs = ctx.documents.get("dev").unwrap();
  let mappings: Vec<_> = docs
    .update_resources
    .of_kind(ResourceKind::EventMapping)
    .filter_map(Resource::as_event_mapping)
    .collect();
  assert_eq!(mappings.len(), 2);
  for mapping in mappings {
    assert_eq!(mapping.batch_size(), 1);
    assert!(mapping.is_stream());
  }
}

#[test]
fn external_store_creates_no_table() {
  let mut ctx = context(&["dev", "prod"]);
  let declarations = Declarations::from_json(
    r#"{ "key_value_stores": [
      { "type_name": "Legacy", "key_name": "id", "existing_arn": "arn:aws:dynamodb:eu-west-1:1:table/legacy" },
      { "type_name": "User", "key_name": "id" }
    ] }"#,
  )
  .unwrap();
  assert_eq!(ctx.create_key_value_stores(&declarations), 2);
  assert_eq!(count(&ctx, "dev", ResourceKind::KeyValueTable), 1);
  assert_eq!(count(&ctx, "prod", ResourceKind::KeyValueTable), 1);
}

#[test]
fn re_registered_trigger_duplicates_permissions() {
  let mut ctx = context(&["dev"]);
  let id = function(&mut ctx, "Items", "get", "dev", 10);
  ctx.new_http_method("GET", "items", &id).unwrap();
  ctx.new_http_method("GET", "items", &id).unwrap();

  let docs = ctx.documents.get("dev").unwrap();
  let permissions: Vec<&str> = docs
    .update_resources
    .of_kind(ResourceKind::Permission)
    .map(|p| p.name())
    .collect();
  assert_eq!(permissions.len(), 2);
  assert_eq!(permissions[1], format!("{}2", permissions[0]));
}
