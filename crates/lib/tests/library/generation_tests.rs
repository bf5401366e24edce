//! End-to-end generation from declarations.

use nimbus_lib::config::ProjectConfig;
use nimbus_lib::declaration::Declarations;
use nimbus_lib::diagnostic::Diagnostics;
use nimbus_lib::resource::{CloudResource, Resource, ResourceKind, TemplateValue};
use nimbus_lib::synth::BuildContext;
use nimbus_lib::template::{deployment_order, render_stage};

use super::common::TIMESTAMP;

fn generate(stages: &[&str], json: &str) -> (BuildContext, Diagnostics) {
  let config = ProjectConfig::new("shop").with_stages(stages.iter().copied());
  let declarations = Declarations::from_json(json).unwrap();
  let mut ctx = BuildContext::new(&config, TIMESTAMP);
  let mut diagnostics = Diagnostics::new();
  ctx.generate(&declarations, &mut diagnostics);
  (ctx, diagnostics)
}

mod http {
  use super::*;

  const GET_ITEMS: &str = r#"{
    "functions": [{
      "handler": { "class_name": "ItemsHandler", "package": "shop", "method_name": "getItems" },
      "stages": ["dev"],
      "timeout": 10,
      "memory": 128,
      "trigger": { "kind": "http", "method": "GET", "path": "items" }
    }]
  }"#;

  #[test]
  fn get_items_produces_nine_resources() {
    let (ctx, diagnostics) = generate(&["dev"], GET_ITEMS);
    assert!(!diagnostics.has_errors());

    let docs = ctx.documents.get("dev").unwrap();
    let resources = &docs.update_resources;
    assert_eq!(resources.len(), 9);
    for kind in [
      ResourceKind::Function,
      ResourceKind::IamRole,
      ResourceKind::LogGroup,
      ResourceKind::DeploymentBucket,
      ResourceKind::RestApi,
      ResourceKind::ApiGatewayDeployment,
      ResourceKind::RestResource,
      ResourceKind::RestMethod,
      ResourceKind::Permission,
    ] {
      assert_eq!(resources.count_of(kind), 1, "expected one {}", kind);
    }

    let role = resources.of_kind(ResourceKind::IamRole).find_map(Resource::as_role).unwrap();
    assert_eq!(role.statements().len(), 2);
    let method = resources.of_kind(ResourceKind::RestMethod).find_map(Resource::as_rest_method).unwrap();
    assert_eq!(method.http_method(), "GET");
  }

  #[test]
  fn get_items_renders_and_orders() {
    let (ctx, _) = generate(&["dev"], GET_ITEMS);
    let docs = ctx.documents.get("dev").unwrap();
    let rendered = render_stage("dev", docs).unwrap();
    assert_eq!(rendered.update["Resources"].as_object().unwrap().len(), 9);
    assert!(rendered.update["Outputs"]["RestApiUrl"]["Export"]["Name"].is_string());

    let order = deployment_order(&docs.update_resources).unwrap();
    let position = |kind: ResourceKind| {
      let name = docs.update_resources.of_kind(kind).next().unwrap().name().to_string();
      order.iter().position(|n| *n == name).unwrap()
    };
    assert!(position(ResourceKind::IamRole) < position(ResourceKind::Function));
    assert!(position(ResourceKind::RestMethod) < position(ResourceKind::ApiGatewayDeployment));
  }

  #[test]
  fn state_records_handler_and_export() {
    let (ctx, _) = generate(&["dev"], GET_ITEMS);
    assert_eq!(ctx.state.handler_files.len(), 1);
    let handler = ctx.state.handler_files.iter().next().unwrap();
    assert_eq!(handler.handler_class_path, "shop.ItemsHandler");
    assert_eq!(handler.handler_file, "ItemsHandlerGetItemsHandler.zip");
    assert_eq!(ctx.state.exports_for("dev").len(), 1);
  }

  #[test]
  fn cors_origin_defaults_to_empty() {
    let (ctx, _) = generate(&["dev"], GET_ITEMS);
    let docs = ctx.documents.get("dev").unwrap();
    let function = docs
      .update_resources
      .of_kind(ResourceKind::Function)
      .find_map(Resource::as_function)
      .unwrap();
    assert_eq!(
      function.env_variable("NIMBUS_ALLOWED_CORS_ORIGIN"),
      Some(&TemplateValue::literal(""))
    );
  }
}

mod diagnostics {
  use super::*;

  #[test]
  fn missing_invoke_target_is_one_error() {
    let json = r#"{
      "functions": [{
        "handler": { "class_name": "OrderListener", "method_name": "onOrder" },
        "trigger": { "kind": "notification", "topic": "orders" },
        "uses": [
          { "kind": "basic_function", "target": { "class_name": "Mailer", "method_name": "sendReceipt" } }
        ],
        "location": { "file": "src/OrderListener.kt", "line": 12 }
      }]
    }"#;
    let (ctx, diagnostics) = generate(&["dev"], json);

    assert_eq!(diagnostics.error_count(), 1);
    let error = diagnostics.errors().next().unwrap();
    assert!(error.message.contains("Mailer"));
    assert!(error.message.contains("sendReceipt"));
    assert_eq!(error.location.as_ref().unwrap().line, 12);

    let docs = ctx.documents.get("dev").unwrap();
    assert_eq!(docs.update_resources.count_of(ResourceKind::Topic), 1);
  }

  #[test]
  fn present_invoke_target_is_wired() {
    let json = r#"{
      "functions": [
        {
          "handler": { "class_name": "Mailer", "method_name": "sendReceipt" },
          "trigger": { "kind": "basic" }
        },
        {
          "handler": { "class_name": "OrderListener", "method_name": "onOrder" },
          "trigger": { "kind": "notification", "topic": "orders" },
          "uses": [
            { "kind": "basic_function", "target": { "class_name": "Mailer", "method_name": "sendReceipt" } }
          ]
        }
      ]
    }"#;
    let (ctx, diagnostics) = generate(&["dev"], json);
    assert!(!diagnostics.has_errors());

    let docs = ctx.documents.get("dev").unwrap();
    let caller_role = docs
      .update_resources
      .of_kind(ResourceKind::IamRole)
      .filter_map(Resource::as_role)
      .find(|role| role.name().starts_with("OrderListener"))
      .unwrap();
    assert!(caller_role.statements().iter().any(|s| s.action == "lambda:*"));
  }

  #[test]
  fn store_trigger_for_undeclared_stage_is_reported() {
    let json = r#"{
      "key_value_stores": [
        { "type_name": "User", "key_name": "id", "stages": ["prod"] }
      ],
      "functions": [{
        "handler": { "class_name": "UserAudit", "method_name": "onChange" },
        "trigger": { "kind": "store", "store": "User" }
      }]
    }"#;
    let (ctx, diagnostics) = generate(&["dev", "prod"], json);

    assert_eq!(diagnostics.error_count(), 1);
    let prod = ctx.documents.get("prod").unwrap();
    assert_eq!(prod.update_resources.count_of(ResourceKind::EventMapping), 1);
  }
}

mod queue {
  use super::*;

  #[test]
  fn oversized_timeout_is_reported_not_wrapped() {
    let json = r#"{
      "functions": [{
        "handler": { "class_name": "JobWorker", "method_name": "run" },
        "stages": ["dev"],
        "timeout": 800000000,
        "trigger": { "kind": "queue", "id": "jobs" }
      }]
    }"#;
    let (ctx, diagnostics) = generate(&["dev"], json);

    assert_eq!(diagnostics.error_count(), 1);
    let error = diagnostics.errors().next().unwrap();
    assert!(error.message.contains("visibility timeout"));
    assert!(error.message.contains("jobs"));

    let docs = ctx.documents.get("dev").unwrap();
    assert_eq!(docs.update_resources.count_of(ResourceKind::Queue), 0);
    assert_eq!(docs.update_resources.count_of(ResourceKind::EventMapping), 0);
  }
}

mod stages {
  use super::*;

  #[test]
  fn undeclared_stages_fan_out() {
    let json = r#"{
      "functions": [{
        "handler": { "class_name": "Jobs", "method_name": "nightly" },
        "trigger": { "kind": "cron", "expression": "cron(0 3 * * ? *)" }
      }]
    }"#;
    let (ctx, _) = generate(&["dev", "prod"], json);
    assert_eq!(ctx.documents.len(), 2);
    for stage in ["dev", "prod"] {
      let docs = ctx.documents.get(stage).unwrap();
      assert_eq!(docs.update_resources.count_of(ResourceKind::CronRule), 1);
      assert_eq!(docs.create_resources.len(), 1);
    }
  }
}
