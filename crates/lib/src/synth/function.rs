use tracing::debug;

use super::{BuildContext, FunctionId};
use crate::consts::env;
use crate::resource::{
  CloudResource, DeploymentBucket, FunctionConfig, FunctionResource, IamRoleResource, LogGroup, MethodInformation,
  TemplateValue,
};

impl BuildContext {
  /// Create a function with its role, log group and the stage's deployment
  /// bucket.
  ///
  /// Synthesizing the same class, method and stage twice replaces the
  /// earlier entries.
  pub fn new_function(&mut self, handler: &str, method: MethodInformation, config: FunctionConfig) -> FunctionId {
    let project_name = self.project_name().to_string();
    let stage = config.stage.clone();

    let mut function = FunctionResource::new(&project_name, handler, method, config);
    let log_group = LogGroup::new(&function);
    let bucket = DeploymentBucket::new(&project_name, &stage);

    let mut role = IamRoleResource::new(&function);
    role.add_allow_statement("logs:CreateLogStream", &log_group, ":*");
    role.add_allow_statement("logs:PutLogEvents", &log_group, ":*:*");

    function.add_env_variable(env::NIMBUS_STAGE, stage.as_str());
    let code_key = function.method().replacement_variable();
    function.set_code_location(bucket.name(), &code_key);

    let bucket_output = "DeploymentBucketName";
    let export_name = format!("{}-{}-{}", project_name, stage, bucket_output);
    let bucket_name = TemplateValue::reference(bucket.name());

    let id = FunctionId {
      stage: stage.clone(),
      name: function.name().to_string(),
    };
    debug!(stage = %stage, function = %id.name, "synthesizing function");

    let docs = self.documents.get_or_create(&stage);
    docs.update_resources.add_resource(role);
    docs.update_resources.add_resource(function);
    docs.update_resources.add_resource(log_group);
    if !docs.update_resources.contains(bucket.name()) {
      docs.update_resources.add_resource(bucket.clone());
    }
    if !docs.create_resources.contains(bucket.name()) {
      docs.create_resources.add_resource(bucket);
    }
    docs
      .create_outputs
      .add_output(bucket_output, bucket_name.clone(), Some(export_name.clone()));
    docs.update_outputs.add_output(bucket_output, bucket_name, Some(export_name));

    id
  }
}
