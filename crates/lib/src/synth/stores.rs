//! Resources declared on their own rather than through a function.

use tracing::debug;

use super::BuildContext;
use crate::declaration::Declarations;
use crate::resource::{CloudResource, FileBucket, KeyValueTable};
use crate::state::FileUploadDescription;

impl BuildContext {
  /// Create one table per store declaration and stage. Stores referencing an
  /// existing table by ARN get no table. Returns the number of tables created.
  pub fn create_key_value_stores(&mut self, declarations: &Declarations) -> usize {
    let mut created = 0;
    for store in &declarations.key_value_stores {
      for stage in self.stages.determine_stages(&store.stages) {
        if store.existing_arn().is_some() {
          debug!(store = %store.type_name, stage = %stage, "store references an existing table");
          continue;
        }
        let table = KeyValueTable::new(
          &store.table_name_for(&stage),
          &store.key_name,
          store.key_type,
          store.read_capacity,
          store.write_capacity,
          &stage,
        );
        debug!(store = %store.type_name, table = %table.name(), "creating key-value table");
        self.documents.get_or_create(&stage).update_resources.add_resource(table);
        created += 1;
      }
    }
    created
  }

  /// Create declared file buckets and record their uploads. Returns the
  /// number of buckets created.
  pub fn create_file_buckets(&mut self, declarations: &Declarations) -> usize {
    let mut created = 0;
    for declaration in &declarations.file_buckets {
      for stage in self.stages.determine_stages(&declaration.stages) {
        let mut bucket = FileBucket::new(&declaration.name, &stage);
        if let Some(website) = &declaration.website {
          bucket.set_website(website.clone());
        }
        for upload in &declaration.uploads {
          self.state.add_file_upload(
            &stage,
            &declaration.name,
            FileUploadDescription {
              local_file: upload.local_file.clone(),
              target_file: upload.target_file.clone(),
              substitute_variables: upload.substitute_variables,
            },
          );
        }
        self.documents.get_or_create(&stage).update_resources.add_resource(bucket);
        created += 1;
      }
    }
    created
  }
}
