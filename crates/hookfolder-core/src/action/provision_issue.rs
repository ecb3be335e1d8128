//! The `opened` action: give each new issue its own folder under the workspace root.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use hookfolder_types::error::ActionError;
use hookfolder_types::webhook::{Issue, IssuePayload};

use super::ActionHandler;
use crate::provision::{FolderProvisioner, FolderStore};

/// Folder name for an issue: `#<number> <title>`, or `#<number>` when untitled.
pub fn issue_folder_name(issue: &Issue) -> String {
    let title = issue.title.trim();
    if title.is_empty() {
        format!("#{}", issue.number)
    } else {
        format!("#{} {}", issue.number, title)
    }
}

/// Ensures `#<number> <title>` exists under the workspace root.
pub struct ProvisionIssueFolder<S> {
    provisioner: Arc<FolderProvisioner<S>>,
}

impl<S> ProvisionIssueFolder<S> {
    pub fn new(provisioner: Arc<FolderProvisioner<S>>) -> Self {
        Self { provisioner }
    }
}

impl<S: FolderStore + 'static> ActionHandler for ProvisionIssueFolder<S> {
    fn run(&self, payload: IssuePayload) -> BoxFuture<'static, Result<(), ActionError>> {
        let provisioner = Arc::clone(&self.provisioner);
        Box::pin(async move {
            let Some(issue) = payload.issue else {
                tracing::error!("issue payload has no 'issue' object, nothing to provision");
                return Err(ActionError::MissingField("issue"));
            };
            let name = issue_folder_name(&issue);

            let result = async {
                let workspace = provisioner.workspace().await?;
                let folder = provisioner
                    .ensure_folder(&name, std::slice::from_ref(&workspace.id))
                    .await?;
                Ok::<_, ActionError>(folder)
            }
            .await;

            match result {
                Ok(folder) => {
                    tracing::info!(
                        issue = issue.number,
                        folder_id = %folder.id,
                        folder = %folder.name,
                        "issue folder ready"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(issue = issue.number, folder = %name, error = %e, "issue folder provisioning failed");
                    Err(e)
                }
            }
        })
    }
}
