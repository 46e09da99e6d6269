//! Client and project actions

use crate::actions::{self, ActionError, ActionResult, Created};
use crate::core::identity::EntityId;
use crate::entities::{Client, ClientSummary, Project, ProjectSummary};
use crate::store::Store;

pub fn get_clients(store: &Store) -> ActionResult<Vec<ClientSummary>> {
    Ok(store.client_summaries()?)
}

pub fn create_client(store: &Store, mut client: Client) -> ActionResult<Created<Client>> {
    client.name = actions::required("Client name", &client.name)?;
    actions::insert(store, client)
}

pub fn update_client(store: &Store, client: &Client) -> ActionResult<()> {
    actions::required("Client name", &client.name)?;
    actions::update(store, client)
}

/// Delete a client. Refused while the client still owns projects.
pub fn delete_client(store: &Store, id: &EntityId) -> ActionResult<()> {
    let owned = store
        .project_summaries()?
        .iter()
        .filter(|p| &p.project.client_id == id)
        .count();
    actions::delete::<Client>(store, id, || {
        format!(
            "Client still owns {} project(s). Delete or reassign them first.",
            owned
        )
    })
}

pub fn get_projects(store: &Store) -> ActionResult<Vec<ProjectSummary>> {
    Ok(store.project_summaries()?)
}

pub fn create_project(store: &Store, mut project: Project) -> ActionResult<Created<Project>> {
    project.name = actions::required("Project name", &project.name)?;
    actions::require::<Client>(store, &project.client_id)?;
    actions::insert(store, project)
}

pub fn update_project(store: &Store, project: &Project) -> ActionResult<()> {
    actions::required("Project name", &project.name)?;
    actions::require::<Client>(store, &project.client_id)?;
    actions::update(store, project)
}

/// Delete a project. Refused while inspections or MDR reports reference it.
pub fn delete_project(store: &Store, id: &EntityId) -> ActionResult<()> {
    actions::delete::<Project>(store, id, || {
        "Project still has inspections or MDR reports. Delete them first.".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;

    #[test]
    fn test_create_project_requires_existing_client() {
        let store = Store::open_in_memory().unwrap();
        let project = Project::new("Orphan".to_string(), EntityId::new(EntityPrefix::Clt));
        let err = create_project(&store, project).unwrap_err();
        assert!(matches!(err, ActionError::Rejected(_)));
        assert!(get_projects(&store).unwrap().is_empty());
    }

    #[test]
    fn test_delete_client_with_projects_rejected() {
        let store = Store::open_in_memory().unwrap();
        let client = create_client(&store, Client::new("Acme".to_string()))
            .unwrap()
            .record;
        create_project(&store, Project::new("P1".to_string(), client.id.clone())).unwrap();

        let err = delete_client(&store, &client.id).unwrap_err();
        assert_eq!(
            err.user_message(),
            "Client still owns 1 project(s). Delete or reassign them first."
        );
        assert_eq!(get_clients(&store).unwrap().len(), 1);
    }

    #[test]
    fn test_blank_name_rejected() {
        let store = Store::open_in_memory().unwrap();
        let err = create_client(&store, Client::new("   ".to_string())).unwrap_err();
        assert_eq!(err.user_message(), "Client name is required");
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = delete_client(&store, &EntityId::new(EntityPrefix::Clt)).unwrap_err();
        assert!(matches!(err, ActionError::NotFound { kind: "client", .. }));
    }
}
