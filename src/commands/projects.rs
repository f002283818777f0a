//! The project list.

use serde::Serialize;

use super::{Context, Output, json_line};
use crate::models::{Project, ProjectQuery};
use crate::remote::RemoteStore;
use crate::sync::ProjectBrowser;
use crate::{Error, Result};

#[derive(Serialize)]
pub struct ProjectList {
    pub page: u32,
    pub page_size: u32,
    pub is_last: bool,
    pub projects: Vec<Project>,
}

impl Output for ProjectList {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        if self.projects.is_empty() {
            return format!("No projects on page {}", self.page);
        }
        let mut lines: Vec<String> = self
            .projects
            .iter()
            .map(|p| format!("#{} {} [{}]", p.id, p.title, p.status))
            .collect();
        lines.push(format!(
            "Page {}{}",
            self.page,
            if self.is_last { " (last)" } else { "" }
        ));
        lines.join("\n")
    }
}

/// List one page of projects.
pub async fn projects<R: RemoteStore + 'static>(
    ctx: &Context<R>,
    query: ProjectQuery,
) -> Result<ProjectList> {
    let browser = ProjectBrowser::with_notifier(ctx.remote.clone(), ctx.notifier.clone());
    if !browser.open(query).await {
        let message = (*browser.error().get())
            .clone()
            .unwrap_or_else(|| "Failed to load projects.".to_string());
        return Err(Error::Reported(message));
    }
    let query = browser.query();
    Ok(ProjectList {
        page: query.page,
        page_size: query.page_size,
        is_last: browser.is_last(),
        projects: browser.projects().snapshot().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectStatus;
    use crate::notify::Toasts;
    use crate::remote::{MemoryRemoteStore, RemoteOp};
    use crate::session::StaticSession;
    use std::rc::Rc;

    fn context() -> (Context<MemoryRemoteStore>, Rc<MemoryRemoteStore>) {
        let remote = Rc::new(MemoryRemoteStore::demo());
        let ctx = Context::new(
            Rc::clone(&remote),
            Toasts::shared(),
            Rc::new(StaticSession::anonymous()),
        );
        (ctx, remote)
    }

    #[tokio::test]
    async fn test_lists_projects() {
        let (ctx, _) = context();
        let list = projects(&ctx, ProjectQuery::default()).await.unwrap();
        let ids: Vec<u64> = list.projects.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(list.is_last);
    }

    #[tokio::test]
    async fn test_filters_by_status() {
        let (ctx, _) = context();
        let list = projects(
            &ctx,
            ProjectQuery {
                status: Some(ProjectStatus::Archived),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(list.projects.len(), 1);
        assert_eq!(list.to_human(), "#2 Mobile app [archived]\nPage 1 (last)");
    }

    #[tokio::test]
    async fn test_failure_is_reported() {
        let (ctx, remote) = context();
        remote.fail(RemoteOp::ListProjects);
        let err = projects(&ctx, ProjectQuery::default()).await.err().unwrap();
        assert_eq!(err.to_string(), "Failed to load projects.");
    }
}
