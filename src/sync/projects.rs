//! Paged, filterable project list.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, warn};

use super::store::{Collection, Observable};
use crate::models::{Project, ProjectDraft, ProjectId, ProjectQuery, ProjectStatus};
use crate::notify::{Notifier, Silent};
use crate::remote::RemoteStore;

const LOAD_PROJECTS_FAILED: &str = "Failed to load projects.";
const CREATE_PROJECT_FAILED: &str = "Failed to create project.";
const DELETE_PROJECT_FAILED: &str = "Failed to delete project.";
const PROJECT_TITLE_REQUIRED: &str = "Project title is required.";
const PROJECT_CREATED: &str = "Project created.";
const PROJECT_DELETED: &str = "Project deleted.";

/// The project list page: filters, the current page and its paging state.
///
/// Every filter or page change reloads from the server. A response that
/// arrives after a newer request was issued is dropped.
pub struct ProjectBrowser<R> {
    remote: Rc<R>,
    notifier: Rc<dyn Notifier>,
    query: RefCell<ProjectQuery>,
    projects: Collection<Project>,
    is_last: Observable<bool>,
    loading: Observable<bool>,
    error: Observable<Option<String>>,
    request: Cell<u64>,
}

impl<R: RemoteStore> ProjectBrowser<R> {
    pub fn new(remote: Rc<R>) -> Self {
        Self::with_notifier(remote, Rc::new(Silent))
    }

    pub fn with_notifier(remote: Rc<R>, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            remote,
            notifier,
            query: RefCell::new(ProjectQuery::default()),
            projects: Collection::new(),
            is_last: Observable::new(true),
            loading: Observable::new(false),
            error: Observable::new(None),
            request: Cell::new(0),
        }
    }

    /// Filters and page of the last request.
    pub fn query(&self) -> ProjectQuery {
        self.query.borrow().clone()
    }

    pub fn projects(&self) -> &Collection<Project> {
        &self.projects
    }

    pub fn is_last(&self) -> bool {
        *self.is_last.get()
    }

    pub fn loading(&self) -> &Observable<bool> {
        &self.loading
    }

    pub fn error(&self) -> &Observable<Option<String>> {
        &self.error
    }

    pub fn set_page_size(&self, page_size: u32) {
        self.query.borrow_mut().page_size = page_size.max(1);
    }

    /// Reload the current page.
    pub async fn refresh(&self) -> bool {
        let query = self.query();
        let request = self.request.get() + 1;
        self.request.set(request);
        self.loading.set(true);

        let result = self.remote.list_projects(&query).await;
        if self.request.get() != request {
            debug!(page = query.page, "discarding superseded project page");
            return false;
        }
        self.loading.set(false);

        match result {
            Ok(page) => {
                debug!(page = query.page, count = page.items.len(), "projects loaded");
                self.is_last.set(page.is_last.unwrap_or(false));
                self.projects.replace_all(page.items);
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to load projects");
                self.is_last.set(true);
                self.projects.replace_all(Vec::new());
                self.fail(LOAD_PROJECTS_FAILED);
                false
            }
        }
    }

    /// Replace filters and page at once, then reload.
    pub async fn open(&self, mut query: ProjectQuery) -> bool {
        query.q = query
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        query.page = query.page.max(1);
        query.page_size = query.page_size.max(1);
        *self.query.borrow_mut() = query;
        self.refresh().await
    }

    /// Filter by free text and status, starting over at page 1.
    pub async fn apply_filters(&self, q: &str, status: Option<ProjectStatus>) -> bool {
        {
            let mut query = self.query.borrow_mut();
            let q = q.trim();
            query.q = (!q.is_empty()).then(|| q.to_string());
            query.status = status;
            query.page = 1;
        }
        self.refresh().await
    }

    pub async fn clear_filters(&self) -> bool {
        self.apply_filters("", None).await
    }

    /// Load the next page. No-op on the last page.
    pub async fn next_page(&self) -> bool {
        if self.is_last() {
            return false;
        }
        self.query.borrow_mut().page += 1;
        self.refresh().await
    }

    /// Load the previous page. No-op on page 1.
    pub async fn prev_page(&self) -> bool {
        {
            let mut query = self.query.borrow_mut();
            if query.page <= 1 {
                return false;
            }
            query.page -= 1;
        }
        self.refresh().await
    }

    /// Create a project, then reload from page 1 with the current filters.
    pub async fn create_project(&self, mut draft: ProjectDraft) -> Option<Project> {
        draft.title = draft.title.trim().to_string();
        draft.description = draft.description.trim().to_string();
        if draft.title.is_empty() {
            self.notifier.notify_error(PROJECT_TITLE_REQUIRED);
            return None;
        }

        match self.remote.create_project(&draft).await {
            Ok(project) => {
                debug!(project_id = project.id, "project created");
                self.error.set(None);
                self.notifier.notify_success(PROJECT_CREATED);
                self.first_page().await;
                Some(project)
            }
            Err(e) => {
                warn!(error = %e, "failed to create project");
                self.fail(CREATE_PROJECT_FAILED);
                None
            }
        }
    }

    /// Delete a project, then reload from page 1 with the current filters.
    pub async fn delete_project(&self, id: ProjectId) -> bool {
        match self.remote.delete_project(id).await {
            Ok(()) => {
                debug!(project_id = id, "project deleted");
                self.notifier.notify_success(PROJECT_DELETED);
                self.first_page().await;
                true
            }
            Err(e) => {
                warn!(project_id = id, error = %e, "failed to delete project");
                self.fail(DELETE_PROJECT_FAILED);
                false
            }
        }
    }

    async fn first_page(&self) {
        self.query.borrow_mut().page = 1;
        self.refresh().await;
    }

    fn fail(&self, message: &str) {
        self.error.set(Some(message.to_string()));
        self.notifier.notify_error(message);
    }
}

impl<R> std::fmt::Debug for ProjectBrowser<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectBrowser")
            .field("query", &self.query.borrow())
            .field("projects", &self.projects)
            .finish_non_exhaustive()
    }
}
