use moka::future::Cache;
use sea_orm::{DatabaseConnection, DbErr};
use std::time::Duration;
use uuid::Uuid;

use crate::db::{freelances as freelance_db, projects as project_db};
use crate::models::applications::{self, ApplicationView};
use crate::models::freelances::FreelanceSummary;
use crate::models::projects::ProjectSummary;

/// Cached summaries of the directory entities shown next to engagement records.
///
/// Only read models go through here; lifecycle rules always read the store.
#[derive(Clone)]
pub struct Directory {
    db: DatabaseConnection,
    projects: Cache<Uuid, ProjectSummary>,
    freelances: Cache<Uuid, FreelanceSummary>,
}

impl Directory {
    pub fn new(db: DatabaseConnection, ttl: Duration) -> Self {
        Self {
            db,
            projects: Cache::builder().time_to_live(ttl).max_capacity(10_000).build(),
            freelances: Cache::builder().time_to_live(ttl).max_capacity(10_000).build(),
        }
    }

    pub async fn project(&self, id: Uuid) -> Result<Option<ProjectSummary>, DbErr> {
        if let Some(hit) = self.projects.get(&id).await {
            return Ok(Some(hit));
        }
        let summary = project_db::get_project_by_id(&self.db, id)
            .await?
            .map(ProjectSummary::from);
        if let Some(summary) = &summary {
            self.projects.insert(id, summary.clone()).await;
        }
        Ok(summary)
    }

    pub async fn freelance(&self, id: Uuid) -> Result<Option<FreelanceSummary>, DbErr> {
        if let Some(hit) = self.freelances.get(&id).await {
            return Ok(Some(hit));
        }
        let summary = freelance_db::get_freelance_by_id(&self.db, id)
            .await?
            .map(FreelanceSummary::from);
        if let Some(summary) = &summary {
            self.freelances.insert(id, summary.clone()).await;
        }
        Ok(summary)
    }

    /// Attach project and freelance summaries. Missing or unreadable summaries
    /// are left out rather than failing the caller.
    pub async fn application_view(&self, application: applications::Model) -> ApplicationView {
        let (project, freelance) = futures_util::join!(
            self.project(application.project_id),
            self.freelance(application.freelance_id)
        );

        ApplicationView {
            project: project.unwrap_or_else(|e| {
                tracing::warn!(project_id = %application.project_id, error = %e, "project summary unavailable");
                None
            }),
            freelance: freelance.unwrap_or_else(|e| {
                tracing::warn!(freelance_id = %application.freelance_id, error = %e, "freelance summary unavailable");
                None
            }),
            application,
        }
    }

    pub async fn application_views(&self, rows: Vec<applications::Model>) -> Vec<ApplicationView> {
        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            views.push(self.application_view(row).await);
        }
        views
    }

    /// Drop cached summaries after a profile or project edit.
    pub async fn invalidate(&self, id: Uuid) {
        self.projects.invalidate(&id).await;
        self.freelances.invalidate(&id).await;
    }
}
