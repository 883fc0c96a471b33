//! Reference backend client: project and category collections, plus the
//! snapshot builder consumed by the normalizer.

use facturas_core::{Category, PipelineError, Project, ReferenceMaps};

use crate::invoices::read_json;
use crate::{authorize, ApiConfig};

#[derive(Debug, Clone)]
pub struct ReferenceClient {
    http: reqwest::Client,
    cfg: ApiConfig,
}

impl ReferenceClient {
    pub fn new(cfg: ApiConfig) -> Self {
        Self { http: reqwest::Client::new(), cfg }
    }

    fn url(&self, resource: &str, tail: &str) -> String {
        format!("{}/api/{}{}", self.cfg.base_url, resource, tail)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, PipelineError> {
        let resp = authorize(
            self.http.get(url).query(&[("company", self.cfg.company_id.as_str())]),
            &self.cfg,
        )
        .send()
        .await
        .map_err(|e| PipelineError::Backend(e.to_string()))?;
        read_json(resp).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, PipelineError> {
        self.get(self.url("categorias", "")).await
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, PipelineError> {
        self.get(self.url("proyectos", "")).await
    }

    pub async fn create_category(&self, category: &Category) -> Result<Category, PipelineError> {
        self.write(self.http.post(self.url("categorias", "")).json(category)).await
    }

    pub async fn update_category(&self, category: &Category) -> Result<Category, PipelineError> {
        self.write(
            self.http
                .patch(self.url("categorias", &format!("/{}", category.key)))
                .json(category),
        )
        .await
    }

    pub async fn delete_category(&self, key: &str) -> Result<(), PipelineError> {
        self.delete(self.url("categorias", &format!("/{key}"))).await
    }

    pub async fn create_project(&self, project: &Project) -> Result<Project, PipelineError> {
        self.write(self.http.post(self.url("proyectos", "")).json(project)).await
    }

    pub async fn update_project(&self, project: &Project) -> Result<Project, PipelineError> {
        self.write(
            self.http
                .patch(self.url("proyectos", &format!("/{}", project.id)))
                .json(project),
        )
        .await
    }

    pub async fn delete_project(&self, id: &str) -> Result<(), PipelineError> {
        self.delete(self.url("proyectos", &format!("/{id}"))).await
    }

    /// Load both reference collections, sequentially, and build the lookup
    /// snapshot. The maps are replaced wholesale on every reload.
    pub async fn load_maps(&self) -> Result<ReferenceMaps, PipelineError> {
        let categories = self.list_categories().await?;
        let projects = self.list_projects().await?;
        tracing::debug!(
            projects = projects.len(),
            categories = categories.len(),
            "rebuilt reference maps"
        );
        Ok(ReferenceMaps::build(&projects, &categories))
    }

    async fn write<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, PipelineError> {
        let resp = authorize(req.query(&[("company", self.cfg.company_id.as_str())]), &self.cfg)
            .send()
            .await
            .map_err(|e| PipelineError::Backend(e.to_string()))?;
        read_json(resp).await
    }

    async fn delete(&self, url: String) -> Result<(), PipelineError> {
        let resp = authorize(
            self.http.delete(url).query(&[("company", self.cfg.company_id.as_str())]),
            &self.cfg,
        )
        .send()
        .await
        .map_err(|e| PipelineError::Backend(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Backend(format!("{status} {text}")));
        }
        Ok(())
    }
}
