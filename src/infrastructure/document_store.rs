// Dashboard document persistence - load, save, import and export JSON files
use crate::domain::dashboard::{DashboardDocument, PanelDocument};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub struct DocumentStore {
    path: PathBuf,
    document: DashboardDocument,
}

impl DocumentStore {
    /// Open the dashboard at `path`; a missing file starts an empty dashboard.
    /// A path that cannot be checked is an error.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to check dashboard {}", path.display()))?;
        let document = if exists {
            let text = read_text(&path).await?;
            DashboardDocument::from_json(&text)
                .with_context(|| format!("Failed to load dashboard {}", path.display()))?
        } else {
            tracing::warn!(path = %path.display(), "dashboard file not found, starting empty");
            DashboardDocument::default()
        };

        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &DashboardDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut DashboardDocument {
        &mut self.document
    }

    pub async fn save(&self) -> Result<()> {
        let text = self.document.to_json()?;
        tokio::fs::write(&self.path, text)
            .await
            .with_context(|| format!("Failed to write dashboard {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), panels = self.document.panels.len(), "saved dashboard");
        Ok(())
    }

    /// Replace the whole dashboard from a file; on any error nothing changes.
    pub async fn import_dashboard(&mut self, source: &Path) -> Result<()> {
        let text = read_text(source).await?;
        let document = DashboardDocument::from_json(&text).context("Failed to load dashboard")?;
        tracing::info!(source = %source.display(), panels = document.panels.len(), "imported dashboard");
        self.document = document;
        Ok(())
    }

    /// Replace one panel from a panel file; on any error nothing changes.
    pub async fn import_panel(&mut self, panel_id: &str, source: &Path) -> Result<()> {
        let text = read_text(source).await?;
        let panel =
            PanelDocument::from_json(&text).context("Failed to load panel configuration")?;
        self.document
            .replace_panel_from(panel_id, panel)
            .context("Failed to load panel configuration")?;
        tracing::info!(panel_id, source = %source.display(), "imported panel");
        Ok(())
    }

    /// Write one panel (without its id) to `dest`, or to its default file name
    /// next to the dashboard. Returns the path written.
    pub async fn export_panel(&self, panel_id: &str, dest: Option<&Path>) -> Result<PathBuf> {
        let panel = self.document.export_panel(panel_id)?;
        let dest = match dest {
            Some(dest) => dest.to_path_buf(),
            None => self
                .path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(panel.file_name()),
        };

        tokio::fs::write(&dest, panel.to_json()?)
            .await
            .with_context(|| format!("Failed to write panel {}", dest.display()))?;
        Ok(dest)
    }
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}
