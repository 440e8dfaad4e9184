//! Application state management module.
//!
//! Holds the selection state of the dashboard (selected cluster, detail page,
//! focused table) and the cache every view is rendered from.

use std::sync::Arc;
use tracing::{info, warn};

use crate::agent;
use crate::cache::InventoryCache;
use crate::client::InventoryClient;
use crate::config::Config;
use crate::error::InventoryError;
use crate::model::{Cluster, ClusterSnapshot, ContainerInstance};
use crate::ui::utils::format_time;

/// Detail page shown below the cluster table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailPage {
    /// Services of the selected cluster
    Services,
    /// Tasks of the selected cluster
    Tasks,
    /// Container instances of the selected cluster
    Instances,
}

impl DetailPage {
    pub fn title(self) -> &'static str {
        match self {
            DetailPage::Services => "Services",
            DetailPage::Tasks => "Tasks",
            DetailPage::Instances => "Instances",
        }
    }
}

/// Which table receives the navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Clusters,
    Details,
}

/// Main application state container.
pub struct App<C> {
    /// Inventory cache every view reads from
    pub cache: InventoryCache<C>,
    /// Application configuration
    pub config: Config,
    /// Clusters sorted by name
    pub clusters: Arc<[Cluster]>,
    /// Selected row of the cluster table
    pub cluster_index: usize,
    /// Current detail page
    pub page: DetailPage,
    /// Table receiving navigation keys
    pub focus: Focus,
    /// Selected row of the detail table
    pub detail_index: usize,
    /// Snapshot of the selected cluster
    pub snapshot: Option<Arc<ClusterSnapshot>>,
    /// Latest released ECS agent version, once looked up
    pub latest_agent_version: Option<String>,
    agent_version_checked: bool,
}

impl<C: InventoryClient> App<C> {
    /// Creates the application and loads the cluster list plus the snapshot
    /// of the first cluster.
    ///
    /// # Errors
    /// Returns the first failed remote call of the initial load.
    pub async fn new(cache: InventoryCache<C>, config: Config) -> Result<Self, InventoryError> {
        let mut app = Self {
            cache,
            config,
            clusters: Arc::from(Vec::new()),
            cluster_index: 0,
            page: DetailPage::Services,
            focus: Focus::Clusters,
            detail_index: 0,
            snapshot: None,
            latest_agent_version: None,
            agent_version_checked: false,
        };

        app.clusters = app.cache.list_clusters().await?;
        app.load_selected().await?;
        Ok(app)
    }

    pub fn selected_cluster(&self) -> Option<&Cluster> {
        self.clusters.get(self.cluster_index)
    }

    /// Cached container instances of `cluster`, used for the cluster meters.
    pub fn instances_of(&self, cluster: &Cluster) -> Arc<[ContainerInstance]> {
        self.cache.get_containers(cluster)
    }

    /// Number of rows on the current detail page.
    pub fn detail_len(&self) -> usize {
        match (&self.snapshot, self.page) {
            (None, _) => 0,
            (Some(s), DetailPage::Services) => s.services.len(),
            (Some(s), DetailPage::Tasks) => s.tasks.len(),
            (Some(s), DetailPage::Instances) => s.instances.len(),
        }
    }

    /// Moves the selection down in the focused table, wrapping at the end.
    ///
    /// # Errors
    /// Moving to another cluster may load its snapshot, which can fail.
    pub async fn next(&mut self) -> Result<(), InventoryError> {
        match self.focus {
            Focus::Clusters => {
                let len = self.clusters.len();
                if len > 0 {
                    self.cluster_index = (self.cluster_index + 1) % len;
                    self.load_selected().await?;
                }
            }
            Focus::Details => {
                let len = self.detail_len();
                if len > 0 {
                    self.detail_index = (self.detail_index + 1) % len;
                }
            }
        }
        Ok(())
    }

    /// Moves the selection up in the focused table, wrapping at the start.
    ///
    /// # Errors
    /// Moving to another cluster may load its snapshot, which can fail.
    pub async fn previous(&mut self) -> Result<(), InventoryError> {
        match self.focus {
            Focus::Clusters => {
                let len = self.clusters.len();
                if len > 0 {
                    self.cluster_index = wrap_back(self.cluster_index, len);
                    self.load_selected().await?;
                }
            }
            Focus::Details => {
                let len = self.detail_len();
                if len > 0 {
                    self.detail_index = wrap_back(self.detail_index, len);
                }
            }
        }
        Ok(())
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Clusters => Focus::Details,
            Focus::Details => Focus::Clusters,
        };
    }

    /// Switches the detail page. The first visit to the instances page looks
    /// up the latest agent release when enabled.
    pub async fn set_page(&mut self, page: DetailPage) {
        if self.page != page {
            self.page = page;
            self.detail_index = 0;
        }

        if page == DetailPage::Instances
            && self.config.ui.check_agent_version
            && !self.agent_version_checked
        {
            self.agent_version_checked = true;
            match agent::latest_agent_version().await {
                Ok(version) => {
                    info!(%version, "latest ECS agent release");
                    self.latest_agent_version = Some(version);
                }
                Err(e) => warn!(error = %format!("{e:#}"), "agent version lookup failed"),
            }
        }
    }

    /// Re-reads everything about the selected cluster, bypassing the cache.
    ///
    /// # Errors
    /// Returns the first failed remote call of the rebuild.
    pub async fn refresh(&mut self) -> Result<(), InventoryError> {
        let Some(cluster) = self.selected_cluster().cloned() else {
            return Ok(());
        };
        let snapshot = self.cache.refresh_snapshot(&cluster).await?;
        self.install(snapshot);
        Ok(())
    }

    /// Loads the snapshot of the selected cluster, from cache when possible.
    async fn load_selected(&mut self) -> Result<(), InventoryError> {
        let Some(cluster) = self.selected_cluster().cloned() else {
            self.snapshot = None;
            return Ok(());
        };
        let snapshot = self.cache.get_snapshot(&cluster).await?;
        self.install(snapshot);
        Ok(())
    }

    fn install(&mut self, snapshot: Arc<ClusterSnapshot>) {
        self.snapshot = Some(snapshot);
        let len = self.detail_len();
        if self.detail_index >= len {
            self.detail_index = len.saturating_sub(1);
        }
    }

    /// Right-hand footer text.
    pub fn status_line(&self) -> String {
        match &self.snapshot {
            Some(snapshot) if !self.clusters.is_empty() => format!(
                "{} refreshed at {}",
                snapshot.cluster.name,
                format_time(snapshot.refreshed_at)
            ),
            _ => "No clusters found".to_string(),
        }
    }
}

fn wrap_back(index: usize, len: usize) -> usize {
    if index == 0 {
        len - 1
    } else {
        index - 1
    }
}
