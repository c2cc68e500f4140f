// ⚙️ Dashboard configuration
// Optional dashboard.toml in the working directory; built-in defaults otherwise

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// File looked up in the working directory by the binaries
pub const CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Page heading
    pub title: String,

    /// Bursary records (Institution, Qualification, Gender, Ethnic Group, Total Funds)
    pub records_path: PathBuf,

    /// Qualification key (Institution, Qualification, ...descriptive columns)
    pub qualification_key_path: PathBuf,

    /// Where the CLI writes the rendered page
    pub output_path: PathBuf,

    /// Share below which a donut slice is merged into "Other"
    pub minor_share_threshold: f64,

    /// Genders with a donut chart, in display order
    pub genders: Vec<String>,

    /// Ethnic groups every donut is reindexed over
    pub ethnic_groups: Vec<String>,

    /// Donut slice colors by ethnic group label
    pub ethnic_colors: BTreeMap<String, String>,

    /// Color for any label missing from `ethnic_colors`
    pub fallback_color: String,

    /// Fixed y-axis ceiling of the qualification × gender chart
    pub qualification_gender_axis_max: f64,

    /// Bind address of the web server
    pub server_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let ethnic_colors = [
            ("Black", "#1f77b4"),
            ("Coloured", "#ff7f0e"),
            ("Indian", "#2ca02c"),
            ("White", "#d62728"),
            ("Other", "#9467bd"),
        ]
        .into_iter()
        .map(|(label, color)| (label.to_string(), color.to_string()))
        .collect();

        Self {
            title: "2024/2025 Bursary Spend Dashboard".to_string(),
            records_path: PathBuf::from("cleaned_bursary_data_updated.csv"),
            qualification_key_path: PathBuf::from("qualification_key_table_updated.csv"),
            output_path: PathBuf::from("bursary_dashboard.html"),
            minor_share_threshold: 0.05,
            genders: vec!["Female".to_string(), "Male".to_string()],
            ethnic_groups: vec![
                "Black".to_string(),
                "Coloured".to_string(),
                "Indian".to_string(),
                "White".to_string(),
            ],
            ethnic_colors,
            fallback_color: "#cccccc".to_string(),
            qualification_gender_axis_max: 5_000_000.0,
            server_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn load_from_file(file_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config {}", file_path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config {}", file_path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DashboardConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Use `file_path` when it exists, defaults otherwise
    pub fn load_or_default(file_path: &Path) -> Result<Self> {
        if file_path.exists() {
            info!(path = %file_path.display(), "loading dashboard config");
            Self::load_from_file(file_path)
        } else {
            info!(path = %file_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn color_for(&self, label: &str) -> &str {
        self.ethnic_colors
            .get(label)
            .map(String::as_str)
            .unwrap_or(&self.fallback_color)
    }
}
