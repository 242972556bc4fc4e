use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::models::{NewCourse, NewModule};
use crate::store::CatalogSeeder;

#[derive(Deserialize, Debug, Clone)]
pub struct SeedCatalog {
    pub courses: Vec<SeedCourse>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SeedCourse {
    #[serde(flatten)]
    pub course: NewCourse,
    #[serde(default)]
    pub modules: Vec<NewModule>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub courses: usize,
    pub modules: usize,
}

pub async fn load(path: &Path) -> anyhow::Result<SeedCatalog> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading seed catalog {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing seed catalog {}", path.display()))
}

/// Writes the catalog only when no course exists yet; returns what was added.
pub async fn apply(seeder: &dyn CatalogSeeder, catalog: SeedCatalog) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();
    if !seeder.is_empty().await? {
        return Ok(report);
    }
    for entry in catalog.courses {
        let course = seeder.add_course(entry.course).await?;
        report.courses += 1;
        for module in entry.modules {
            seeder.add_module(course.id, module).await?;
            report.modules += 1;
        }
    }
    Ok(report)
}
