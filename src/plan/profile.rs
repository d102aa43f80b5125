//! Per-host plan profiles and the run's plan file

use crate::plan::Plan;
use crate::SweepError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the plan inside the crawl directory
pub const PLAN_FILE_NAME: &str = "plan.json";

/// Plans cached across runs, one JSON file per host
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the profile for `host`
    pub fn profile_path(&self, host: &str) -> PathBuf {
        let file_name: String = host
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }

    /// Loads the cached plan for `host`
    ///
    /// Missing, unreadable, unparseable and tampered profiles are all a miss.
    pub fn load(&self, host: &str) -> Option<Plan> {
        let path = self.profile_path(host);
        let content = fs::read_to_string(&path).ok()?;

        let plan: Plan = match serde_json::from_str(&content) {
            Ok(plan) => plan,
            Err(e) => {
                debug!("Ignoring unreadable profile {}: {}", path.display(), e);
                return None;
            }
        };

        if !plan.verify_hash() {
            debug!("Ignoring profile {} with mismatched hash", path.display());
            return None;
        }

        Some(plan)
    }

    /// Stores `plan` as the profile for `host`
    pub fn save(&self, host: &str, plan: &Plan) -> Result<(), SweepError> {
        write_json(&self.profile_path(host), plan)
    }
}

/// Writes `plan.json` into the crawl directory
pub fn write_plan_file(crawl_dir: &Path, plan: &Plan) -> Result<(), SweepError> {
    write_json(&crawl_dir.join(PLAN_FILE_NAME), plan)
}

fn write_json(path: &Path, plan: &Plan) -> Result<(), SweepError> {
    let persistence = |message: String| SweepError::Persistence {
        path: path.display().to_string(),
        message,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| persistence(e.to_string()))?;
    }
    let json = serde_json::to_string_pretty(plan).map_err(|e| persistence(e.to_string()))?;
    fs::write(path, json).map_err(|e| persistence(e.to_string()))
}
