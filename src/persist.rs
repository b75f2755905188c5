//! Model snapshots written as JSON artifacts
//!
//! Snapshots are process-local: they are reloadable by this crate's version
//! and carry no compatibility promise beyond that.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierModel;
use crate::cluster::ClusterModel;
use crate::error::PipelineError;

/// File name of the classifier artifact inside the destination directory.
pub const CLASSIFIER_ARTIFACT: &str = "decision_tree_model.json";
/// File name of the clustering artifact inside the destination directory.
pub const CLUSTER_ARTIFACT: &str = "kmeans_model.json";

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot<M> {
    crate_version: String,
    trained_at: DateTime<Utc>,
    model: M,
}

/// Write whichever models are present into `destination`.
///
/// Returns the paths written; absent models produce no artifact.
pub fn save(
    classifier: Option<&ClassifierModel>,
    cluster_model: Option<&ClusterModel>,
    destination: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, PipelineError> {
    let destination = destination.as_ref();
    fs::create_dir_all(destination).map_err(|e| PipelineError::persist(destination, e))?;

    let mut written = Vec::new();
    if let Some(model) = classifier {
        let path = destination.join(CLASSIFIER_ARTIFACT);
        write_snapshot(&path, model)?;
        written.push(path);
    }
    if let Some(model) = cluster_model {
        let path = destination.join(CLUSTER_ARTIFACT);
        write_snapshot(&path, model)?;
        written.push(path);
    }

    info!("Saved {} model artifact(s) to {}", written.len(), destination.display());
    Ok(written)
}

pub fn load_classifier(path: impl AsRef<Path>) -> Result<ClassifierModel, PipelineError> {
    read_snapshot(path.as_ref())
}

pub fn load_cluster_model(path: impl AsRef<Path>) -> Result<ClusterModel, PipelineError> {
    read_snapshot(path.as_ref())
}

fn write_snapshot<M: Serialize>(path: &Path, model: &M) -> Result<(), PipelineError> {
    let snapshot = Snapshot {
        crate_version: env!("CARGO_PKG_VERSION").to_string(),
        trained_at: Utc::now(),
        model,
    };
    let file = File::create(path).map_err(|e| PipelineError::persist(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &snapshot).map_err(|e| PipelineError::persist(path, e))?;
    writer.flush().map_err(|e| PipelineError::persist(path, e))
}

fn read_snapshot<M: DeserializeOwned>(path: &Path) -> Result<M, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::persist(path, e))?;
    let snapshot: Snapshot<M> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| PipelineError::persist(path, e))?;
    if snapshot.crate_version != env!("CARGO_PKG_VERSION") {
        return Err(PipelineError::persist(
            path,
            format!(
                "snapshot written by version {}, this is {}",
                snapshot.crate_version,
                env!("CARGO_PKG_VERSION")
            ),
        ));
    }
    Ok(snapshot.model)
}
