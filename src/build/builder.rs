use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::config::RootConfig;
use crate::dataset::{Dataset, DatasetError, LocationRecord};

use super::paths::{output_path, resolve_against};
use super::render::{RenderError, RenderSettings, Renderer};

/// Errors that prevent a run from starting. Per-record failures are
/// reported in [`BuildReport`] instead.
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("failed to prepare output directory {0}: {1}")]
    OutputDir(PathBuf, std::io::Error),
}

/// Why a single record could not be written.
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of processing one record.
#[derive(Debug)]
pub enum RecordOutcome {
    Written {
        slug: String,
        path: PathBuf,
    },
    Failed {
        slug: String,
        path: PathBuf,
        error: RecordError,
    },
}

impl RecordOutcome {
    pub fn slug(&self) -> &str {
        match self {
            RecordOutcome::Written { slug, .. } | RecordOutcome::Failed { slug, .. } => slug,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            RecordOutcome::Written { path, .. } | RecordOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, RecordOutcome::Written { .. })
    }
}

/// Outcome of a full run, one entry per record in dataset order.
#[derive(Debug)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub outcomes: Vec<RecordOutcome>,
}

impl BuildReport {
    pub fn generated(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_written()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|o| !o.is_written())
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// An output that does not match what the generator would write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleOutput {
    pub slug: String,
    pub path: PathBuf,
    pub reason: StaleReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    Missing,
    Changed,
}

/// Drives rendering of every record and emission of one file per slug.
pub struct Builder {
    dataset: Dataset,
    renderer: Renderer,
    output_dir: PathBuf,
}

impl Builder {
    pub fn new(dataset: Dataset, renderer: Renderer, output_dir: PathBuf) -> Self {
        Self {
            dataset,
            renderer,
            output_dir,
        }
    }

    /// Load the dataset and templates named by the config.
    ///
    /// Relative paths are resolved against `base_path` (typically the
    /// config file's directory).
    pub fn from_config(config: &RootConfig, base_path: &Path) -> Result<Self, BuildError> {
        let dataset_path = config
            .dataset
            .as_deref()
            .map(|path| resolve_against(base_path, path));
        let dataset = Dataset::load_or_builtin(dataset_path.as_deref())?;
        debug!(records = dataset.len(), "loaded dataset");

        let settings = RenderSettings::from_config(config);
        let renderer = match &config.site.theme {
            Some(theme) => Renderer::from_theme(&resolve_against(base_path, theme), settings)?,
            None => Renderer::builtin(settings)?,
        };

        let output_dir = resolve_against(base_path, &config.site.output);
        Ok(Self::new(dataset, renderer, output_dir))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Render and write every record.
    ///
    /// A record that fails is recorded and the run moves on; the summary is
    /// logged once all records have been processed.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| BuildError::OutputDir(self.output_dir.clone(), e))?;

        let mut outcomes = Vec::with_capacity(self.dataset.len());
        for record in self.dataset.records() {
            let path = self.output_path(record);
            let outcome = match self.write_record(record, &path) {
                Ok(()) => {
                    info!(slug = %record.slug, path = %path.display(), "wrote location page");
                    RecordOutcome::Written {
                        slug: record.slug.clone(),
                        path,
                    }
                }
                Err(e) => {
                    error!(slug = %record.slug, path = %path.display(), error = %e, "failed to write location page");
                    RecordOutcome::Failed {
                        slug: record.slug.clone(),
                        path,
                        error: e,
                    }
                }
            };
            outcomes.push(outcome);
        }

        let report = BuildReport {
            output_dir: self.output_dir.clone(),
            outcomes,
        };
        info!(
            generated = report.generated(),
            failed = report.failed(),
            "location page generation finished"
        );
        Ok(report)
    }

    /// Render every record and compare with what is on disk, writing nothing.
    pub fn check(&self) -> Result<Vec<StaleOutput>, BuildError> {
        let mut stale = Vec::new();
        for record in self.dataset.records() {
            let path = self.output_path(record);
            let expected = self.renderer.render(record)?;

            let reason = match std::fs::read(&path) {
                Ok(existing) if existing == expected.as_bytes() => None,
                Ok(_) => Some(StaleReason::Changed),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Some(StaleReason::Missing),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "unreadable location page");
                    Some(StaleReason::Changed)
                }
            };

            if let Some(reason) = reason {
                debug!(slug = %record.slug, ?reason, "stale location page");
                stale.push(StaleOutput {
                    slug: record.slug.clone(),
                    path,
                    reason,
                });
            }
        }
        Ok(stale)
    }

    fn output_path(&self, record: &LocationRecord) -> PathBuf {
        output_path(&record.slug, &self.output_dir, self.renderer.format())
    }

    fn write_record(&self, record: &LocationRecord, path: &Path) -> Result<(), RecordError> {
        let content = self.renderer.render(record)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    fn builder(output_dir: &Path, format: OutputFormat) -> Builder {
        let settings = RenderSettings {
            format,
            ..RenderSettings::default()
        };
        Builder::new(
            Dataset::builtin().unwrap(),
            Renderer::builtin(settings).unwrap(),
            output_dir.to_path_buf(),
        )
    }

    fn read_outputs(dir: &Path) -> Vec<(String, String)> {
        let mut files: Vec<(String, String)> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| {
                let path = entry.unwrap().path();
                let name = path.file_name().unwrap().to_string_lossy().to_string();
                (name, std::fs::read_to_string(&path).unwrap())
            })
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_build_writes_one_file_per_slug() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("src/pages/locations");
        let report = builder(&output, OutputFormat::Astro).build().unwrap();

        assert!(report.is_success());
        assert_eq!(report.generated(), 12);
        assert_eq!(report.outcomes[0].slug(), "modesto");
        assert_eq!(report.outcomes[11].slug(), "pittsburg");

        let turlock = std::fs::read_to_string(output.join("turlock.astro")).unwrap();
        assert!(turlock.contains("Professional Fence Installation in Turlock, CA"));
        assert_eq!(read_outputs(&output).len(), 12);
    }

    #[test]
    fn test_build_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(dir.path(), OutputFormat::Astro);

        builder.build().unwrap();
        let first = read_outputs(dir.path());
        builder.build().unwrap();
        let second = read_outputs(dir.path());

        assert_eq!(first, second);
    }

    #[test]
    fn test_build_html_layout() {
        let dir = tempfile::tempdir().unwrap();
        let report = builder(dir.path(), OutputFormat::Html).build().unwrap();

        assert!(report.is_success());
        assert_eq!(
            report.outcomes[1].path(),
            dir.path().join("turlock").join("index.html")
        );
        assert!(dir.path().join("pittsburg/index.html").is_file());
    }

    #[test]
    fn test_failed_write_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should go makes that one write fail
        std::fs::create_dir_all(dir.path().join("turlock.astro")).unwrap();

        let report = builder(dir.path(), OutputFormat::Astro).build().unwrap();

        assert!(!report.is_success());
        assert_eq!(report.generated(), 11);
        assert_eq!(report.failed(), 1);

        let failure = report.failures().next().unwrap();
        assert_eq!(failure.slug(), "turlock");
        assert!(matches!(
            failure,
            RecordOutcome::Failed {
                error: RecordError::Io(_),
                ..
            }
        ));
        // Records after the failing one were still written
        assert!(dir.path().join("pittsburg.astro").is_file());
    }

    #[test]
    fn test_unwritable_output_dir_is_a_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let err = builder(&blocker.join("out"), OutputFormat::Astro)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::OutputDir(_, _)));
    }

    #[test]
    fn test_check_reports_stale_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(dir.path(), OutputFormat::Astro);

        let stale = builder.check().unwrap();
        assert_eq!(stale.len(), 12);
        assert!(stale.iter().all(|s| s.reason == StaleReason::Missing));

        builder.build().unwrap();
        assert!(builder.check().unwrap().is_empty());

        std::fs::write(dir.path().join("ceres.astro"), "edited by hand").unwrap();
        std::fs::remove_file(dir.path().join("dublin.astro")).unwrap();
        let stale = builder.check().unwrap();
        assert_eq!(
            stale,
            vec![
                StaleOutput {
                    slug: "ceres".to_string(),
                    path: dir.path().join("ceres.astro"),
                    reason: StaleReason::Changed,
                },
                StaleOutput {
                    slug: "dublin".to_string(),
                    path: dir.path().join("dublin.astro"),
                    reason: StaleReason::Missing,
                },
            ]
        );
    }

    #[test]
    fn test_check_treats_unreadable_output_as_changed() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(dir.path(), OutputFormat::Astro);
        builder.build().unwrap();

        std::fs::write(dir.path().join("ceres.astro"), [0xff, 0xfe, 0x00]).unwrap();
        std::fs::remove_file(dir.path().join("dublin.astro")).unwrap();
        std::fs::create_dir(dir.path().join("dublin.astro")).unwrap();

        let stale = builder.check().unwrap();
        let slugs: Vec<(&str, StaleReason)> =
            stale.iter().map(|s| (s.slug.as_str(), s.reason)).collect();
        assert_eq!(
            slugs,
            vec![("ceres", StaleReason::Changed), ("dublin", StaleReason::Changed)]
        );
    }

    #[test]
    fn test_from_config_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let dataset_path = dir.path().join("cities.yaml");
        std::fs::write(
            &dataset_path,
            serde_yaml::to_string(&vec![crate::dataset::tests::turlock()]).unwrap(),
        )
        .unwrap();

        let mut config = RootConfig::default();
        config.dataset = Some(PathBuf::from("cities.yaml"));
        config.site.output = PathBuf::from("out");

        let builder = Builder::from_config(&config, dir.path()).unwrap();
        assert_eq!(builder.output_dir(), dir.path().join("out"));
        assert_eq!(builder.dataset().len(), 1);

        let report = builder.build().unwrap();
        assert_eq!(report.generated(), 1);
        assert!(dir.path().join("out/turlock.astro").is_file());
    }
}
