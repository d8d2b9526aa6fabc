use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::extraction::domain::descriptor_extractor::{DescriptorExtractor, ExtractionError};
use crate::extraction::infrastructure::descriptor_file::{write_descriptors, DescriptorFileError};
use crate::grouping::domain::group::GroupSet;
use crate::grouping::domain::group_size_policy::select_materializable;
use crate::grouping::domain::grouping_error::GroupingError;
use crate::grouping::domain::identity_frequency::{
    bucketize, filter_by_min_count, FilenamePrefixKey,
};
use crate::grouping::domain::online_grouper::OnlineGrouper;
use crate::organize::domain::group_materializer::GroupMaterializer;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::sort_config::SortConfig;
use crate::shared::descriptor::Descriptor;

/// Called after each image with `(processed, total)`. Returning `false`
/// cancels the run.
pub type ProgressCallback = Box<dyn Fn(usize, usize) -> bool + Send>;

#[derive(Error, Debug)]
pub enum SortError {
    #[error(transparent)]
    Grouping(#[from] GroupingError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("failed to write group {dir_name}: {source}")]
    Materialize {
        dir_name: String,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error(transparent)]
    Export(#[from] DescriptorFileError),
    #[error("sort cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MaterializedGroup {
    pub group_id: usize,
    pub dir: PathBuf,
    pub size: usize,
}

/// Outcome of one sort run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SortReport {
    pub images_scanned: usize,
    /// Images that could not be read or decoded.
    pub images_skipped: usize,
    pub images_without_faces: usize,
    pub descriptors: usize,
    pub groups: GroupSet,
    pub materialized: Vec<MaterializedGroup>,
    /// Filename identity keys seen more than `identity_min_count` times.
    pub frequent_identities: Vec<String>,
}

/// Sorts a list of photos into per-person folders:
/// extract → flatten → group → diagnose → select → materialize.
pub struct SortPhotosUseCase {
    extractor: Box<dyn DescriptorExtractor>,
    materializer: Box<dyn GroupMaterializer>,
    logger: Box<dyn PipelineLogger>,
    config: SortConfig,
    on_progress: Option<ProgressCallback>,
    descriptor_dump: Option<PathBuf>,
}

impl SortPhotosUseCase {
    pub fn new(
        extractor: Box<dyn DescriptorExtractor>,
        materializer: Box<dyn GroupMaterializer>,
        logger: Box<dyn PipelineLogger>,
        config: SortConfig,
        on_progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            extractor,
            materializer,
            logger,
            config,
            on_progress,
            descriptor_dump: None,
        }
    }

    /// Also write the flattened descriptors to `path` as JSON.
    pub fn with_descriptor_dump(mut self, path: impl Into<PathBuf>) -> Self {
        self.descriptor_dump = Some(path.into());
        self
    }

    pub fn execute(&mut self, images: &[PathBuf]) -> Result<SortReport, SortError> {
        self.config.validate()?;

        let mut report = SortReport {
            images_scanned: images.len(),
            ..SortReport::default()
        };

        let descriptors = self.extract_all(images, &mut report)?;
        report.descriptors = descriptors.len();
        self.logger.metric("descriptors", descriptors.len() as f64);

        if let Some(path) = &self.descriptor_dump {
            write_descriptors(path, &descriptors)?;
            self.logger
                .info(&format!("Wrote {} descriptors to {}", descriptors.len(), path.display()));
        }

        report.frequent_identities = self.identity_diagnostic(&descriptors);

        let start = Instant::now();
        let grouper = OnlineGrouper::new(self.config.grouping.clone());
        let groups = grouper.group(&descriptors)?;
        self.logger.timing("group", elapsed_ms(start));
        self.logger.metric("groups", groups.len() as f64);

        let start = Instant::now();
        for group in select_materializable(&groups, self.config.min_group_size)? {
            let dir_name = self.config.group_dir_name(group.id());
            let members: Vec<&Path> = group
                .members()
                .iter()
                .map(|&index| descriptors[index].image())
                .collect();
            let dir = self
                .materializer
                .materialize(&dir_name, &members)
                .map_err(|source| SortError::Materialize {
                    dir_name: dir_name.clone(),
                    source,
                })?;
            log::info!("Group {} ({} faces) -> {}", group.id(), group.len(), dir.display());
            report.materialized.push(MaterializedGroup {
                group_id: group.id(),
                dir,
                size: group.len(),
            });
        }
        self.logger.timing("materialize", elapsed_ms(start));
        self.logger
            .metric("materialized_groups", report.materialized.len() as f64);

        report.groups = groups;
        self.logger.info(&format!(
            "{} images, {} faces, {} groups, {} written",
            report.images_scanned,
            report.descriptors,
            report.groups.len(),
            report.materialized.len()
        ));
        self.logger.summary();

        Ok(report)
    }

    /// Runs the extractor over every image in order and flattens the faces
    /// into one descriptor list, honouring the per-image face limit.
    fn extract_all(
        &mut self,
        images: &[PathBuf],
        report: &mut SortReport,
    ) -> Result<Vec<Descriptor>, SortError> {
        let total = images.len();
        let limit = self.config.max_faces_per_image.max_faces();
        let mut descriptors = Vec::new();

        for (index, image) in images.iter().enumerate() {
            let start = Instant::now();
            match self.extractor.extract(image) {
                Ok(embeddings) if embeddings.is_empty() => {
                    log::debug!("No faces in {}", image.display());
                    report.images_without_faces += 1;
                }
                Ok(embeddings) => {
                    let take = limit.unwrap_or(embeddings.len());
                    self.logger.metric("faces_per_image", embeddings.len() as f64);
                    descriptors.extend(
                        embeddings
                            .into_iter()
                            .take(take)
                            .map(|embedding| Descriptor::new(image.clone(), embedding)),
                    );
                }
                Err(e) if e.is_per_image() => {
                    log::warn!("Skipping image: {e}");
                    report.images_skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
            self.logger.timing("extract", elapsed_ms(start));

            let processed = index + 1;
            self.logger.progress(processed, total);
            if let Some(ref callback) = self.on_progress {
                if !callback(processed, total) {
                    log::info!("Sort cancelled after {processed}/{total} images");
                    return Err(SortError::Cancelled);
                }
            }
        }

        Ok(descriptors)
    }

    fn identity_diagnostic(&mut self, descriptors: &[Descriptor]) -> Vec<String> {
        let Some(separator) = self.config.identity_separator else {
            return Vec::new();
        };
        let buckets = bucketize(descriptors, &FilenamePrefixKey::new(separator));
        let frequent = filter_by_min_count(&buckets, self.config.identity_min_count);
        log::debug!(
            "{} filename identities, {} seen more than {} times",
            buckets.len(),
            frequent.len(),
            self.config.identity_min_count
        );
        if !frequent.is_empty() {
            self.logger
                .info(&format!("Frequent filename identities: {}", frequent.join(", ")));
        }
        frequent
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
