use crate::config::{Config, LoaderKind};
use crate::error::{ConfigError, Error};
use crate::loader::{BulkFileLoader, BulkLoadOptions, DataLoader, LoadSummary, RowInsertLoader};
use crate::provision::Provisioner;
use crate::warehouse::Warehouse;

/// Provisions the dataset (and table, when the loader needs one declared), then loads the
/// data. The first error aborts the run, nothing that was already created is rolled back.
#[derive(Debug)]
pub struct Bootstrap<W> {
    warehouse: W,
    config: Config,
}

impl<W: Warehouse> Bootstrap<W> {
    pub const fn new(warehouse: W, config: Config) -> Self {
        Self { warehouse, config }
    }

    /// Builds the configuration from 'lookup' first, so configuration errors are raised
    /// before 'warehouse' sees any calls.
    pub fn from_lookup<F>(warehouse: W, lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config::from_lookup(lookup)?;
        Ok(Self::new(warehouse, config))
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn warehouse(&self) -> &W {
        &self.warehouse
    }

    /// Builds the configured loader. This reads (and for the sample, writes) the local
    /// source and validates records, so a bad source fails before any remote call.
    pub async fn build_loader(&self) -> Result<DataLoader, Error> {
        let config = &self.config;

        let loader: DataLoader = match config.loader {
            LoaderKind::Import => {
                if config.write_sample {
                    crate::sample::write_sample_file(&config.source)?;
                }

                let options = BulkLoadOptions {
                    skip_header_rows: config.skip_header_rows,
                    auto_detect_schema: config.auto_detect_schema,
                    poll_interval: config.poll_interval,
                    timeout: config.job_timeout,
                };

                BulkFileLoader::new(config.source.clone(), options)
                    .with_schema(config.schema.clone())
                    .into()
            }
            LoaderKind::Insert => {
                if config.write_sample {
                    return Err(ConfigError::invalid(
                        crate::config::WRITE_SAMPLE,
                        "the sample source is CSV, which only the import loader reads",
                    )
                    .into());
                }

                let loader =
                    RowInsertLoader::from_ndjson_file(config.schema.clone(), &config.source).await?;
                loader.validate()?;
                loader.into()
            }
        };

        Ok(loader)
    }

    pub async fn run(&self) -> Result<LoadSummary, Error> {
        let loader = self.build_loader().await?;
        self.run_with(&loader).await
    }

    /// Runs the provisioning steps, then 'loader'.
    pub async fn run_with(&self, loader: &DataLoader) -> Result<LoadSummary, Error> {
        let config = &self.config;

        info!(
            message = "starting bootstrap",
            project_id = %self.warehouse.project_id(),
            dataset = %config.dataset,
            table = %config.table,
            loader = loader.kind(),
        );

        let provisioner = Provisioner::new(&self.warehouse);

        let dataset = provisioner.ensure_dataset(&config.dataset).await?;

        if loader.requires_schema() {
            provisioner
                .ensure_table(&dataset, &config.table, &config.schema)
                .await?;
        } else {
            debug!(message = "loader creates the table itself, skipping table provisioning");
        }

        let summary = loader
            .load(&self.warehouse, &config.table, &config.dataset.location)
            .await?;

        info!(
            message = "bootstrap finished",
            table = %config.table,
            rows = summary.rows,
            job_id = summary.job_id.as_deref(),
        );

        Ok(summary)
    }
}
