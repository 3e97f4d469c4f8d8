use std::{
    fs::{create_dir_all, read},
    path::Path,
};

use bplist_preview::preview::render_preview;

use crate::{
    app::{
        compression::decompress,
        error::RuntimeError,
        options::{ExportType, Options},
    },
    exporters::{exporter::Exporter, ndjson::NDJSON, txt::TXT},
};

/// Stores the application state and handles application lifecycle
#[derive(Debug)]
pub struct Config {
    /// App configuration options
    pub options: Options,
}

impl Config {
    /// Create a new instance of the application, preparing the export directory if one was
    /// requested
    pub fn new(options: Options) -> Result<Config, RuntimeError> {
        if let Some(export_path) = &options.export_path {
            create_dir_all(export_path)
                .map_err(|err| RuntimeError::CreateError(err, export_path.clone()))?;
        }
        Ok(Config { options })
    }

    /// Read, decompress, and render a single input file
    pub fn preview_file(&self, path: &Path) -> Result<String, RuntimeError> {
        let bytes = read(path).map_err(|err| RuntimeError::ReadError(err, path.to_path_buf()))?;
        let bytes = decompress(bytes)?;
        render_preview(&bytes).map_err(RuntimeError::PreviewError)
    }

    /// Run every input through the exporter `T`, failing if any input could not be previewed
    fn run_exporter<'a, T: Exporter<'a>>(&'a self) -> Result<(), RuntimeError> {
        let failures = T::new(self)?.iter_previews()?;
        match failures {
            0 => Ok(()),
            count => Err(RuntimeError::Failures(count)),
        }
    }

    /// Start the app given the provided set of options
    pub fn start(&self) -> Result<(), RuntimeError> {
        match self.options.export_type {
            ExportType::Txt => self.run_exporter::<TXT>(),
            ExportType::Ndjson => self.run_exporter::<NDJSON>(),
        }
    }
}
