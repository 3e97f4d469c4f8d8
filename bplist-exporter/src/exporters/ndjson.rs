use std::{
    fs::File,
    io::{stdout, BufWriter, Write},
    path::Path,
};

use bplist_preview::preview::FALLBACK_MESSAGE;
use json::object;

use crate::{
    app::{error::RuntimeError, runtime::Config},
    exporters::exporter::{Exporter, Writer},
};

/// Name of the file all previews are written to inside the export path
pub const PREVIEWS_FILE: &str = "previews";
/// Extension of [`PREVIEWS_FILE`]
pub const PREVIEWS_FILE_EXT: &str = "ndjson";

pub struct NDJSON<'a> {
    /// Data that is setup from the application's runtime
    pub config: &'a Config,
    /// Resolved previews file location, or stdout, behind a buffered writer
    pub file: BufWriter<Box<dyn Write>>,
}

impl<'a> Exporter<'a> for NDJSON<'a> {
    fn new(config: &'a Config) -> Result<Self, RuntimeError> {
        let writer: Box<dyn Write> = match &config.options.export_path {
            Some(export_path) => {
                let mut filename = export_path.join(PREVIEWS_FILE);
                filename.set_extension(PREVIEWS_FILE_EXT);

                let file = File::create(&filename)
                    .map_err(|err| RuntimeError::CreateError(err, filename))?;
                Box::new(file)
            }
            None => Box::new(stdout()),
        };

        Ok(NDJSON {
            config,
            file: BufWriter::new(writer),
        })
    }

    fn config(&self) -> &'a Config {
        self.config
    }

    fn write_preview(
        &mut self,
        path: &Path,
        preview: &Result<String, RuntimeError>,
    ) -> Result<(), RuntimeError> {
        let line = self.format_preview(path, preview);
        NDJSON::write_to_file(&mut self.file, &line)
    }

    fn finish(&mut self) -> Result<(), RuntimeError> {
        self.file.flush().map_err(RuntimeError::DiskError)
    }
}

impl<'a> Writer for NDJSON<'a> {
    fn format_preview(&self, path: &Path, preview: &Result<String, RuntimeError>) -> String {
        let path = path.display().to_string();
        let entry = match preview {
            Ok(text) => object! {
                path: path,
                preview: text.as_str(),
            },
            Err(why) => object! {
                path: path,
                error: format!("{FALLBACK_MESSAGE}: {why}"),
            },
        };
        format!("{}\n", json::stringify(entry))
    }
}
