use std::{
    borrow::Cow,
    collections::HashSet,
    fs::File,
    io::{stdout, BufWriter, Stdout, Write},
    path::Path,
};

use bplist_preview::preview::FALLBACK_MESSAGE;

use crate::{
    app::{error::RuntimeError, runtime::Config, sanitizers::sanitize_filename},
    exporters::exporter::{Exporter, Writer},
};

/// Used when an input path has no file name component
const UNNAMED: &str = "preview";

pub struct TXT<'a> {
    /// Data that is setup from the application's runtime
    pub config: &'a Config,
    /// Destination when no export path is set
    stdout: BufWriter<Stdout>,
    /// Output file names already written during this export
    claimed: HashSet<String>,
}

impl<'a> Exporter<'a> for TXT<'a> {
    fn new(config: &'a Config) -> Result<Self, RuntimeError> {
        Ok(TXT {
            config,
            stdout: BufWriter::new(stdout()),
            claimed: HashSet::new(),
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
        let config = self.config;
        let text = self.format_preview(path, preview);

        match &config.options.export_path {
            Some(export_path) => {
                let filename = export_path.join(self.claim_filename(path));
                let file = File::create(&filename)
                    .map_err(|err| RuntimeError::CreateError(err, filename.clone()))?;
                let mut writer = BufWriter::new(file);
                TXT::write_to_file(&mut writer, &text)?;
                writer.flush().map_err(RuntimeError::DiskError)
            }
            None => {
                if config.options.paths.len() > 1 {
                    let header = format!("==> {} <==\n", path.display());
                    TXT::write_to_file(&mut self.stdout, &header)?;
                }
                TXT::write_to_file(&mut self.stdout, &text)
            }
        }
    }

    fn finish(&mut self) -> Result<(), RuntimeError> {
        self.stdout.flush().map_err(RuntimeError::DiskError)
    }
}

impl<'a> TXT<'a> {
    /// Pick a unique, filesystem-safe output name for `path`
    ///
    /// Inputs from different directories can share a file name; later ones get the lowest
    /// numeric suffix that is still free.
    fn claim_filename(&mut self, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or(Cow::Borrowed(UNNAMED));
        let base = sanitize_filename(&name);

        let mut filename = format!("{base}.txt");
        let mut count = 2;
        while !self.claimed.insert(filename.clone()) {
            filename = format!("{base} ({count}).txt");
            count += 1;
        }
        filename
    }
}

impl<'a> Writer for TXT<'a> {
    fn format_preview(&self, _: &Path, preview: &Result<String, RuntimeError>) -> String {
        match preview {
            Ok(text) => format!("{text}\n"),
            Err(_) => format!("{FALLBACK_MESSAGE}\n"),
        }
    }
}
