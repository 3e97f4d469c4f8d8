use std::{io::Write, path::Path};

use bplist_preview::preview::FALLBACK_MESSAGE;

use crate::app::{error::RuntimeError, progress::build_progress_bar_export, runtime::Config};

/// Defines behavior for iterating over the input files and managing export files
pub trait Exporter<'a> {
    /// Create a new exporter with a reference to the runtime configuration
    fn new(config: &'a Config) -> Result<Self, RuntimeError>
    where
        Self: Sized;
    /// The runtime configuration this exporter was built with
    fn config(&self) -> &'a Config;
    /// Emit the outcome for a single input
    fn write_preview(
        &mut self,
        path: &Path,
        preview: &Result<String, RuntimeError>,
    ) -> Result<(), RuntimeError>;
    /// Flush anything still buffered
    fn finish(&mut self) -> Result<(), RuntimeError>;

    /// Preview every input in order, returning how many could not be previewed
    fn iter_previews(&mut self) -> Result<usize, RuntimeError> {
        let config = self.config();
        let options = &config.options;

        // Tell the user what we are doing
        if let Some(export_path) = &options.export_path {
            eprintln!(
                "Exporting to {} as {}...",
                export_path.display(),
                options.export_type
            );
        }

        let pb =
            build_progress_bar_export(options.paths.len() as u64, options.export_path.is_some());
        let mut failures = 0;

        for path in &options.paths {
            let preview = config.preview_file(path);
            if let Err(why) = &preview {
                failures += 1;
                pb.suspend(|| eprintln!("{}: {FALLBACK_MESSAGE}: {why}", path.display()));
            }
            self.write_preview(path, &preview)?;
            pb.inc(1);

            if options.fail_fast {
                if let Err(why) = preview {
                    pb.abandon();
                    self.finish()?;
                    return Err(why);
                }
            }
        }

        pb.finish();
        self.finish()?;
        Ok(failures)
    }
}

/// Defines behavior for formatting a preview outcome to the desired output format
pub(super) trait Writer {
    /// Format the rendered preview, or the failure, for one input
    fn format_preview(&self, path: &Path, preview: &Result<String, RuntimeError>) -> String;
    fn write_to_file(file: &mut impl Write, text: &str) -> Result<(), RuntimeError> {
        file.write_all(text.as_bytes())
            .map_err(RuntimeError::DiskError)
    }
}
