/// Characters that cannot appear in an output file name on at least one supported platform
const FILENAME_DISALLOWED_CHARS: [char; 9] = ['*', '"', '/', '\\', '<', '>', ':', '|', '?'];
/// Stands in for each disallowed character
const FILENAME_REPLACEMENT_CHAR: char = '_';

/// Derive a preview file name from an input file name
///
/// Each [disallowed character](FILENAME_DISALLOWED_CHARS) and each control character becomes
/// one [`FILENAME_REPLACEMENT_CHAR`].
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|letter| {
            if FILENAME_DISALLOWED_CHARS.contains(&letter) || letter.is_control() {
                FILENAME_REPLACEMENT_CHAR
            } else {
                letter
            }
        })
        .collect()
}
