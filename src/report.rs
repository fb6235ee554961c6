use std::fmt;
use std::path::PathBuf;

/// Final paths of a successful run, printed on standard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub video: PathBuf,
    pub source_subtitles: PathBuf,
    pub translated_subtitles: PathBuf,
    pub source_lang: String,
    pub target_lang: String,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Done! ===")?;
        writeln!(f, "Video file: {}", self.video.display())?;
        writeln!(
            f,
            "Source subtitles ({}): {}",
            self.source_lang,
            self.source_subtitles.display()
        )?;
        write!(
            f,
            "Translated subtitles ({}): {}",
            self.target_lang,
            self.translated_subtitles.display()
        )
    }
}
