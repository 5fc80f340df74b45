use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name of the `index`-th results file: `data.csv`, `data1.csv`, ...
pub fn data_file_name(index: usize) -> String {
    if index == 0 {
        "data.csv".to_string()
    } else {
        format!("data{}.csv", index)
    }
}

/// True for names produced by [`data_file_name`].
pub fn is_data_file_name(name: &str) -> bool {
    name.strip_prefix("data")
        .and_then(|rest| rest.strip_suffix(".csv"))
        .is_some_and(|digits| digits.chars().all(|c| c.is_ascii_digit()))
}

/// Claims the first unused results file name in `dir`.
///
/// Creates the directory if needed, then tries `data.csv`, `data1.csv`, ...
/// with create-new semantics. The winning file is left on disk empty, so a
/// concurrent caller probing the same directory moves on to the next name.
///
/// # Arguments
///
/// * `dir` - Output directory
///
/// # Returns
///
/// Path of the claimed file, or an error if the directory cannot be
/// created or a probe fails for a reason other than the name being taken.
pub fn reserve_data_name<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut index = 0;
    loop {
        let path = dir.join(data_file_name(index));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                log::info!("saving results to {}", path.display());
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => index += 1,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to reserve {}", path.display()));
            }
        }
    }
}
