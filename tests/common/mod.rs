pub mod mocks;

use std::{env::temp_dir, path::PathBuf};

use rand::distr::{Alphanumeric, SampleString};

#[allow(unused_imports)]
pub use mocks::{MockInput, MockOutput};

/// A scratch path in the system temp directory with a random file name.
#[allow(dead_code)]
pub fn scratch_path(extension: &str) -> PathBuf {
    let file_name = Alphanumeric.sample_string(&mut rand::rng(), 16);
    temp_dir().join(format!("{file_name}.{extension}"))
}
