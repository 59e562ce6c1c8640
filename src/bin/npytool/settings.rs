use std::env;
use std::error::Error;
use std::str::FromStr;

pub fn key_or_default_parse<
    E: Into<Box<dyn Error>>,
    T: FromStr<Err=E>
>(key: &str, default: T) -> Result<T, Box<dyn Error>> {
    match env::var(key) {
        Ok(val) => val.parse::<T>().map_err(|err| err.into()),
        Err(_) => Ok(default),
    }
}

pub fn key_or_default(key: &str, default: &str) -> String {
   match env::var(key) {
        Ok(val) => val,
        Err(_) => default.into(),
    }
}

/// folder: string. where `sample` writes its .npy files
/// log_file: string. log file, in addition to stderr
/// sample_count: usize. how many sample tensors to write
#[derive(Clone, Debug)]
pub struct Settings {
    pub folder: String,
    pub log_file: String,
    pub sample_count: usize,
}

impl Settings {
    pub fn from_env() -> Result<Settings, Box<dyn Error>> {
        Ok(Settings {
            folder: key_or_default("NPY_FOLDER", "npy"),
            log_file: key_or_default("NPY_LOG_FILE", "npytool.log"),
            sample_count: key_or_default_parse("NPY_SAMPLE_COUNT", 10)?,
        })
    }
}
