use std::fmt::Debug;

use log::info;

use crate::{
    core::item::{ItemWriter, ItemWriterResult},
    error::CodecError,
};

/// An `ItemWriter` that logs every entry at `info` level instead of
/// writing it anywhere.
#[derive(Default)]
pub struct LoggerWriter {}

impl<T> ItemWriter<T> for LoggerWriter
where
    T: Debug,
{
    fn write(&self, item: &T) -> Result<(), CodecError> {
        info!("Record:{:?}", item);
        Ok(())
    }

    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }
}
