pub(crate) mod compressor;
pub(crate) mod error;
pub(crate) mod flags;
pub(crate) mod header;
pub(crate) mod manifest;
