use std::io::{self, Read, Write};

use flate2::{read::GzDecoder, Compression, GzBuilder};

use super::error::*;

#[derive(Debug)]
/// Exported utility compressor used by `angepkg`, gzip is the only filter the format knows
pub struct Compressor<T: Read> {
	data: T,
}

impl<T: Read> Compressor<T> {
	/// Construct a new compressor over a read handle
	pub fn new(data: T) -> Compressor<T> {
		Compressor { data }
	}

	/// Gzip everything in the read handle into `output`
	pub fn compress(&mut self, output: &mut dyn Write) -> InternalResult {
		self.compress_padded(0, output)
	}

	/// Like [`compress`](Compressor::compress) but the gzip member is exactly `pad` bytes longer.
	/// The padding lives in the header's comment field (`pad - 1` spaces and a NUL), which decoders skip.
	pub fn compress_padded(&mut self, pad: usize, output: &mut dyn Write) -> InternalResult {
		let builder = match pad {
			0 => GzBuilder::new(),
			pad => GzBuilder::new().comment(vec![b' '; pad - 1]),
		};

		let mut compressor = builder.write(output, Compression::default());
		io::copy(&mut self.data, &mut compressor)?;
		compressor.finish()?;

		Ok(())
	}

	/// Gunzip the read handle into `output`, returns the number of bytes decompressed.
	/// Errors are left as raw [`io::Error`]s so callers can attribute them to a manifest or an entry
	pub fn decompress(&mut self, output: &mut Vec<u8>) -> io::Result<usize> {
		let mut rdr = GzDecoder::new(&mut self.data);
		rdr.read_to_end(output)
	}
}
