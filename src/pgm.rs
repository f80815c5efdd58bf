//! PGM (P5/P2) reader and writer for single-channel images.
//!
//! Handy for dumping individual planes and for grayscale pipelines that
//! should not pass through the lossy baseline codec.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use crate::pixmap::{Image, PixelFormat};
use crate::{Result, StupError};

pub struct Pgm {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Pgm {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut line = String::new();

        reader.read_line(&mut line)?;
        if !line.starts_with("P5") && !line.starts_with("P2") {
            return Err(StupError::UnsupportedFormat);
        }
        let binary = line.starts_with("P5");

        line.clear();
        loop {
            reader.read_line(&mut line)?;
            if !line.starts_with('#') {
                break;
            }
            line.clear();
        }

        let dims: Vec<usize> = line
            .split_whitespace()
            .map(|s| s.parse().map_err(|_| StupError::InvalidData))
            .collect::<Result<Vec<usize>>>()?;
        if dims.len() != 2 {
            return Err(StupError::InvalidData);
        }
        let (width, height) = (dims[0], dims[1]);

        line.clear();
        reader.read_line(&mut line)?;
        let max_val: u32 = line.trim().parse().map_err(|_| StupError::InvalidData)?;
        if max_val != 255 {
            return Err(StupError::UnsupportedFormat);
        }

        let mut data = vec![0u8; width * height];
        if binary {
            reader.read_exact(&mut data)?;
        } else {
            let mut values = String::new();
            reader.read_to_string(&mut values)?;
            let values: Vec<u8> = values
                .split_whitespace()
                .map(|s| s.parse().map_err(|_| StupError::InvalidData))
                .collect::<Result<Vec<u8>>>()?;
            if values.len() != data.len() {
                return Err(StupError::InvalidData);
            }
            data.copy_from_slice(&values);
        }

        Ok(Self { width, height, data })
    }

    /// Write as binary P5.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        writeln!(file, "P5")?;
        writeln!(file, "{} {}", self.width, self.height)?;
        writeln!(file, "255")?;
        file.write_all(&self.data)?;
        Ok(())
    }

    pub fn from_image(img: &Image) -> Result<Self> {
        if img.format() != PixelFormat::Gray {
            return Err(StupError::UnsupportedFormat);
        }
        Ok(Self {
            width: img.width(),
            height: img.height(),
            data: img.data().to_vec(),
        })
    }

    pub fn into_image(self) -> Image {
        Image::from_raw(self.width, self.height, PixelFormat::Gray, self.data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
