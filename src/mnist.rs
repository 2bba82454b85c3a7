use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::info;
use ndarray::{s, Array2};

use crate::data::{one_hot, Dataset};
use crate::error::{Error, Result};

const IMAGE_MAGIC: u32 = 2051;
const LABEL_MAGIC: u32 = 2049;

/// Training set plus the MNIST test set split in half: the first half for
/// validation, the second for final testing.
#[derive(Debug, Clone)]
pub struct MnistSplits {
    pub training: Dataset,
    pub validation: Dataset,
    pub test: Dataset,
}

/// Loads the four IDX files from `dir`, each either raw or gzipped
pub fn load<P: AsRef<Path>>(dir: P) -> Result<MnistSplits> {
    let dir = dir.as_ref();
    let training = read_set(dir, "train-images-idx3-ubyte", "train-labels-idx1-ubyte")?;
    let test = read_set(dir, "t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte")?;

    let half = test.len() / 2;
    let validation = Dataset::new(
        test.inputs.slice(s![..half, ..]).to_owned(),
        test.targets.slice(s![..half, ..]).to_owned(),
    )?;
    let test = Dataset::new(
        test.inputs.slice(s![half.., ..]).to_owned(),
        test.targets.slice(s![half.., ..]).to_owned(),
    )?;

    info!(
        "MNIST loaded: {} training, {} validation, {} test examples",
        training.len(),
        validation.len(),
        test.len()
    );

    Ok(MnistSplits {
        training,
        validation,
        test,
    })
}

fn read_set(dir: &Path, images: &str, labels: &str) -> Result<Dataset> {
    let image_bytes = read_bytes(&locate(dir, images)?)?;
    let label_bytes = read_bytes(&locate(dir, labels)?)?;

    let inputs = parse_images(&image_bytes)?;
    let labels = parse_labels(&label_bytes)?;
    Dataset::new(inputs, one_hot(&labels, 10)?)
}

fn locate(dir: &Path, name: &str) -> Result<PathBuf> {
    let raw = dir.join(name);
    if raw.exists() {
        return Ok(raw);
    }
    let gz = dir.join(format!("{}.gz", name));
    if gz.exists() {
        return Ok(gz);
    }
    Err(Error::Dataset(format!("{} not found in {}", name, dir.display())))
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        GzDecoder::new(file).read_to_end(&mut bytes)?;
    } else {
        let mut file = file;
        file.read_to_end(&mut bytes)?;
    }
    Ok(bytes)
}

fn header(bytes: &[u8], count: usize) -> Result<Vec<u32>> {
    if bytes.len() < count * 4 {
        return Err(Error::Dataset("truncated IDX header".to_string()));
    }
    Ok(bytes[..count * 4]
        .chunks_exact(4)
        .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Parses an IDX3 image file into rows of pixels scaled to [0, 1]
pub fn parse_images(bytes: &[u8]) -> Result<Array2<f32>> {
    let fields = header(bytes, 4)?;
    if fields[0] != IMAGE_MAGIC {
        return Err(Error::Dataset(format!("bad image magic number {}", fields[0])));
    }
    let images = fields[1] as usize;
    let overflow = || Error::Dataset(format!("IDX dimensions {:?} overflow", &fields[1..]));
    let pixels = (fields[2] as usize).checked_mul(fields[3] as usize).ok_or_else(overflow)?;
    let expected = images.checked_mul(pixels).ok_or_else(overflow)?;

    let body = &bytes[16..];
    if body.len() != expected {
        return Err(Error::Dataset(format!(
            "expected {} image bytes, found {}",
            expected,
            body.len()
        )));
    }
    Ok(Array2::from_shape_fn((images, pixels), |(i, j)| body[i * pixels + j] as f32 / 255.0))
}

/// Parses an IDX1 label file
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>> {
    let fields = header(bytes, 2)?;
    if fields[0] != LABEL_MAGIC {
        return Err(Error::Dataset(format!("bad label magic number {}", fields[0])));
    }

    let body = &bytes[8..];
    if body.len() != fields[1] as usize {
        return Err(Error::Dataset(format!(
            "expected {} labels, found {}",
            fields[1],
            body.len()
        )));
    }
    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(magic: u32, dims: &[u32], body: &[u8]) -> Vec<u8> {
        let mut bytes = magic.to_be_bytes().to_vec();
        for d in dims {
            bytes.extend_from_slice(&d.to_be_bytes());
        }
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn test_parse_images() {
        let bytes = idx(IMAGE_MAGIC, &[2, 1, 2], &[0, 255, 51, 0]);
        let images = parse_images(&bytes).unwrap();

        assert_eq!(images.dim(), (2, 2));
        assert_eq!(images[[0, 1]], 1.0);
        assert!((images[[1, 0]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_oversized_header_is_an_error() {
        let bytes = idx(IMAGE_MAGIC, &[1, 70000, 70000], &[0; 16]);
        assert!(matches!(parse_images(&bytes), Err(Error::Dataset(_))));

        let bytes = idx(IMAGE_MAGIC, &[u32::MAX, u32::MAX, u32::MAX], &[]);
        assert!(matches!(parse_images(&bytes), Err(Error::Dataset(_))));
    }

    #[test]
    fn test_parse_labels_rejects_wrong_magic() {
        assert!(parse_labels(&idx(IMAGE_MAGIC, &[1], &[3])).is_err());
        assert_eq!(parse_labels(&idx(LABEL_MAGIC, &[2], &[3, 7])).unwrap(), vec![3, 7]);
    }

    #[test]
    fn test_truncated_body() {
        assert!(parse_images(&idx(IMAGE_MAGIC, &[2, 2, 2], &[0; 5])).is_err());
    }
}
