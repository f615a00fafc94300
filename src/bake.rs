// ============================================
// Bake - Запечённая карта высот для физики/навигации
// ============================================
// Формат: заголовок (bincode) + тело (bincode, сжатое ZSTD)
// Заголовок фиксированного размера: magic, версия, размеры

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::terrain::HeightField;

/// Магическое число "HFLD" в ASCII
pub const BAKE_MAGIC: [u8; 4] = [0x48, 0x46, 0x4C, 0x44];

/// Версия формата
pub const BAKE_VERSION: u32 = 1;

/// Заголовок файла (20 байт, little-endian):
/// ```text
/// 0..4    magic "HFLD"
/// 4..8    версия формата
/// 8..12   ширина карты в сэмплах
/// 12..16  глубина карты в сэмплах
/// 16..20  ширина бордюра
/// ```
/// Дальше до конца файла - zstd-поток с Vec<f32> высот (bincode).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BakeHeader {
    magic: [u8; 4],
    version: u32,
    width: u32,
    depth: u32,
    extension_size: u32,
}

impl Default for BakeHeader {
    fn default() -> Self {
        Self {
            magic: BAKE_MAGIC,
            version: BAKE_VERSION,
            width: 0,
            depth: 0,
            extension_size: 0,
        }
    }
}

/// Ошибки запекания/загрузки
#[derive(Debug)]
pub enum BakeError {
    Io(std::io::Error),
    Serialize(String),
    Deserialize(String),
    Compression(String),
    InvalidMagic,
    UnsupportedVersion(u32),
    /// Размеры тела не совпадают с заголовком
    SizeMismatch,
}

impl fmt::Display for BakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BakeError::Io(e) => write!(f, "io error: {}", e),
            BakeError::Serialize(e) => write!(f, "serialize error: {}", e),
            BakeError::Deserialize(e) => write!(f, "deserialize error: {}", e),
            BakeError::Compression(e) => write!(f, "compression error: {}", e),
            BakeError::InvalidMagic => write!(f, "not a baked height field"),
            BakeError::UnsupportedVersion(v) => write!(f, "unsupported bake version {}", v),
            BakeError::SizeMismatch => write!(f, "height data does not match header size"),
        }
    }
}

impl std::error::Error for BakeError {}

impl From<std::io::Error> for BakeError {
    fn from(e: std::io::Error) -> Self {
        BakeError::Io(e)
    }
}

/// Сохранить карту высот
pub fn save_height_field(path: impl AsRef<Path>, field: &HeightField) -> Result<(), BakeError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let header = BakeHeader {
        width: field.width() as u32,
        depth: field.depth() as u32,
        extension_size: field.extension_size() as u32,
        ..Default::default()
    };
    let header_bytes = bincode::serialize(&header)
        .map_err(|e| BakeError::Serialize(e.to_string()))?;
    writer.write_all(&header_bytes)?;

    let body_bytes = bincode::serialize(field.values())
        .map_err(|e| BakeError::Serialize(e.to_string()))?;
    let compressed = zstd::encode_all(&body_bytes[..], 3)
        .map_err(|e| BakeError::Compression(e.to_string()))?;
    writer.write_all(&compressed)?;

    writer.flush()?;
    Ok(())
}

/// Загрузить карту высот
pub fn load_height_field(path: impl AsRef<Path>) -> Result<HeightField, BakeError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let header_size = bincode::serialized_size(&BakeHeader::default())
        .map_err(|e| BakeError::Serialize(e.to_string()))? as usize;
    let mut header_bytes = vec![0u8; header_size];
    reader.read_exact(&mut header_bytes)?;

    let header: BakeHeader = bincode::deserialize(&header_bytes)
        .map_err(|e| BakeError::Deserialize(e.to_string()))?;
    if header.magic != BAKE_MAGIC {
        return Err(BakeError::InvalidMagic);
    }
    if header.version != BAKE_VERSION {
        return Err(BakeError::UnsupportedVersion(header.version));
    }

    let mut compressed = Vec::new();
    reader.read_to_end(&mut compressed)?;
    let body_bytes = zstd::decode_all(&compressed[..])
        .map_err(|e| BakeError::Compression(e.to_string()))?;
    let heights: Vec<f32> = bincode::deserialize(&body_bytes)
        .map_err(|e| BakeError::Deserialize(e.to_string()))?;

    HeightField::from_values(
        header.width as usize,
        header.depth as usize,
        header.extension_size as usize,
        heights,
    )
    .ok_or(BakeError::SizeMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bake_and_load() {
        let mut field = HeightField::new(6, 4, 1, 2.5);
        field.set(3, 2, -1.0);

        let path = std::env::temp_dir().join("highland_bake_test.hfz");
        save_height_field(&path, &field).unwrap();
        let loaded = load_height_field(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, field);
    }

    #[test]
    fn test_header_is_fixed_size() {
        let header = BakeHeader { width: 1000, depth: 7, ..Default::default() };
        let bytes = bincode::serialize(&header).unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[0..4], b"HFLD");
        assert_eq!(bincode::serialized_size(&BakeHeader::default()).unwrap(), 20);
    }

    #[test]
    fn test_rejects_foreign_file() {
        let path = std::env::temp_dir().join("highland_bake_foreign.hfz");
        std::fs::write(&path, vec![0u8; 64]).unwrap();
        let result = load_height_field(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(BakeError::InvalidMagic)));
    }
}
