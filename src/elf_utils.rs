//! Image Loader
//!
//! Populates [`Memory`] from an ELF executable's `.text`/`.data`/`.rodata`/
//! `.bss` sections and, optionally, a preloaded hex data image. `.text` is
//! mandatory; the other sections are loaded only when present with a
//! nonzero payload.

use elf::endian::AnyEndian;
use elf::ElfBytes;
use thiserror::Error;

use crate::memory::Memory;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not read executable {path}: {source}")]
    ReadExecutable { path: String, #[source] source: std::io::Error },

    #[error("could not parse ELF file {path}: {source}")]
    ParseElf { path: String, #[source] source: elf::ParseError },

    #[error("executable {path} has no .text section")]
    MissingText { path: String },

    #[error("could not read section data for {section} in {path}: {source}")]
    SectionData { section: &'static str, path: String, source: elf::ParseError },

    #[error(".text section in {path} is compressed, which is unsupported")]
    CompressedText { path: String },

    #[error("could not read preload hex file {path}: {source}")]
    ReadHexFile { path: String, #[source] source: std::io::Error },

    #[error("malformed hex line {line_number} in {path}: {text:?}")]
    MalformedHexLine { path: String, line_number: usize, text: String },
}

/// Size, in bytes, of the loaded `.text` section. The driver uses this to
/// bound the fetch loop to `[text_start, text_start + text_size)`.
pub struct LoadedImage {
    pub text_size: u32,
}

/// Load `.text` (mandatory) and `.data`/`.rodata`/`.bss` (optional) from
/// `path` into `mem`, with `.text` placed at `text_start`.
pub fn load_elf(path: &str, text_start: u32, mem: &mut Memory) -> Result<LoadedImage, LoadError> {
    let file_data = std::fs::read(path).map_err(|source| LoadError::ReadExecutable {
        path: path.to_string(),
        source,
    })?;

    let file = ElfBytes::<AnyEndian>::minimal_parse(&file_data).map_err(|source| {
        LoadError::ParseElf { path: path.to_string(), source }
    })?;

    let text_shdr = file
        .section_header_by_name(".text")
        .map_err(|source| LoadError::SectionData { section: ".text", path: path.to_string(), source })?
        .ok_or_else(|| LoadError::MissingText { path: path.to_string() })?;

    let (text_data, compressed) = file
        .section_data(&text_shdr)
        .map_err(|source| LoadError::SectionData { section: ".text", path: path.to_string(), source })?;
    if compressed.is_some() {
        return Err(LoadError::CompressedText { path: path.to_string() });
    }
    mem.load_bytes(text_start, text_data);
    let text_size = text_data.len() as u32;

    for name in [".data", ".rodata", ".bss"] {
        if let Some(shdr) = file.section_header_by_name(name).map_err(|source| {
            LoadError::SectionData { section: name, path: path.to_string(), source }
        })? {
            if shdr.sh_size == 0 {
                continue;
            }
            let (data, compressed) = file.section_data(&shdr).map_err(|source| {
                LoadError::SectionData { section: name, path: path.to_string(), source }
            })?;
            if compressed.is_some() || data.is_empty() {
                continue;
            }
            mem.load_bytes(shdr.sh_addr as u32, data);
        }
    }

    Ok(LoadedImage { text_size })
}

/// Parse a hex preload file: one 32-bit word per nonempty line, base-16,
/// stored little-endian starting at address 0 and incrementing by 4.
pub fn load_hex_file(path: &str, mem: &mut Memory) -> Result<(), LoadError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|source| LoadError::ReadHexFile { path: path.to_string(), source })?;

    let mut addr = 0u32;
    for (line_number, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let word = u32::from_str_radix(trimmed, 16).map_err(|_| LoadError::MalformedHexLine {
            path: path.to_string(),
            line_number,
            text: trimmed.to_string(),
        })?;
        mem.write_word(addr, word);
        addr = addr.wrapping_add(4);
    }

    Ok(())
}
