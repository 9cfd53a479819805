use std::{fs, io, path::Path};

use thiserror::Error;

use crate::mapper::{Mapper, Mapper0};

/// The size of each PRG-ROM bank
pub const PRG_ROM_SIZE: usize = 0x4000;

/// The size of each CHR-ROM bank
pub const CHR_ROM_SIZE: usize = 0x2000;

// "NES" in ASCII followed by the MS-DOS end-of-file byte
const INES_MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];
const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;

/// Nametable mirroring arrangement, declared by the iNES header for the
/// simple boards and switched at runtime by the fancier mappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    OneScreenLo,
    OneScreenHi,
}

/// Construction-time failures. Once a cartridge is built, every access is
/// total and nothing here can occur again.
#[derive(Error, Debug)]
pub enum CartridgeError {
    #[error("not an iNES file")]
    BadMagic,

    #[error("iNES image declares no PRG-ROM")]
    NoPrgRom,

    #[error("iNES image shorter than its header declares")]
    Truncated,

    #[error("unsupported iNES mapper {0}")]
    UnsupportedMapper(u8),

    #[error("cartridge I/O: {0}")]
    Io(#[from] io::Error),
}

/// A decoded game pak: PRG/CHR storage plus the mapper chip that decides
/// which guest addresses land where.
pub struct CartridgeNes {
    prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
    prg_banks: usize,
    chr_banks: usize,
    mapper_id: u8,
    mirroring: Mirroring,
    mapper: Box<dyn Mapper>,
}

impl CartridgeNes {
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let data = fs::read(path)?;

        CartridgeNes::from_ines_bytes(&data)
    }

    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_LEN || data[0..4] != INES_MAGIC {
            return Err(CartridgeError::BadMagic);
        }

        let prg_banks = data[4] as usize;
        let chr_banks = data[5] as usize;
        let flags6 = data[6];
        let flags7 = data[7];

        if prg_banks == 0 {
            return Err(CartridgeError::NoPrgRom);
        }

        let mirroring = if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let mut offset = HEADER_LEN;
        if flags6 & 0x04 != 0 {
            offset += TRAINER_LEN;
        }

        let prg_len = prg_banks * PRG_ROM_SIZE;
        let chr_len = chr_banks * CHR_ROM_SIZE;
        if data.len() < offset + prg_len + chr_len {
            return Err(CartridgeError::Truncated);
        }

        let prg_rom = data[offset..offset + prg_len].to_vec();
        let chr_rom = if chr_banks == 0 {
            // boards with no CHR-ROM carry 8 KiB of CHR-RAM instead
            vec![0; CHR_ROM_SIZE]
        } else {
            data[offset + prg_len..offset + prg_len + chr_len].to_vec()
        };

        let mapper_id = (flags7 & 0xF0) | (flags6 >> 4);
        let mapper: Box<dyn Mapper> = match mapper_id {
            0 => Box::new(Mapper0::new(prg_banks)),
            _ => {
                log::warn!("unsupported iNES mapper {}", mapper_id);
                return Err(CartridgeError::UnsupportedMapper(mapper_id));
            }
        };

        Ok(Self {
            prg_rom,
            chr_rom,
            prg_banks,
            chr_banks,
            mapper_id,
            mirroring,
            mapper,
        })
    }

    /// CPU-space access. `None` means the mapper declined the address and
    /// the bus should look at its own devices instead.
    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        self.mapper
            .cpu_map_read(addr)
            .map(|offset| self.prg_rom[offset])
    }

    pub fn cpu_write(&mut self, addr: u16, byte: u8) -> bool {
        match self.mapper.cpu_map_write(addr) {
            Some(offset) => {
                self.prg_rom[offset] = byte;
                true
            }
            None => false,
        }
    }

    /// PPU-space access into the pattern tables.
    pub fn ppu_read(&self, addr: u16) -> Option<u8> {
        self.mapper
            .ppu_map_read(addr)
            .map(|offset| self.chr_rom[offset])
    }

    pub fn ppu_write(&mut self, addr: u16, byte: u8) -> bool {
        match self.mapper.ppu_map_write(addr) {
            Some(offset) => {
                self.chr_rom[offset] = byte;
                true
            }
            None => false,
        }
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn mapper_id(&self) -> u8 {
        self.mapper_id
    }

    pub fn prg_banks(&self) -> usize {
        self.prg_banks
    }

    pub fn chr_banks(&self) -> usize {
        self.chr_banks
    }
}

#[cfg(test)]
impl CartridgeNes {
    /// A blank NROM-256 cartridge. The PRG window is writable through the
    /// mapper, so tests load programs and vectors with plain bus writes.
    pub fn test_new() -> Self {
        Self {
            prg_rom: vec![0; 2 * PRG_ROM_SIZE],
            chr_rom: vec![0; CHR_ROM_SIZE],
            prg_banks: 2,
            chr_banks: 1,
            mapper_id: 0,
            mirroring: Mirroring::Horizontal,
            mapper: Box::new(Mapper0::new(2)),
        }
    }

    pub fn test_new_with_mirroring(mirroring: Mirroring) -> Self {
        let mut cartridge = CartridgeNes::test_new();
        cartridge.mirroring = mirroring;
        cartridge
    }
}
