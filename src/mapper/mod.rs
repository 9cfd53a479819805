mod mapper0;

pub use self::mapper0::Mapper0;

/// Cartridge-side address translation.
///
/// Each query takes a guest address and answers with the offset into the
/// cartridge's PRG or CHR storage that backs it, or `None` when the address
/// is outside the cartridge window and the bus should route elsewhere.
/// Mappers with banking registers snoop the write queries to reconfigure
/// themselves, which is why the write halves take `&mut self`.
pub trait Mapper {
    fn cpu_map_read(&self, addr: u16) -> Option<usize>;

    fn cpu_map_write(&mut self, addr: u16) -> Option<usize>;

    fn ppu_map_read(&self, addr: u16) -> Option<usize>;

    fn ppu_map_write(&mut self, addr: u16) -> Option<usize>;
}
