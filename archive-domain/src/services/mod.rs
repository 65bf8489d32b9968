//! Domain service interfaces. No implementation lives here — concrete
//! engines are provided by `archive-core`.

mod byte_io;

pub use byte_io::ByteIo;
