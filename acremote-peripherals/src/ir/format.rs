mod nec;

pub use nec::Nec;
