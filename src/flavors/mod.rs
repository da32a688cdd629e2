/// Bounded FIFO channel implementation.
pub(crate) mod buffered;
/// Single-slot hand-off channel implementation.
pub(crate) mod rendezvous;
