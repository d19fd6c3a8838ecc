// bus/mod.rs
//
// The two broadcast channels of the machine: the Common Data Bus (results,
// station -> everyone) and the Tag Bus (commit notifications, ROB -> register
// file). Both follow the same double-buffered stage/latch discipline so that
// no consumer ever observes a write staged earlier in the same cycle.

pub mod cdb;
pub mod tag_bus;

pub use cdb::CommonDataBus;
pub use tag_bus::TagBus;
