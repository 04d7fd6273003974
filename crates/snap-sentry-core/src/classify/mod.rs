pub mod partition;
pub mod probe;

pub use partition::{partition_removals, HiddenOrCopy, HiddenReason, PartitionOptions, RemovalPartition};
pub use probe::{CopyProbe, GlobProbe, NoCopyProbe};
