pub mod discovery;
pub mod identity;
pub mod metadata;
pub mod probe;
pub mod templates;

pub use discovery::{discover, PROBE_CONCURRENCY};
pub use identity::{resolve_identity, InfoPlistReader, ManifestReader};
pub use metadata::{MdlsMetadata, MetadataQuery};
pub use probe::{DiskProbe, FsProbe};
pub use templates::{DiscoveryRoots, PathTemplate, Scope, TEMPLATES};
