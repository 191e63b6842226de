//! Install and configuration scripts shipped with the binary.
//!
//! The scripts are opaque payloads: they are uploaded and run as-is, with
//! their inputs supplied as environment assignments on the command line.

pub const NODEPOOL_INSTALL: &str = include_str!("../assets/installscript.sh");
pub const NODEPOOL_CONFIGURE: &str = include_str!("../assets/nodepool_config.sh");
pub const OSCI_INSTALL: &str = include_str!("../assets/osci_installscript.sh");
