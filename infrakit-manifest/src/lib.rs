//! # infrakit-manifest
//!
//! Client for the external manifest generator, implementing
//! [`infrakit_core::ManifestGenerator`].
//!
//! The generator is a separate executable invoked once per command:
//!
//! ```text
//! <path> [args…] generate-helm   stdin {name, chart, values}     stdout {success, manifest?, error?}
//! <path> [args…] validate-k8s    stdin {manifest, kubeconfig?}   stdout {valid|success, error?}
//! ```
//!
//! A non-zero exit or unparsable stdout means the tool is broken; a
//! well-formed negative answer means the input is invalid. The two never
//! collapse into one error.

pub mod process;
pub mod protocol;

pub use process::ProcessGenerator;
