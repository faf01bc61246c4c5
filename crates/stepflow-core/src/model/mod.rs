//! Modelos neutrales (assets, metadata, outputs, type checks, handles).

pub mod asset;
pub mod handle;
pub mod metadata;
pub mod output;
pub mod type_check;

pub use asset::{AssetKey, AssetMaterialization, AssetPartitions, ExpectationResult};
pub use handle::SolidHandle;
pub use metadata::{MetadataEntry, MetadataValue, OutputMetadataEntry, PartitionMetadataEntry};
pub use output::{DynamicOutput, Output, SolidOutput, StepOutputHandle, UserEvent};
pub use type_check::{TypeCheck, TypeCheckData, TypeCheckReturn};
