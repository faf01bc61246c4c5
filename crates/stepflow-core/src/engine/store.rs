//! Almacenamiento de un output ya validado.
use std::iter;
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;

use crate::errors::StepError;
use crate::event::StepEvent;
use crate::model::{AssetMaterialization, AssetPartitions, MetadataEntry, OutputMetadataEntry, SolidOutput,
                   StepOutputHandle, UserEvent};

use super::{asset_partitions_for_output, flatten_asset_partitions, guard, EventStream, StepExecutionContext};

pub(crate) fn store_output<'a>(ctx: &'a StepExecutionContext,
                               handle: StepOutputHandle,
                               output: Rc<SolidOutput>,
                               input_assets: Rc<Vec<AssetPartitions>>)
                               -> EventStream<'a> {
    match store_output_events(ctx, &handle, &output, &input_assets) {
        Ok(events) => Box::new(events.into_iter().map(Ok)),
        Err(e) => Box::new(iter::once(Err(e))),
    }
}

fn store_output_events(ctx: &StepExecutionContext,
                       handle: &StepOutputHandle,
                       output: &SolidOutput,
                       input_assets: &[AssetPartitions])
                       -> Result<Vec<StepEvent>, StepError> {
    let step_key = &ctx.step().key;
    let output_def =
        ctx.solid_def()
           .output_def_named(&handle.output_name)
           .ok_or_else(|| StepError::Invariant(format!("output \"{}\" has no definition", handle.output_name)))?;
    let manager = ctx.io_manager_for(output_def)?;
    let output_context = ctx.output_context(handle);

    let asset_partitions = asset_partitions_for_output(&output_context, output_def, manager)?;
    let flat_assets = flatten_asset_partitions(asset_partitions.as_ref());
    let mut buckets: IndexMap<Option<String>, Vec<MetadataEntry>> =
        flat_assets.iter().map(|(_, partition)| (partition.clone(), Vec::new())).collect();
    if buckets.is_empty() {
        buckets.insert(None, Vec::new());
    }

    let returned = guard(|| manager.handle_output(&output_context, output.value())).map_err(|e| {
                       e.escalate(|source| StepError::HandleOutput { step_key: step_key.clone(),
                                                                     output_name: handle.output_name.clone(),
                                                                     source })
                   })?;

    let mut manager_materializations = Vec::new();
    let mut manager_metadata: Vec<OutputMetadataEntry> = Vec::new();
    for item in returned {
        match item {
            UserEvent::AssetMaterialization(m) => manager_materializations.push(m),
            UserEvent::Metadata(entry) => manager_metadata.push(entry.into()),
            UserEvent::PartitionMetadata(entry) => manager_metadata.push(entry.into()),
            other => {
                return Err(StepError::BackendContractViolation { output_name: handle.output_name.clone(),
                                                                 value: format!("{other:?}"),
                                                                 type_name: other.type_name().to_string() })
            }
        }
    }

    // Primero la metadata del output, luego la del backend.
    for entry in output.metadata_entries().iter().chain(manager_metadata.iter()) {
        match entry {
            OutputMetadataEntry::Partitioned(targeted) => {
                let key = Some(targeted.partition.clone());
                let declared: Vec<String> = buckets.keys().flatten().cloned().collect();
                match buckets.get_mut(&key) {
                    Some(bucket) => bucket.push(targeted.entry.clone()),
                    None => {
                        return Err(StepError::UndeclaredPartition { output_name: output_def.name.clone(),
                                                                    label: targeted.entry.label.clone(),
                                                                    partition: targeted.partition.clone(),
                                                                    declared })
                    }
                }
            }
            OutputMetadataEntry::Plain(plain) => {
                for bucket in buckets.values_mut() {
                    bucket.push(plain.clone());
                }
            }
        }
    }

    let mut events = Vec::with_capacity(flat_assets.len() + manager_materializations.len() + 1);
    for (asset_key, partition) in flat_assets {
        let metadata_entries = buckets.get(&partition).cloned().unwrap_or_default();
        let materialization = AssetMaterialization { asset_key,
                                                     partition,
                                                     description: None,
                                                     metadata_entries };
        events.push(StepEvent::materialization(ctx, materialization, input_assets.to_vec()));
    }
    for materialization in manager_materializations {
        events.push(StepEvent::materialization(ctx, materialization, input_assets.to_vec()));
    }

    let handled_metadata = manager_metadata.into_iter()
                                           .filter_map(|entry| match entry {
                                               OutputMetadataEntry::Plain(e) => Some(e),
                                               OutputMetadataEntry::Partitioned(_) => None,
                                           })
                                           .collect();
    debug!("handled output {handle} with IO manager \"{}\"", output_def.io_manager_key);
    events.push(StepEvent::handled_output(ctx, &handle.output_name, &output_def.io_manager_key, handled_metadata));
    Ok(events)
}
