//! Resolución de (asset, partición) para inputs y outputs.
use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::errors::StepError;
use crate::model::{AssetKey, AssetPartitions};
use crate::step::OutputDefinition;
use crate::storage::{IoManager, OutputContext};

/// El claim de asset de un output puede venir de su definición o de su
/// backend, nunca de ambos.
pub fn asset_partitions_for_output(ctx: &OutputContext,
                                   output_def: &OutputDefinition,
                                   manager: &dyn IoManager)
                                   -> Result<Option<AssetPartitions>, StepError> {
    let definition_asset = output_def.asset_partitions_for(ctx);
    let manager_asset = manager.output_asset_partitions(ctx);
    match (definition_asset, manager_asset) {
        (Some(_), Some(_)) => Err(StepError::AssetClaimConflict { solid: ctx.solid_def_name.clone().unwrap_or_default(),
                                                                  output_name: output_def.name.clone() }),
        (definition_asset, manager_asset) => Ok(definition_asset.or(manager_asset)),
    }
}

/// Un claim sin particiones produce un único par `(asset, None)`.
pub fn flatten_asset_partitions(asset_partitions: Option<&AssetPartitions>) -> Vec<(AssetKey, Option<String>)> {
    let Some(ap) = asset_partitions else {
        return vec![];
    };
    if ap.partitions.is_empty() {
        return vec![(ap.asset_key.clone(), None)];
    }
    ap.partitions
      .iter()
      .map(|p| (ap.asset_key.clone(), Some(p.clone())))
      .collect()
}

/// Une claims por asset. Un asset visto con y sin particiones queda con la
/// unión de las particiones explícitas.
pub fn dedup_asset_partitions<I>(asset_partitions: I) -> Vec<AssetPartitions>
    where I: IntoIterator<Item = AssetPartitions>
{
    let mut by_key: IndexMap<AssetKey, BTreeSet<String>> = IndexMap::new();
    for ap in asset_partitions {
        by_key.entry(ap.asset_key).or_default().extend(ap.partitions);
    }
    by_key.into_iter()
          .map(|(asset_key, partitions)| AssetPartitions { asset_key, partitions })
          .collect()
}
