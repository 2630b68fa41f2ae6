//! Fixtures shared by tests across the workspace

use crate::{DataNodeId, SchemaConfig, TableRule};

pub fn nodes(ids: &[&str]) -> Vec<DataNodeId> {
    ids.iter().map(|id| DataNodeId::from(*id)).collect()
}

/// A three-shard "shop" schema:
/// - `orders` sharded by `user_id`, primary key `id`
/// - `users` sharded by `user_id`
/// - `regions` global
/// - default node `dn1`
pub fn shop_schema() -> SchemaConfig {
    let shards = nodes(&["dn1", "dn2", "dn3"]);

    SchemaConfig::new("shop")
        .with_default_node("dn1")
        .with_table(TableRule::sharded("orders", "user_id", shards.clone()).with_primary_key("id"))
        .with_table(TableRule::sharded("users", "user_id", shards.clone()))
        .with_table(TableRule::global("regions", shards))
}
