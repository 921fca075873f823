use greenscope::prelude::*;
use serde_derive::Serialize;

#[derive(Serialize)]
pub struct VegStatsOutput {
    #[serde(flatten)]
    pub report: DashboardReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<RegionStats>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetLookup>,
}
