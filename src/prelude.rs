pub use crate::{Error, Result};

pub use crate::backend::*;
pub use crate::boundary::*;
pub use crate::catalog::*;
pub use crate::geometry::*;
pub use crate::raster::*;
pub use crate::source::*;
pub use crate::stats::*;
pub use crate::window::*;

pub use crate::change::*;
pub use crate::composite::*;
pub use crate::export::*;
pub use crate::series::*;
pub use crate::session::*;
pub use crate::zonal::*;

pub use crate::assets::{AssetLookup, Assets};
