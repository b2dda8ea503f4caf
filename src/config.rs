use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};




/// Largest supported number of spatial dimensions.
pub const MAX_DIM: usize = 3;




/**
 * Static parameters of an adaptive mesh: the spatial dimension, the deepest
 * level a mesh may ever reach, and the widths of the halos used by the
 * numerical stencils and by the multiresolution prediction.
 */
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub dim: usize,
    pub max_refinement_level: usize,
    pub ghost_width: i64,
    pub prediction_order: usize,
    pub prediction_width: i64,
}




// ============================================================================
impl MeshConfig {

    pub fn new(dim: usize) -> Self {
        Self { dim, ..Self::default() }
    }

    pub fn with_ghost_width(mut self, ghost_width: i64) -> Self {
        self.ghost_width = ghost_width;
        self
    }

    pub fn with_prediction(mut self, order: usize, width: i64) -> Self {
        self.prediction_order = order;
        self.prediction_width = width;
        self
    }

    pub fn with_max_refinement_level(mut self, level: usize) -> Self {
        self.max_refinement_level = level;
        self
    }


    /**
     * Check the configuration for internal consistency. The prediction halo
     * must be at least as wide as the prediction order, since the order-s
     * correction reads coarse neighbors up to a distance s.
     */
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 || self.dim > MAX_DIM {
            return Err(Error::UnsupportedDimension(self.dim))
        }
        if self.prediction_order > 5 {
            return Err(Error::PredictionOrder(self.prediction_order))
        }
        if self.prediction_width < self.prediction_order as i64 || self.ghost_width < 0 {
            return Err(Error::PredictionWidth {
                order: self.prediction_order,
                width: self.prediction_width.max(0) as usize,
            })
        }
        Ok(())
    }


    /**
     * Check that the level bounds fit below the refinement limit.
     */
    pub fn validate_levels(&self, min_level: usize, max_level: usize) -> Result<()> {
        if min_level > max_level || max_level > self.max_refinement_level {
            return Err(Error::InvalidLevels {
                min: min_level,
                max: max_level,
                limit: self.max_refinement_level,
            })
        }
        Ok(())
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            dim: 2,
            max_refinement_level: 20,
            ghost_width: 1,
            prediction_order: 1,
            prediction_width: 1,
        }
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::MeshConfig;
    use crate::error::Error;

    #[test]
    fn partial_config_fills_defaults() {
        let config: MeshConfig = serde_json::from_str(r#"{ "dim": 3, "ghost_width": 2 }"#).unwrap();
        assert_eq!(config.dim, 3);
        assert_eq!(config.ghost_width, 2);
        assert_eq!(config.prediction_order, 1);
        assert_eq!(config.max_refinement_level, 20);
    }

    #[test]
    fn narrow_prediction_halo_is_rejected() {
        let config = MeshConfig::new(2).with_prediction(3, 1);
        assert_eq!(config.validate(), Err(Error::PredictionWidth { order: 3, width: 1 }));
        assert!(MeshConfig::new(2).with_prediction(3, 3).validate().is_ok());
    }

    #[test]
    fn dimension_four_is_rejected() {
        assert_eq!(MeshConfig::new(4).validate(), Err(Error::UnsupportedDimension(4)));
    }

    #[test]
    fn level_bounds_are_checked() {
        let config = MeshConfig::new(1).with_max_refinement_level(8);
        assert!(config.validate_levels(2, 8).is_ok());
        assert!(config.validate_levels(3, 2).is_err());
        assert!(config.validate_levels(0, 9).is_err());
    }
}
