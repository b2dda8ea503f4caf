use log::debug;
use crate::error::Result;
use crate::field::Field;
use crate::mesh::MeshId;
use crate::prediction::{coefficients_for, Prediction};
use crate::projection::Projection;
use crate::subset::Subset;




/**
 * Fill the non-leaf positions of a field from its leaves: projection cells
 * are averaged from the finest level down, then prediction cells are
 * interpolated from the coarsest level up, each level reading values
 * completed by the previous one. Positions outside the domain are not
 * touched. The prediction order may not exceed the prediction width of the
 * mesh.
 */
pub fn update_ghost_mr(field: &mut Field<f64>, order: usize) -> Result<()> {
    let mesh = field.mesh();
    let (min, max) = (mesh.min_level(), mesh.max_level());

    coefficients_for(mesh, order)?;

    for level in (min..max).rev() {
        Subset::from(&mesh[MeshId::ProjCells][level]).apply_op(&mut Projection::new(field));
    }
    for level in (min + 1)..=max {
        Subset::from(&mesh[MeshId::PredCells][level]).apply_op(&mut Prediction::new(order, false, field)?);
    }
    debug!(
        "ghosts of {} updated: {} projected, {} predicted",
        field.name(),
        mesh.nb_cells(MeshId::ProjCells),
        mesh.nb_cells(MeshId::PredCells));

    Ok(())
}


/**
 * Update the ghosts of a field with the prediction order set in the
 * configuration of its mesh.
 */
pub fn update_ghost(field: &mut Field<f64>) -> Result<()> {
    let order = field.mesh().config().prediction_order;
    update_ghost_mr(field, order)
}
