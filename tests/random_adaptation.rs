use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use latticework::adapt::update_mesh;
use latticework::ghosts::update_ghost;
use latticework::graduation::{graduation, is_graded};
use latticework::{BoundingBox, CellFlag, Field, Mesh, MeshConfig, MeshId};




fn linear(x: [f64; 3]) -> f64 {
    1.0 + 2.0 * x[0] - 3.0 * x[1] + 0.5 * x[2]
}

fn unit_box(dim: usize) -> BoundingBox {
    BoundingBox::new(&vec![0.0; dim], &vec![1.0; dim])
}

fn random_tags<'m>(mesh: &'m Mesh, rng: &mut SmallRng) -> Field<'m, CellFlag> {
    let mut tag = Field::new("tag", mesh);
    tag.fill_with(MeshId::Cells, |_| match rng.gen_range(0..3) {
        0 => CellFlag::KEEP,
        1 => CellFlag::COARSEN,
        _ => CellFlag::REFINE,
    });
    tag
}

fn leaf_volume(mesh: &Mesh) -> f64 {
    let mut volume = 0.0;
    mesh.for_each_cell(MeshId::Cells, |cell| volume += cell.length.powi(mesh.dim() as i32));
    volume
}

fn assert_ghosts_are_exact(mesh: &Mesh) {
    let mut u = Field::new("u", mesh);
    u.fill_with(MeshId::AllCells, |cell| linear(cell.center()));
    u.fill_with(MeshId::PredCells, |_| 1e3);
    u.fill_with(MeshId::ProjCells, |_| -1e3);
    update_ghost(&mut u).unwrap();

    mesh.for_each_cell(MeshId::AllCells, |cell| {
        assert!((u[cell] - linear(cell.center())).abs() < 1e-10, "level {} at {:?}", cell.level, cell.indices)
    });
}

fn adapt_randomly(config: MeshConfig, start: usize, min: usize, max: usize, seed: u64, iterations: usize) {
    let dim = config.dim;
    let mut mesh = Mesh::new(config, &unit_box(dim), start, min, max).unwrap();
    let mut rng = SmallRng::seed_from_u64(seed);

    for _ in 0..iterations {
        let adapted = {
            let mut tag = random_tags(&mesh, &mut rng);
            graduation(&mut tag);
            let once = tag.array().to_vec();
            graduation(&mut tag);
            assert_eq!(tag.array(), &once[..]);
            update_mesh(&tag)
        };

        assert!(is_graded(&adapted));
        assert!((leaf_volume(&adapted) - 1.0).abs() < 1e-12);
        assert_ghosts_are_exact(&adapted);
        mesh = adapted;
    }
}




// ============================================================================
#[test]
fn random_tags_graduate_in_1d() {
    for seed in [1, 7, 42] {
        adapt_randomly(MeshConfig::new(1), 4, 1, 7, seed, 6);
    }
}

#[test]
fn random_tags_graduate_in_2d() {
    for seed in [3, 11] {
        adapt_randomly(MeshConfig::new(2), 3, 1, 5, seed, 5);
    }
}

#[test]
fn random_tags_graduate_in_3d() {
    adapt_randomly(MeshConfig::new(3), 2, 1, 4, 5, 4);
}

#[test]
fn wide_prediction_halo_keeps_ghosts_exact() {
    adapt_randomly(MeshConfig::new(1).with_prediction(5, 5), 4, 1, 6, 13, 5);
    adapt_randomly(MeshConfig::new(2).with_prediction(3, 3), 3, 1, 5, 17, 4);
    adapt_randomly(MeshConfig::new(3).with_prediction(2, 2), 2, 1, 3, 19, 3);
}
