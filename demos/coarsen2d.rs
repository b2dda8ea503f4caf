use clap::Parser;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use latticework::adapt::{coarsening_criterion, refinement_criterion, transfer_field, update_mesh};
use latticework::ghosts::update_ghost;
use latticework::graduation::{graduation, is_graded};
use latticework::{BoundingBox, Field, Mesh, MeshConfig, MeshId};

#[derive(Debug, Parser)]
#[clap(version = "0.1", about = "Adapt a 2D mesh to a circular front")]
struct Opts {
    #[clap(long, default_value = "2")]
    min_level: usize,

    #[clap(long, default_value = "7")]
    max_level: usize,

    #[clap(short = 'e', long, default_value = "1e-3")]
    eps: f64,

    #[clap(short = 's', long, default_value = "1")]
    order: usize,

    #[clap(short = 'n', long, default_value = "10")]
    iterations: usize,

    #[clap(short = 'v', long)]
    verbose: bool,
}

fn front(x: [f64; 3]) -> f64 {
    let r = ((x[0] - 0.5).powi(2) + (x[1] - 0.5).powi(2)).sqrt();
    (50.0 * (r - 0.25)).tanh()
}

fn adapt(mesh: &Mesh, values: &[f64], opts: &Opts) -> latticework::Result<(Mesh, Vec<f64>)> {
    let mut u = Field::new("u", mesh);
    u.array_mut().copy_from_slice(values);
    update_ghost(&mut u)?;

    let mut tag = Field::new("tag", mesh);
    coarsening_criterion(&u, &mut tag, opts.eps);
    refinement_criterion(&u, &mut tag, 10.0 * opts.eps);
    graduation(&mut tag);

    let new_mesh = update_mesh(&tag);
    let values = transfer_field(&u, &new_mesh)?.array().to_vec();
    Ok((new_mesh, values))
}

fn main() -> latticework::Result<()> {
    let opts = Opts::parse();
    let level = if opts.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    SimpleLogger::new().with_level(level).init().unwrap();

    let config = MeshConfig::new(2).with_prediction(opts.order, opts.order.max(1) as i64);
    let bbox = BoundingBox::new(&[0.0, 0.0], &[1.0, 1.0]);
    let mut mesh = Mesh::new(config, &bbox, opts.max_level, opts.min_level, opts.max_level)?;
    let mut values = {
        let mut u = Field::new("u", &mesh);
        u.fill_with(MeshId::AllCells, |cell| front(cell.center()));
        u.array().to_vec()
    };

    for iteration in 0..opts.iterations {
        let before = mesh.nb_cells(MeshId::Cells);
        let (new_mesh, new_values) = adapt(&mesh, &values, &opts)?;
        mesh = new_mesh;
        values = new_values;

        info!(
            "iteration {}: {} leaves, graded: {}",
            iteration,
            mesh.nb_cells(MeshId::Cells),
            is_graded(&mesh));

        if mesh.nb_cells(MeshId::Cells) == before {
            break
        }
    }

    for level in opts.min_level..=opts.max_level {
        info!("level {}: {} leaves", level, mesh.nb_cells_on_level(MeshId::Cells, level));
    }
    info!("final mesh: {} field positions", mesh.nb_total_cells());
    Ok(())
}
